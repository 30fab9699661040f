//! Small helpers shared by the engine, the balancer and the CLI

use uuid::Uuid;

/// Fresh random id for a recorded game
pub fn generate_game_id() -> Uuid {
    Uuid::new_v4()
}

/// Unsigned gap between two aggregate ratings
pub fn rating_gap(team_one: f64, team_two: f64) -> f64 {
    (team_one - team_two).abs()
}

/// Format a probability in [0, 1] as a percentage with two decimals
pub fn as_percentage(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_ids_are_unique() {
        assert_ne!(generate_game_id(), generate_game_id());
    }

    #[test]
    fn test_rating_gap_ignores_order() {
        assert_eq!(rating_gap(2400.0, 2325.0), 75.0);
        assert_eq!(rating_gap(2325.0, 2400.0), 75.0);
        assert_eq!(rating_gap(2050.0, 2050.0), 0.0);
    }

    #[test]
    fn test_as_percentage() {
        assert_eq!(as_percentage(0.666139), "66.61%");
        assert_eq!(as_percentage(0.5), "50.00%");
        assert_eq!(as_percentage(1.0), "100.00%");
    }
}
