//! Full-history rating recalculation
//!
//! The engine derives every player's rating, games played and rating history
//! from their initial ratings and the ordered list of ranked games. It never
//! mutates its inputs; the caller applies the returned [`Recalculation`].

use crate::config::rating::RatingConfig;
use crate::error::{RatingError, Result};
use crate::rating::calculator::{
    EloRatingCalculator, Participant, RatingCalculationResult, RatingCalculator,
};
use crate::recalc::history::RatingHistory;
use crate::types::{Game, GameId, Player, PlayerId, RatingLogEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Outcome of one replayed game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    pub game_id: GameId,
    pub timestamp: DateTime<Utc>,
    pub result: RatingCalculationResult,
}

/// Derived state produced by a replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recalculation {
    /// Input players, in input order, with rating and games played replaced
    pub players: Vec<Player>,
    pub history: RatingHistory,
    /// One report per replayed ranked game, in replay order
    pub reports: Vec<GameReport>,
}

impl Recalculation {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.id == player_id)
    }

    pub fn report(&self, game_id: GameId) -> Option<&GameReport> {
        self.reports.iter().find(|report| report.game_id == game_id)
    }
}

#[derive(Debug, Clone, Copy)]
struct WorkingState {
    rating: f64,
    games_played: u32,
}

/// Replays ranked games to rebuild ratings
pub struct RecalculationEngine {
    calculator: Box<dyn RatingCalculator>,
}

impl Default for RecalculationEngine {
    fn default() -> Self {
        Self::with_calculator(Box::new(EloRatingCalculator::default()))
    }
}

impl std::fmt::Debug for RecalculationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecalculationEngine")
            .field("calculator", &self.calculator.config())
            .finish()
    }
}

impl RecalculationEngine {
    /// Create an engine using the team Elo calculator
    pub fn new(config: RatingConfig) -> Result<Self> {
        Ok(Self::with_calculator(Box::new(EloRatingCalculator::new(
            config,
        )?)))
    }

    pub fn with_calculator(calculator: Box<dyn RatingCalculator>) -> Self {
        Self { calculator }
    }

    pub fn calculator(&self) -> &dyn RatingCalculator {
        self.calculator.as_ref()
    }

    /// Replay every ranked game from the players' initial ratings
    pub fn recompute(&self, players: &[Player], games: &[Game]) -> Result<Recalculation> {
        self.replay(players, games, &RatingHistory::new(), DateTime::<Utc>::MIN_UTC)
    }

    /// Replay only the games at or after `from`
    ///
    /// Snapshots in `previous` strictly before `from` are kept and each
    /// player resumes from their last one. The result equals [`Self::recompute`]
    /// as long as no game before `from` changed since `previous` was built.
    pub fn recompute_from(
        &self,
        players: &[Player],
        games: &[Game],
        previous: &RatingHistory,
        from: DateTime<Utc>,
    ) -> Result<Recalculation> {
        self.replay(players, games, previous, from)
    }

    fn replay(
        &self,
        players: &[Player],
        games: &[Game],
        previous: &RatingHistory,
        from: DateTime<Utc>,
    ) -> Result<Recalculation> {
        let mut state: HashMap<&str, WorkingState> = HashMap::with_capacity(players.len());
        let mut history = RatingHistory::new();

        for player in players {
            let resumed = previous
                .last_before(&player.id, from)
                .filter(|entry| !entry.is_seed());
            let working = match resumed {
                Some(entry) => WorkingState {
                    rating: entry.rating,
                    games_played: entry.games_played,
                },
                None => WorkingState {
                    rating: player.initial_rating,
                    games_played: 0,
                },
            };

            if state.insert(player.id.as_str(), working).is_some() {
                return Err(
                    RatingError::domain(format!("duplicate player id {}", player.id)).into(),
                );
            }
            history.push(RatingLogEntry::seed(player));
        }

        // Kept snapshots of players that still exist
        for entry in previous.entries() {
            let kept = !entry.is_seed()
                && entry.timestamp < from
                && state.contains_key(entry.player_id.as_str());
            if kept {
                history.push(entry.clone());
            }
        }

        // That instant is reserved for seed entries
        if let Some(game) = games
            .iter()
            .find(|game| game.ranked && game.timestamp == DateTime::<Utc>::MIN_UTC)
        {
            return Err(RatingError::domain(format!(
                "game {} has no usable timestamp",
                game.id
            ))
            .into());
        }

        let mut ordered: Vec<&Game> = games
            .iter()
            .filter(|game| game.ranked && game.timestamp >= from)
            .collect();
        // Stable, so games sharing a timestamp keep their input order
        ordered.sort_by_key(|game| game.timestamp);

        let mut reports = Vec::with_capacity(ordered.len());
        for game in ordered {
            let result = self.apply_game(game, &state)?;

            for change in &result.rating_changes {
                if let Some(working) = state.get_mut(change.player_id.as_str()) {
                    working.rating = change.new_rating;
                    working.games_played = change.games_played;
                }
                history.push(RatingLogEntry {
                    player_id: change.player_id.clone(),
                    timestamp: game.timestamp,
                    rating: change.new_rating,
                    games_played: change.games_played,
                });
            }

            debug!(
                "Replayed game {} at {}: delta {:.1}, {} rating changes",
                game.id,
                game.timestamp,
                result.rating_delta,
                result.rating_changes.len()
            );

            reports.push(GameReport {
                game_id: game.id,
                timestamp: game.timestamp,
                result,
            });
        }

        let players: Vec<Player> = players
            .iter()
            .map(|player| {
                let working = state[player.id.as_str()];
                Player {
                    rating: working.rating,
                    games_played: working.games_played,
                    ..player.clone()
                }
            })
            .collect();

        info!(
            "Recalculated {} players over {} ranked games from {}",
            players.len(),
            reports.len(),
            from
        );

        Ok(Recalculation {
            players,
            history,
            reports,
        })
    }

    fn apply_game(
        &self,
        game: &Game,
        state: &HashMap<&str, WorkingState>,
    ) -> Result<RatingCalculationResult> {
        let team_one = resolve_team(&game.team_one);
        let team_two = resolve_team(&game.team_two);

        if let Some(both) = team_one.iter().find(|id| team_two.contains(*id)) {
            return Err(RatingError::domain(format!(
                "player {} is on both teams of game {}",
                both, game.id
            ))
            .into());
        }

        let participants = |team: &[&PlayerId]| -> Vec<Participant> {
            team.iter()
                .map(|id| match state.get(id.as_str()) {
                    Some(working) => Participant::new(*id, working.rating, working.games_played),
                    None => Participant::unknown(*id),
                })
                .collect()
        };

        self.calculator.calculate_rating_changes(
            &participants(&team_one),
            &participants(&team_two),
            game.winner,
        )
    }
}

/// Team roster with duplicate ids collapsed, first occurrence kept
fn resolve_team(ids: &[PlayerId]) -> Vec<&PlayerId> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(id.as_str())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use chrono::{Duration, TimeZone};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn players() -> Vec<Player> {
        vec![
            Player::new("alice", "Alice", 2100.0),
            Player::new("bob", "Bob", 2000.0),
            Player::new("carol", "Carol", 1500.0),
        ]
    }

    #[test]
    fn test_single_game() {
        let engine = RecalculationEngine::default();
        let games = vec![Game::new(t(0), ["alice"], ["bob"], Side::TeamOne)];

        let result = engine.recompute(&players(), &games).unwrap();

        let alice = result.player("alice").unwrap();
        assert_eq!(alice.rating, 2107.0);
        assert_eq!(alice.games_played, 1);
        let bob = result.player("bob").unwrap();
        assert_eq!(bob.rating, 1993.0);
        let carol = result.player("carol").unwrap();
        assert_eq!(carol.rating, 1500.0);
        assert_eq!(carol.games_played, 0);

        // Three seeds plus two game entries
        assert_eq!(result.history.len(), 5);
        assert!(result.history.entries()[..3].iter().all(|e| e.is_seed()));
        assert_eq!(result.reports.len(), 1);
        assert_eq!(result.reports[0].result.rating_delta, 100.0);
    }

    #[test]
    fn test_uses_working_ratings_not_cached_ones() {
        let engine = RecalculationEngine::default();
        let mut input = players();
        // Stale cached values must be ignored
        input[0].rating = 9999.0;
        input[0].games_played = 42;

        let games = vec![Game::new(t(0), ["alice"], ["bob"], Side::TeamOne)];
        let result = engine.recompute(&input, &games).unwrap();

        assert_eq!(result.player("alice").unwrap().rating, 2107.0);
        assert_eq!(result.player("alice").unwrap().games_played, 1);
    }

    #[test]
    fn test_games_replayed_in_timestamp_order() {
        let engine = RecalculationEngine::default();
        let late = Game::new(t(10), ["alice"], ["bob"], Side::TeamTwo);
        let early = Game::new(t(0), ["alice"], ["bob"], Side::TeamOne);

        let shuffled = engine
            .recompute(&players(), &[late.clone(), early.clone()])
            .unwrap();
        let ordered = engine.recompute(&players(), &[early, late]).unwrap();

        assert_eq!(shuffled.players, ordered.players);
        assert_eq!(shuffled.history, ordered.history);
        assert_eq!(shuffled.reports[0].timestamp, t(0));
    }

    #[test]
    fn test_unranked_games_are_skipped() {
        let engine = RecalculationEngine::default();
        let games = vec![Game::new(t(0), ["alice"], ["bob"], Side::TeamTwo).unranked()];

        let result = engine.recompute(&players(), &games).unwrap();

        assert_eq!(result.player("alice").unwrap().rating, 2100.0);
        assert_eq!(result.player("alice").unwrap().games_played, 0);
        assert!(result.reports.is_empty());
        assert_eq!(result.history.len(), 3);
    }

    #[test]
    fn test_deleted_player_is_excluded_from_team() {
        let engine = RecalculationEngine::default();
        let games = vec![Game::new(
            t(0),
            ["alice", "departed"],
            ["bob"],
            Side::TeamOne,
        )];

        let result = engine.recompute(&players(), &games).unwrap();

        assert_eq!(result.player("alice").unwrap().rating, 2107.0);
        assert_eq!(result.reports[0].result.missing.len(), 1);
        assert!(result.history.latest("departed").is_none());
    }

    #[test]
    fn test_team_emptied_by_deletion_fails() {
        let engine = RecalculationEngine::default();
        let games = vec![Game::new(t(0), ["departed"], ["bob"], Side::TeamOne)];

        let err = engine.recompute(&players(), &games).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RatingError>(),
            Some(RatingError::Domain { .. })
        ));
    }

    #[test]
    fn test_overlapping_teams_rejected() {
        let engine = RecalculationEngine::default();
        let games = vec![Game::new(t(0), ["alice", "bob"], ["bob"], Side::TeamOne)];

        assert!(engine.recompute(&players(), &games).is_err());
    }

    #[test]
    fn test_duplicate_ids_within_team_collapse() {
        let engine = RecalculationEngine::default();
        let doubled = vec![Game::new(t(0), ["alice", "alice"], ["bob"], Side::TeamOne)];
        let single = vec![Game::new(t(0), ["alice"], ["bob"], Side::TeamOne)];

        let a = engine.recompute(&players(), &doubled).unwrap();
        let b = engine.recompute(&players(), &single).unwrap();
        assert_eq!(a.players, b.players);
        assert_eq!(a.player("alice").unwrap().games_played, 1);
    }

    #[test]
    fn test_duplicate_player_ids_rejected() {
        let engine = RecalculationEngine::default();
        let mut input = players();
        input.push(Player::new("bob", "Other Bob", 1000.0));

        assert!(engine.recompute(&input, &[]).is_err());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let engine = RecalculationEngine::default();
        let games = vec![
            Game::new(t(0), ["alice"], ["bob", "carol"], Side::TeamTwo),
            Game::new(t(5), ["alice", "carol"], ["bob"], Side::TeamOne),
        ];

        let first = engine.recompute(&players(), &games).unwrap();
        let second = engine.recompute(&first.players, &games).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_replay_matches_full_replay() {
        let engine = RecalculationEngine::default();
        let games = vec![
            Game::new(t(0), ["alice"], ["bob"], Side::TeamTwo),
            Game::new(t(5), ["alice", "carol"], ["bob"], Side::TeamOne),
            Game::new(t(5), ["carol"], ["bob"], Side::TeamOne),
            Game::new(t(9), ["bob", "carol"], ["alice"], Side::TeamOne),
        ];

        let full = engine.recompute(&players(), &games).unwrap();

        for boundary in [t(-1), t(0), t(3), t(5), t(9), t(60)] {
            let partial = engine
                .recompute_from(&players(), &games, &full.history, boundary)
                .unwrap();
            assert_eq!(partial.players, full.players);
            assert_eq!(partial.history, full.history);
        }
    }

    #[test]
    fn test_partial_replay_after_append() {
        let engine = RecalculationEngine::default();
        let mut games = vec![Game::new(t(0), ["alice"], ["bob"], Side::TeamOne)];
        let before = engine.recompute(&players(), &games).unwrap();

        games.push(Game::new(t(30), ["carol"], ["bob"], Side::TeamOne));
        let incremental = engine
            .recompute_from(&before.players, &games, &before.history, t(30))
            .unwrap();
        let full = engine.recompute(&players(), &games).unwrap();

        assert_eq!(incremental.players, full.players);
        assert_eq!(incremental.history, full.history);
        assert_eq!(incremental.reports.len(), 1);
        assert_eq!(incremental.player("bob").unwrap().games_played, 2);
    }

    #[test]
    fn test_game_at_seed_instant_rejected() {
        let engine = RecalculationEngine::default();
        let games = vec![
            Game::new(DateTime::<Utc>::MIN_UTC, ["alice"], ["bob"], Side::TeamOne),
            Game::new(t(1), ["alice"], ["bob"], Side::TeamOne),
        ];

        let err = engine.recompute(&players(), &games).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RatingError>(),
            Some(RatingError::Domain { .. })
        ));
        assert!(engine
            .recompute_from(&players(), &games, &RatingHistory::new(), t(1))
            .is_err());

        // Unranked games never write entries, so they may carry it
        let unranked = vec![
            Game::new(DateTime::<Utc>::MIN_UTC, ["alice"], ["bob"], Side::TeamOne).unranked(),
        ];
        assert!(engine.recompute(&players(), &unranked).is_ok());
    }

    #[test]
    fn test_fixed_k_engine() {
        let engine = RecalculationEngine::new(RatingConfig::fixed_k()).unwrap();
        let games = vec![Game::new(t(0), ["alice"], ["bob"], Side::TeamOne)];

        let result = engine.recompute(&players(), &games).unwrap();
        assert_eq!(result.player("alice").unwrap().rating, 2106.0);
        assert_eq!(result.player("bob").unwrap().rating, 1994.0);
    }
}
