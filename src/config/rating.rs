//! Rating model configuration

use crate::error::{RatingError, Result};
use serde::{Deserialize, Serialize};

/// Corrective bonus per doubling of team size
pub const MP_FACTOR: f64 = 300.0;

/// Rating gap at which the favourite wins about 91% of the time
pub const PROBABILITY_SCALE: f64 = 250.0;

/// K used by the fixed-K update rule
pub const FIXED_K: f64 = 20.0;

/// Rating given to players registered without an explicit one
pub const DEFAULT_INITIAL_RATING: f64 = 1400.0;

/// Which K-factor rule drives per-game rating updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KFactorMode {
    /// `200 / (sqrt(games_played) + 10) + 5`
    GamesPlayed,
    /// Constant [`RatingConfig::fixed_k`]
    Fixed,
}

impl std::str::FromStr for KFactorMode {
    type Err = RatingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "games_played" => Ok(KFactorMode::GamesPlayed),
            "fixed" => Ok(KFactorMode::Fixed),
            other => Err(RatingError::ConfigurationError {
                message: format!("Unknown K-factor mode: {}", other),
            }),
        }
    }
}

impl std::fmt::Display for KFactorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KFactorMode::GamesPlayed => write!(f, "games_played"),
            KFactorMode::Fixed => write!(f, "fixed"),
        }
    }
}

/// Constants of the team Elo model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub mp_factor: f64,
    pub probability_scale: f64,
    pub k_mode: KFactorMode,
    pub fixed_k: f64,
    pub initial_rating: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            mp_factor: MP_FACTOR,
            probability_scale: PROBABILITY_SCALE,
            k_mode: KFactorMode::GamesPlayed,
            fixed_k: FIXED_K,
            initial_rating: DEFAULT_INITIAL_RATING,
        }
    }
}

impl RatingConfig {
    /// Configuration using the constant K of the simplified update rule
    pub fn fixed_k() -> Self {
        Self {
            k_mode: KFactorMode::Fixed,
            ..Self::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.mp_factor.is_finite() || self.mp_factor < 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "Multiplayer factor must be non-negative".to_string(),
            }
            .into());
        }

        if !self.probability_scale.is_finite() || self.probability_scale <= 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "Probability scale must be positive".to_string(),
            }
            .into());
        }

        if !self.fixed_k.is_finite() || self.fixed_k <= 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "Fixed K must be positive".to_string(),
            }
            .into());
        }

        if !self.initial_rating.is_finite() {
            return Err(RatingError::ConfigurationError {
                message: "Initial rating must be a finite number".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RatingConfig::default();
        assert_eq!(config.mp_factor, 300.0);
        assert_eq!(config.probability_scale, 250.0);
        assert_eq!(config.k_mode, KFactorMode::GamesPlayed);
        assert!(config.validate().is_ok());
        assert!(RatingConfig::fixed_k().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = RatingConfig::default();
        config.probability_scale = 0.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.fixed_k = -5.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.mp_factor = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_k_mode_parsing() {
        assert_eq!("fixed".parse::<KFactorMode>().unwrap(), KFactorMode::Fixed);
        assert_eq!(
            "GAMES_PLAYED".parse::<KFactorMode>().unwrap(),
            KFactorMode::GamesPlayed
        );
        assert!("sometimes".parse::<KFactorMode>().is_err());
    }
}
