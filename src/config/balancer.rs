//! Team balancer configuration

use crate::error::{RatingError, Result};
use serde::{Deserialize, Serialize};

/// Hard ceiling for the player cap, the search uses a 32-bit membership mask
pub const MAX_SUPPORTED_PLAYERS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Largest pool the exhaustive search accepts
    pub max_players: usize,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self { max_players: 20 }
    }
}

impl BalancerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_players < 2 || self.max_players > MAX_SUPPORTED_PLAYERS {
            return Err(RatingError::ConfigurationError {
                message: format!(
                    "Balancer player cap must be between 2 and {}",
                    MAX_SUPPORTED_PLAYERS
                ),
            }
            .into());
        }
        Ok(())
    }
}
