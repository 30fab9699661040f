//! Error types for the rating engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the crate. Callers that need to react to a specific failure can
//! `downcast_ref::<RatingError>()` the returned error.

use crate::types::{GameId, PlayerId};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating and balancing scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("Invalid input: {reason}")]
    Domain { reason: String },

    #[error("Not enough players to build two teams: got {count}, need at least 2")]
    InsufficientPlayers { count: usize },

    #[error("Too many players to balance: got {count}, limit is {max}")]
    TooManyPlayers { count: usize, max: usize },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: PlayerId },

    #[error("Game not found: {game_id}")]
    GameNotFound { game_id: GameId },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl RatingError {
    /// Shorthand for a [`RatingError::Domain`] error
    pub fn domain(reason: impl Into<String>) -> Self {
        RatingError::Domain {
            reason: reason.into(),
        }
    }
}
