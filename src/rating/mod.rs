//! Team Elo rating model
//!
//! This module provides the pure rating formulas and the calculator that
//! applies a single game's outcome to its participants.

pub mod calculator;
pub mod model;

// Re-export commonly used types
pub use calculator::{
    EloRatingCalculator, Participant, RatingCalculationResult, RatingCalculator, RatingChange,
};
pub use model::{RatingModel, TeamMember, TeamRating};
