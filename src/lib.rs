//! Lanelo - team Elo ratings for LAN party leagues
//!
//! This crate provides the team rating model, full-history recalculation of
//! player ratings, and an exhaustive team balancer for ad-hoc matches.

pub mod balance;
pub mod config;
pub mod error;
pub mod league;
pub mod rating;
pub mod recalc;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use balance::{BalanceResult, BalanceVerdict, Partition, TeamBalancer};
pub use league::{InMemoryLeagueStore, LeagueManager, LeagueStore};
pub use rating::{EloRatingCalculator, RatingCalculator, RatingModel};
pub use recalc::{RatingHistory, Recalculation, RecalculationEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
