//! Rating recalculation
//!
//! Replays the ordered game history to derive current ratings, games played
//! and the full rating log, either from scratch or from a timestamp boundary.

pub mod engine;
pub mod history;

pub use engine::{GameReport, Recalculation, RecalculationEngine};
pub use history::RatingHistory;
