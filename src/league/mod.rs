//! League management
//!
//! Storage for players and games plus the manager that keeps derived ratings
//! in step with every change.

pub mod manager;
pub mod storage;

pub use manager::{LeagueManager, LeagueManagerStats};
pub use storage::{InMemoryLeagueStore, LeagueStore};
