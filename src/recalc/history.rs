//! Rating history
//!
//! Ordered log of rating snapshots produced by the recalculation engine. Used
//! to answer "rating as of a date" and to resume a replay part way through.

use crate::types::RatingLogEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every rating snapshot in replay order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingHistory {
    entries: Vec<RatingLogEntry>,
}

impl RatingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap entries that are already in non-decreasing timestamp order
    pub fn from_entries(entries: Vec<RatingLogEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: RatingLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RatingLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All snapshots of one player, oldest first
    pub fn for_player<'a>(
        &'a self,
        player_id: &'a str,
    ) -> impl Iterator<Item = &'a RatingLogEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.player_id == player_id)
    }

    /// Most recent snapshot of a player
    pub fn latest(&self, player_id: &str) -> Option<&RatingLogEntry> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.player_id == player_id)
    }

    /// Last snapshot strictly before `at`
    pub fn last_before(&self, player_id: &str, at: DateTime<Utc>) -> Option<&RatingLogEntry> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.player_id == player_id && entry.timestamp < at)
    }

    /// Rating the player held at `at`, counting games played at that instant
    pub fn rating_as_of(&self, player_id: &str, at: DateTime<Utc>) -> Option<f64> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.player_id == player_id && entry.timestamp <= at)
            .map(|entry| entry.rating)
    }
}
