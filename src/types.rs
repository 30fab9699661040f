//! Common types used throughout the rating engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for games
pub type GameId = Uuid;

/// One of the two sides of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    TeamOne,
    TeamTwo,
}

impl Side {
    /// The side playing against this one
    pub fn opponent(self) -> Side {
        match self {
            Side::TeamOne => Side::TeamTwo,
            Side::TeamTwo => Side::TeamOne,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::TeamOne => write!(f, "team1"),
            Side::TeamTwo => write!(f, "team2"),
        }
    }
}

/// A rated player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Current rating, derived by the recalculation engine
    pub rating: f64,
    /// Baseline every replay starts from
    pub initial_rating: f64,
    #[serde(default)]
    pub games_played: u32,
}

impl Player {
    /// Create a player that has not played yet
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, initial_rating: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rating: initial_rating,
            initial_rating,
            games_played: 0,
        }
    }
}

fn ranked_by_default() -> bool {
    true
}

/// A finished game between two teams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub timestamp: DateTime<Utc>,
    pub team_one: Vec<PlayerId>,
    pub team_two: Vec<PlayerId>,
    pub winner: Side,
    /// Unranked games are kept for display but never touch ratings
    #[serde(default = "ranked_by_default")]
    pub ranked: bool,
    #[serde(default)]
    pub map: Option<String>,
}

impl Game {
    /// Create a ranked game with a fresh id
    pub fn new<I, J, S, T>(timestamp: DateTime<Utc>, team_one: I, team_two: J, winner: Side) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<PlayerId>,
        T: Into<PlayerId>,
    {
        Self {
            id: crate::utils::generate_game_id(),
            timestamp,
            team_one: team_one.into_iter().map(Into::into).collect(),
            team_two: team_two.into_iter().map(Into::into).collect(),
            winner,
            ranked: true,
            map: None,
        }
    }

    /// Mark the game as unranked
    pub fn unranked(mut self) -> Self {
        self.ranked = false;
        self
    }

    /// Attach the name of the map the game was played on
    pub fn on_map(mut self, map: impl Into<String>) -> Self {
        self.map = Some(map.into());
        self
    }
}

/// Snapshot of a player's rating after a ranked game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingLogEntry {
    pub player_id: PlayerId,
    /// Game timestamp, or `DateTime::<Utc>::MIN_UTC` for the seed entry
    pub timestamp: DateTime<Utc>,
    pub rating: f64,
    /// Games played including the one this entry was written for
    pub games_played: u32,
}

impl RatingLogEntry {
    /// Seed entry holding a player's initial rating
    pub fn seed(player: &Player) -> Self {
        Self {
            player_id: player.id.clone(),
            timestamp: DateTime::<Utc>::MIN_UTC,
            rating: player.initial_rating,
            games_played: 0,
        }
    }

    pub fn is_seed(&self) -> bool {
        self.timestamp == DateTime::<Utc>::MIN_UTC
    }
}

/// Non-fatal notice that a team member had no usable rating
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissingRatingWarning {
    pub player_id: PlayerId,
}

/// Players and games as handed over by an external store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub games: Vec<Game>,
}
