//! Rating calculator trait and implementations
//!
//! This module defines the interface for applying one game's outcome to its
//! participants and provides the team Elo implementation.

use crate::config::rating::RatingConfig;
use crate::error::{RatingError, Result};
use crate::rating::model::{RatingModel, TeamMember};
use crate::types::{MissingRatingWarning, PlayerId, Side};
use serde::{Deserialize, Serialize};

/// A player entering a game, as known at that point of the history
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub player_id: PlayerId,
    /// `None` for a player the caller could not resolve
    pub rating: Option<f64>,
    /// Games played before this one
    pub games_played: u32,
}

impl Participant {
    pub fn new(player_id: impl Into<PlayerId>, rating: f64, games_played: u32) -> Self {
        Self {
            player_id: player_id.into(),
            rating: Some(rating),
            games_played,
        }
    }

    pub fn unknown(player_id: impl Into<PlayerId>) -> Self {
        Self {
            player_id: player_id.into(),
            rating: None,
            games_played: 0,
        }
    }

    fn as_member(&self) -> TeamMember {
        TeamMember {
            player_id: self.player_id.clone(),
            rating: self.rating,
        }
    }
}

/// Rating change information for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub player_id: PlayerId,
    pub side: Side,
    pub old_rating: f64,
    pub new_rating: f64,
    pub won: bool,
    /// Games played including this one
    pub games_played: u32,
}

impl RatingChange {
    pub fn rating_delta(&self) -> f64 {
        self.new_rating - self.old_rating
    }
}

/// Result of applying one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCalculationResult {
    pub team_one_rating: f64,
    pub team_two_rating: f64,
    /// Team one's aggregate minus team two's
    pub rating_delta: f64,
    pub team_one_win_probability: f64,
    pub winner: Side,
    /// One entry per rated participant, team one first, in input order
    pub rating_changes: Vec<RatingChange>,
    pub missing: Vec<MissingRatingWarning>,
}

impl RatingCalculationResult {
    /// Win probability of the given side before the game
    pub fn win_probability(&self, side: Side) -> f64 {
        match side {
            Side::TeamOne => self.team_one_win_probability,
            Side::TeamTwo => 1.0 - self.team_one_win_probability,
        }
    }

    pub fn change_for(&self, player_id: &str) -> Option<&RatingChange> {
        self.rating_changes
            .iter()
            .find(|change| change.player_id == player_id)
    }

    /// Other rated players on the same side as `player_id`
    pub fn teammates_of(&self, player_id: &str) -> Vec<&RatingChange> {
        match self.change_for(player_id) {
            Some(own) => self
                .rating_changes
                .iter()
                .filter(|change| change.side == own.side && change.player_id != player_id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Rated players on the side opposing `player_id`
    pub fn opponents_of(&self, player_id: &str) -> Vec<&RatingChange> {
        match self.change_for(player_id) {
            Some(own) => self
                .rating_changes
                .iter()
                .filter(|change| change.side != own.side)
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Trait for calculating rating changes after games
pub trait RatingCalculator: Send + Sync {
    /// Apply a finished game to both teams
    ///
    /// # Arguments
    /// * `team_one` - Participants of the first team
    /// * `team_two` - Participants of the second team
    /// * `winner` - The side that won
    fn calculate_rating_changes(
        &self,
        team_one: &[Participant],
        team_two: &[Participant],
        winner: Side,
    ) -> Result<RatingCalculationResult>;

    /// Get the initial rating for new players
    fn initial_rating(&self) -> f64;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;

    /// Update configuration from JSON
    fn update_config(&mut self, config: serde_json::Value) -> Result<()>;
}

/// Team Elo calculator backed by [`RatingModel`]
#[derive(Debug, Clone, Default)]
pub struct EloRatingCalculator {
    model: RatingModel,
}

impl EloRatingCalculator {
    pub fn new(config: RatingConfig) -> Result<Self> {
        Ok(Self {
            model: RatingModel::new(config)?,
        })
    }

    pub fn model(&self) -> &RatingModel {
        &self.model
    }

    fn side_changes(
        &self,
        side: Side,
        participants: &[Participant],
        rating_delta: f64,
        winner: Side,
    ) -> Result<Vec<RatingChange>> {
        let won = side == winner;
        let mut changes = Vec::with_capacity(participants.len());

        for participant in participants {
            let Some(rating) = participant.rating.filter(|r| r.is_finite()) else {
                continue;
            };
            changes.push(RatingChange {
                player_id: participant.player_id.clone(),
                side,
                old_rating: rating,
                new_rating: self.model.updated_rating(
                    rating,
                    rating_delta,
                    won,
                    participant.games_played,
                )?,
                won,
                games_played: participant.games_played + 1,
            });
        }

        Ok(changes)
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn calculate_rating_changes(
        &self,
        team_one: &[Participant],
        team_two: &[Participant],
        winner: Side,
    ) -> Result<RatingCalculationResult> {
        let members_one: Vec<TeamMember> = team_one.iter().map(Participant::as_member).collect();
        let members_two: Vec<TeamMember> = team_two.iter().map(Participant::as_member).collect();

        let rating_one = self.model.team_rating(&members_one)?;
        let rating_two = self.model.team_rating(&members_two)?;
        let rating_delta = rating_one.value - rating_two.value;

        let mut rating_changes =
            self.side_changes(Side::TeamOne, team_one, rating_delta, winner)?;
        rating_changes.extend(self.side_changes(Side::TeamTwo, team_two, -rating_delta, winner)?);

        let mut missing = rating_one.missing;
        missing.extend(rating_two.missing);

        Ok(RatingCalculationResult {
            team_one_rating: rating_one.value,
            team_two_rating: rating_two.value,
            rating_delta,
            team_one_win_probability: self.model.win_probability(rating_delta),
            winner,
            rating_changes,
            missing,
        })
    }

    fn initial_rating(&self) -> f64 {
        self.model.config().initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(self.model.config()).unwrap_or(serde_json::Value::Null)
    }

    fn update_config(&mut self, config: serde_json::Value) -> Result<()> {
        let new_config: RatingConfig =
            serde_json::from_value(config).map_err(|e| RatingError::ConfigurationError {
                message: format!("Invalid rating configuration: {}", e),
            })?;

        self.model = RatingModel::new(new_config)?;
        Ok(())
    }
}
