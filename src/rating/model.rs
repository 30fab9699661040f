//! Team Elo model
//!
//! Pure formulas shared by the calculator, the recalculation engine and the
//! team balancer. Nothing here holds state beyond the configured constants.

use crate::config::rating::{KFactorMode, RatingConfig};
use crate::error::{RatingError, Result};
use crate::types::{MissingRatingWarning, PlayerId};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A team member as seen by the aggregate formula
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMember {
    pub player_id: PlayerId,
    /// `None` when the member's rating is unknown
    pub rating: Option<f64>,
}

impl TeamMember {
    pub fn rated(player_id: impl Into<PlayerId>, rating: f64) -> Self {
        Self {
            player_id: player_id.into(),
            rating: Some(rating),
        }
    }

    pub fn unrated(player_id: impl Into<PlayerId>) -> Self {
        Self {
            player_id: player_id.into(),
            rating: None,
        }
    }
}

/// Aggregate rating of a team along with the members that were left out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRating {
    pub value: f64,
    /// Members that contributed to the mean and the size bonus
    pub counted: usize,
    pub missing: Vec<MissingRatingWarning>,
}

/// Win probability, K-factor and rating update rules for team games
#[derive(Debug, Clone, Default)]
pub struct RatingModel {
    config: RatingConfig,
}

impl RatingModel {
    /// Create a model from validated configuration
    pub fn new(config: RatingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// `sum / count + mp_factor * log2(count)`
    ///
    /// Fails for an empty team since the size bonus is undefined there.
    pub fn aggregate(&self, sum: f64, count: usize) -> Result<f64> {
        if count == 0 {
            return Err(RatingError::domain("cannot rate an empty team").into());
        }
        let count = count as f64;
        Ok(sum / count + self.config.mp_factor * count.log2())
    }

    /// Aggregate rating of a team, skipping members without a usable rating
    pub fn team_rating(&self, members: &[TeamMember]) -> Result<TeamRating> {
        let mut sum = 0.0;
        let mut counted = 0;
        let mut missing = Vec::new();

        for member in members {
            match member.rating {
                Some(rating) if rating.is_finite() => {
                    sum += rating;
                    counted += 1;
                }
                _ => {
                    warn!(
                        "Player {} has no known rating, leaving them out of the team rating",
                        member.player_id
                    );
                    missing.push(MissingRatingWarning {
                        player_id: member.player_id.clone(),
                    });
                }
            }
        }

        if counted == 0 {
            return Err(RatingError::domain(format!(
                "no rated players left in team of {}",
                members.len()
            ))
            .into());
        }

        Ok(TeamRating {
            value: self.aggregate(sum, counted)?,
            counted,
            missing,
        })
    }

    /// Aggregate rating over plain ratings
    pub fn team_rating_of(&self, ratings: &[f64]) -> Result<f64> {
        self.aggregate(ratings.iter().sum(), ratings.len())
    }

    /// Probability that the side with `rating_delta` more points wins
    pub fn win_probability(&self, rating_delta: f64) -> f64 {
        1.0 / (1.0 + 10f64.powf(-rating_delta / self.config.probability_scale))
    }

    /// `200 / (sqrt(games_played) + 10) + 5`
    ///
    /// 25 for a new player, 15 after 100 games, tending towards 5.
    pub fn k_factor(&self, games_played: i64) -> Result<f64> {
        if games_played < 0 {
            return Err(RatingError::domain(format!(
                "games played cannot be negative, got {}",
                games_played
            ))
            .into());
        }
        Ok(200.0 / ((games_played as f64).sqrt() + 10.0) + 5.0)
    }

    /// K used for a player with `games_played` games under the configured mode
    pub fn effective_k(&self, games_played: u32) -> Result<f64> {
        match self.config.k_mode {
            KFactorMode::Fixed => Ok(self.config.fixed_k),
            KFactorMode::GamesPlayed => self.k_factor(i64::from(games_played)),
        }
    }

    /// Rating after one game, rounded to the nearest point
    ///
    /// `rating_delta` is the player's team rating minus the opposing team's.
    pub fn updated_rating(
        &self,
        rating: f64,
        rating_delta: f64,
        won: bool,
        games_played: u32,
    ) -> Result<f64> {
        let score = if won { 1.0 } else { 0.0 };
        let k = self.effective_k(games_played)?;
        Ok((rating + k * (score - self.win_probability(rating_delta))).round())
    }
}
