//! Exhaustive team balancing
//!
//! Every split of the pool into two non-empty teams is scored by the gap
//! between the teams' aggregate ratings and the smallest gap wins. The search
//! is `2^N`, so pools are capped by [`BalancerConfig::max_players`] and
//! rejected before any work is done.

use crate::balance::combinations::{binomial, Combinations};
use crate::balance::verdict::BalanceVerdict;
use crate::config::balancer::BalancerConfig;
use crate::config::rating::RatingConfig;
use crate::error::{RatingError, Result};
use crate::rating::model::RatingModel;
use crate::types::{Player, PlayerId};
use crate::utils::rating_gap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use tracing::debug;

/// A proposed split of the pool into two teams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    /// The enumerated subset, in pool order
    pub team_one: Vec<Player>,
    /// Its complement, in pool order
    pub team_two: Vec<Player>,
    pub team_one_rating: f64,
    pub team_two_rating: f64,
    /// `|team_one_rating - team_two_rating|`
    pub rating_gap: f64,
    pub team_one_win_probability: f64,
}

impl Partition {
    pub fn team_one_ids(&self) -> Vec<PlayerId> {
        self.team_one.iter().map(|p| p.id.clone()).collect()
    }

    pub fn team_two_ids(&self) -> Vec<PlayerId> {
        self.team_two.iter().map(|p| p.id.clone()).collect()
    }

    pub fn verdict(&self) -> BalanceVerdict {
        BalanceVerdict::from_probability(self.team_one_win_probability)
    }

    /// Whether both partitions put the same players together, whichever side
    /// they were labelled
    pub fn same_split(&self, other: &Partition) -> bool {
        let ids = |team: &[Player]| -> HashSet<PlayerId> {
            team.iter().map(|p| p.id.clone()).collect()
        };
        let (a1, a2) = (ids(&self.team_one), ids(&self.team_two));
        let (b1, b2) = (ids(&other.team_one), ids(&other.team_two));

        (a1 == b1 && a2 == b2) || (a1 == b2 && a2 == b1)
    }
}

/// Both proposals for a pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResult {
    /// Best split over every team size
    pub best: Partition,
    /// Best split with team one holding exactly half the pool, rounded down
    pub equal_size: Partition,
}

impl BalanceResult {
    /// False when the equal-size proposal is just the best one again
    pub fn equal_size_is_distinct(&self) -> bool {
        !self.best.same_split(&self.equal_size)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    mask: u32,
    team_one_rating: f64,
    team_two_rating: f64,
    gap: f64,
}

/// Searches for the two-team split with the smallest rating gap
#[derive(Debug, Clone, Default)]
pub struct TeamBalancer {
    model: RatingModel,
    config: BalancerConfig,
}

impl TeamBalancer {
    pub fn new(rating: RatingConfig, config: BalancerConfig) -> Result<Self> {
        Self::with_model(RatingModel::new(rating)?, config)
    }

    pub fn with_model(model: RatingModel, config: BalancerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn max_players(&self) -> usize {
        self.config.max_players
    }

    /// Best split over every subset size from 1 to N-1
    pub fn best_partition(&self, players: &[Player]) -> Result<Partition> {
        self.check_pool(players)?;
        self.search(players, 1..=players.len() - 1)
    }

    /// Best split with team one holding `floor(N/2)` players
    pub fn best_equal_size_partition(&self, players: &[Player]) -> Result<Partition> {
        self.check_pool(players)?;
        let half = players.len() / 2;
        self.search(players, half..=half)
    }

    /// Both proposals, so callers can compare them
    pub fn balance(&self, players: &[Player]) -> Result<BalanceResult> {
        Ok(BalanceResult {
            best: self.best_partition(players)?,
            equal_size: self.best_equal_size_partition(players)?,
        })
    }

    fn check_pool(&self, players: &[Player]) -> Result<()> {
        if players.len() < 2 {
            return Err(RatingError::InsufficientPlayers {
                count: players.len(),
            }
            .into());
        }

        if players.len() > self.config.max_players {
            return Err(RatingError::TooManyPlayers {
                count: players.len(),
                max: self.config.max_players,
            }
            .into());
        }

        let mut seen = HashSet::new();
        for player in players {
            if !seen.insert(player.id.as_str()) {
                return Err(
                    RatingError::domain(format!("player {} listed twice", player.id)).into(),
                );
            }
            if !player.rating.is_finite() {
                return Err(RatingError::domain(format!(
                    "player {} has no usable rating",
                    player.id
                ))
                .into());
            }
        }

        Ok(())
    }

    fn search(&self, players: &[Player], sizes: RangeInclusive<usize>) -> Result<Partition> {
        let n = players.len();
        let mut best: Option<Candidate> = None;
        let mut examined: u64 = 0;
        debug!(
            "Searching {} splits of {} players",
            sizes.clone().map(|k| binomial(n, k)).sum::<u64>(),
            n
        );

        for size in sizes {
            for subset in Combinations::new(n, size) {
                let mask = subset.iter().fold(0u32, |mask, &i| mask | (1u32 << i));

                let (mut sum_one, mut sum_two) = (0.0, 0.0);
                for (i, player) in players.iter().enumerate() {
                    if mask & (1u32 << i) != 0 {
                        sum_one += player.rating;
                    } else {
                        sum_two += player.rating;
                    }
                }

                let team_one_rating = self.model.aggregate(sum_one, size)?;
                let team_two_rating = self.model.aggregate(sum_two, n - size)?;
                let gap = rating_gap(team_one_rating, team_two_rating);
                examined += 1;

                // Strict comparison keeps the first split found on ties
                if best.map_or(true, |b| gap < b.gap) {
                    best = Some(Candidate {
                        mask,
                        team_one_rating,
                        team_two_rating,
                        gap,
                    });
                }
            }
        }

        let best = best.ok_or_else(|| RatingError::InsufficientPlayers { count: n })?;
        debug!(
            "Examined {} splits of {} players, best gap {:.1}",
            examined, n, best.gap
        );

        let (team_one, team_two): (Vec<(usize, &Player)>, Vec<(usize, &Player)>) = players
            .iter()
            .enumerate()
            .partition(|(i, _)| best.mask & (1u32 << *i) != 0);

        Ok(Partition {
            team_one: team_one.into_iter().map(|(_, p)| p.clone()).collect(),
            team_two: team_two.into_iter().map(|(_, p)| p.clone()).collect(),
            team_one_rating: best.team_one_rating,
            team_two_rating: best.team_two_rating,
            rating_gap: best.gap,
            team_one_win_probability: self
                .model
                .win_probability(best.team_one_rating - best.team_two_rating),
        })
    }
}
