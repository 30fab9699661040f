//! League manager
//!
//! Keeps a [`LeagueStore`] consistent with its game history. Every change to
//! players or games triggers a replay, and mutations are serialised so no game
//! is inserted while a replay is running.
//!
//! Partial replays resume from the store's rating history, which is only
//! trusted once this manager has written it. Until then, or whenever the
//! history does not cover the stored games, the manager replays everything.

use crate::balance::{BalanceResult, TeamBalancer};
use crate::config::AppConfig;
use crate::error::{RatingError, Result};
use crate::league::storage::LeagueStore;
use crate::recalc::{RatingHistory, Recalculation, RecalculationEngine};
use crate::types::{Game, GameId, Player, PlayerId};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

/// Statistics about league manager operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeagueManagerStats {
    /// Replays that started from the first game
    pub full_replays: u64,
    /// Replays that resumed from a timestamp boundary
    pub partial_replays: u64,
    /// Changes undone because their replay failed
    pub rollbacks: u64,
}

#[derive(Debug, Default)]
struct ManagerState {
    stats: LeagueManagerStats,
    /// Set once the store's history was written by this manager and still
    /// matches the stored players and games
    history_synced: bool,
}

/// Applies player and game changes to a store and keeps ratings derived
pub struct LeagueManager {
    store: Arc<dyn LeagueStore>,
    engine: RecalculationEngine,
    balancer: TeamBalancer,
    /// Held for the whole of any mutation, replay included
    state: Mutex<ManagerState>,
}

impl LeagueManager {
    /// Create a manager with default rating and balancer settings
    pub fn new(store: Arc<dyn LeagueStore>) -> Self {
        Self {
            store,
            engine: RecalculationEngine::default(),
            balancer: TeamBalancer::default(),
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Create a manager from application configuration
    pub fn with_config(store: Arc<dyn LeagueStore>, config: &AppConfig) -> Result<Self> {
        Ok(Self {
            store,
            engine: RecalculationEngine::new(config.rating.clone())?,
            balancer: TeamBalancer::new(config.rating.clone(), config.balancer.clone())?,
            state: Mutex::new(ManagerState::default()),
        })
    }

    pub fn store(&self) -> &Arc<dyn LeagueStore> {
        &self.store
    }

    pub fn stats(&self) -> Result<LeagueManagerStats> {
        Ok(self.lock()?.stats.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ManagerState>> {
        self.state.lock().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire league write lock".to_string(),
            }
            .into()
        })
    }

    /// History a replay from `from` can resume from, or `None` when only a
    /// full replay is safe
    fn resumable_history(
        &self,
        state: &ManagerState,
        players: &[Player],
        games: &[Game],
        from: DateTime<Utc>,
    ) -> Result<Option<RatingHistory>> {
        if from == DateTime::<Utc>::MIN_UTC {
            return Ok(None);
        }
        if !state.history_synced {
            info!("Stored rating history was not built here, replaying every game");
            return Ok(None);
        }

        let history = self.store.get_history()?;

        // Everyone who played before the boundary needs a seed to resume from
        let earlier: HashSet<&str> = games
            .iter()
            .filter(|game| game.ranked && game.timestamp < from)
            .flat_map(|game| game.team_one.iter().chain(game.team_two.iter()))
            .map(String::as_str)
            .collect();
        let uncovered = players.iter().find(|player| {
            earlier.contains(player.id.as_str())
                && !history
                    .for_player(&player.id)
                    .next()
                    .is_some_and(|entry| entry.is_seed())
        });

        if let Some(player) = uncovered {
            warn!(
                "Rating history has no seed for {}, replaying every game",
                player.id
            );
            return Ok(None);
        }

        Ok(Some(history))
    }

    /// Replay from `from` and apply the result; the caller holds the lock
    fn replay_from(&self, state: &mut ManagerState, from: DateTime<Utc>) -> Result<Recalculation> {
        let players = self.store.get_players()?;
        let games = self.store.get_games()?;

        let recalculation = match self.resumable_history(state, &players, &games, from)? {
            Some(history) => {
                state.stats.partial_replays += 1;
                self.engine
                    .recompute_from(&players, &games, &history, from)?
            }
            None => {
                state.stats.full_replays += 1;
                self.engine.recompute(&players, &games)?
            }
        };

        self.store.apply_recalculation(&recalculation)?;
        state.history_synced = true;
        Ok(recalculation)
    }

    /// Undo a change whose replay failed, handing back the replay error
    ///
    /// The failed replay applied nothing, so the history stays in step once the
    /// change is undone. If undoing fails too, the next replay starts over.
    fn roll_back(
        &self,
        state: &mut ManagerState,
        change: &str,
        replay_error: anyhow::Error,
        undo: impl FnOnce() -> Result<()>,
    ) -> anyhow::Error {
        warn!("Undoing {} after failed replay: {}", change, replay_error);
        state.stats.rollbacks += 1;

        if let Err(undo_error) = undo() {
            error!("Could not undo {}: {}", change, undo_error);
            state.history_synced = false;
        }

        replay_error
    }

    /// Register a new player, starting from the configured initial rating
    /// when none is given
    pub fn register_player(
        &self,
        player_id: impl Into<PlayerId>,
        name: impl Into<String>,
        initial_rating: Option<f64>,
    ) -> Result<Player> {
        let player_id = player_id.into();
        let mut state = self.lock()?;

        if self.store.get_player(&player_id)?.is_some() {
            return Err(
                RatingError::domain(format!("player {} is already registered", player_id)).into(),
            );
        }

        let initial_rating =
            initial_rating.unwrap_or_else(|| self.engine.calculator().initial_rating());
        let player = Player::new(player_id, name, initial_rating);
        self.store.store_player(player.clone())?;

        // Nothing to replay, this only seeds the new player's history
        if let Err(e) = self.replay_from(&mut state, DateTime::<Utc>::MAX_UTC) {
            let change = format!("registration of {}", player.id);
            return Err(self.roll_back(&mut state, &change, e, || {
                self.store.remove_player(&player.id).map(|_| ())
            }));
        }
        info!("Registered player {} at {}", player.id, initial_rating);

        Ok(player)
    }

    /// Change a player's baseline and replay everything
    pub fn set_initial_rating(&self, player_id: &str, initial_rating: f64) -> Result<Player> {
        let mut state = self.lock()?;

        let previous = self
            .store
            .get_player(player_id)?
            .ok_or_else(|| RatingError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;
        self.store.store_player(Player {
            initial_rating,
            ..previous.clone()
        })?;

        let recalculation = match self.replay_from(&mut state, DateTime::<Utc>::MIN_UTC) {
            Ok(recalculation) => recalculation,
            Err(e) => {
                let change = format!("initial rating of {}", player_id);
                return Err(self.roll_back(&mut state, &change, e, || {
                    self.store.store_player(previous)
                }));
            }
        };
        let player = recalculation.player(player_id).cloned().ok_or_else(|| {
            RatingError::PlayerNotFound {
                player_id: player_id.to_string(),
            }
        })?;
        Ok(player)
    }

    /// Remove a player and replay everything without them
    pub fn delete_player(&self, player_id: &str) -> Result<Recalculation> {
        let mut state = self.lock()?;

        let players = self.store.get_players()?;
        let (position, player) = players
            .into_iter()
            .enumerate()
            .find(|(_, p)| p.id == player_id)
            .ok_or_else(|| RatingError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;
        self.store.remove_player(player_id)?;

        match self.replay_from(&mut state, DateTime::<Utc>::MIN_UTC) {
            Ok(recalculation) => {
                info!("Deleted player {}", player_id);
                Ok(recalculation)
            }
            Err(e) => {
                let change = format!("deletion of player {}", player_id);
                Err(self.roll_back(&mut state, &change, e, || {
                    self.store.insert_player(position, player)
                }))
            }
        }
    }

    /// Record a finished game and replay from its timestamp
    pub fn record_game(&self, game: Game) -> Result<Recalculation> {
        let mut state = self.lock()?;

        if self.store.get_game(game.id)?.is_some() {
            return Err(RatingError::domain(format!("game {} is already recorded", game.id)).into());
        }

        let (game_id, from) = (game.id, game.timestamp);
        self.store.store_game(game)?;

        match self.replay_from(&mut state, from) {
            Ok(recalculation) => {
                info!("Recorded game {} at {}", game_id, from);
                Ok(recalculation)
            }
            Err(e) => {
                let change = format!("recording of game {}", game_id);
                Err(self.roll_back(&mut state, &change, e, || {
                    self.store.remove_game(game_id).map(|_| ())
                }))
            }
        }
    }

    /// Replace a recorded game and replay from the earlier of both timestamps
    pub fn update_game(&self, game: Game) -> Result<Recalculation> {
        let mut state = self.lock()?;

        let previous = self
            .store
            .get_game(game.id)?
            .ok_or(RatingError::GameNotFound { game_id: game.id })?;

        let (game_id, from) = (game.id, previous.timestamp.min(game.timestamp));
        self.store.store_game(game)?;

        match self.replay_from(&mut state, from) {
            Ok(recalculation) => {
                info!("Updated game {}, replayed from {}", game_id, from);
                Ok(recalculation)
            }
            Err(e) => {
                let change = format!("update of game {}", game_id);
                Err(self.roll_back(&mut state, &change, e, || {
                    self.store.store_game(previous)
                }))
            }
        }
    }

    /// Delete a recorded game and replay from its timestamp
    pub fn delete_game(&self, game_id: GameId) -> Result<Recalculation> {
        let mut state = self.lock()?;

        let position = self
            .store
            .get_games()?
            .iter()
            .position(|g| g.id == game_id)
            .ok_or(RatingError::GameNotFound { game_id })?;
        let removed = self
            .store
            .remove_game(game_id)?
            .ok_or(RatingError::GameNotFound { game_id })?;
        let from = removed.timestamp;

        match self.replay_from(&mut state, from) {
            Ok(recalculation) => {
                info!("Deleted game {}", game_id);
                Ok(recalculation)
            }
            Err(e) => {
                let change = format!("deletion of game {}", game_id);
                Err(self.roll_back(&mut state, &change, e, || {
                    self.store.insert_game(position, removed)
                }))
            }
        }
    }

    /// Replay the whole history
    pub fn rebuild(&self) -> Result<Recalculation> {
        let mut state = self.lock()?;
        self.replay_from(&mut state, DateTime::<Utc>::MIN_UTC)
    }

    /// Players by rating, highest first
    pub fn leaderboard(&self) -> Result<Vec<Player>> {
        let mut players = self.store.get_players()?;
        players.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(players)
    }

    /// Games newest first, optionally truncated
    pub fn recent_games(&self, limit: Option<usize>) -> Result<Vec<Game>> {
        let mut games = self.store.get_games()?;
        games.reverse();
        // Stable, so same-timestamp games stay newest-inserted first
        games.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        if let Some(limit) = limit {
            games.truncate(limit);
        }
        Ok(games)
    }

    /// A player's rating at a point in time
    pub fn rating_as_of(&self, player_id: &str, at: DateTime<Utc>) -> Result<Option<f64>> {
        Ok(self.store.get_history()?.rating_as_of(player_id, at))
    }

    /// Propose balanced teams among registered players
    pub fn propose_teams(&self, player_ids: &[PlayerId]) -> Result<BalanceResult> {
        // Checked before any lookup so oversized pools cost nothing
        if player_ids.len() > self.balancer.max_players() {
            return Err(RatingError::TooManyPlayers {
                count: player_ids.len(),
                max: self.balancer.max_players(),
            }
            .into());
        }

        let players = player_ids
            .iter()
            .map(|id| -> Result<Player> {
                let player = self.store.get_player(id)?.ok_or_else(|| {
                    RatingError::PlayerNotFound {
                        player_id: id.clone(),
                    }
                })?;
                Ok(player)
            })
            .collect::<Result<Vec<Player>>>()?;

        self.balancer.balance(&players)
    }
}
