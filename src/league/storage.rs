//! League storage interface and implementations
//!
//! This module defines the interface for persisting players, games and the
//! derived rating history, with an in-memory implementation. Derived state is
//! only ever written through [`LeagueStore::apply_recalculation`], which
//! replaces it in one step.

use crate::error::{RatingError, Result};
use crate::recalc::{RatingHistory, Recalculation};
use crate::types::{Game, GameId, Player};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Trait for league storage operations
pub trait LeagueStore: Send + Sync {
    /// Get a player by id
    fn get_player(&self, player_id: &str) -> Result<Option<Player>>;

    /// All players in registration order
    fn get_players(&self) -> Result<Vec<Player>>;

    /// Insert a player, or replace the one with the same id in place
    fn store_player(&self, player: Player) -> Result<()>;

    /// Insert a player at `index` (clamped to the end), or replace the one
    /// with the same id in place
    fn insert_player(&self, index: usize, player: Player) -> Result<()>;

    /// Remove a player; their games are left untouched
    fn remove_player(&self, player_id: &str) -> Result<bool>;

    /// Get a game by id
    fn get_game(&self, game_id: GameId) -> Result<Option<Game>>;

    /// All games in insertion order
    fn get_games(&self) -> Result<Vec<Game>>;

    /// Insert a game, or replace the one with the same id in place
    fn store_game(&self, game: Game) -> Result<()>;

    /// Insert a game at `index` (clamped to the end), or replace the one
    /// with the same id in place
    fn insert_game(&self, index: usize, game: Game) -> Result<()>;

    /// Remove a game, returning it
    fn remove_game(&self, game_id: GameId) -> Result<Option<Game>>;

    /// The current rating history
    fn get_history(&self) -> Result<RatingHistory>;

    /// Replace every player's rating and games played, and the whole history
    fn apply_recalculation(&self, recalculation: &Recalculation) -> Result<()>;
}

#[derive(Debug, Default)]
struct LeagueState {
    players: Vec<Player>,
    games: Vec<Game>,
    history: RatingHistory,
}

/// In-memory league storage implementation
#[derive(Debug, Default)]
pub struct InMemoryLeagueStore {
    state: RwLock<LeagueState>,
}

impl InMemoryLeagueStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding existing players and games, with no history yet
    pub fn with_data(players: Vec<Player>, games: Vec<Game>) -> Self {
        Self {
            state: RwLock::new(LeagueState {
                players,
                games,
                history: RatingHistory::new(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LeagueState>> {
        self.state.read().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire league read lock".to_string(),
            }
            .into()
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LeagueState>> {
        self.state.write().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire league write lock".to_string(),
            }
            .into()
        })
    }
}

impl LeagueStore for InMemoryLeagueStore {
    fn get_player(&self, player_id: &str) -> Result<Option<Player>> {
        let state = self.read()?;
        Ok(state.players.iter().find(|p| p.id == player_id).cloned())
    }

    fn get_players(&self) -> Result<Vec<Player>> {
        Ok(self.read()?.players.clone())
    }

    fn store_player(&self, player: Player) -> Result<()> {
        let mut state = self.write()?;
        match state.players.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => *existing = player,
            None => state.players.push(player),
        }
        Ok(())
    }

    fn insert_player(&self, index: usize, player: Player) -> Result<()> {
        let mut state = self.write()?;
        match state.players.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => *existing = player,
            None => {
                let index = index.min(state.players.len());
                state.players.insert(index, player);
            }
        }
        Ok(())
    }

    fn remove_player(&self, player_id: &str) -> Result<bool> {
        let mut state = self.write()?;
        let before = state.players.len();
        state.players.retain(|p| p.id != player_id);
        Ok(state.players.len() != before)
    }

    fn get_game(&self, game_id: GameId) -> Result<Option<Game>> {
        let state = self.read()?;
        Ok(state.games.iter().find(|g| g.id == game_id).cloned())
    }

    fn get_games(&self) -> Result<Vec<Game>> {
        Ok(self.read()?.games.clone())
    }

    fn store_game(&self, game: Game) -> Result<()> {
        let mut state = self.write()?;
        match state.games.iter_mut().find(|g| g.id == game.id) {
            Some(existing) => *existing = game,
            None => state.games.push(game),
        }
        Ok(())
    }

    fn insert_game(&self, index: usize, game: Game) -> Result<()> {
        let mut state = self.write()?;
        match state.games.iter_mut().find(|g| g.id == game.id) {
            Some(existing) => *existing = game,
            None => {
                let index = index.min(state.games.len());
                state.games.insert(index, game);
            }
        }
        Ok(())
    }

    fn remove_game(&self, game_id: GameId) -> Result<Option<Game>> {
        let mut state = self.write()?;
        let position = state.games.iter().position(|g| g.id == game_id);
        Ok(position.map(|index| state.games.remove(index)))
    }

    fn get_history(&self) -> Result<RatingHistory> {
        Ok(self.read()?.history.clone())
    }

    fn apply_recalculation(&self, recalculation: &Recalculation) -> Result<()> {
        let mut state = self.write()?;

        for player in state.players.iter_mut() {
            if let Some(updated) = recalculation.player(&player.id) {
                player.rating = updated.rating;
                player.games_played = updated.games_played;
            }
        }
        state.history = recalculation.history.clone();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recalc::RecalculationEngine;
    use crate::types::Side;
    use chrono::{TimeZone, Utc};

    fn create_test_player(id: &str, rating: f64) -> Player {
        Player::new(id, id.to_uppercase(), rating)
    }

    #[test]
    fn test_player_operations() {
        let store = InMemoryLeagueStore::new();

        assert!(store.get_player("alice").unwrap().is_none());

        store.store_player(create_test_player("alice", 1500.0)).unwrap();
        store.store_player(create_test_player("bob", 1400.0)).unwrap();

        let retrieved = store.get_player("alice").unwrap().unwrap();
        assert_eq!(retrieved.rating, 1500.0);

        // Replacing keeps registration order
        store.store_player(create_test_player("alice", 1600.0)).unwrap();
        assert_eq!(
            store
                .get_players()
                .unwrap()
                .into_iter()
                .map(|p| p.id)
                .collect::<Vec<_>>(),
            vec!["alice".to_string(), "bob".to_string()]
        );
        assert_eq!(store.get_player("alice").unwrap().unwrap().rating, 1600.0);

        assert!(store.remove_player("alice").unwrap());
        assert!(!store.remove_player("alice").unwrap());
        assert_eq!(store.get_players().unwrap().len(), 1);
    }

    #[test]
    fn test_game_operations() {
        let store = InMemoryLeagueStore::new();
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 21, 0, 0).unwrap();
        let game = Game::new(at, ["alice"], ["bob"], Side::TeamOne);
        let game_id = game.id;

        store.store_game(game.clone()).unwrap();
        assert_eq!(store.get_game(game_id).unwrap(), Some(game.clone()));

        let replaced = Game {
            winner: Side::TeamTwo,
            ..game
        };
        store.store_game(replaced).unwrap();
        assert_eq!(store.get_games().unwrap().len(), 1);
        assert_eq!(store.get_games().unwrap()[0].winner, Side::TeamTwo);

        let removed = store.remove_game(game_id).unwrap().unwrap();
        assert_eq!(removed.id, game_id);
        assert!(store.remove_game(game_id).unwrap().is_none());
    }

    #[test]
    fn test_insert_keeps_position() {
        let store = InMemoryLeagueStore::new();
        for id in ["alice", "bob", "carol"] {
            store.store_player(create_test_player(id, 1500.0)).unwrap();
        }

        store.remove_player("bob").unwrap();
        store.insert_player(1, create_test_player("bob", 1450.0)).unwrap();
        store.insert_player(99, create_test_player("dave", 1400.0)).unwrap();
        // Existing ids are replaced where they stand
        store.insert_player(0, create_test_player("carol", 1600.0)).unwrap();

        let players = store.get_players().unwrap();
        let ids: Vec<&str> = players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol", "dave"]);
        assert_eq!(players[2].rating, 1600.0);

        let at = Utc.with_ymd_and_hms(2024, 2, 1, 21, 0, 0).unwrap();
        let first = Game::new(at, ["alice"], ["bob"], Side::TeamOne);
        let second = Game::new(at, ["carol"], ["dave"], Side::TeamOne);
        store.store_game(first.clone()).unwrap();
        store.store_game(second.clone()).unwrap();

        let removed = store.remove_game(first.id).unwrap().unwrap();
        store.insert_game(0, removed).unwrap();
        let order: Vec<GameId> = store.get_games().unwrap().iter().map(|g| g.id).collect();
        assert_eq!(order, vec![first.id, second.id]);
    }

    #[test]
    fn test_apply_recalculation_replaces_derived_state() {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 21, 0, 0).unwrap();
        let players = vec![
            create_test_player("alice", 2100.0),
            create_test_player("bob", 2000.0),
        ];
        let games = vec![Game::new(at, ["alice"], ["bob"], Side::TeamOne)];
        let store = InMemoryLeagueStore::with_data(players.clone(), games.clone());

        let recalculation = RecalculationEngine::default()
            .recompute(&players, &games)
            .unwrap();
        store.apply_recalculation(&recalculation).unwrap();

        let alice = store.get_player("alice").unwrap().unwrap();
        assert_eq!(alice.rating, 2107.0);
        assert_eq!(alice.games_played, 1);
        assert_eq!(alice.initial_rating, 2100.0);
        assert_eq!(store.get_history().unwrap(), recalculation.history);
    }
}
