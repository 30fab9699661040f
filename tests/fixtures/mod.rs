//! Test fixtures and factories for integration testing

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use lanelo::league::{InMemoryLeagueStore, LeagueManager};
use lanelo::types::{Game, Player, Side};
use std::sync::Arc;

/// Start of the fixture league's first evening
pub fn league_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 19, 0, 0).unwrap()
}

/// Timestamp `minutes` after the league start
pub fn at(minutes: i64) -> DateTime<Utc> {
    league_start() + Duration::minutes(minutes)
}

/// Player with a given initial rating, named after their id
pub fn create_player(id: &str, initial_rating: f64) -> Player {
    Player::new(id, format!("Player {}", id), initial_rating)
}

/// Players `p0..pN` with the given initial ratings
pub fn create_players(ratings: &[f64]) -> Vec<Player> {
    ratings
        .iter()
        .enumerate()
        .map(|(i, &rating)| create_player(&format!("p{}", i), rating))
        .collect()
}

/// Ranked game at `minutes` after the league start
pub fn create_game(minutes: i64, team_one: &[&str], team_two: &[&str], winner: Side) -> Game {
    Game::new(
        at(minutes),
        team_one.iter().copied(),
        team_two.iter().copied(),
        winner,
    )
}

/// Eight regulars for a 4v4 evening
pub fn lan_regulars() -> Vec<Player> {
    vec![
        create_player("ash", 1900.0),
        create_player("bee", 1700.0),
        create_player("cid", 1500.0),
        create_player("dot", 1300.0),
        create_player("eve", 1850.0),
        create_player("fox", 1650.0),
        create_player("gus", 1450.0),
        create_player("hal", 1250.0),
    ]
}

/// A short evening of mixed-size games among the regulars
pub fn lan_evening() -> Vec<Game> {
    vec![
        create_game(0, &["ash", "bee"], &["eve", "fox"], Side::TeamOne),
        create_game(
            30,
            &["ash", "bee", "cid", "dot"],
            &["eve", "fox", "gus", "hal"],
            Side::TeamTwo,
        ),
        create_game(30, &["cid"], &["gus"], Side::TeamOne).unranked(),
        create_game(55, &["ash"], &["dot", "hal"], Side::TeamTwo),
        create_game(80, &["bee", "gus", "hal"], &["ash", "cid"], Side::TeamOne),
        create_game(80, &["eve"], &["fox"], Side::TeamOne).on_map("de_dust2"),
        create_game(120, &["dot", "eve", "gus"], &["bee", "cid", "fox"], Side::TeamTwo),
    ]
}

/// Manager over an in-memory store with the regulars registered
pub fn create_league() -> LeagueManager {
    let manager = LeagueManager::new(Arc::new(InMemoryLeagueStore::new()));
    for player in lan_regulars() {
        manager
            .register_player(player.id, player.name, Some(player.initial_rating))
            .unwrap();
    }
    manager
}

/// Manager over a store that already holds players and games
pub fn adopt_league(players: Vec<Player>, games: Vec<Game>) -> LeagueManager {
    LeagueManager::new(Arc::new(InMemoryLeagueStore::with_data(players, games)))
}
