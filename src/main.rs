//! Main entry point for the lanelo command line tool
//!
//! Loads configuration, initializes logging, and runs the rating engine or
//! the team balancer over a JSON league snapshot.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lanelo::balance::{Partition, TeamBalancer};
use lanelo::config::AppConfig;
use lanelo::rating::RatingModel;
use lanelo::recalc::RecalculationEngine;
use lanelo::types::{LeagueSnapshot, Player, PlayerId};
use lanelo::utils::as_percentage;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Lanelo - Team Elo Ratings and Team Balancing
#[derive(Parser)]
#[command(
    name = "lanelo",
    version,
    about = "Team Elo ratings and balanced team proposals for LAN party leagues",
    long_about = "Lanelo replays a league's ranked games to derive every player's rating \
                 and rating history, and proposes the fairest split of a player pool into \
                 two teams using the same team rating model."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        global = true,
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(
        short,
        long,
        global = true,
        help = "Enable debug mode with verbose logging"
    )]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without running a command")]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Replay every ranked game and print the derived ratings as JSON
    Recompute {
        /// League snapshot (JSON with `players` and `games`)
        snapshot: PathBuf,
    },
    /// Propose balanced teams from the snapshot's current ratings
    Balance {
        /// League snapshot (JSON with `players` and `games`)
        snapshot: PathBuf,

        /// Restrict the pool to these player ids
        #[arg(long, value_delimiter = ',', value_name = "ID,...")]
        players: Option<Vec<PlayerId>>,
    },
    /// Print team one's win probability for a rating delta
    Probability {
        /// Team one's aggregate rating minus team two's
        #[arg(allow_hyphen_values = true)]
        delta: f64,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    lanelo::config::validate_config(&config)?;
    Ok(config)
}

/// Display configuration summary
fn display_config(config: &AppConfig) {
    info!("Lanelo {}", lanelo::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   K-factor mode: {}", config.rating.k_mode);
    info!("   Initial rating: {}", config.rating.initial_rating);
    info!("   Balancer max players: {}", config.balancer.max_players);
}

fn read_snapshot(path: &Path) -> Result<LeagueSnapshot> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot: LeagueSnapshot = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid league snapshot {}", path.display()))?;

    info!(
        "Loaded {} players and {} games from {}",
        snapshot.players.len(),
        snapshot.games.len(),
        path.display()
    );
    Ok(snapshot)
}

fn run_recompute(config: &AppConfig, snapshot: &Path) -> Result<()> {
    let snapshot = read_snapshot(snapshot)?;
    let engine = RecalculationEngine::new(config.rating.clone())?;

    let recalculation = engine.recompute(&snapshot.players, &snapshot.games)?;
    println!("{}", serde_json::to_string_pretty(&recalculation)?);

    Ok(())
}

fn print_partition(title: &str, partition: &Partition) {
    let names = |team: &[Player]| -> String {
        team.iter()
            .map(|p| format!("{} ({:.0})", p.name, p.rating))
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("{}", title);
    println!(
        "  Team 1 [{:.1}]: {}",
        partition.team_one_rating,
        names(&partition.team_one)
    );
    println!(
        "  Team 2 [{:.1}]: {}",
        partition.team_two_rating,
        names(&partition.team_two)
    );
    println!(
        "  Gap: {:.1}, team 1 wins {} ({})",
        partition.rating_gap,
        as_percentage(partition.team_one_win_probability),
        partition.verdict()
    );
}

fn run_balance(config: &AppConfig, snapshot: &Path, players: Option<&[PlayerId]>) -> Result<()> {
    let snapshot = read_snapshot(snapshot)?;
    let engine = RecalculationEngine::new(config.rating.clone())?;
    let balancer = TeamBalancer::new(config.rating.clone(), config.balancer.clone())?;

    // Balance on derived ratings, not whatever the snapshot cached
    let current = engine.recompute(&snapshot.players, &snapshot.games)?.players;

    let pool = match players {
        Some(ids) => ids
            .iter()
            .map(|id| {
                current
                    .iter()
                    .find(|p| &p.id == id)
                    .cloned()
                    .ok_or_else(|| lanelo::RatingError::PlayerNotFound {
                        player_id: id.clone(),
                    })
            })
            .collect::<std::result::Result<Vec<Player>, _>>()?,
        None => current,
    };

    let result = balancer.balance(&pool)?;
    print_partition("Best teams", &result.best);
    if result.equal_size_is_distinct() {
        print_partition("Best equal-size teams", &result.equal_size);
    }

    Ok(())
}

fn run_probability(config: &AppConfig, delta: f64) -> Result<()> {
    let model = RatingModel::new(config.rating.clone())?;
    println!("{}", as_percentage(model.win_probability(delta)));
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_config(&config);
        info!("Dry run completed - exiting");
        return Ok(());
    }

    let outcome = match &args.command {
        Some(Command::Recompute { snapshot }) => run_recompute(&config, snapshot),
        Some(Command::Balance { snapshot, players }) => {
            run_balance(&config, snapshot, players.as_deref())
        }
        Some(Command::Probability { delta }) => run_probability(&config, *delta),
        None => Err(anyhow::anyhow!(
            "No command given, run with --help to list commands"
        )),
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
