//! Main application configuration
//!
//! This module defines the primary configuration structures for lanelo,
//! including environment variable loading, TOML file loading and validation.

use crate::config::balancer::BalancerConfig;
use crate::config::rating::{KFactorMode, RatingConfig};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub balancer: BalancerConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "lanelo".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing sections keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).map_err(|e| anyhow!("Invalid TOML configuration: {}", e))?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating settings
        if let Ok(factor) = env::var("RATING_MP_FACTOR") {
            self.rating.mp_factor = factor
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_MP_FACTOR value: {}", factor))?;
        }
        if let Ok(scale) = env::var("RATING_PROBABILITY_SCALE") {
            self.rating.probability_scale = scale
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_PROBABILITY_SCALE value: {}", scale))?;
        }
        if let Ok(mode) = env::var("RATING_K_MODE") {
            self.rating.k_mode = mode.parse::<KFactorMode>()?;
        }
        if let Ok(k) = env::var("RATING_FIXED_K") {
            self.rating.fixed_k = k
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_FIXED_K value: {}", k))?;
        }
        if let Ok(initial) = env::var("RATING_INITIAL") {
            self.rating.initial_rating = initial
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_INITIAL value: {}", initial))?;
        }

        // Balancer settings
        if let Ok(max_players) = env::var("BALANCER_MAX_PLAYERS") {
            self.balancer.max_players = max_players
                .parse()
                .map_err(|_| anyhow!("Invalid BALANCER_MAX_PLAYERS value: {}", max_players))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.rating.validate()?;
    config.balancer.validate()?;

    Ok(())
}
