//! Configuration management for lanelo
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for the rating engine.

pub mod app;
pub mod balancer;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use balancer::BalancerConfig;
pub use rating::{KFactorMode, RatingConfig};
