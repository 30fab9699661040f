//! Team balancing
//!
//! This module finds the split of a player pool into two teams with the
//! smallest aggregate rating gap, optionally restricted to equal team sizes.

pub mod balancer;
pub mod combinations;
pub mod verdict;

// Re-export commonly used types
pub use balancer::{BalanceResult, Partition, TeamBalancer};
pub use verdict::BalanceVerdict;
