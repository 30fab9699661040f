//! Win-probability thresholds used when presenting a proposed match

use serde::{Deserialize, Serialize};

/// How lopsided a match looks from team one's win probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceVerdict {
    Success,
    Warning,
    Danger,
}

impl BalanceVerdict {
    /// Danger outside 40-60%, warning outside 45-55%, success otherwise
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.60 || probability < 0.40 {
            BalanceVerdict::Danger
        } else if probability > 0.55 || probability < 0.45 {
            BalanceVerdict::Warning
        } else {
            BalanceVerdict::Success
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            BalanceVerdict::Success => "success",
            BalanceVerdict::Warning => "warning",
            BalanceVerdict::Danger => "danger",
        }
    }
}

impl std::fmt::Display for BalanceVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.css_class())
    }
}
