//! Analysis configuration.
//!
//! Every field has a default, so a host can send a partial JSON document
//! (or none at all) and get the standard six-month analysis.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::SupplyMetrics;

pub const DEFAULT_MONTHS_OF_SUPPLY: u8 = 6;
pub const MIN_MONTHS_OF_SUPPLY: u8 = 1;
pub const MAX_MONTHS_OF_SUPPLY: u8 = 12;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Months of supply must be between 1 and 12, got {0}")]
    MonthsOutOfRange(u8),

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for one national supply analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Months of supply the desired quantity should cover (1-12)
    pub months_of_supply: u8,
    /// Subtract stock expiring within 90 days from the required quantity
    pub net_out_expiring: bool,
    /// Which conditions put a drug in the "needs action" subset
    pub action_filter: ActionFilter,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            months_of_supply: DEFAULT_MONTHS_OF_SUPPLY,
            net_out_expiring: true,
            action_filter: ActionFilter::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create a config for the given horizon with default settings otherwise.
    pub fn with_months(months_of_supply: u8) -> Self {
        Self {
            months_of_supply,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(MIN_MONTHS_OF_SUPPLY..=MAX_MONTHS_OF_SUPPLY).contains(&self.months_of_supply) {
            return Err(ConfigError::MonthsOutOfRange(self.months_of_supply));
        }
        Ok(())
    }
}

/// Predicate selecting the drugs that need purchasing or review.
///
/// A drug is selected when any enabled clause holds. With every clause
/// disabled nothing is selected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ActionFilter {
    /// Adjusted required quantity is above zero
    pub required: bool,
    /// Criticality is anything but "not critical"
    pub critical: bool,
    /// More than half the stock expires within 90 days
    pub expiry_risk: bool,
    /// Stock exceeds the desired quantity
    pub excess: bool,
}

impl Default for ActionFilter {
    fn default() -> Self {
        Self {
            required: true,
            critical: true,
            expiry_risk: false,
            excess: false,
        }
    }
}

impl ActionFilter {
    /// Enable every clause.
    pub fn all() -> Self {
        Self {
            required: true,
            critical: true,
            expiry_risk: true,
            excess: true,
        }
    }

    pub fn matches(&self, metrics: &SupplyMetrics) -> bool {
        (self.required && metrics.adjusted_required_quantity > 0.0)
            || (self.critical && metrics.criticality.is_critical())
            || (self.expiry_risk && metrics.expiry_risk)
            || (self.excess && metrics.excess_stock > 0.0)
    }
}
