//! National supply models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Consumption and stock figures for one drug from the national export.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DrugSupplyRecord {
    /// Average monthly national consumption (CPM)
    pub cpm_national: f64,
    /// Current national stock on hand
    pub total_stock: f64,
    /// Months of coverage implied by current stock
    pub national_coverage: f64,
    /// Quantity expected to expire within 90 days
    pub expiring_90d: f64,
}

impl DrugSupplyRecord {
    /// Create a record from the four required figures.
    pub fn new(cpm_national: f64, total_stock: f64, national_coverage: f64, expiring_90d: f64) -> Self {
        Self {
            cpm_national,
            total_stock,
            national_coverage,
            expiring_90d,
        }
    }
}

/// Supply criticality tier, from most to least urgent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Criticality {
    /// 75% or more of the desired quantity is missing
    High,
    /// Between 50% and 75% missing
    Medium,
    /// Between 25% and 50% missing
    Low,
    /// Less than 25% missing, or nothing desired at all
    NotCritical,
}

impl Criticality {
    /// Label used in exported tables.
    pub fn label(&self) -> &'static str {
        match self {
            Criticality::High => "Alta",
            Criticality::Medium => "Media",
            Criticality::Low => "Baja",
            Criticality::NotCritical => "No es crítico",
        }
    }

    /// Whether this tier counts as critical.
    pub fn is_critical(&self) -> bool {
        !matches!(self, Criticality::NotCritical)
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Criticality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alta" | "high" => Ok(Criticality::High),
            "media" | "medium" => Ok(Criticality::Medium),
            "baja" | "low" => Ok(Criticality::Low),
            "no es crítico" | "no es critico" | "not critical" => Ok(Criticality::NotCritical),
            other => Err(format!("unknown criticality label '{}'", other)),
        }
    }
}

/// Pareto consumption class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    pub fn label(&self) -> &'static str {
        match self {
            AbcClass::A => "A",
            AbcClass::B => "B",
            AbcClass::C => "C",
        }
    }
}

impl fmt::Display for AbcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AbcClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(AbcClass::A),
            "B" | "b" => Ok(AbcClass::B),
            "C" | "c" => Ok(AbcClass::C),
            other => Err(format!("unknown ABC class '{}'", other)),
        }
    }
}

/// Inventory turnover: annual consumption over current stock.
///
/// A drug with no stock on hand has no meaningful ratio; that case is kept
/// as [`Turnover::Undefined`] instead of being folded into a number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Turnover {
    Ratio(f64),
    Undefined,
}

impl Turnover {
    /// Compute turnover from annual consumption and stock on hand.
    pub fn from_parts(annual_consumption: f64, total_stock: f64) -> Self {
        if total_stock == 0.0 {
            return Turnover::Undefined;
        }
        let ratio = annual_consumption / total_stock;
        if ratio.is_finite() {
            Turnover::Ratio(ratio)
        } else {
            Turnover::Undefined
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Turnover::Ratio(r) => Some(*r),
            Turnover::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Turnover::Undefined)
    }

    /// Apply `f` to the ratio, leaving an undefined turnover as is.
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Turnover::Ratio(r) => Turnover::Ratio(f(r)),
            Turnover::Undefined => Turnover::Undefined,
        }
    }
}

impl fmt::Display for Turnover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Turnover::Ratio(r) => write!(f, "{}", r),
            Turnover::Undefined => f.write_str("inf"),
        }
    }
}

impl FromStr for Turnover {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "inf" | "+inf" | "infinity" => Ok(Turnover::Undefined),
            _ => trimmed
                .parse::<f64>()
                .map(Turnover::Ratio)
                .map_err(|_| format!("invalid turnover '{}'", trimmed)),
        }
    }
}

/// Derived figures for one drug after a national analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplyMetrics {
    /// CPM times the configured months of supply
    pub desired_quantity: f64,
    /// Desired quantity minus stock on hand (may be negative)
    pub required_quantity: f64,
    /// Required quantity net of near-expiry stock, floored at zero
    pub adjusted_required_quantity: f64,
    /// CPM times twelve
    pub annual_consumption: f64,
    pub turnover: Turnover,
    /// Running consumption total in ABC order (internal, never exported)
    pub cumulative_consumption: f64,
    pub abc_class: AbcClass,
    pub criticality: Criticality,
    /// Stock above the desired quantity
    pub excess_stock: f64,
    /// Excess as a percentage of the desired quantity; `None` when nothing is desired
    pub excess_pct: Option<f64>,
    /// More than half of the stock expires within 90 days
    pub expiry_risk: bool,
}
