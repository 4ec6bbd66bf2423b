//! Replenishment results for manual entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entry::ManualDrugEntry;

/// Replenishment figures for one manual entry.
///
/// Quantities are expressed in the entry's purchase unit: individual units,
/// or boxes of 100 once [`rescale_to_purchase_unit`] has been applied.
///
/// [`rescale_to_purchase_unit`]: crate::analysis::rescale_to_purchase_unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplenishmentRow {
    /// The entry these figures were computed from
    pub entry: ManualDrugEntry,
    /// Dose multiplier resolved from the administration frequency
    pub frequency_factor: f64,
    pub monthly_consumption: f64,
    /// 20% of monthly consumption
    pub safety_stock: f64,
    /// Only present when the entry tracks a lead time
    pub reorder_point: Option<f64>,
    pub recommended_purchase: f64,
    pub current_stock: f64,
}

impl ReplenishmentRow {
    /// Whether stock has fallen below the reorder point.
    pub fn needs_reorder(&self) -> bool {
        self.reorder_point
            .map(|point| self.current_stock < point)
            .unwrap_or(false)
    }
}

/// Warning raised for a drug whose stock is below its reorder point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReorderAlert {
    pub name: String,
    pub current_stock: f64,
    pub reorder_point: f64,
}

impl fmt::Display for ReorderAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is below its reorder point: stock {} < {}",
            self.name, self.current_stock, self.reorder_point
        )
    }
}
