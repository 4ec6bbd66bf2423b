//! Inventory analysis engines.
//!
//! Two independent engines share the same row-transform, classify and
//! filter shape:
//!
//! - [`NationalSupplyAnalyzer`]: national consumption/stock table → purchase
//!   quantities, ABC class, criticality
//! - [`ReplenishmentCalculator`]: manual entries → safety stock, reorder
//!   point, recommended purchase

mod classify;
mod national;
mod replenishment;

pub use classify::*;
pub use national::*;
pub use replenishment::*;

use std::io::Read;

use thiserror::Error;

use crate::config::{AnalysisConfig, ConfigError};
use crate::table::{load_supply_table, TableError};

/// Analysis errors.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Load a CSV export and run the national analysis on it.
///
/// The configuration is checked before any input is read, and a schema
/// error stops the run before any figure is computed.
pub fn analyze_csv<R: Read>(reader: R, config: AnalysisConfig) -> AnalysisResult<NationalReport> {
    let analyzer = NationalSupplyAnalyzer::new(config)?;
    let table = load_supply_table(reader)?;
    Ok(analyzer.analyze(&table))
}
