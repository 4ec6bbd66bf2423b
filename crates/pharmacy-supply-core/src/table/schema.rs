//! Column schema of the national inventory export.

use serde::{Deserialize, Serialize};

use super::{TableError, TableResult};

pub const COL_CPM_NATIONAL: &str = "CPM Nacional";
pub const COL_TOTAL_STOCK: &str = "Existencias totales";
pub const COL_NATIONAL_COVERAGE: &str = "Cobertura Nacional";
pub const COL_EXPIRING_90D: &str = "Total de existencias que vencen en los próximos 90 días";

/// Required columns, in the order missing ones are reported.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    COL_CPM_NATIONAL,
    COL_TOTAL_STOCK,
    COL_NATIONAL_COVERAGE,
    COL_EXPIRING_90D,
];

/// Positions of the required columns within a header row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplyColumns {
    pub cpm_national: usize,
    pub total_stock: usize,
    pub national_coverage: usize,
    pub expiring_90d: usize,
}

impl SupplyColumns {
    /// Map header names onto the required fields.
    ///
    /// Headers must already be trimmed. Every missing column is reported at
    /// once.
    pub fn resolve(headers: &[String]) -> TableResult<Self> {
        let positions = REQUIRED_COLUMNS.map(|name| headers.iter().position(|h| h == name));

        match positions {
            [Some(cpm_national), Some(total_stock), Some(national_coverage), Some(expiring_90d)] => {
                Ok(Self {
                    cpm_national,
                    total_stock,
                    national_coverage,
                    expiring_90d,
                })
            }
            _ => Err(TableError::MissingColumns(
                REQUIRED_COLUMNS
                    .iter()
                    .zip(positions.iter())
                    .filter(|(_, pos)| pos.is_none())
                    .map(|(name, _)| name.to_string())
                    .collect(),
            )),
        }
    }
}

/// Normalize a raw header cell: strip a byte-order mark and surrounding whitespace.
pub fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}
