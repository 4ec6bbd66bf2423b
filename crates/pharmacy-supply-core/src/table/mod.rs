//! Inventory table ingestion.
//!
//! Reads the national "existencia y cobertura" CSV export, checks it against
//! the required schema and maps each row onto a typed [`DrugSupplyRecord`].
//! Every original cell is kept verbatim so the analysis output can pass extra
//! columns through untouched. Only header names and required numeric cells
//! are trimmed.

mod schema;

pub use schema::*;

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DrugSupplyRecord;

/// Table ingestion errors.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("No inventory data provided; please upload a CSV file")]
    EmptyInput,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Line {line}: column '{column}' is not a number: '{value}'")]
    InvalidNumber {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Line {line}: national CPM must not be negative, got {value}")]
    NegativeConsumption { line: usize, value: f64 },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TableResult<T> = Result<T, TableError>;

/// One data row: the original cells plus the typed required figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplyRow {
    /// 1-based line number in the source file (header is line 1)
    pub line: usize,
    /// Original cell values, aligned with [`SupplyTable::headers`]
    pub cells: Vec<String>,
    pub record: DrugSupplyRecord,
}

impl SupplyRow {
    /// Original value of a column by header position.
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

/// A validated national inventory table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplyTable {
    /// Trimmed header names in input order
    pub headers: Vec<String>,
    pub columns: SupplyColumns,
    pub rows: Vec<SupplyRow>,
}

impl SupplyTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build a table directly from records, using the standard column layout.
    pub fn from_records(records: &[DrugSupplyRecord]) -> Self {
        let headers: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = records
            .iter()
            .enumerate()
            .map(|(i, record)| SupplyRow {
                line: i + 2,
                cells: vec![
                    record.cpm_national.to_string(),
                    record.total_stock.to_string(),
                    record.national_coverage.to_string(),
                    record.expiring_90d.to_string(),
                ],
                record: *record,
            })
            .collect();

        Self {
            headers,
            columns: SupplyColumns {
                cpm_national: 0,
                total_stock: 1,
                national_coverage: 2,
                expiring_90d: 3,
            },
            rows,
        }
    }
}

/// Load a national inventory table from a CSV reader.
pub fn load_supply_table<R: Read>(reader: R) -> TableResult<SupplyTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(clean_header).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(TableError::EmptyInput);
    }

    let columns = SupplyColumns::resolve(&headers)?;

    let mut rows = Vec::new();
    for (index, result) in csv_reader.records().enumerate() {
        let record = result?;
        let line = index + 2;

        let number = |col: usize| parse_number(&record, col, &headers[col], line);
        let supply = DrugSupplyRecord {
            cpm_national: number(columns.cpm_national)?,
            total_stock: number(columns.total_stock)?,
            national_coverage: number(columns.national_coverage)?,
            expiring_90d: number(columns.expiring_90d)?,
        };
        if supply.cpm_national < 0.0 {
            return Err(TableError::NegativeConsumption {
                line,
                value: supply.cpm_national,
            });
        }

        rows.push(SupplyRow {
            line,
            cells: record.iter().map(String::from).collect(),
            record: supply,
        });
    }

    tracing::debug!(rows = rows.len(), columns = headers.len(), "loaded supply table");

    Ok(SupplyTable {
        headers,
        columns,
        rows,
    })
}

/// Load a national inventory table from a CSV file path.
pub fn load_supply_table_file<P: AsRef<Path>>(path: P) -> TableResult<SupplyTable> {
    let file = std::fs::File::open(path)?;
    load_supply_table(file)
}

fn parse_number(record: &csv::StringRecord, col: usize, column: &str, line: usize) -> TableResult<f64> {
    let raw = record.get(col).unwrap_or("");
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TableError::InvalidNumber {
            line,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Clave,Descripción,CPM Nacional,Existencias totales,Cobertura Nacional,Total de existencias que vencen en los próximos 90 días
010.000.0101.00,Paracetamol 500mg,100,300,3,50
010.000.0104.00,Ibuprofeno 400mg,40,0,0,0
010.000.2304.00,\"Amoxicilina, suspensión\",12.5,80,6.4,10
";

    #[test]
    fn test_load_sample_csv() {
        let table = load_supply_table(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.headers.len(), 6);
        assert_eq!(table.columns.cpm_national, 2);

        let first = &table.rows[0];
        assert_eq!(first.line, 2);
        assert_eq!(first.cell(1), Some("Paracetamol 500mg"));
        assert_eq!(first.record, DrugSupplyRecord::new(100.0, 300.0, 3.0, 50.0));

        assert_eq!(table.rows[2].cell(1), Some("Amoxicilina, suspensión"));
        assert!((table.rows[2].record.cpm_national - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_headers_are_trimmed() {
        let csv_data = "\u{feff} CPM Nacional , Existencias totales,Cobertura Nacional ,Total de existencias que vencen en los próximos 90 días\n10,20,2,0\n";
        let table = load_supply_table(csv_data.as_bytes()).unwrap();
        assert_eq!(table.headers[0], "CPM Nacional");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let csv_data = "Clave,CPM Nacional,Existencias totales\nX,1,2\n";
        let err = load_supply_table(csv_data.as_bytes()).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, TableError::MissingColumns(ref cols) if cols.len() == 2));
        assert!(message.contains("Cobertura Nacional"));
        assert!(message.contains("Total de existencias que vencen en los próximos 90 días"));
    }

    #[test]
    fn test_non_numeric_cell_is_rejected() {
        let csv_data = "\
CPM Nacional,Existencias totales,Cobertura Nacional,Total de existencias que vencen en los próximos 90 días
10,20,2,0
10,n/a,2,0
";
        match load_supply_table(csv_data.as_bytes()).unwrap_err() {
            TableError::InvalidNumber { line, column, value } => {
                assert_eq!(line, 3);
                assert_eq!(column, "Existencias totales");
                assert_eq!(value, "n/a");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_cell_and_negative_cpm_are_rejected() {
        let csv_data = "\
CPM Nacional,Existencias totales,Cobertura Nacional,Total de existencias que vencen en los próximos 90 días
,20,2,0
";
        assert!(matches!(
            load_supply_table(csv_data.as_bytes()),
            Err(TableError::InvalidNumber { line: 2, .. })
        ));

        let csv_data = "\
CPM Nacional,Existencias totales,Cobertura Nacional,Total de existencias que vencen en los próximos 90 días
-5,20,2,0
";
        assert!(matches!(
            load_supply_table(csv_data.as_bytes()),
            Err(TableError::NegativeConsumption { line: 2, .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            load_supply_table("".as_bytes()),
            Err(TableError::EmptyInput)
        ));
    }

    #[test]
    fn test_header_only_gives_empty_table() {
        let csv_data = "CPM Nacional,Existencias totales,Cobertura Nacional,Total de existencias que vencen en los próximos 90 días\n";
        let table = load_supply_table(csv_data.as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_passthrough_cells_are_verbatim() {
        let csv_data = "\
Clave,Nota,CPM Nacional,Existencias totales,Cobertura Nacional,Total de existencias que vencen en los próximos 90 días
X,  padded  , 100 ,0,0,0
";
        let table = load_supply_table(csv_data.as_bytes()).unwrap();
        let row = &table.rows[0];
        assert_eq!(row.cell(1), Some("  padded  "));
        // Required cells keep their padding but still parse
        assert_eq!(row.cell(2), Some(" 100 "));
        assert_eq!(row.record.cpm_national, 100.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existencias.csv");
        std::fs::write(&path, SAMPLE_CSV).unwrap();

        let table = load_supply_table_file(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[1].cell(1), Some("Ibuprofeno 400mg"));

        assert!(matches!(
            load_supply_table_file(dir.path().join("missing.csv")),
            Err(TableError::Io(_))
        ));
    }
}
