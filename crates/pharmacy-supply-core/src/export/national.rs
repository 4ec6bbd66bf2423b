//! National analysis export.
//!
//! The exported table carries every input column unchanged, followed by the
//! derived columns. The cumulative consumption used for ABC ranking is
//! internal and never exported.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::{AnalyzedRow, NationalReport};
use crate::models::{AbcClass, Criticality, SupplyMetrics, Turnover};
use crate::table::clean_header;

use super::{into_string, ExportError, ExportResult};

pub const COL_DESIRED: &str = "Cantidad_Deseada";
pub const COL_REQUIRED: &str = "Cantidad_Necesaria";
pub const COL_ADJUSTED_REQUIRED: &str = "Cantidad_Necesaria_Ajustada";
pub const COL_ANNUAL_CONSUMPTION: &str = "Consumo_Anual";
pub const COL_TURNOVER: &str = "Rotacion_Inventario";
pub const COL_ABC: &str = "Clasificacion_ABC";
pub const COL_CRITICALITY: &str = "Critico_Abastecimiento";
pub const COL_EXCESS: &str = "Exceso_Existencias";
pub const COL_EXCESS_PCT: &str = "Porcentaje_Exceso";
pub const COL_EXPIRY_RISK: &str = "Riesgo_Vencimiento";

/// Derived columns appended after the input columns, in export order.
pub const DERIVED_COLUMNS: [&str; 10] = [
    COL_DESIRED,
    COL_REQUIRED,
    COL_ADJUSTED_REQUIRED,
    COL_ANNUAL_CONSUMPTION,
    COL_TURNOVER,
    COL_ABC,
    COL_CRITICALITY,
    COL_EXCESS,
    COL_EXCESS_PCT,
    COL_EXPIRY_RISK,
];

/// Download file name for an analysis over `months_of_supply` months.
pub fn export_file_name(months_of_supply: u8) -> String {
    format!("Analisis_Inventario_{}M.csv", months_of_supply)
}

impl NationalReport {
    /// CSV of the rows needing action.
    pub fn action_table_csv(&self) -> ExportResult<String> {
        let mut writer = csv::Writer::from_writer(vec![]);
        write_rows(&mut writer, &self.headers, &self.action_rows)?;
        into_string(writer)
    }

    /// CSV of every analyzed row.
    pub fn full_table_csv(&self) -> ExportResult<String> {
        let mut writer = csv::Writer::from_writer(vec![]);
        write_rows(&mut writer, &self.headers, &self.rows)?;
        into_string(writer)
    }

    pub fn export_file_name(&self) -> String {
        export_file_name(self.summary.months_of_supply)
    }

    /// Write the action table into `dir` under its download file name.
    pub fn write_action_table<P: AsRef<Path>>(&self, dir: P) -> ExportResult<PathBuf> {
        let path = dir.as_ref().join(self.export_file_name());
        let mut writer = csv::Writer::from_path(&path)?;
        write_rows(&mut writer, &self.headers, &self.action_rows)?;
        writer.flush()?;

        tracing::info!(
            rows = self.action_rows.len(),
            path = %path.display(),
            "exported inventory analysis"
        );
        Ok(path)
    }
}

fn write_rows<W: Write>(
    writer: &mut csv::Writer<W>,
    headers: &[String],
    rows: &[AnalyzedRow],
) -> ExportResult<()> {
    let header_row = headers
        .iter()
        .map(String::as_str)
        .chain(DERIVED_COLUMNS.iter().copied());
    writer.write_record(header_row)?;

    for row in rows {
        let derived = derived_cells(&row.metrics);
        let cells = row
            .source
            .cells
            .iter()
            .chain(derived.iter())
            .map(String::as_str);
        writer.write_record(cells)?;
    }
    Ok(())
}

fn derived_cells(m: &SupplyMetrics) -> [String; 10] {
    [
        m.desired_quantity.to_string(),
        m.required_quantity.to_string(),
        m.adjusted_required_quantity.to_string(),
        m.annual_consumption.to_string(),
        m.turnover.to_string(),
        m.abc_class.to_string(),
        m.criticality.to_string(),
        m.excess_stock.to_string(),
        m.excess_pct.map(|p| p.to_string()).unwrap_or_default(),
        m.expiry_risk.to_string(),
    ]
}

/// One row read back from an exported analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportedSupplyRow {
    /// Input columns, aligned with [`ExportedTable::headers`]
    pub cells: Vec<String>,
    pub desired_quantity: f64,
    pub required_quantity: f64,
    pub adjusted_required_quantity: f64,
    pub annual_consumption: f64,
    pub turnover: Turnover,
    pub abc_class: AbcClass,
    pub criticality: Criticality,
    pub excess_stock: f64,
    pub excess_pct: Option<f64>,
    pub expiry_risk: bool,
}

/// An exported analysis read back into typed rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportedTable {
    /// Input column names (derived columns excluded)
    pub headers: Vec<String>,
    pub rows: Vec<ExportedSupplyRow>,
}

/// Read an exported analysis table back.
pub fn read_exported_table<R: Read>(reader: R) -> ExportResult<ExportedTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let all_headers: Vec<String> = csv_reader.headers()?.iter().map(clean_header).collect();

    // Derived columns come last, so the last occurrence wins on a name clash
    let mut derived = [0usize; 10];
    for (slot, name) in derived.iter_mut().zip(DERIVED_COLUMNS.iter()) {
        *slot = all_headers
            .iter()
            .rposition(|h| h == name)
            .ok_or_else(|| ExportError::MissingColumn(name.to_string()))?;
    }
    let passthrough: Vec<usize> = (0..all_headers.len())
        .filter(|i| !derived.contains(i))
        .collect();

    let mut rows = Vec::new();
    for (index, result) in csv_reader.records().enumerate() {
        let record = result?;
        let line = index + 2;
        let cell = |slot: usize| Cell {
            line,
            column: DERIVED_COLUMNS[slot],
            value: record.get(derived[slot]).unwrap_or(""),
        };

        rows.push(ExportedSupplyRow {
            cells: passthrough
                .iter()
                .map(|&i| record.get(i).unwrap_or("").to_string())
                .collect(),
            desired_quantity: cell(0).parse()?,
            required_quantity: cell(1).parse()?,
            adjusted_required_quantity: cell(2).parse()?,
            annual_consumption: cell(3).parse()?,
            turnover: cell(4).parse()?,
            abc_class: cell(5).parse()?,
            criticality: cell(6).parse()?,
            excess_stock: cell(7).parse()?,
            excess_pct: cell(8).parse_optional()?,
            expiry_risk: cell(9).parse()?,
        });
    }

    Ok(ExportedTable {
        headers: passthrough.iter().map(|&i| all_headers[i].clone()).collect(),
        rows,
    })
}

struct Cell<'a> {
    line: usize,
    column: &'static str,
    value: &'a str,
}

impl Cell<'_> {
    fn parse<T: FromStr>(&self) -> ExportResult<T> {
        self.value.trim().parse().map_err(|_| self.invalid())
    }

    fn parse_optional<T: FromStr>(&self) -> ExportResult<Option<T>> {
        if self.value.trim().is_empty() {
            return Ok(None);
        }
        self.parse().map(Some)
    }

    fn invalid(&self) -> ExportError {
        ExportError::InvalidCell {
            line: self.line,
            column: self.column.to_string(),
            value: self.value.to_string(),
        }
    }
}
