//! Replenishment plan export.

use serde::Serialize;

use crate::analysis::ReplenishmentPlan;
use crate::models::ReplenishmentRow;

use super::{into_string, ExportResult};

pub const REPLENISHMENT_FILE_NAME: &str = "Compra_Medicamentos.csv";

/// Column names used on the purchase form, in export order.
pub const REPLENISHMENT_COLUMNS: [&str; 12] = [
    "Medicamento",
    "Presentación",
    "Unidad de Medida",
    "Frecuencia Administración",
    "Dosis Por Administración",
    "Duración del Tratamiento",
    "Pacientes Estimados",
    "Stock Actual",
    "Consumo Total Mensual",
    "Stock de Seguridad",
    "Punto de Reorden",
    "Cantidad Recomendada a Comprar",
];

/// One export row. Field order follows [`REPLENISHMENT_COLUMNS`].
#[derive(Debug, Serialize)]
struct ReplenishmentRecord<'a> {
    name: &'a str,
    presentation: &'static str,
    unit_of_measure: &'static str,
    frequency: &'static str,
    dose: f64,
    treatment_duration_days: u32,
    patients: u32,
    current_stock: f64,
    monthly_consumption: f64,
    safety_stock: f64,
    reorder_point: Option<f64>,
    recommended_purchase: f64,
}

impl<'a> From<&'a ReplenishmentRow> for ReplenishmentRecord<'a> {
    fn from(row: &'a ReplenishmentRow) -> Self {
        Self {
            name: &row.entry.name,
            presentation: row.entry.presentation.label(),
            unit_of_measure: row.entry.unit_of_measure.label(),
            frequency: row.entry.administration_frequency.label(),
            dose: row.entry.dose_per_administration,
            treatment_duration_days: row.entry.treatment_duration_days,
            patients: row.entry.estimated_patients_per_month,
            current_stock: row.current_stock,
            monthly_consumption: row.monthly_consumption,
            safety_stock: row.safety_stock,
            reorder_point: row.reorder_point,
            recommended_purchase: row.recommended_purchase,
        }
    }
}

impl ReplenishmentPlan {
    /// Export to CSV format. The header row is written even for an empty plan.
    pub fn to_csv(&self) -> ExportResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        writer.write_record(REPLENISHMENT_COLUMNS)?;
        for row in &self.rows {
            writer.serialize(ReplenishmentRecord::from(row))?;
        }
        into_string(writer)
    }

    pub fn export_file_name(&self) -> &'static str {
        REPLENISHMENT_FILE_NAME
    }
}
