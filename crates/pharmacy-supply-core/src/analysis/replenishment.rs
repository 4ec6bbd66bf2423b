//! Per-drug replenishment calculator.

use serde::{Deserialize, Serialize};

use crate::models::{ManualDrugEntry, ReorderAlert, ReplenishmentRow, UnitOfMeasure};

use super::classify::round2;

/// Safety stock as a share of monthly consumption.
pub const SAFETY_STOCK_RATIO: f64 = 0.20;
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Replenishment results for a set of manual entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReplenishmentPlan {
    pub rows: Vec<ReplenishmentRow>,
    pub alerts: Vec<ReorderAlert>,
}

impl ReplenishmentPlan {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Computes consumption, safety stock, reorder point and purchase quantity
/// for manually entered drugs.
#[derive(Debug, Clone, Default)]
pub struct ReplenishmentCalculator;

impl ReplenishmentCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute a plan for every entry. The entries themselves are not modified.
    pub fn calculate(&self, entries: &[ManualDrugEntry]) -> ReplenishmentPlan {
        let rows: Vec<ReplenishmentRow> = entries
            .iter()
            .map(|entry| rescale_to_purchase_unit(self.replenish(entry)))
            .collect();

        let alerts: Vec<ReorderAlert> = rows
            .iter()
            .filter_map(|row| {
                let reorder_point = row.reorder_point?;
                (row.current_stock < reorder_point).then(|| ReorderAlert {
                    name: row.entry.name.clone(),
                    current_stock: row.current_stock,
                    reorder_point,
                })
            })
            .collect();

        for alert in &alerts {
            tracing::warn!(
                drug = %alert.name,
                current_stock = alert.current_stock,
                reorder_point = alert.reorder_point,
                "stock below reorder point"
            );
        }
        tracing::info!(
            entries = rows.len(),
            alerts = alerts.len(),
            "replenishment plan computed"
        );

        ReplenishmentPlan { rows, alerts }
    }

    /// Figures for a single entry, in individual units.
    pub fn replenish(&self, entry: &ManualDrugEntry) -> ReplenishmentRow {
        let frequency_factor = entry.administration_frequency.factor();
        let monthly_consumption = f64::from(entry.estimated_patients_per_month)
            * entry.dose_per_administration
            * frequency_factor
            * DAYS_PER_MONTH;
        let daily_consumption = monthly_consumption / DAYS_PER_MONTH;
        let safety_stock = monthly_consumption * SAFETY_STOCK_RATIO;
        let current_stock = f64::from(entry.current_stock);

        let reorder_point = entry
            .lead_time_days
            .map(|days| daily_consumption * f64::from(days) + safety_stock);
        let recommended_purchase = (monthly_consumption - current_stock).max(0.0) + safety_stock;

        ReplenishmentRow {
            entry: entry.clone(),
            frequency_factor,
            monthly_consumption,
            safety_stock,
            reorder_point,
            recommended_purchase,
            current_stock,
        }
    }
}

/// Express a row in its purchase unit.
///
/// Box-of-100 rows have every absolute quantity divided by 100 and rounded
/// to two decimals. Individual-unit rows are returned unchanged.
pub fn rescale_to_purchase_unit(row: ReplenishmentRow) -> ReplenishmentRow {
    if row.entry.unit_of_measure != UnitOfMeasure::BoxOf100 {
        return row;
    }
    let per_package = row.entry.unit_of_measure.units_per_package();
    let scale = |value: f64| round2(value / per_package);

    ReplenishmentRow {
        monthly_consumption: scale(row.monthly_consumption),
        safety_stock: scale(row.safety_stock),
        reorder_point: row.reorder_point.map(scale),
        recommended_purchase: scale(row.recommended_purchase),
        current_stock: scale(row.current_stock),
        ..row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdministrationFrequency, NewDrugEntry, Presentation, TreatmentDuration};

    fn make_entry(unit: UnitOfMeasure, lead_time_days: Option<u32>) -> ManualDrugEntry {
        ManualDrugEntry::new(NewDrugEntry {
            name: "Paracetamol".into(),
            presentation: Presentation::Tablet,
            unit_of_measure: unit,
            administration_frequency: AdministrationFrequency::Daily,
            dose_per_administration: 2.0,
            treatment_duration: TreatmentDuration::Days(10),
            estimated_patients_per_month: 10,
            current_stock: 50,
            lead_time_days,
        })
        .unwrap()
    }

    #[test]
    fn test_reference_scenario() {
        let calc = ReplenishmentCalculator::new();
        let row = calc.replenish(&make_entry(UnitOfMeasure::Individual, None));

        assert_eq!(row.frequency_factor, 1.0);
        assert_eq!(row.monthly_consumption, 600.0);
        assert!((row.safety_stock - 120.0).abs() < 1e-9);
        assert!((row.recommended_purchase - 670.0).abs() < 1e-9);
        assert_eq!(row.reorder_point, None);
    }

    #[test]
    fn test_reorder_point_with_lead_time() {
        let calc = ReplenishmentCalculator::new();
        let row = calc.replenish(&make_entry(UnitOfMeasure::Individual, Some(15)));

        // daily 20 * 15 days + 120 safety
        let point = row.reorder_point.unwrap();
        assert!((point - 420.0).abs() < 1e-9);
        assert!(row.needs_reorder());
    }

    #[test]
    fn test_frequency_scales_consumption() {
        let mut entry = make_entry(UnitOfMeasure::Individual, None);
        entry.administration_frequency = AdministrationFrequency::Every8Hours;
        let row = ReplenishmentCalculator::new().replenish(&entry);
        assert_eq!(row.monthly_consumption, 1800.0);
    }

    #[test]
    fn test_box_of_100_rescale() {
        let plan = ReplenishmentCalculator::new()
            .calculate(&[make_entry(UnitOfMeasure::BoxOf100, Some(15))]);
        let row = &plan.rows[0];

        assert_eq!(row.monthly_consumption, 6.0);
        assert_eq!(row.safety_stock, 1.2);
        assert_eq!(row.recommended_purchase, 6.7);
        assert_eq!(row.reorder_point, Some(4.2));
        assert_eq!(row.current_stock, 0.5);
    }

    #[test]
    fn test_individual_rows_are_untouched_by_rescale() {
        let calc = ReplenishmentCalculator::new();
        let row = calc.replenish(&make_entry(UnitOfMeasure::Individual, Some(7)));
        assert_eq!(rescale_to_purchase_unit(row.clone()), row);
    }

    #[test]
    fn test_alerts_only_below_reorder_point() {
        let mut stocked = make_entry(UnitOfMeasure::Individual, Some(15));
        stocked.name = "Bien surtido".into();
        stocked.current_stock = 1000;
        let low = make_entry(UnitOfMeasure::Individual, Some(15));
        let untracked = make_entry(UnitOfMeasure::Individual, None);

        let plan = ReplenishmentCalculator::new().calculate(&[stocked, low, untracked]);

        assert_eq!(plan.rows.len(), 3);
        assert_eq!(plan.alerts.len(), 1);
        assert_eq!(plan.alerts[0].name, "Paracetamol");
        assert!((plan.alerts[0].reorder_point - 420.0).abs() < 1e-9);
        assert!(plan.alerts[0].to_string().contains("Paracetamol"));
    }

    #[test]
    fn test_calculate_leaves_entries_unchanged() {
        let entries = vec![make_entry(UnitOfMeasure::BoxOf100, None)];
        let before = entries.clone();
        let _ = ReplenishmentCalculator::new().calculate(&entries);
        assert_eq!(entries, before);
    }
}
