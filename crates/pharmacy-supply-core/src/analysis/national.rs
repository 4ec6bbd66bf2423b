//! National supply analyzer.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::models::{AbcClass, Criticality, DrugSupplyRecord, SupplyMetrics, Turnover};
use crate::table::{SupplyRow, SupplyTable};

use super::classify::{classify_criticality, rank_abc, round2};
use super::AnalysisResult;

/// Share of stock that may expire within 90 days before a drug is flagged.
pub const EXPIRY_RISK_SHARE: f64 = 0.5;

const MONTHS_PER_YEAR: f64 = 12.0;

/// A source row together with its derived figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedRow {
    pub source: SupplyRow,
    pub metrics: SupplyMetrics,
}

/// Counts shown alongside an analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SupplySummary {
    pub months_of_supply: u8,
    pub total_rows: usize,
    pub action_rows: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub not_critical: usize,
    pub class_a: usize,
    pub class_b: usize,
    pub class_c: usize,
    pub expiry_risk_rows: usize,
    pub undefined_turnover_rows: usize,
    /// Generation timestamp (RFC 3339)
    pub generated_at: String,
}

/// Result of one national analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NationalReport {
    /// Original header names, in input order
    pub headers: Vec<String>,
    /// Every row, in ABC order (highest consumption first)
    pub rows: Vec<AnalyzedRow>,
    /// Rows selected by the configured action filter, same order
    pub action_rows: Vec<AnalyzedRow>,
    pub summary: SupplySummary,
}

impl NationalReport {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Derives procurement signals from a national inventory table.
#[derive(Debug, Clone)]
pub struct NationalSupplyAnalyzer {
    config: AnalysisConfig,
}

impl NationalSupplyAnalyzer {
    /// Create an analyzer, rejecting an invalid configuration.
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the full analysis over a table.
    pub fn analyze(&self, table: &SupplyTable) -> NationalReport {
        let months = f64::from(self.config.months_of_supply);
        tracing::info!(
            rows = table.len(),
            months_of_supply = self.config.months_of_supply,
            net_out_expiring = self.config.net_out_expiring,
            "starting national supply analysis"
        );

        let figures: Vec<RowFigures> = table
            .rows
            .iter()
            .map(|row| RowFigures::compute(&row.record, months, self.config.net_out_expiring))
            .collect();

        // ABC depends on the whole table, so it runs after every row is computed
        let annual: Vec<f64> = figures.iter().map(|f| f.annual_consumption).collect();
        let ranking = rank_abc(&annual);

        let mut rows = Vec::with_capacity(table.len());
        for &idx in &ranking.order {
            let source = &table.rows[idx];
            let metrics = figures[idx].finish(ranking.cumulative[idx], ranking.classes[idx]);
            if metrics.turnover.is_undefined() {
                tracing::warn!(line = source.line, "turnover undefined: no stock on hand");
            }
            rows.push(AnalyzedRow {
                source: source.clone(),
                metrics,
            });
        }

        let filter = self.config.action_filter;
        let action_rows: Vec<AnalyzedRow> = rows
            .iter()
            .filter(|row| filter.matches(&row.metrics))
            .cloned()
            .collect();

        let summary = self.summarize(&rows, action_rows.len());
        tracing::info!(
            total = summary.total_rows,
            needs_action = summary.action_rows,
            high = summary.high,
            "national supply analysis complete"
        );

        NationalReport {
            headers: table.headers.clone(),
            rows,
            action_rows,
            summary,
        }
    }

    fn summarize(&self, rows: &[AnalyzedRow], action_rows: usize) -> SupplySummary {
        let mut summary = SupplySummary {
            months_of_supply: self.config.months_of_supply,
            total_rows: rows.len(),
            action_rows,
            generated_at: chrono::Utc::now().to_rfc3339(),
            ..SupplySummary::default()
        };

        for row in rows {
            let m = &row.metrics;
            match m.criticality {
                Criticality::High => summary.high += 1,
                Criticality::Medium => summary.medium += 1,
                Criticality::Low => summary.low += 1,
                Criticality::NotCritical => summary.not_critical += 1,
            }
            match m.abc_class {
                AbcClass::A => summary.class_a += 1,
                AbcClass::B => summary.class_b += 1,
                AbcClass::C => summary.class_c += 1,
            }
            if m.expiry_risk {
                summary.expiry_risk_rows += 1;
            }
            if m.turnover.is_undefined() {
                summary.undefined_turnover_rows += 1;
            }
        }

        summary
    }
}

/// Per-row figures, unrounded, before the table-wide ABC pass.
#[derive(Debug, Clone, Copy)]
struct RowFigures {
    desired: f64,
    required: f64,
    adjusted_required: f64,
    annual_consumption: f64,
    turnover: Turnover,
    criticality: Criticality,
    excess: f64,
    excess_pct: Option<f64>,
    expiry_risk: bool,
}

impl RowFigures {
    fn compute(record: &DrugSupplyRecord, months: f64, net_out_expiring: bool) -> Self {
        let desired = record.cpm_national * months;
        let required = desired - record.total_stock;
        let netted = if net_out_expiring {
            required - record.expiring_90d
        } else {
            required
        };
        let adjusted_required = netted.max(0.0);

        let annual_consumption = record.cpm_national * MONTHS_PER_YEAR;
        let turnover = Turnover::from_parts(annual_consumption, record.total_stock);

        let criticality = classify_criticality(adjusted_required, desired);

        let excess = (record.total_stock - desired).max(0.0);
        let excess_pct = if desired == 0.0 {
            None
        } else {
            Some(excess / desired * 100.0)
        };

        let expiry_risk = record.expiring_90d > record.total_stock * EXPIRY_RISK_SHARE;

        Self {
            desired,
            required,
            adjusted_required,
            annual_consumption,
            turnover,
            criticality,
            excess,
            excess_pct,
            expiry_risk,
        }
    }

    /// Attach ABC results and round quantities for output.
    fn finish(&self, cumulative: f64, abc_class: AbcClass) -> SupplyMetrics {
        SupplyMetrics {
            desired_quantity: round2(self.desired),
            required_quantity: round2(self.required),
            adjusted_required_quantity: round2(self.adjusted_required),
            annual_consumption: round2(self.annual_consumption),
            turnover: self.turnover.map(round2),
            cumulative_consumption: cumulative,
            abc_class,
            criticality: self.criticality,
            excess_stock: round2(self.excess),
            excess_pct: self.excess_pct.map(round2),
            expiry_risk: self.expiry_risk,
        }
    }
}
