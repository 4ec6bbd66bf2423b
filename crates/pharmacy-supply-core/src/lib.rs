//! Pharmacy Supply Core Library
//!
//! Procurement signals from pharmacy inventory data.
//!
//! # Architecture
//!
//! ```text
//!   National CSV export               Manual entry form
//!          │                                  │
//!   [table: schema check]            [session: validate]
//!          │                                  │
//!   NationalSupplyAnalyzer          ReplenishmentCalculator
//!   desired / required / ABC        safety stock / reorder
//!   criticality / excess            point / purchase qty
//!          │                                  │
//!   action filter                    box-of-100 rescale
//!          │                                  │
//!          └──────────────┬───────────────────┘
//!                         ▼
//!                    CSV export
//! ```
//!
//! # Modules
//!
//! - [`table`]: CSV ingestion and schema validation
//! - [`models`]: Domain types (DrugSupplyRecord, ManualDrugEntry, etc.)
//! - [`analysis`]: National analyzer and replenishment calculator
//! - [`session`]: Manual entry list held for one session
//! - [`export`]: CSV export and re-import
//! - [`config`]: Analysis settings

pub mod analysis;
pub mod config;
pub mod export;
pub mod models;
pub mod session;
pub mod table;

// Re-export commonly used types
pub use analysis::{
    analyze_csv, AnalyzedRow, NationalReport, NationalSupplyAnalyzer, ReplenishmentCalculator,
    ReplenishmentPlan,
};
pub use config::{ActionFilter, AnalysisConfig};
pub use models::{
    AbcClass, AdministrationFrequency, Criticality, DrugSupplyRecord, ManualDrugEntry,
    NewDrugEntry, Presentation, ReorderAlert, ReplenishmentRow, SupplyMetrics, TreatmentDuration,
    Turnover, UnitOfMeasure,
};
pub use session::ManualEntryBook;
pub use table::{load_supply_table, SupplyTable};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum PharmacySupplyError {
    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Session error: {0}")]
    SessionError(String),
}

impl From<table::TableError> for PharmacySupplyError {
    fn from(e: table::TableError) -> Self {
        match e {
            table::TableError::MissingColumns(cols) => {
                PharmacySupplyError::MissingColumns(cols.join(", "))
            }
            table::TableError::EmptyInput => PharmacySupplyError::EmptyInput(e.to_string()),
            other => PharmacySupplyError::InvalidInput(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for PharmacySupplyError {
    fn from(e: config::ConfigError) -> Self {
        PharmacySupplyError::InvalidInput(e.to_string())
    }
}

impl From<analysis::AnalysisError> for PharmacySupplyError {
    fn from(e: analysis::AnalysisError) -> Self {
        match e {
            analysis::AnalysisError::Table(e) => e.into(),
            analysis::AnalysisError::Config(e) => e.into(),
        }
    }
}

impl From<models::EntryError> for PharmacySupplyError {
    fn from(e: models::EntryError) -> Self {
        PharmacySupplyError::InvalidInput(e.to_string())
    }
}

impl From<session::SessionError> for PharmacySupplyError {
    fn from(e: session::SessionError) -> Self {
        match e {
            session::SessionError::Entry(e) => e.into(),
            session::SessionError::NotFound(name) => PharmacySupplyError::NotFound(name),
        }
    }
}

impl From<export::ExportError> for PharmacySupplyError {
    fn from(e: export::ExportError) -> Self {
        PharmacySupplyError::ExportError(e.to_string())
    }
}

impl From<serde_json::Error> for PharmacySupplyError {
    fn from(e: serde_json::Error) -> Self {
        PharmacySupplyError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PharmacySupplyError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PharmacySupplyError::SessionError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install a log subscriber. Later calls are ignored.
///
/// `filter` uses `EnvFilter` syntax; without one, `RUST_LOG` is consulted and
/// then `pharmacy_supply_core=info`.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) {
    let env_filter = filter
        .and_then(|f| tracing_subscriber::EnvFilter::try_new(f).ok())
        .or_else(|| tracing_subscriber::EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new("pharmacy_supply_core=info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Start a new session with an empty manual entry list.
#[uniffi::export]
pub fn new_session() -> Arc<PharmacySupplyCore> {
    Arc::new(PharmacySupplyCore {
        entries: Arc::new(Mutex::new(ManualEntryBook::new())),
    })
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe session wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PharmacySupplyCore {
    entries: Arc<Mutex<ManualEntryBook>>,
}

#[uniffi::export]
impl PharmacySupplyCore {
    // =========================================================================
    // National Analysis
    // =========================================================================

    /// Analyze an uploaded inventory CSV.
    pub fn analyze_inventory(
        &self,
        csv_text: String,
        config: FfiAnalysisConfig,
    ) -> Result<FfiNationalReport, PharmacySupplyError> {
        if csv_text.trim().is_empty() {
            return Err(table::TableError::EmptyInput.into());
        }
        let report = analyze_csv(csv_text.as_bytes(), config.into())?;
        FfiNationalReport::from_report(&report)
    }

    /// Analyze with a JSON configuration document.
    pub fn analyze_inventory_with_json_config(
        &self,
        csv_text: String,
        config_json: String,
    ) -> Result<FfiNationalReport, PharmacySupplyError> {
        let config = AnalysisConfig::from_json(&config_json)?;
        self.analyze_inventory(csv_text, config.into())
    }

    // =========================================================================
    // Manual Entries
    // =========================================================================

    /// Validate and add a manual entry.
    pub fn add_manual_entry(
        &self,
        entry: FfiNewDrugEntry,
    ) -> Result<FfiManualEntry, PharmacySupplyError> {
        let input = NewDrugEntry::try_from(entry)?;
        let mut book = self.entries.lock()?;
        let stored = book.add(input)?;
        Ok(stored.clone().into())
    }

    /// Remove the first entry with this exact name.
    pub fn remove_manual_entry(&self, name: String) -> Result<FfiManualEntry, PharmacySupplyError> {
        let mut book = self.entries.lock()?;
        let removed = book.remove(&name)?;
        Ok(removed.into())
    }

    /// List the entries in insertion order.
    pub fn list_manual_entries(&self) -> Result<Vec<FfiManualEntry>, PharmacySupplyError> {
        let book = self.entries.lock()?;
        Ok(book.entries().iter().cloned().map(|e| e.into()).collect())
    }

    /// Drop every manual entry.
    pub fn clear_manual_entries(&self) -> Result<(), PharmacySupplyError> {
        let mut book = self.entries.lock()?;
        book.clear();
        Ok(())
    }

    // =========================================================================
    // Replenishment
    // =========================================================================

    /// Compute the replenishment plan for the current entries.
    pub fn compute_replenishment(&self) -> Result<FfiReplenishmentReport, PharmacySupplyError> {
        let book = self.entries.lock()?;
        let plan = book.plan(&ReplenishmentCalculator::new());
        FfiReplenishmentReport::from_plan(&plan)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe analysis configuration.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAnalysisConfig {
    pub months_of_supply: u8,
    pub net_out_expiring: bool,
    pub include_required: bool,
    pub include_critical: bool,
    pub include_expiry_risk: bool,
    pub include_excess: bool,
}

impl From<FfiAnalysisConfig> for AnalysisConfig {
    fn from(config: FfiAnalysisConfig) -> Self {
        AnalysisConfig {
            months_of_supply: config.months_of_supply,
            net_out_expiring: config.net_out_expiring,
            action_filter: ActionFilter {
                required: config.include_required,
                critical: config.include_critical,
                expiry_risk: config.include_expiry_risk,
                excess: config.include_excess,
            },
        }
    }
}

impl From<AnalysisConfig> for FfiAnalysisConfig {
    fn from(config: AnalysisConfig) -> Self {
        Self {
            months_of_supply: config.months_of_supply,
            net_out_expiring: config.net_out_expiring,
            include_required: config.action_filter.required,
            include_critical: config.action_filter.critical,
            include_expiry_risk: config.action_filter.expiry_risk,
            include_excess: config.action_filter.excess,
        }
    }
}

/// FFI-safe analyzed row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSupplyRow {
    pub line: u32,
    pub cells: Vec<String>,
    pub desired_quantity: f64,
    pub required_quantity: f64,
    pub adjusted_required_quantity: f64,
    pub annual_consumption: f64,
    /// `None` when there is no stock to turn over
    pub turnover: Option<f64>,
    pub abc_class: String,
    pub criticality: String,
    pub excess_stock: f64,
    pub excess_pct: Option<f64>,
    pub expiry_risk: bool,
}

impl From<&AnalyzedRow> for FfiSupplyRow {
    fn from(row: &AnalyzedRow) -> Self {
        let m = &row.metrics;
        Self {
            line: row.source.line as u32,
            cells: row.source.cells.clone(),
            desired_quantity: m.desired_quantity,
            required_quantity: m.required_quantity,
            adjusted_required_quantity: m.adjusted_required_quantity,
            annual_consumption: m.annual_consumption,
            turnover: m.turnover.value(),
            abc_class: m.abc_class.to_string(),
            criticality: m.criticality.to_string(),
            excess_stock: m.excess_stock,
            excess_pct: m.excess_pct,
            expiry_risk: m.expiry_risk,
        }
    }
}

/// FFI-safe analysis summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSupplySummary {
    pub months_of_supply: u8,
    pub total_rows: u32,
    pub action_rows: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub not_critical: u32,
    pub class_a: u32,
    pub class_b: u32,
    pub class_c: u32,
    pub expiry_risk_rows: u32,
    pub undefined_turnover_rows: u32,
    pub generated_at: String,
}

impl From<&analysis::SupplySummary> for FfiSupplySummary {
    fn from(s: &analysis::SupplySummary) -> Self {
        Self {
            months_of_supply: s.months_of_supply,
            total_rows: s.total_rows as u32,
            action_rows: s.action_rows as u32,
            high: s.high as u32,
            medium: s.medium as u32,
            low: s.low as u32,
            not_critical: s.not_critical as u32,
            class_a: s.class_a as u32,
            class_b: s.class_b as u32,
            class_c: s.class_c as u32,
            expiry_risk_rows: s.expiry_risk_rows as u32,
            undefined_turnover_rows: s.undefined_turnover_rows as u32,
            generated_at: s.generated_at.clone(),
        }
    }
}

/// FFI-safe national analysis result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNationalReport {
    pub headers: Vec<String>,
    pub rows: Vec<FfiSupplyRow>,
    pub action_rows: Vec<FfiSupplyRow>,
    pub summary: FfiSupplySummary,
    pub export_file_name: String,
    pub export_csv: String,
}

impl FfiNationalReport {
    fn from_report(report: &NationalReport) -> Result<Self, PharmacySupplyError> {
        Ok(Self {
            headers: report.headers.clone(),
            rows: report.rows.iter().map(FfiSupplyRow::from).collect(),
            action_rows: report.action_rows.iter().map(FfiSupplyRow::from).collect(),
            summary: (&report.summary).into(),
            export_file_name: report.export_file_name(),
            export_csv: report.action_table_csv()?,
        })
    }
}

/// FFI-safe manual entry form input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewDrugEntry {
    pub name: String,
    pub presentation: String,
    pub unit_of_measure: String,
    pub administration_frequency: String,
    pub dose_per_administration: f64,
    pub treatment_duration: u32,
    /// Duration is given in weeks rather than days
    pub duration_in_weeks: bool,
    pub estimated_patients_per_month: u32,
    pub current_stock: u32,
    pub lead_time_days: Option<u32>,
}

impl TryFrom<FfiNewDrugEntry> for NewDrugEntry {
    type Error = models::EntryError;

    fn try_from(entry: FfiNewDrugEntry) -> Result<Self, Self::Error> {
        let treatment_duration = if entry.duration_in_weeks {
            TreatmentDuration::Weeks(entry.treatment_duration)
        } else {
            TreatmentDuration::Days(entry.treatment_duration)
        };
        Ok(NewDrugEntry {
            name: entry.name,
            presentation: entry.presentation.parse()?,
            unit_of_measure: entry.unit_of_measure.parse()?,
            administration_frequency: AdministrationFrequency::parse(
                &entry.administration_frequency,
            ),
            dose_per_administration: entry.dose_per_administration,
            treatment_duration,
            estimated_patients_per_month: entry.estimated_patients_per_month,
            current_stock: entry.current_stock,
            lead_time_days: entry.lead_time_days,
        })
    }
}

/// FFI-safe stored manual entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiManualEntry {
    pub entry_id: String,
    pub name: String,
    pub presentation: String,
    pub unit_of_measure: String,
    pub administration_frequency: String,
    pub dose_per_administration: f64,
    pub treatment_duration_days: u32,
    pub estimated_patients_per_month: u32,
    pub current_stock: u32,
    pub lead_time_days: Option<u32>,
    pub created_at: String,
}

impl From<ManualDrugEntry> for FfiManualEntry {
    fn from(entry: ManualDrugEntry) -> Self {
        Self {
            entry_id: entry.entry_id,
            name: entry.name,
            presentation: entry.presentation.to_string(),
            unit_of_measure: entry.unit_of_measure.to_string(),
            administration_frequency: entry.administration_frequency.to_string(),
            dose_per_administration: entry.dose_per_administration,
            treatment_duration_days: entry.treatment_duration_days,
            estimated_patients_per_month: entry.estimated_patients_per_month,
            current_stock: entry.current_stock,
            lead_time_days: entry.lead_time_days,
            created_at: entry.created_at,
        }
    }
}

/// FFI-safe replenishment row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReplenishmentRow {
    pub name: String,
    pub unit_of_measure: String,
    pub frequency_factor: f64,
    pub monthly_consumption: f64,
    pub safety_stock: f64,
    pub reorder_point: Option<f64>,
    pub recommended_purchase: f64,
    pub current_stock: f64,
}

impl From<&ReplenishmentRow> for FfiReplenishmentRow {
    fn from(row: &ReplenishmentRow) -> Self {
        Self {
            name: row.entry.name.clone(),
            unit_of_measure: row.entry.unit_of_measure.to_string(),
            frequency_factor: row.frequency_factor,
            monthly_consumption: row.monthly_consumption,
            safety_stock: row.safety_stock,
            reorder_point: row.reorder_point,
            recommended_purchase: row.recommended_purchase,
            current_stock: row.current_stock,
        }
    }
}

/// FFI-safe reorder alert.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReorderAlert {
    pub name: String,
    pub current_stock: f64,
    pub reorder_point: f64,
    pub message: String,
}

impl From<&ReorderAlert> for FfiReorderAlert {
    fn from(alert: &ReorderAlert) -> Self {
        Self {
            name: alert.name.clone(),
            current_stock: alert.current_stock,
            reorder_point: alert.reorder_point,
            message: alert.to_string(),
        }
    }
}

/// FFI-safe replenishment result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReplenishmentReport {
    pub rows: Vec<FfiReplenishmentRow>,
    pub alerts: Vec<FfiReorderAlert>,
    pub export_file_name: String,
    pub export_csv: String,
}

impl FfiReplenishmentReport {
    fn from_plan(plan: &ReplenishmentPlan) -> Result<Self, PharmacySupplyError> {
        Ok(Self {
            rows: plan.rows.iter().map(FfiReplenishmentRow::from).collect(),
            alerts: plan.alerts.iter().map(FfiReorderAlert::from).collect(),
            export_file_name: plan.export_file_name().to_string(),
            export_csv: plan.to_csv()?,
        })
    }
}
