//! Manually entered drugs for replenishment planning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors raised when a manual entry is created.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntryError {
    #[error("Drug name must not be empty")]
    EmptyName,

    #[error("Dose per administration must be greater than zero, got {0}")]
    NonPositiveDose(f64),

    #[error("Estimated patients per month must be at least 1")]
    NoPatients,

    #[error("Treatment duration must be at least 1 day")]
    ZeroDuration,

    #[error("Lead time must be at least 1 day")]
    ZeroLeadTime,

    #[error("Unknown unit of measure: {0}")]
    UnknownUnit(String),

    #[error("Unknown presentation: {0}")]
    UnknownPresentation(String),
}

pub type EntryResult<T> = Result<T, EntryError>;

/// Commercial presentation of a drug.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Presentation {
    Tablet,
    Ampoule,
    Vial,
    Capsule,
    Syrup,
}

impl Presentation {
    pub fn label(&self) -> &'static str {
        match self {
            Presentation::Tablet => "Tableta",
            Presentation::Ampoule => "Ampolla",
            Presentation::Vial => "Frasco",
            Presentation::Capsule => "Cápsula",
            Presentation::Syrup => "Jarabe",
        }
    }
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Presentation {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tableta" | "tablet" => Ok(Presentation::Tablet),
            "ampolla" | "ampoule" => Ok(Presentation::Ampoule),
            "frasco" | "vial" | "bottle" => Ok(Presentation::Vial),
            "cápsula" | "capsula" | "capsule" => Ok(Presentation::Capsule),
            "jarabe" | "syrup" => Ok(Presentation::Syrup),
            _ => Err(EntryError::UnknownPresentation(s.to_string())),
        }
    }
}

/// Unit in which purchases are managed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UnitOfMeasure {
    /// Single units ("C/U")
    Individual,
    /// Boxes of 100 units ("CTO")
    BoxOf100,
}

impl UnitOfMeasure {
    pub fn label(&self) -> &'static str {
        match self {
            UnitOfMeasure::Individual => "C/U",
            UnitOfMeasure::BoxOf100 => "CTO",
        }
    }

    /// Number of individual units per purchase unit.
    pub fn units_per_package(&self) -> f64 {
        match self {
            UnitOfMeasure::Individual => 1.0,
            UnitOfMeasure::BoxOf100 => 100.0,
        }
    }
}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UnitOfMeasure {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c/u" | "cu" | "unit" | "individual" | "individual-unit" => Ok(UnitOfMeasure::Individual),
            "cto" | "box" | "box-of-100" => Ok(UnitOfMeasure::BoxOf100),
            _ => Err(EntryError::UnknownUnit(s.to_string())),
        }
    }
}

/// How often a dose is administered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AdministrationFrequency {
    Daily,
    Weekly,
    Monthly,
    Every4Hours,
    Every6Hours,
    Every8Hours,
    Every12Hours,
}

impl AdministrationFrequency {
    /// Parse a frequency label. Unrecognized labels fall back to daily.
    pub fn parse(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        match lower.as_str() {
            "diaria" | "diario" | "daily" => AdministrationFrequency::Daily,
            "semanal" | "weekly" => AdministrationFrequency::Weekly,
            "mensual" | "monthly" => AdministrationFrequency::Monthly,
            "cada 4 horas" | "every 4 hours" | "q4h" => AdministrationFrequency::Every4Hours,
            "cada 6 horas" | "every 6 hours" | "q6h" => AdministrationFrequency::Every6Hours,
            "cada 8 horas" | "every 8 hours" | "q8h" => AdministrationFrequency::Every8Hours,
            "cada 12 horas" | "every 12 hours" | "q12h" => AdministrationFrequency::Every12Hours,
            _ => {
                tracing::debug!(label = %label, "unrecognized administration frequency, using daily");
                AdministrationFrequency::Daily
            }
        }
    }

    /// Multiplier applied to the dose when computing monthly consumption.
    pub fn factor(&self) -> f64 {
        match self {
            AdministrationFrequency::Daily => 1.0,
            AdministrationFrequency::Weekly => 7.0,
            AdministrationFrequency::Monthly => 30.0,
            AdministrationFrequency::Every4Hours => 6.0,
            AdministrationFrequency::Every6Hours => 4.0,
            AdministrationFrequency::Every8Hours => 3.0,
            AdministrationFrequency::Every12Hours => 2.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdministrationFrequency::Daily => "Diaria",
            AdministrationFrequency::Weekly => "Semanal",
            AdministrationFrequency::Monthly => "Mensual",
            AdministrationFrequency::Every4Hours => "Cada 4 horas",
            AdministrationFrequency::Every6Hours => "Cada 6 horas",
            AdministrationFrequency::Every8Hours => "Cada 8 horas",
            AdministrationFrequency::Every12Hours => "Cada 12 horas",
        }
    }
}

impl fmt::Display for AdministrationFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Treatment duration as entered on the form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TreatmentDuration {
    Days(u32),
    Weeks(u32),
}

impl TreatmentDuration {
    pub fn to_days(&self) -> u32 {
        match self {
            TreatmentDuration::Days(d) => *d,
            TreatmentDuration::Weeks(w) => w.saturating_mul(7),
        }
    }
}

/// Form input for a new manual entry, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDrugEntry {
    pub name: String,
    pub presentation: Presentation,
    pub unit_of_measure: UnitOfMeasure,
    pub administration_frequency: AdministrationFrequency,
    pub dose_per_administration: f64,
    pub treatment_duration: TreatmentDuration,
    pub estimated_patients_per_month: u32,
    pub current_stock: u32,
    /// Supplier lead time; reorder points are only computed when present
    pub lead_time_days: Option<u32>,
}

/// A validated manual entry held by the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualDrugEntry {
    /// Local UUID
    pub entry_id: String,
    pub name: String,
    pub presentation: Presentation,
    pub unit_of_measure: UnitOfMeasure,
    pub administration_frequency: AdministrationFrequency,
    pub dose_per_administration: f64,
    pub treatment_duration_days: u32,
    pub estimated_patients_per_month: u32,
    pub current_stock: u32,
    pub lead_time_days: Option<u32>,
    /// Creation timestamp
    pub created_at: String,
}

impl ManualDrugEntry {
    /// Validate form input and create an entry.
    pub fn new(input: NewDrugEntry) -> EntryResult<Self> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(EntryError::EmptyName);
        }
        let dose = input.dose_per_administration;
        if !dose.is_finite() || dose <= 0.0 {
            return Err(EntryError::NonPositiveDose(dose));
        }
        if input.estimated_patients_per_month < 1 {
            return Err(EntryError::NoPatients);
        }
        let treatment_duration_days = input.treatment_duration.to_days();
        if treatment_duration_days < 1 {
            return Err(EntryError::ZeroDuration);
        }
        if input.lead_time_days == Some(0) {
            return Err(EntryError::ZeroLeadTime);
        }

        Ok(Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            presentation: input.presentation,
            unit_of_measure: input.unit_of_measure,
            administration_frequency: input.administration_frequency,
            dose_per_administration: dose,
            treatment_duration_days,
            estimated_patients_per_month: input.estimated_patients_per_month,
            current_stock: input.current_stock,
            lead_time_days: input.lead_time_days,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
