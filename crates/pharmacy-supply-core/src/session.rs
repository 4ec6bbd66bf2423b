//! Session-held list of manually entered drugs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::{ReplenishmentCalculator, ReplenishmentPlan};
use crate::models::{EntryError, ManualDrugEntry, NewDrugEntry};

/// Session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid entry: {0}")]
    Entry(#[from] EntryError),

    #[error("No entry named '{0}'")]
    NotFound(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Manual entries accumulated during one session.
///
/// Entries are validated on the way in; removal is by exact name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ManualEntryBook {
    entries: Vec<ManualDrugEntry>,
}

impl ManualEntryBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append an entry, returning the stored copy.
    pub fn add(&mut self, input: NewDrugEntry) -> SessionResult<&ManualDrugEntry> {
        let entry = ManualDrugEntry::new(input)?;
        tracing::debug!(name = %entry.name, entry_id = %entry.entry_id, "manual entry added");
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    /// Remove the first entry whose name matches exactly.
    pub fn remove(&mut self, name: &str) -> SessionResult<ManualDrugEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))?;
        let removed = self.entries.remove(index);
        tracing::debug!(name = %removed.name, "manual entry removed");
        Ok(removed)
    }

    pub fn entries(&self) -> &[ManualDrugEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Compute replenishment for the current entries.
    pub fn plan(&self, calculator: &ReplenishmentCalculator) -> ReplenishmentPlan {
        calculator.calculate(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdministrationFrequency, Presentation, TreatmentDuration, UnitOfMeasure};

    fn make_input(name: &str) -> NewDrugEntry {
        NewDrugEntry {
            name: name.into(),
            presentation: Presentation::Ampoule,
            unit_of_measure: UnitOfMeasure::Individual,
            administration_frequency: AdministrationFrequency::Daily,
            dose_per_administration: 1.0,
            treatment_duration: TreatmentDuration::Days(5),
            estimated_patients_per_month: 4,
            current_stock: 10,
            lead_time_days: None,
        }
    }

    #[test]
    fn test_add_and_remove() {
        let mut book = ManualEntryBook::new();
        book.add(make_input("Ceftriaxona")).unwrap();
        book.add(make_input("Ketorolaco")).unwrap();
        assert_eq!(book.len(), 2);

        let removed = book.remove("Ceftriaxona").unwrap();
        assert_eq!(removed.name, "Ceftriaxona");
        assert_eq!(book.len(), 1);
        assert_eq!(book.entries()[0].name, "Ketorolaco");
    }

    #[test]
    fn test_invalid_entry_is_not_stored() {
        let mut book = ManualEntryBook::new();
        let mut input = make_input("Ceftriaxona");
        input.estimated_patients_per_month = 0;

        assert!(matches!(
            book.add(input),
            Err(SessionError::Entry(EntryError::NoPatients))
        ));
        assert!(book.is_empty());
    }

    #[test]
    fn test_remove_requires_exact_name() {
        let mut book = ManualEntryBook::new();
        book.add(make_input("Ceftriaxona")).unwrap();

        assert!(matches!(
            book.remove("ceftriaxona"),
            Err(SessionError::NotFound(_))
        ));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_duplicate_names_remove_first() {
        let mut book = ManualEntryBook::new();
        let first_id = book.add(make_input("Insulina")).unwrap().entry_id.clone();
        book.add(make_input("Insulina")).unwrap();

        let removed = book.remove("Insulina").unwrap();
        assert_eq!(removed.entry_id, first_id);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_plan_uses_current_entries() {
        let mut book = ManualEntryBook::new();
        book.add(make_input("Ceftriaxona")).unwrap();
        let plan = book.plan(&ReplenishmentCalculator::new());

        assert_eq!(plan.rows.len(), 1);
        // 4 patients * 1 dose * 1 * 30 days
        assert_eq!(plan.rows[0].monthly_consumption, 120.0);

        book.clear();
        assert!(book.plan(&ReplenishmentCalculator::new()).rows.is_empty());
    }
}
