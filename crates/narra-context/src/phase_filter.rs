//! Sheet phase filtering.
//!
//! Strips phase records and phase-named sections that lie past the scene's
//! current phase, so future-arc material never reaches a prompt. Sections
//! whose key is not a known phase name are free prose and pass through.

use narra_core::{InvalidPhaseError, PhaseOrder};
use narra_vault::Sheet;

/// Filters sheets against a configured phase order.
#[derive(Clone, Debug, Default)]
pub struct PhaseFilter {
    order: PhaseOrder,
}

impl PhaseFilter {
    /// Create a filter over a phase order.
    pub fn new(order: PhaseOrder) -> Self {
        Self { order }
    }

    /// The configured phase order.
    pub fn order(&self) -> &PhaseOrder {
        &self.order
    }

    /// Drop phase records and phase-keyed sections later than `current`.
    ///
    /// An unknown `current` is a caller bug and fails fast. A phase record
    /// whose name is unknown counts as not-yet-reached and is dropped.
    pub fn filter_sheet(&self, sheet: Sheet, current: &str) -> Result<Sheet, InvalidPhaseError> {
        if self.order.index_of(current).is_none() {
            return Err(InvalidPhaseError(current.to_owned()));
        }

        let phases = sheet
            .phases
            .into_iter()
            .filter(|p| self.order.allows(current, &p.name).unwrap_or(false))
            .collect();

        let sections = sheet
            .sections
            .into_iter()
            .filter(|(key, _)| {
                if self.order.index_of(key).is_some() {
                    self.order.allows(current, key).unwrap_or(false)
                } else {
                    true
                }
            })
            .collect();

        Ok(Sheet {
            name: sheet.name,
            phases,
            sections,
            body: sheet.body,
        })
    }
}
