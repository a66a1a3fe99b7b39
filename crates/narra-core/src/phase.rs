//! Narrative phase ordering.
//!
//! Phases form an ordered list of named stages; content scoped to a phase
//! later than the scene's current phase must never reach a prompt. An unknown
//! *current* phase is a caller bug and fails fast; an unknown *candidate*
//! phase on a record is treated as not-yet-reached and filtered out.

use serde::{Deserialize, Serialize};

/// Default phase order for vaults that do not configure their own.
pub const DEFAULT_PHASES: &[&str] = &["initial", "development", "climax", "resolution"];

/// The requested phase is not in the configured phase order.
///
/// This signals a caller bug rather than a data problem, so it propagates
/// instead of becoming a build warning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown narrative phase: {0}")]
pub struct InvalidPhaseError(pub String);

/// An ordered list of narrative phase names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOrder {
    names: Vec<String>,
}

impl Default for PhaseOrder {
    fn default() -> Self {
        Self {
            names: DEFAULT_PHASES.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl PhaseOrder {
    /// Create a phase order from an explicit list of names.
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Index of a phase name, if known.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Whether `candidate` is visible at `current`.
    ///
    /// True iff `candidate` appears in the ordered prefix up to and including
    /// `current`. Unknown `current` is an [`InvalidPhaseError`]; an unknown
    /// `candidate` is simply not visible.
    pub fn allows(&self, current: &str, candidate: &str) -> Result<bool, InvalidPhaseError> {
        let current_idx = self
            .index_of(current)
            .ok_or_else(|| InvalidPhaseError(current.to_owned()))?;
        Ok(self
            .index_of(candidate)
            .is_some_and(|idx| idx <= current_idx))
    }

    /// The ordered phase names.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
