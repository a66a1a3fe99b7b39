//! Context-construction errors.

use narra_core::InvalidPhaseError;
use narra_vault::VaultError;

/// Errors from context construction.
///
/// Almost every data problem (missing file, bad YAML) is downgraded to a
/// stage-prefixed warning by the component that hits it; what remains here
/// is the fail-fast phase error and the rare structural failures.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The scene's current phase is not in the configured order.
    #[error(transparent)]
    InvalidPhase(#[from] InvalidPhaseError),

    /// A vault read or parse failed in a way the collector could not absorb.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// A collector thread panicked during fan-out.
    #[error("{collector} collector panicked")]
    CollectorPanic {
        /// Which collector panicked.
        collector: &'static str,
    },
}

/// Convenience alias for context-construction results.
pub type Result<T> = std::result::Result<T, ContextError>;
