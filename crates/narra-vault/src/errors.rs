//! Error types for vault reads.

/// Result alias for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Errors that can occur while reading the vault.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// I/O error during filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A document failed to parse.
    #[error("parse error in {path}: {message}")]
    Parse {
        /// Path to the problematic document.
        path: String,
        /// Description of the failure.
        message: String,
    },

    /// A required file is missing.
    #[error("required file not found: {0}")]
    MissingRequired(String),
}
