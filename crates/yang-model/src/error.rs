//! Errors raised while constructing model values from raw text.

use thiserror::Error;

/// Result alias for model value construction.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Failure to interpret a textual value as a model type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid revision '{0}': expected YYYY-MM-DD")]
    InvalidRevision(String),

    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("unsupported yang-version '{0}'")]
    InvalidVersion(String),

    #[error("invalid {expected} value '{value}'")]
    InvalidValue { expected: &'static str, value: String },
}
