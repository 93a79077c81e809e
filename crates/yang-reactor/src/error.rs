//! Reactor error taxonomy
//!
//! Every failure raised while processing statements is a [`ReactorError`].
//! Apart from the per-phase aggregate, each variant is tied to the
//! [`StatementSourceReference`] of the statement that caused it, so tooling
//! can point at the offending line.
//!
//! # Categories
//!
//! - Source errors: malformed arguments, unknown statements, illegal copies
//! - Inference errors: forward references that never resolved
//! - Namespace availability: a statement support touched a namespace before
//!   the phase it becomes available in (a support bug, not a model error)
//! - Substatement validation: invalid, missing or too many substatements
//!
//! [`ReactorError::kind`] maps each variant onto an [`ErrorKind`] with a
//! stable display name, in the same spirit as a compiler diagnostic code.

use std::fmt;

use thiserror::Error;
use yang_model::{StatementDefinition, StatementSourceReference};

use crate::phase::ModelProcessingPhase;

/// Result alias used across the reactor.
pub type Result<T> = std::result::Result<T, ReactorError>;

/// Failure while building an effective model.
#[derive(Debug, Clone, Error)]
pub enum ReactorError {
    /// Malformed or illegal statement in a source.
    #[error("{reference}: {message}")]
    Source {
        reference: StatementSourceReference,
        message: String,
    },

    /// Forward reference that could not be resolved.
    #[error("{reference}: {message}")]
    Inference {
        reference: StatementSourceReference,
        message: String,
    },

    /// A namespace was used before the phase it becomes available in.
    #[error("{reference}: namespace {namespace} is not available in phase {phase}")]
    NamespaceNotAvailable {
        namespace: &'static str,
        phase: ModelProcessingPhase,
        reference: StatementSourceReference,
    },

    #[error("{reference}: {substatement} is not a valid substatement of {parent}")]
    InvalidSubstatement {
        parent: String,
        substatement: String,
        reference: StatementSourceReference,
    },

    #[error("{reference}: missing {substatement} substatement in {parent}")]
    MissingSubstatement {
        parent: StatementDefinition,
        substatement: StatementDefinition,
        reference: StatementSourceReference,
    },

    #[error("{reference}: maximal count of {substatement} for {parent} is {max}, detected {count}")]
    CardinalityExceeded {
        parent: StatementDefinition,
        substatement: StatementDefinition,
        max: usize,
        count: usize,
        reference: StatementSourceReference,
    },

    /// Every failure collected when a phase could not complete.
    #[error("phase {phase} failed with {} error(s): {}", .errors.len(), render_causes(.errors))]
    PhaseFailed {
        phase: ModelProcessingPhase,
        errors: Vec<ReactorError>,
    },

    /// Reactor invariant violated; indicates a bug rather than a model error.
    #[error("{reference}: internal reactor error: {message}")]
    Internal {
        reference: StatementSourceReference,
        message: String,
    },
}

fn render_causes(errors: &[ReactorError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Category of a [`ReactorError`].
///
/// # Invariant
///
/// The discriminant values must match the ERROR_KIND_NAMES array indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    Source = 0,
    Inference = 1,
    NamespaceNotAvailable = 2,
    InvalidSubstatement = 3,
    MissingSubstatement = 4,
    CardinalityExceeded = 5,
    PhaseFailed = 6,
    Internal = 7,
}

/// Human-readable names for error kinds.
///
/// Index matches ErrorKind discriminant.
const ERROR_KIND_NAMES: &[&str] = &[
    "source error",            // 0: Source
    "inference error",         // 1: Inference
    "namespace not available", // 2: NamespaceNotAvailable
    "invalid substatement",    // 3: InvalidSubstatement
    "missing substatement",    // 4: MissingSubstatement
    "cardinality exceeded",    // 5: CardinalityExceeded
    "phase failed",            // 6: PhaseFailed
    "internal reactor error",  // 7: Internal
];

impl ErrorKind {
    pub fn name(self) -> &'static str {
        ERROR_KIND_NAMES[self as usize]
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ReactorError {
    /// Creates a source error at `reference`.
    pub fn source(reference: &StatementSourceReference, message: impl Into<String>) -> Self {
        Self::Source {
            reference: reference.clone(),
            message: message.into(),
        }
    }

    /// Creates an inference error at `reference`.
    pub fn inference(reference: &StatementSourceReference, message: impl Into<String>) -> Self {
        Self::Inference {
            reference: reference.clone(),
            message: message.into(),
        }
    }

    pub fn internal(reference: &StatementSourceReference, message: impl Into<String>) -> Self {
        Self::Internal {
            reference: reference.clone(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Source { .. } => ErrorKind::Source,
            Self::Inference { .. } => ErrorKind::Inference,
            Self::NamespaceNotAvailable { .. } => ErrorKind::NamespaceNotAvailable,
            Self::InvalidSubstatement { .. } => ErrorKind::InvalidSubstatement,
            Self::MissingSubstatement { .. } => ErrorKind::MissingSubstatement,
            Self::CardinalityExceeded { .. } => ErrorKind::CardinalityExceeded,
            Self::PhaseFailed { .. } => ErrorKind::PhaseFailed,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Source location of the failure.
    ///
    /// For [`ReactorError::PhaseFailed`] this is the location of the first
    /// collected cause, if any.
    pub fn reference(&self) -> Option<&StatementSourceReference> {
        match self {
            Self::Source { reference, .. }
            | Self::Inference { reference, .. }
            | Self::NamespaceNotAvailable { reference, .. }
            | Self::InvalidSubstatement { reference, .. }
            | Self::MissingSubstatement { reference, .. }
            | Self::CardinalityExceeded { reference, .. }
            | Self::Internal { reference, .. } => Some(reference),
            Self::PhaseFailed { errors, .. } => errors.first().and_then(Self::reference),
        }
    }

    /// Individual failures: the collected causes of a phase failure, or
    /// the error itself.
    pub fn causes(&self) -> Vec<&ReactorError> {
        match self {
            Self::PhaseFailed { errors, .. } => errors.iter().flat_map(Self::causes).collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: u32) -> StatementSourceReference {
        StatementSourceReference::new("a.yang", line, 3)
    }

    #[test]
    fn test_error_kind_names_cover_all_kinds() {
        assert_eq!(ErrorKind::Internal as usize + 1, ERROR_KIND_NAMES.len());
        assert_eq!(ErrorKind::Inference.name(), "inference error");
    }

    #[test]
    fn test_display_carries_reference() {
        let err = ReactorError::inference(&at(7), "Grouping 'g' was not resolved.");
        assert_eq!(err.to_string(), "a.yang:7:3: Grouping 'g' was not resolved.");
    }

    #[test]
    fn test_phase_failed_flattens_causes() {
        let err = ReactorError::PhaseFailed {
            phase: ModelProcessingPhase::EffectiveModel,
            errors: vec![
                ReactorError::inference(&at(1), "first"),
                ReactorError::source(&at(2), "second"),
            ],
        };
        assert_eq!(err.kind(), ErrorKind::PhaseFailed);
        assert_eq!(err.reference(), Some(&at(1)));
        let kinds: Vec<_> = err.causes().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![ErrorKind::Inference, ErrorKind::Source]);
        assert!(err.to_string().contains("2 error(s)"));
    }
}
