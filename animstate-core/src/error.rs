//! Core error types.

use crate::param::ParamKind;
use thiserror::Error;

/// What kind of entry a lookup or insertion was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Parameter,
    State,
    Transition,
    Condition,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntryKind::Parameter => "parameter",
            EntryKind::State => "state",
            EntryKind::Transition => "transition",
            EntryKind::Condition => "condition",
        };
        f.write_str(s)
    }
}

/// Errors from the state machine core.
///
/// None of these are fatal: mutators that hit one become no-ops and
/// evaluation that hits one treats the condition as not satisfied.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{kind} already exists: {name}")]
    DuplicateKey { kind: EntryKind, name: String },

    #[error("{kind} not found: {name}")]
    NotFound { kind: EntryKind, name: String },

    #[error("kind mismatch on '{name}': expected {expected}, actual {actual}")]
    KindMismatch {
        name: String,
        expected: ParamKind,
        actual: ParamKind,
    },

    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("invalid condition: {reason}")]
    InvalidCondition { reason: String },

    #[error("invalid machine definition: {reason}")]
    InvalidDefinition { reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CoreError {
    pub(crate) fn not_found(kind: EntryKind, name: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn duplicate(kind: EntryKind, name: impl Into<String>) -> Self {
        CoreError::DuplicateKey {
            kind,
            name: name.into(),
        }
    }

    /// Returns a stable error code suitable for tooling output.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::DuplicateKey { .. } => "DUPLICATE_KEY",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::KindMismatch { .. } => "KIND_MISMATCH",
            CoreError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            CoreError::InvalidCondition { .. } => "INVALID_CONDITION",
            CoreError::InvalidDefinition { .. } => "INVALID_DEFINITION",
            CoreError::Json(_) => "BAD_REQUEST",
            CoreError::Yaml(_) => "BAD_REQUEST",
        }
    }

    /// Returns true if this error came from misuse of a name (lookup or insert).
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            CoreError::DuplicateKey { .. } | CoreError::NotFound { .. }
        )
    }
}
