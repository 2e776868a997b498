//! Value error model.

use thiserror::Error;

/// Result type used when unwrapping erased values.
pub type ValueResult<T> = Result<T, ValueError>;

/// Failure raised when an erased [`Value`](crate::Value) is read as the wrong type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The stored value is not of the requested type (or the slot is empty).
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl ValueError {
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }

    /// Short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ValueError::TypeMismatch { .. } => "value_type_mismatch",
        }
    }
}
