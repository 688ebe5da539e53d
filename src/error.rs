//! Error types surfaced to callers.
//!
//! Only validation failures are reported through [`AllocError`]. They are
//! raised before any allocation state is touched. Broken internal invariants
//! (seat underflow, duplicate courses, over-full students) are bugs and
//! panic instead.

use thiserror::Error;

/// Validation failures that abort a run before it starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocError {
    /// A configuration scalar is out of its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A lambda weight is outside `[0, 1]` or not finite.
    #[error("lambda for student '{student}' must be in [0, 1], got {value}")]
    LambdaOutOfRange {
        /// Student the weight belongs to (`"<default>"` for the fallback).
        student: String,
        /// The rejected value.
        value: f64,
    },

    /// The input tables produced no students or no courses.
    #[error("no {0} found in the preference tables")]
    EmptyUniverse(&'static str),

    /// An improvement mode name that is not one of `swap`, `add-drop`, `none`.
    #[error("unknown improve mode '{0}' (expected swap, add-drop or none)")]
    UnknownImproveMode(String),
}

/// Shorthand result type for fallible crate operations.
pub type AllocResult<T> = Result<T, AllocError>;
