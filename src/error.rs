//! Core error type.
//!
//! The core never retries and never logs a failure itself (spec §7): every
//! operation that detects a problem returns it to the caller. `verify()` is
//! the one exception — a failed verification is a `bool`, not an error, since
//! it is a user-visible but expected outcome rather than a defect.

use thiserror::Error;

/// Errors surfaced by the core.
#[derive(Debug, Error)]
pub enum PolError {
    /// Malformed hex, a non-decimal integer, or an empty required field.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// `build` was given a non-power-of-two leaf count, or `root` was
    /// requested of a top level holding more than one node.
    #[error("shape error: {0}")]
    ShapeError(String),

    /// A merge was attempted with a negative node value.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// `parse` ran out of lines before a level was complete.
    #[error("incomplete tree: expected {expected} nodes at level {level}, got {got}")]
    IncompleteTree {
        level: usize,
        expected: usize,
        got: usize,
    },
}

pub type Result<T> = std::result::Result<T, PolError>;
