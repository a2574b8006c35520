//! Typed errors for conditions a caller may want to match on.
//!
//! Everything else travels as [`anyhow::Error`] with context attached at the
//! I/O boundary. These variants are wrapped into `anyhow` as well and can be
//! recovered with `err.downcast_ref::<TriageError>()`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    /// A rating transition was requested while nothing is displayed.
    #[error("no active document to rate or skip")]
    NoActiveItem,

    /// The same id lives in more than one collection.
    #[error("document '{0}' appears in more than one collection")]
    DuplicateId(String),

    /// The snapshot parsed but violates the rating invariant.
    #[error("invalid snapshot {}: {reason}", path.display())]
    InvalidSnapshot { path: PathBuf, reason: String },

    /// The scorer returned a batch that does not line up with its input.
    #[error("scorer returned {got} documents for {expected} candidates")]
    ScoreMismatch { expected: usize, got: usize },

    /// The scorer returned candidates in a different order.
    #[error("scorer reordered candidates: expected '{expected}', got '{got}'")]
    ScoreOrder { expected: String, got: String },

    /// The scorer produced NaN or an infinity, which the snapshot cannot hold.
    #[error("scorer returned non-finite score {score} for '{id}'")]
    NonFiniteScore { id: String, score: f64 },

    #[error("scoring did not finish within {0:?}")]
    ScoringTimeout(Duration),
}
