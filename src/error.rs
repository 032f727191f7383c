//! Error types for the preference engine.
//!
//! The taxonomy is deliberately small. Contract violations (training an
//! uninitialized model) surface to the caller; expected edge conditions
//! (corrupted persisted state, an exhausted candidate pool) are signaled
//! through `Err`/`None` return values and recovered locally, never panics.

use thiserror::Error;

/// Top-level error type for preference-engine operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TasteError {
    /// `update` was called before `initialize` bound a tag dictionary.
    ///
    /// Only the mutating path raises this; `score` on an uninitialized
    /// model degrades to returning 0 instead.
    #[error("preference model is not initialized")]
    ModelNotInitialized,

    /// A persisted state snapshot does not fit the model it was handed to.
    ///
    /// Import rejects the snapshot and leaves the current model untouched.
    #[error("incompatible preference state: {0}")]
    IncompatibleState(String),
}
