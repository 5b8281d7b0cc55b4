//! Typed error hierarchy for the review gate.
//!
//! Two top-level enums cover the two fallible surfaces:
//! - `GateError`: review session lifecycle failures surfaced to `open()` callers
//! - `StorageError`: key-value store failures

use thiserror::Error;

/// Errors from the review gate surfaced to callers of `open()`.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Review gate used before init()")]
    NotInitialized,

    #[error("Review {active} is still open; rejected request {rejected}")]
    SessionActive { active: String, rejected: String },

    #[error("Review {gavel_id} was abandoned before a decision was made")]
    Abandoned { gavel_id: String },
}

/// Errors from a key-value store backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key '{key}': {message}")]
    InvalidKey { key: String, message: String },

    #[error("Failed to read key '{key}': {source}")]
    ReadFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write key '{key}': {source}")]
    WriteFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
