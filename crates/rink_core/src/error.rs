//! Error types for the rule engine.

use thiserror::Error;

use crate::types::PlayerId;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error type for all rule engine errors.
///
/// None of these are raised by panicking: every public engine operation
/// returns them as values so a bad tick never takes the host down.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A player identifier the engine has never seen.
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// Configuration data failed validation.
    #[error("Invalid config field '{field}': {message}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Config file parsing error.
    #[error("Failed to parse config '{path}': {message}")]
    ConfigParse {
        /// Path (or `<inline>`) of the source that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Filesystem error while reading or writing a config or recording.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Feed recording could not be encoded, decoded or replayed.
    #[error("Recording error: {0}")]
    Recording(String),

    /// Internal state reached a combination that should be impossible.
    ///
    /// The tick that detected it is aborted.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The shared engine mutex was poisoned by a panicking holder.
    #[error("Engine lock poisoned")]
    LockPoisoned,
}
