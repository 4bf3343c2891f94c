//! Error type for the tools.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Anything a tool command can fail with.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The engine rejected a config or recording.
    #[error(transparent)]
    Engine(#[from] rink_core::error::EngineError),

    /// JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input path does not exist.
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// One or more config files failed validation.
    #[error("{failed} of {checked} config files failed validation")]
    ValidationFailed {
        /// Files checked.
        checked: usize,
        /// Files rejected.
        failed: usize,
    },

    /// A recording replayed to a different final state than it recorded.
    #[error("Replay diverged from the recorded final state")]
    Diverged,
}
