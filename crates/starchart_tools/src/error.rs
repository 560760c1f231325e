//! Tool errors.

use thiserror::Error;

use starchart_core::error::StarchartError;

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Anything a tool command can fail with.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The core rejected an operation.
    #[error(transparent)]
    Core(#[from] StarchartError),

    /// A dump file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A dump file is not valid JSON for a tick dump.
    #[error("Failed to parse tick dump '{path}': {source}")]
    Json {
        /// File that failed.
        path: String,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Output could not be rendered.
    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}
