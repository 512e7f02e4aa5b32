//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while driving the external media tool.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    #[error("{label} failed with exit code {exit_code:?}: {stderr}")]
    ToolFailed {
        label: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("path has no usable file name: {0}")]
    InvalidPath(PathBuf),

    #[error("unparsable tool output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a labeled tool failure carrying stderr verbatim.
    pub fn tool_failed(
        label: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ToolFailed {
            label: label.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Create an unparsable-output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }
}
