//! Plugin error types

use std::time::Duration;

use thiserror::Error;
use uc_core::CoreError;

/// Errors raised by plugins and the registries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    /// No registered plugin handles this format
    #[error("Unsupported format: {0}")]
    Unsupported(String),

    /// Media could not be opened or decoded
    #[error("Failed to load media: {0}")]
    Load(String),

    /// Diagram source rejected by the plugin
    #[error("Invalid source at line {line}: {message}")]
    InvalidSource { line: usize, message: String },

    /// Rendering failed inside the plugin
    #[error("Render failed: {0}")]
    Render(String),

    /// Background render did not finish in time
    #[error("Plugin render timed out after {0:?}")]
    Timeout(Duration),

    /// Operation not valid in the player's current state
    #[error("Invalid playback operation: {0}")]
    InvalidOperation(String),
}

impl From<PluginError> for CoreError {
    fn from(err: PluginError) -> Self {
        CoreError::Plugin(err.to_string())
    }
}

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;
