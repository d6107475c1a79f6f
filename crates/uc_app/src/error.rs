//! Error types for uc_app

use thiserror::Error;
use uc_core::WindowId;
use uc_platform::PlatformError;
use uc_plugin::PluginError;
use uc_ui::UiError;

/// Errors that can occur in an UltraCanvas application
#[derive(Error, Debug)]
pub enum AppError {
    /// Window, element tree or render context failure
    #[error(transparent)]
    Ui(#[from] UiError),

    /// Backend failure (windowing, clipboard)
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Configuration file unreadable or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Id does not name an open window
    #[error("Unknown window: {0:?}")]
    UnknownWindow(WindowId),

    /// Background runtime could not start
    #[error("Task runtime error: {0}")]
    Runtime(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Other(format!("{err:#}"))
    }
}

/// Result type for uc_app operations
pub type Result<T> = std::result::Result<T, AppError>;
