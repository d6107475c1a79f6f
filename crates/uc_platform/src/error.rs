//! Platform error types

use thiserror::Error;
use uc_core::CoreError;

/// Platform-related errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Failed to initialize platform
    #[error("Platform initialization failed: {0}")]
    InitFailed(String),

    /// Failed to create window or its surface
    #[error("Failed to create window: {0}")]
    WindowCreation(String),

    /// Window configuration out of range
    #[error("Invalid window configuration: {0}")]
    InvalidConfig(String),

    /// No window with this native handle
    #[error("Unknown window handle: {0}")]
    UnknownWindow(u64),

    /// Clipboard unavailable or rejected the data
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Platform not supported on this OS
    #[error("Platform not supported: {0}")]
    Unsupported(String),

    /// Generic platform error
    #[error("Platform error: {0}")]
    Other(String),
}

impl From<PlatformError> for CoreError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::InvalidConfig(msg) => CoreError::InvalidArgument(msg),
            other => CoreError::Backend(other.to_string()),
        }
    }
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
