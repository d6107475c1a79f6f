//! Core error types

use thiserror::Error;

/// Errors raised by core primitives and render contexts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Missing file, unknown format, allocation failure
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Negative size, out-of-range value, bad rectangle
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Context or surface creation failed, font system unavailable
    #[error("Backend failure: {0}")]
    Backend(String),

    /// Unsupported format, decode error, timeout
    #[error("Plugin failure: {0}")]
    Plugin(String),

    /// Rendering outside a scope, double capture
    #[error("State violation: {0}")]
    StateViolation(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
