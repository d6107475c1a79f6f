//! Paint error types

use thiserror::Error;
use uc_core::CoreError;

/// Errors raised by the raster backend
#[derive(Error, Debug)]
pub enum PaintError {
    #[error("Surface creation failed: {0}")]
    Surface(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl From<PaintError> for CoreError {
    fn from(err: PaintError) -> Self {
        CoreError::Backend(err.to_string())
    }
}

/// Result type for paint operations
pub type Result<T> = std::result::Result<T, PaintError>;
