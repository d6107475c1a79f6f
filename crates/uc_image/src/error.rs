//! Image error types

use thiserror::Error;

/// Errors that can occur while loading images
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    /// Failed to read an image file
    #[error("Failed to load image file: {0}")]
    FileLoad(String),

    /// Failed to decode image data
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Invalid base64 payload
    #[error("Invalid base64 data: {0}")]
    Base64(String),

    /// No plugin handles the format
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// A plugin reported a failure
    #[error("Image plugin '{plugin}' failed: {message}")]
    Plugin { plugin: String, message: String },
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        ImageError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for ImageError {
    fn from(err: base64::DecodeError) -> Self {
        ImageError::Base64(err.to_string())
    }
}

/// Result type for image operations
pub type Result<T> = std::result::Result<T, ImageError>;
