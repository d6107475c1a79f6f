//! UI error types

use thiserror::Error;
use uc_core::CoreError;
use uc_platform::PlatformError;

use crate::element::ElementId;

/// Errors raised by the element tree and windows
#[derive(Error, Debug)]
pub enum UiError {
    /// Key does not name a live element
    #[error("Unknown element: {0:?}")]
    UnknownElement(ElementId),

    /// Children can only be added to containers
    #[error("Element {0:?} is not a container")]
    NotAContainer(ElementId),

    /// Reparenting would break the single-parent tree
    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<UiError> for CoreError {
    fn from(err: UiError) -> Self {
        match err {
            UiError::Core(err) => err,
            UiError::Platform(err) => err.into(),
            other => CoreError::InvalidArgument(other.to_string()),
        }
    }
}

/// Result type for UI operations
pub type Result<T> = std::result::Result<T, UiError>;
