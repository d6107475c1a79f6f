//! UltraCanvas Platform Abstraction Layer
//!
//! Platform-agnostic types for windowing and native input:
//!
//! - [`Platform`] - creates windows with their render contexts, pumps native
//!   events and owns the clipboard
//! - [`BackendWindow`] - native window operations
//! - [`WindowConfig`] - validated window creation parameters
//! - [`NativeEvent`] - raw events before translation
//!
//! [`HeadlessPlatform`] implements the contract in memory.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use uc_platform::{button, HeadlessPlatform, NativeEvent, Platform, WindowConfig};
//!
//! let mut platform = HeadlessPlatform::default();
//! let parts = platform.create_window(&WindowConfig::new("Demo").size(640, 480)).unwrap();
//! let handle = parts.backend.native_handle();
//!
//! platform.sender().send(NativeEvent::button_press(handle, button::LEFT, 10, 10));
//! assert!(platform.poll_event(Some(Duration::ZERO)).is_some());
//! ```

mod error;
mod event;
mod headless;
mod platform;
mod window;

pub use error::{PlatformError, Result};
pub use event::{button, mask, NativeEvent, NativeEventKind};
pub use headless::{
    HeadlessEventSender, HeadlessPlatform, HeadlessWindow, HeadlessWindowState, SurfaceKind,
};
pub use platform::{Platform, WindowParts};
pub use window::{
    BackendWindow, Cursor, WindowConfig, WindowState, WindowType, MAX_WINDOW_DIMENSION, UNSET,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{PlatformError, Result};
    pub use crate::event::{NativeEvent, NativeEventKind};
    pub use crate::platform::{Platform, WindowParts};
    pub use crate::window::{BackendWindow, Cursor, WindowConfig, WindowState, WindowType};
}
