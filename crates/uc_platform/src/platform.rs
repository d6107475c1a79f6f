//! Platform trait

use std::time::Duration;

use uc_core::RenderContext;

use crate::error::Result;
use crate::event::NativeEvent;
use crate::window::{BackendWindow, WindowConfig};

/// A native window and the render context bound to its surface
pub struct WindowParts {
    pub backend: Box<dyn BackendWindow>,
    pub context: Box<dyn RenderContext + Send>,
}

impl std::fmt::Debug for WindowParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowParts")
            .field("native_handle", &self.backend.native_handle())
            .field("surface_size", &self.context.surface_size())
            .finish()
    }
}

/// Platform abstraction trait
///
/// Implemented by each windowing backend. All methods are called from the
/// UI thread.
pub trait Platform {
    /// Get the platform name, e.g. "x11" or "headless"
    fn name(&self) -> &'static str;

    /// Create a native window and its drawing surface
    ///
    /// On error nothing is registered with the platform.
    fn create_window(&mut self, config: &WindowConfig) -> Result<WindowParts>;

    /// Next native event
    ///
    /// `None` timeout blocks until an event arrives; a zero timeout polls.
    fn poll_event(&mut self, timeout: Option<Duration>) -> Option<NativeEvent>;

    fn clipboard_text(&mut self) -> Option<String>;

    fn set_clipboard_text(&mut self, text: &str) -> Result<()>;

    /// Release native resources of a window
    fn destroy_window(&mut self, native_handle: u64);

    /// Default display scale factor
    fn scale_factor(&self) -> f64 {
        1.0
    }
}
