//! UltraCanvas Application Framework
//!
//! Ties the platform, windows and plugins together:
//!
//! - [`Application`] - owns the platform and windows and runs the main loop
//! - [`translate`] - native events to neutral [`UcEvent`](uc_core::UcEvent)s
//! - [`TaskQueue`] - background image loads and diagram renders
//! - [`AppConfig`] - TOML configuration with defaults
//! - [`init_logging`] - tracing subscriber filtered by `RUST_LOG`
//!
//! # Example
//!
//! ```rust
//! use uc_app::{AppConfig, Application};
//! use uc_core::{Color, Rect2Di};
//! use uc_platform::{button, NativeEvent, WindowConfig};
//! use uc_ui::{ElementOptions, Panel};
//!
//! let (mut app, events) = Application::headless(AppConfig::default()).unwrap();
//! let id = app.create_window(WindowConfig::new("Hello").size(320, 240)).unwrap();
//!
//! let window = app.window_mut(id).unwrap();
//! let root = window.root();
//! window
//!     .add_element(root, Panel::filled(Color::BLUE), Rect2Di::new(10, 10, 100, 40), ElementOptions::new("panel"))
//!     .unwrap();
//! window.show().unwrap();
//!
//! let handle = window.native_handle();
//! events.send(NativeEvent::button_press(handle, button::LEFT, 20, 20));
//! assert!(app.run_iteration());
//! assert_eq!(app.frame_count(), 1);
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod tasks;
pub mod translate;


pub use app::Application;
pub use config::{AppConfig, DoubleClickConfig};
pub use error::{AppError, Result};
pub use logging::init_logging;
pub use tasks::{Completion, DiagramRendered, ImageLoaded, TaskQueue};
pub use translate::{modifiers, mouse_button, translate};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::app::Application;
    pub use crate::config::AppConfig;
    pub use crate::error::{AppError, Result};
    pub use uc_core::{Color, EventType, Point2Di, Rect2Di, RenderContext, UcEvent, WindowId};
    pub use uc_platform::prelude::*;
    pub use uc_ui::{Element, ElementCore, ElementId, ElementOptions, EventContext, UcWindow};
}
