//! UltraCanvas UI
//!
//! The element and window model on top of [`uc_core::RenderContext`]:
//!
//! - **Element tree**: slotmap arena of elements and containers with z-order,
//!   scrolling and hit testing
//! - **Windows**: lifecycle, focus, popups and per-window render contexts
//! - **Selective rendering**: dirty regions merged and repainted under clips
//! - **Context manager**: thread-local current context with scope guards
//! - **Mouse capture**: drag threshold, drop resolution and hover tracking
//! - **Dispatch**: capture, popups, focus and bubbling
//!
//! # Example
//!
//! ```rust
//! use uc_core::{Color, EventType, MouseButton, Rect2Di, UcEvent};
//! use uc_platform::{HeadlessPlatform, WindowConfig};
//! use uc_ui::{ElementOptions, Panel, UcWindow};
//!
//! let mut platform = HeadlessPlatform::default();
//! let mut window = UcWindow::create(&mut platform, WindowConfig::new("Demo").size(320, 240)).unwrap();
//! let root = window.root();
//! window
//!     .add_element(root, Panel::filled(Color::BLUE), Rect2Di::new(10, 10, 100, 40), ElementOptions::new("box"))
//!     .unwrap();
//!
//! window.show().unwrap();
//! assert!(window.render());
//! window.dispatch_event(&UcEvent::mouse(EventType::MouseMove, 20, 20, MouseButton::None));
//! ```

pub mod capture;
pub mod context_manager;
pub mod dirty;
pub mod dispatch;
pub mod draw;
pub mod element;
pub mod error;
pub mod panel;
pub mod popup;
pub mod selective;
pub mod timers;
pub mod tree;
pub mod window;

pub use capture::{capture_owner, CaptureState, MouseCapture, DEFAULT_DRAG_THRESHOLD};
pub use context_manager::{
    context_for_window, current_window, get_render_context, lock_context,
    register_window_context, registered_windows, share_context, unregister_window_context,
    with_active_context, with_render_context, HeldContext, RenderContextScope, RenderStateGuard, SharedContext,
    WindowRenderScope,
};
pub use dirty::{DirtyRegion, DirtyRegionList, MERGE_EFFICIENCY_THRESHOLD};
pub use dispatch::{
    ClickTracker, DEFAULT_DOUBLE_CLICK_DISTANCE, DEFAULT_DOUBLE_CLICK_INTERVAL, WHEEL_SCROLL_STEP,
};
pub use element::{
    ContainerData, Element, ElementCore, ElementId, ElementOptions, EventContext, MouseControl,
    UiRequest,
};
pub use error::{Result, UiError};
pub use panel::Panel;
pub use popup::PopupStack;
pub use selective::{RenderStats, SelectiveRenderer};
pub use timers::TimerSet;
pub use tree::ElementTree;
pub use window::{UcWindow, WindowEventHandler};
