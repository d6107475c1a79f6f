//! Headless platform
//!
//! An in-memory implementation of [`Platform`]. Native events are injected
//! through a [`HeadlessEventSender`], which may be cloned into other threads.
//! Window operations update an inspectable [`HeadlessWindowState`]. Surfaces
//! are recording contexts or software raster contexts.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, trace, warn};
use uc_core::{RecordingContext, Rect2Di, RenderContext};
use uc_image::ImageCache;
use uc_paint::RasterContext;

use crate::error::{PlatformError, Result};
use crate::event::{NativeEvent, NativeEventKind};
use crate::platform::{Platform, WindowParts};
use crate::window::{BackendWindow, Cursor, WindowConfig, WindowState, UNSET};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Surface type created for headless windows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Commands are recorded, nothing is rasterized
    #[default]
    Recording,
    /// Pixels are rasterized in memory
    Raster,
}

/// Observable state of a headless window
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadlessWindowState {
    pub title: String,
    pub position: (i32, i32),
    pub size: (i32, i32),
    pub visible: bool,
    pub state: WindowState,
    pub resizable: bool,
    pub pointer_grabbed: bool,
    pub cursor: Cursor,
    pub swap_count: u32,
    pub invalidations: Vec<Option<Rect2Di>>,
    pub closed: bool,
}

#[derive(Default)]
struct EventQueue {
    events: Mutex<VecDeque<NativeEvent>>,
    ready: Condvar,
}

/// Handle for injecting native events
#[derive(Clone)]
pub struct HeadlessEventSender {
    queue: Arc<EventQueue>,
}

impl HeadlessEventSender {
    pub fn send(&self, event: NativeEvent) {
        lock(&self.queue.events).push_back(event);
        self.queue.ready.notify_one();
    }

    pub fn send_all(&self, events: impl IntoIterator<Item = NativeEvent>) {
        lock(&self.queue.events).extend(events);
        self.queue.ready.notify_all();
    }

    /// Break a blocking poll
    pub fn wake(&self) {
        self.send(NativeEvent::new(0, NativeEventKind::Wakeup));
    }

    pub fn pending(&self) -> usize {
        lock(&self.queue.events).len()
    }
}

/// Backend window of the headless platform
pub struct HeadlessWindow {
    handle: u64,
    state: Arc<Mutex<HeadlessWindowState>>,
}

impl HeadlessWindow {
    fn update(&self, op: &str, f: impl FnOnce(&mut HeadlessWindowState)) {
        let mut state = lock(&self.state);
        if state.closed {
            trace!(handle = self.handle, op, "operation on closed window ignored");
            return;
        }
        f(&mut state);
    }
}

impl BackendWindow for HeadlessWindow {
    fn native_handle(&self) -> u64 {
        self.handle
    }

    fn show(&mut self) {
        self.update("show", |s| {
            s.visible = true;
            if s.state == WindowState::Hidden {
                s.state = WindowState::Normal;
            }
        });
    }

    fn hide(&mut self) {
        self.update("hide", |s| {
            s.visible = false;
            s.state = WindowState::Hidden;
        });
    }

    fn close(&mut self) {
        self.update("close", |s| {
            s.visible = false;
            s.state = WindowState::Closing;
            s.pointer_grabbed = false;
            s.closed = true;
        });
    }

    fn minimize(&mut self) {
        self.update("minimize", |s| s.state = WindowState::Minimized);
    }

    fn maximize(&mut self) {
        self.update("maximize", |s| s.state = WindowState::Maximized);
    }

    fn restore(&mut self) {
        self.update("restore", |s| {
            s.visible = true;
            s.state = WindowState::Normal;
        });
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.update("set_fullscreen", |s| {
            s.state = if fullscreen {
                WindowState::Fullscreen
            } else {
                WindowState::Normal
            };
        });
    }

    fn set_title(&mut self, title: &str) {
        self.update("set_title", |s| s.title = title.to_string());
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.update("set_position", |s| s.position = (x, y));
    }

    fn set_size(&mut self, width: i32, height: i32) {
        self.update("set_size", |s| s.size = (width, height));
    }

    fn set_resizable(&mut self, resizable: bool) {
        self.update("set_resizable", |s| s.resizable = resizable);
    }

    fn invalidate(&mut self, rect: Option<Rect2Di>) {
        self.update("invalidate", |s| s.invalidations.push(rect));
    }

    fn swap_buffers(&mut self) {
        self.update("swap_buffers", |s| s.swap_count += 1);
    }

    fn grab_pointer(&mut self) -> bool {
        let mut granted = false;
        self.update("grab_pointer", |s| {
            s.pointer_grabbed = true;
            granted = true;
        });
        granted
    }

    fn ungrab_pointer(&mut self) {
        self.update("ungrab_pointer", |s| s.pointer_grabbed = false);
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.update("set_cursor", |s| s.cursor = cursor);
    }
}

/// In-memory platform for tests and off-screen rendering
pub struct HeadlessPlatform {
    queue: Arc<EventQueue>,
    windows: BTreeMap<u64, Arc<Mutex<HeadlessWindowState>>>,
    clipboard: Option<String>,
    images: Arc<ImageCache>,
    surface: SurfaceKind,
    next_handle: u64,
    reject_windows: bool,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new(Arc::new(ImageCache::default()))
    }
}

impl HeadlessPlatform {
    pub fn new(images: Arc<ImageCache>) -> Self {
        Self {
            queue: Arc::new(EventQueue::default()),
            windows: BTreeMap::new(),
            clipboard: None,
            images,
            surface: SurfaceKind::Recording,
            next_handle: 0x1000,
            reject_windows: false,
        }
    }

    pub fn with_surface(mut self, surface: SurfaceKind) -> Self {
        self.surface = surface;
        self
    }

    pub fn sender(&self) -> HeadlessEventSender {
        HeadlessEventSender {
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn image_cache(&self) -> &Arc<ImageCache> {
        &self.images
    }

    /// Make subsequent window creation fail, simulating a lost display
    pub fn set_reject_windows(&mut self, reject: bool) {
        self.reject_windows = reject;
    }

    pub fn window_state(&self, native_handle: u64) -> Option<HeadlessWindowState> {
        self.windows
            .get(&native_handle)
            .map(|state| lock(state).clone())
    }

    pub fn window_handles(&self) -> Vec<u64> {
        self.windows.keys().copied().collect()
    }

    fn create_surface(&self, config: &WindowConfig) -> Result<Box<dyn RenderContext + Send>> {
        let (w, h) = (config.width as u32, config.height as u32);
        match self.surface {
            SurfaceKind::Recording => Ok(Box::new(
                RecordingContext::with_image_cache(w, h, Arc::clone(&self.images))
                    .with_label(config.title.clone()),
            )),
            SurfaceKind::Raster => RasterContext::new(w, h, Arc::clone(&self.images))
                .map(|ctx| Box::new(ctx) as Box<dyn RenderContext + Send>)
                .map_err(|e| PlatformError::WindowCreation(e.to_string())),
        }
    }
}

impl Platform for HeadlessPlatform {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_window(&mut self, config: &WindowConfig) -> Result<WindowParts> {
        config.validate()?;
        if self.reject_windows {
            return Err(PlatformError::WindowCreation(
                "headless display unavailable".to_string(),
            ));
        }
        let context = self.create_surface(config)?;

        let handle = self.next_handle;
        self.next_handle += 1;
        let position = |v: i32| if v == UNSET { 0 } else { v };
        let state = Arc::new(Mutex::new(HeadlessWindowState {
            title: config.title.clone(),
            position: (position(config.x), position(config.y)),
            size: (config.width, config.height),
            resizable: config.resizable,
            ..Default::default()
        }));
        self.windows.insert(handle, Arc::clone(&state));
        debug!(handle, title = %config.title, "created headless window");

        Ok(WindowParts {
            backend: Box::new(HeadlessWindow { handle, state }),
            context,
        })
    }

    fn poll_event(&mut self, timeout: Option<Duration>) -> Option<NativeEvent> {
        let mut events = lock(&self.queue.events);
        if let Some(event) = events.pop_front() {
            return Some(event);
        }
        match timeout {
            Some(t) if t.is_zero() => None,
            Some(t) => {
                let (mut events, _) = self
                    .queue
                    .ready
                    .wait_timeout_while(events, t, |q| q.is_empty())
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                events.pop_front()
            }
            None => {
                let mut events = self
                    .queue
                    .ready
                    .wait_while(events, |q| q.is_empty())
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                events.pop_front()
            }
        }
    }

    fn clipboard_text(&mut self) -> Option<String> {
        self.clipboard.clone()
    }

    fn set_clipboard_text(&mut self, text: &str) -> Result<()> {
        self.clipboard = Some(text.to_string());
        let sender = self.sender();
        sender.send(NativeEvent::new(0, NativeEventKind::ClipboardChanged));
        Ok(())
    }

    fn destroy_window(&mut self, native_handle: u64) {
        match self.windows.remove(&native_handle) {
            Some(state) => {
                let mut state = lock(&state);
                state.closed = true;
                state.visible = false;
            }
            None => warn!(native_handle, "destroy of unknown headless window"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::button;

    #[test]
    fn test_create_window_registers_state() {
        let mut platform = HeadlessPlatform::default();
        let mut parts = platform
            .create_window(&WindowConfig::new("Main").size(320, 200).position(10, 20))
            .unwrap();
        let handle = parts.backend.native_handle();
        assert_eq!(parts.context.surface_size(), (320, 200));

        parts.backend.show();
        parts.backend.set_title("Renamed");
        parts.backend.swap_buffers();

        let state = platform.window_state(handle).unwrap();
        assert!(state.visible);
        assert_eq!(state.title, "Renamed");
        assert_eq!(state.position, (10, 20));
        assert_eq!(state.swap_count, 1);
    }

    #[test]
    fn test_invalid_config_registers_nothing() {
        let mut platform = HeadlessPlatform::default();
        let err = platform
            .create_window(&WindowConfig::default().size(0, 0))
            .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidConfig(_)));

        platform.set_reject_windows(true);
        assert!(matches!(
            platform.create_window(&WindowConfig::default()),
            Err(PlatformError::WindowCreation(_))
        ));
        assert!(platform.window_handles().is_empty());
    }

    #[test]
    fn test_events_delivered_in_order() {
        let mut platform = HeadlessPlatform::default();
        let sender = platform.sender();
        sender.send(NativeEvent::button_press(1, button::LEFT, 5, 5));
        sender.send(NativeEvent::button_release(1, button::LEFT, 5, 5));

        let first = platform.poll_event(Some(Duration::ZERO)).unwrap();
        let second = platform.poll_event(Some(Duration::ZERO)).unwrap();
        assert!(matches!(first.kind, NativeEventKind::ButtonPress { .. }));
        assert!(matches!(second.kind, NativeEventKind::ButtonRelease { .. }));
        assert!(platform.poll_event(Some(Duration::from_millis(1))).is_none());
    }

    #[test]
    fn test_blocking_poll_wakes_on_send() {
        let mut platform = HeadlessPlatform::default();
        let sender = platform.sender();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            sender.wake();
        });
        let event = platform.poll_event(None).unwrap();
        assert_eq!(event.kind, NativeEventKind::Wakeup);
        worker.join().unwrap();
    }

    #[test]
    fn test_closed_window_ignores_operations() {
        let mut platform = HeadlessPlatform::default();
        let mut parts = platform.create_window(&WindowConfig::default()).unwrap();
        let handle = parts.backend.native_handle();
        assert!(parts.backend.grab_pointer());
        parts.backend.close();
        assert!(!parts.backend.grab_pointer());
        parts.backend.set_title("late");

        let state = platform.window_state(handle).unwrap();
        assert!(state.closed);
        assert_eq!(state.state, WindowState::Closing);
        assert!(!state.pointer_grabbed);
        assert_ne!(state.title, "late");

        platform.destroy_window(handle);
        assert!(platform.window_state(handle).is_none());
    }

    #[test]
    fn test_clipboard_round_trip() {
        let mut platform = HeadlessPlatform::default();
        assert_eq!(platform.clipboard_text(), None);
        platform.set_clipboard_text("copied").unwrap();
        assert_eq!(platform.clipboard_text().as_deref(), Some("copied"));
        let event = platform.poll_event(Some(Duration::ZERO)).unwrap();
        assert_eq!(event.kind, NativeEventKind::ClipboardChanged);
    }

    #[test]
    fn test_raster_surface() {
        let mut platform = HeadlessPlatform::default().with_surface(SurfaceKind::Raster);
        let mut parts = platform
            .create_window(&WindowConfig::default().size(16, 16))
            .unwrap();
        assert!(parts.context.native_context().is_some());
        assert_eq!(parts.context.surface_size(), (16, 16));
    }
}
