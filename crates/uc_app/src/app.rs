//! Application main loop
//!
//! # Architecture
//!
//! ```text
//! Platform::poll_event ──► translate ──► UcWindow::dispatch_event
//!                                              │
//! TaskQueue::drain ─────── completions ────────┤
//!                                              ▼
//!                          timers ──► reap closed ──► render dirty windows
//! ```
//!
//! One iteration waits for native events (never longer than the next timer
//! deadline), dispatches everything queued, applies finished background
//! work, fires timers, destroys closed windows and repaints visible windows
//! with pending dirty regions inside their own render scope.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use uc_core::{TextLayout, WindowId};
use uc_image::ImageCache;
use uc_platform::{
    HeadlessEventSender, HeadlessPlatform, NativeEvent, NativeEventKind, Platform, SurfaceKind,
    WindowConfig, WindowState,
};
use uc_plugin::{diagram_plugin_for, DiagramFormat, PluginError};
use uc_ui::{UcWindow, WindowRenderScope};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::tasks::TaskQueue;
use crate::translate::translate;

/// Native events handled per iteration before rendering gets a turn
const MAX_EVENTS_PER_ITERATION: usize = 256;

/// Owns the platform, every open window and the background task queue
pub struct Application<P: Platform = HeadlessPlatform> {
    platform: P,
    windows: Vec<UcWindow>,
    config: AppConfig,
    images: Arc<ImageCache>,
    tasks: TaskQueue,
    text: TextLayout,
    running: bool,
    last_frame: Option<Instant>,
    delta: Duration,
    frames: u64,
}

impl<P: Platform> std::fmt::Debug for Application<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("platform", &self.platform.name())
            .field("windows", &self.windows.len())
            .field("running", &self.running)
            .field("frames", &self.frames)
            .finish()
    }
}

impl Application<HeadlessPlatform> {
    /// In-memory application plus a sender for injecting native events
    pub fn headless(config: AppConfig) -> Result<(Self, HeadlessEventSender)> {
        config.validate()?;
        let images = Arc::new(ImageCache::new(config.image_cache_budget));
        let surface = if config.raster_surfaces {
            SurfaceKind::Raster
        } else {
            SurfaceKind::Recording
        };
        let platform = HeadlessPlatform::new(Arc::clone(&images)).with_surface(surface);
        let sender = platform.sender();
        let app = Self::build(platform, config, images)?;
        Ok((app, sender))
    }
}

impl<P: Platform> Application<P> {
    pub fn new(platform: P, config: AppConfig) -> Result<Self> {
        config.validate()?;
        let images = Arc::new(ImageCache::new(config.image_cache_budget));
        Self::build(platform, config, images)
    }

    fn build(platform: P, config: AppConfig, images: Arc<ImageCache>) -> Result<Self> {
        uc_paint::install_font_measurer();
        let mut text = TextLayout::default();
        text.set_dpi(config.text_dpi);
        let tasks = TaskQueue::new()?;
        info!(platform = platform.name(), fps = config.target_fps, "application started");
        Ok(Self {
            platform,
            windows: Vec::new(),
            config,
            images,
            tasks,
            text,
            running: true,
            last_frame: None,
            delta: Duration::ZERO,
            frames: 0,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn image_cache(&self) -> &Arc<ImageCache> {
        &self.images
    }

    /// Text layout configured with the application DPI
    pub fn text_layout(&self) -> &TextLayout {
        &self.text
    }

    // ─────────────────────────────────────────────────────────────────────
    // Windows
    // ─────────────────────────────────────────────────────────────────────

    /// Create a hidden window with the application's input settings
    pub fn create_window(&mut self, config: WindowConfig) -> Result<WindowId> {
        let mut window = UcWindow::create(&mut self.platform, config)?;
        window.set_drag_threshold(self.config.drag_threshold);
        window.set_double_click(
            self.config.double_click_interval(),
            self.config.double_click.distance,
        );
        let id = window.id();
        self.windows.push(window);
        Ok(id)
    }

    pub fn window(&self, id: WindowId) -> Option<&UcWindow> {
        self.windows.iter().find(|w| w.id() == id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut UcWindow> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }

    pub fn window_by_native(&self, native_handle: u64) -> Option<&UcWindow> {
        self.windows
            .iter()
            .find(|w| w.native_handle() == native_handle)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.iter().map(UcWindow::id).collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────

    pub fn clipboard_text(&mut self) -> Option<String> {
        self.platform.clipboard_text()
    }

    pub fn set_clipboard_text(&mut self, text: &str) -> Result<()> {
        self.platform.set_clipboard_text(text)?;
        Ok(())
    }

    /// Render a diagram in the background
    ///
    /// The source is validated up front; the bytes (or the render error)
    /// arrive later as a custom event carrying a `DiagramRendered`.
    pub fn render_diagram(
        &mut self,
        window: WindowId,
        language: &str,
        source: impl Into<String>,
        format: DiagramFormat,
    ) -> Result<()> {
        if self.window(window).is_none() {
            return Err(AppError::UnknownWindow(window));
        }
        let plugin = diagram_plugin_for(language)?;
        if !plugin.formats().contains(&format) {
            return Err(PluginError::Unsupported(format!(
                "{} output from {}",
                format.mime_type(),
                plugin.name()
            ))
            .into());
        }
        let source = source.into();
        plugin.validate_source(&source)?;
        let timeout = self.config.plugin_timeout();
        self.tasks
            .render_diagram(window, plugin, source, format, timeout);
        Ok(())
    }

    /// Decode an image into the shared cache; posts an `ImageLoaded` event
    pub fn load_image_async(&mut self, window: WindowId, path: impl Into<PathBuf>) -> Result<()> {
        if self.window(window).is_none() {
            return Err(AppError::UnknownWindow(window));
        }
        self.tasks
            .load_image(window, Arc::clone(&self.images), path.into());
        Ok(())
    }

    /// Background jobs not yet delivered
    pub fn pending_tasks(&self) -> usize {
        self.tasks.pending()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Main loop
    // ─────────────────────────────────────────────────────────────────────

    pub fn quit(&mut self) {
        info!("quit requested");
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Time between the last two iterations
    pub fn delta_time(&self) -> Duration {
        self.delta
    }

    /// Iterations that repainted at least one window
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Run until [`quit`](Self::quit) or the last window closes
    pub fn run(&mut self) -> Result<()> {
        if self.windows.is_empty() {
            return Err(AppError::Other("no windows to run".to_string()));
        }
        self.running = true;
        info!(windows = self.windows.len(), "entering main loop");
        while self.run_iteration() {}
        info!(frames = self.frames, "main loop finished");
        Ok(())
    }

    /// One pass of the loop; false once the application should stop
    pub fn run_iteration(&mut self) -> bool {
        if !self.running {
            return false;
        }
        let started = Instant::now();

        let timeout = self.poll_timeout(started);
        if let Some(native) = self.platform.poll_event(Some(timeout)) {
            self.handle_native(&native);
            for _ in 1..MAX_EVENTS_PER_ITERATION {
                let Some(native) = self.platform.poll_event(Some(Duration::ZERO)) else {
                    break;
                };
                self.handle_native(&native);
            }
        }

        self.tick(started);
        self.apply_completions();

        let now = Instant::now();
        for window in &mut self.windows {
            window.process_timers(now);
        }

        self.reap_closed_windows();
        if self.windows.is_empty() {
            info!("last window closed");
            self.running = false;
            return false;
        }

        if self.render_windows() > 0 {
            self.frames += 1;
            self.throttle(started);
        }
        self.running
    }

    /// Translate and dispatch one native event
    pub fn handle_native(&mut self, native: &NativeEvent) {
        let events = translate(native);
        if native.window == 0 {
            // not tied to a window (clipboard changes)
            for window in &mut self.windows {
                for event in &events {
                    window.dispatch_event(event);
                }
            }
            return;
        }
        let Some(window) = self
            .windows
            .iter_mut()
            .find(|w| w.native_handle() == native.window)
        else {
            debug!(handle = native.window, "event for unknown native window dropped");
            return;
        };
        if matches!(native.kind, NativeEventKind::Deiconify) {
            window.sync_native_state(WindowState::Normal);
        }
        for event in &events {
            window.dispatch_event(event);
        }
    }

    fn poll_timeout(&self, now: Instant) -> Duration {
        let redraw_pending = self
            .windows
            .iter()
            .any(|w| w.is_visible() && w.needs_redraw());
        if redraw_pending {
            return Duration::ZERO;
        }
        let mut timeout = self.config.poll_timeout();
        if let Some(deadline) = self
            .windows
            .iter()
            .filter_map(UcWindow::next_timer_deadline)
            .min()
        {
            timeout = timeout.min(deadline.saturating_duration_since(now));
        }
        timeout
    }

    fn tick(&mut self, now: Instant) {
        if let Some(last) = self.last_frame {
            self.delta = now.saturating_duration_since(last);
        }
        self.last_frame = Some(now);
    }

    fn apply_completions(&mut self) {
        for completion in self.tasks.drain() {
            match self
                .windows
                .iter_mut()
                .find(|w| w.id() == completion.window)
            {
                Some(window) => {
                    window.dispatch_event(&completion.event);
                }
                None => debug!(window = ?completion.window, "completion for closed window dropped"),
            }
        }
    }

    fn reap_closed_windows(&mut self) {
        if !self.windows.iter().any(UcWindow::is_closing) {
            return;
        }
        let (closed, open): (Vec<_>, Vec<_>) = std::mem::take(&mut self.windows)
            .into_iter()
            .partition(UcWindow::is_closing);
        self.windows = open;
        for window in closed {
            info!(window = ?window.id(), "window destroyed");
            self.platform.destroy_window(window.native_handle());
        }
    }

    fn render_windows(&mut self) -> usize {
        let mut rendered = 0;
        for window in &mut self.windows {
            if !window.is_visible() || !window.needs_redraw() {
                continue;
            }
            let _scope = WindowRenderScope::new(window.id());
            if window.render() {
                rendered += 1;
            } else {
                debug!(window = ?window.id(), "dirty window skipped this frame");
            }
        }
        rendered
    }

    fn throttle(&self, started: Instant) {
        let Some(interval) = self.config.frame_interval() else {
            return;
        };
        let elapsed = started.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }
}

impl<P: Platform> Drop for Application<P> {
    fn drop(&mut self) {
        for window in self.windows.drain(..) {
            self.platform.destroy_window(window.native_handle());
        }
    }
}
