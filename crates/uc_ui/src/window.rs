//! Top-level window
//!
//! A [`UcWindow`] owns the backend window, its shared render context, the
//! element tree with its popup stack and dirty regions, keyboard focus,
//! mouse capture and element timers. Event routing lives in
//! [`dispatch`](crate::dispatch).

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use uc_core::{CoreError, Point2Di, Rect2Di, RenderContext, UcEvent, WindowId};
use uc_platform::{
    BackendWindow, Cursor, Platform, WindowConfig, WindowParts, WindowState, UNSET,
};

use crate::capture::MouseCapture;
use crate::context_manager::{
    lock_context, register_window_context, share_context, unregister_window_context,
    with_active_context, SharedContext,
};
use crate::dispatch::ClickTracker;
use crate::element::{Element, ElementId, ElementOptions, UiRequest};
use crate::error::Result;
use crate::selective::{RenderStats, SelectiveRenderer};
use crate::timers::TimerSet;
use crate::tree::ElementTree;

/// Window-level event handler; runs after the element tree
pub type WindowEventHandler = Box<dyn FnMut(&UcEvent) -> bool>;

pub struct UcWindow {
    id: WindowId,
    config: WindowConfig,
    backend: Box<dyn BackendWindow>,
    context: SharedContext,
    pub(crate) tree: ElementTree,
    renderer: SelectiveRenderer,
    pub(crate) capture: MouseCapture,
    pub(crate) clicks: ClickTracker,
    timers: TimerSet,
    pub(crate) focused: Option<ElementId>,
    pub(crate) pressed: Option<ElementId>,
    state: WindowState,
    title: String,
    position: Point2Di,
    size: (i32, i32),
    pub(crate) pointer: Point2Di,
    cursor: Cursor,
    has_focus: bool,
    handler: Option<WindowEventHandler>,
}

impl std::fmt::Debug for UcWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UcWindow")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("state", &self.state)
            .field("size", &self.size)
            .field("tree", &self.tree)
            .finish()
    }
}

impl UcWindow {
    /// Create the native window and register its render context
    ///
    /// On error nothing is registered.
    pub fn create(platform: &mut dyn Platform, config: WindowConfig) -> Result<Self> {
        config.validate()?;
        let parts = platform.create_window(&config).map_err(|err| {
            error!(title = %config.title, %err, "window creation failed");
            err
        })?;
        Ok(Self::from_parts(config, parts))
    }

    /// Wrap an already created backend window; starts hidden
    pub fn from_parts(config: WindowConfig, parts: WindowParts) -> Self {
        let id = WindowId::next();
        let context = share_context(parts.context);
        register_window_context(id, context.clone());
        let unset_to_zero = |v: i32| if v == UNSET { 0 } else { v };
        let position = Point2Di::new(unset_to_zero(config.x), unset_to_zero(config.y));
        info!(?id, title = %config.title, width = config.width, height = config.height, "window created");
        Self {
            id,
            backend: parts.backend,
            context,
            tree: ElementTree::new(config.width, config.height),
            renderer: SelectiveRenderer::new(),
            capture: MouseCapture::new(id),
            clicks: ClickTracker::default(),
            timers: TimerSet::new(),
            focused: None,
            pressed: None,
            state: WindowState::Hidden,
            title: config.title.clone(),
            position,
            size: (config.width, config.height),
            pointer: Point2Di::default(),
            cursor: Cursor::Default,
            has_focus: false,
            handler: None,
            config,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn native_handle(&self) -> u64 {
        self.backend.native_handle()
    }

    pub fn context(&self) -> SharedContext {
        self.context.clone()
    }

    /// Run `f` on this window's render context
    pub fn with_context<R>(&self, f: impl FnOnce(&mut dyn RenderContext) -> R) -> Option<R> {
        let mut held = lock_context(&self.context)?;
        let ctx: &mut (dyn RenderContext + Send) = &mut *held;
        Some(f(ctx))
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    pub fn root(&self) -> ElementId {
        self.tree.root()
    }

    /// Insert an element under `parent`
    pub fn add_element(
        &mut self,
        parent: ElementId,
        element: impl Element,
        bounds: Rect2Di,
        options: ElementOptions,
    ) -> Result<ElementId> {
        self.tree.create_child(parent, element, bounds, options)
    }

    /// Destroy an element; focus, capture, hover and timers referring to
    /// its subtree are dropped
    ///
    /// This is the only way to destroy an element of a window:
    ///
    /// ```compile_fail
    /// fn destroy_directly(window: &mut uc_ui::UcWindow, id: uc_ui::ElementId) {
    ///     let _ = window.tree_mut().destroy(id);
    /// }
    /// ```
    pub fn destroy_element(&mut self, id: ElementId) -> Result<()> {
        for removed in self.tree.destroy(id)? {
            if self.focused == Some(removed) {
                self.focused = None;
            }
            if self.pressed == Some(removed) {
                self.pressed = None;
            }
            if self.capture.element_removed(removed) {
                self.backend.ungrab_pointer();
            }
            self.timers.remove_element(removed);
        }
        Ok(())
    }

    pub fn set_event_handler(&mut self, handler: impl FnMut(&UcEvent) -> bool + 'static) {
        self.handler = Some(Box::new(handler));
    }

    pub(crate) fn call_window_handler(&mut self, event: &UcEvent) -> bool {
        match self.handler.as_mut() {
            Some(handler) => handler(event),
            None => false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_visible()
    }

    pub fn is_closing(&self) -> bool {
        self.state == WindowState::Closing
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    fn transition(&mut self, next: WindowState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CoreError::StateViolation(format!(
                "window {:?} cannot go from {:?} to {:?}",
                self.id, self.state, next
            ))
            .into());
        }
        debug!(window = ?self.id, from = ?self.state, to = ?next, "window state");
        self.state = next;
        Ok(())
    }

    pub fn show(&mut self) -> Result<()> {
        if self.state.is_visible() {
            return Ok(());
        }
        self.transition(WindowState::Normal)?;
        self.backend.show();
        self.tree.mark_full_redraw();
        Ok(())
    }

    pub fn hide(&mut self) -> Result<()> {
        self.transition(WindowState::Hidden)?;
        self.backend.hide();
        Ok(())
    }

    pub fn minimize(&mut self) -> Result<()> {
        if !self.config.minimizable {
            return Err(CoreError::StateViolation("window is not minimizable".to_string()).into());
        }
        self.transition(WindowState::Minimized)?;
        self.backend.minimize();
        Ok(())
    }

    pub fn maximize(&mut self) -> Result<()> {
        if !self.config.maximizable {
            return Err(CoreError::StateViolation("window is not maximizable".to_string()).into());
        }
        self.transition(WindowState::Maximized)?;
        self.backend.maximize();
        self.tree.mark_full_redraw();
        Ok(())
    }

    pub fn restore(&mut self) -> Result<()> {
        self.transition(WindowState::Normal)?;
        self.backend.restore();
        self.tree.mark_full_redraw();
        Ok(())
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        let next = if fullscreen {
            WindowState::Fullscreen
        } else {
            WindowState::Normal
        };
        self.transition(next)?;
        self.backend.set_fullscreen(fullscreen);
        self.tree.mark_full_redraw();
        Ok(())
    }

    /// Begin closing; false if the window is not closable or already closing
    pub fn request_close(&mut self) -> bool {
        if !self.config.closable || self.is_closing() {
            return false;
        }
        if self.transition(WindowState::Closing).is_err() {
            return false;
        }
        if self.capture.release().is_some() {
            self.backend.ungrab_pointer();
        }
        self.backend.close();
        info!(window = ?self.id, "window closing");
        true
    }

    /// Adopt a state change made by the OS without calling the backend
    pub fn sync_native_state(&mut self, state: WindowState) {
        if self.state == state {
            return;
        }
        if self.transition(state).is_ok() && state.is_visible() {
            self.tree.mark_full_redraw();
        }
    }

    pub(crate) fn set_has_focus(&mut self, focus: bool) {
        self.has_focus = focus;
        if !focus {
            if self.capture.release().is_some() {
                self.backend.ungrab_pointer();
            }
            self.clear_pressed();
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Geometry
    // ─────────────────────────────────────────────────────────────────────

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.backend.set_title(&self.title);
    }

    pub fn position(&self) -> Point2Di {
        self.position
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = Point2Di::new(x, y);
        self.backend.set_position(x, y);
    }

    pub(crate) fn note_moved(&mut self, x: i32, y: i32) {
        self.position = Point2Di::new(x, y);
    }

    pub fn size(&self) -> (i32, i32) {
        self.size
    }

    /// Resize within the configured limits
    pub fn set_size(&mut self, width: i32, height: i32) {
        let (width, height) = self.config.clamp_size(width, height);
        self.backend.set_size(width, height);
        self.apply_resize(width, height);
    }

    pub fn set_resizable(&mut self, resizable: bool) {
        self.backend.set_resizable(resizable);
    }

    /// Adopt a new surface size
    pub(crate) fn apply_resize(&mut self, width: i32, height: i32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.size == (width, height) {
            return;
        }
        debug!(window = ?self.id, width, height, "window resized");
        self.size = (width, height);
        if let Some(mut held) = lock_context(&self.context) {
            held.resize_surface(width as u32, height as u32);
        }
        self.tree.resize(width, height);
    }

    pub fn pointer_position(&self) -> Point2Di {
        self.pointer
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub(crate) fn apply_cursor(&mut self, cursor: Cursor) {
        if self.cursor != cursor {
            self.cursor = cursor;
            self.backend.set_cursor(cursor);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Focus, capture, popups
    // ─────────────────────────────────────────────────────────────────────

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    /// Move keyboard focus, sending `FocusLost` and `FocusGained`
    ///
    /// Only active, focusable elements accept focus; returns whether focus
    /// changed.
    pub fn set_focus(&mut self, target: Option<ElementId>) -> bool {
        if target == self.focused {
            return false;
        }
        if let Some(t) = target {
            let accepts = self
                .tree
                .core(t)
                .is_some_and(|c| c.is_active() && c.is_focusable());
            if !accepts {
                return false;
            }
        }
        if let Some(old) = self.focused.take() {
            let _ = self.tree.set_focused(old, false);
            self.deliver(old, &UcEvent::new(uc_core::EventType::FocusLost));
        }
        self.focused = target;
        if let Some(new) = target {
            let _ = self.tree.set_focused(new, true);
            self.deliver(new, &UcEvent::new(uc_core::EventType::FocusGained));
        }
        debug!(window = ?self.id, focused = ?self.focused, "focus changed");
        true
    }

    pub fn capture(&self) -> &MouseCapture {
        &self.capture
    }

    pub fn set_drag_threshold(&mut self, threshold: f64) {
        self.capture.set_drag_threshold(threshold);
    }

    pub fn set_double_click(&mut self, interval: Duration, distance: f64) {
        self.clicks = ClickTracker::new(interval, distance);
    }

    pub fn capture_mouse(&mut self, element: ElementId, button: uc_core::MouseButton) {
        match self.capture.capture(element, button, self.pointer) {
            Ok(()) => {
                if !self.backend.grab_pointer() {
                    warn!(window = ?self.id, "pointer grab refused");
                }
            }
            Err(err) => warn!(%err, "capture request ignored"),
        }
    }

    pub fn release_mouse(&mut self) {
        if self.capture.release().is_some() {
            self.backend.ungrab_pointer();
        }
    }

    pub(crate) fn press(&mut self, id: ElementId) {
        self.clear_pressed();
        let _ = self.tree.set_pressed(id, true);
        self.pressed = Some(id);
    }

    pub(crate) fn clear_pressed(&mut self) {
        if let Some(pressed) = self.pressed.take() {
            let _ = self.tree.set_pressed(pressed, false);
        }
    }

    pub fn open_popup(&mut self, popup: ElementId) -> Result<()> {
        self.tree.open_popup(popup)
    }

    pub fn close_popup(&mut self, popup: ElementId) -> bool {
        self.tree.close_popup(popup)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Requests and timers
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn apply_requests(&mut self, target: ElementId, requests: Vec<UiRequest>) {
        for request in requests {
            let result = match request {
                UiRequest::Redraw => {
                    self.tree.request_redraw(target);
                    Ok(())
                }
                UiRequest::SetBounds(bounds) => self.tree.set_bounds(target, bounds),
                UiRequest::SetVisible(visible) => self.tree.set_visible(target, visible),
                UiRequest::SetPressed(pressed) => self.tree.set_pressed(target, pressed),
                UiRequest::Focus => {
                    self.set_focus(Some(target));
                    Ok(())
                }
                UiRequest::Blur => {
                    if self.focused == Some(target) {
                        self.set_focus(None);
                    }
                    Ok(())
                }
                UiRequest::CaptureMouse(button) => {
                    self.capture_mouse(target, button);
                    Ok(())
                }
                UiRequest::ReleaseMouse => {
                    if self.capture.captured() == Some(target) {
                        self.release_mouse();
                    }
                    Ok(())
                }
                UiRequest::StartDrag(data) => {
                    self.capture.set_drag_payload(data);
                    Ok(())
                }
                UiRequest::ScrollTo(x, y) => self.tree.set_scroll(target, x, y),
                UiRequest::ScrollBy(dx, dy) => self.tree.scroll_by(target, dx, dy).map(|_| ()),
                UiRequest::OpenPopup(popup) => self.tree.open_popup(popup),
                UiRequest::ClosePopup(popup) => {
                    self.tree.close_popup(popup);
                    Ok(())
                }
                UiRequest::CloseAllPopups => {
                    self.tree.close_all_popups();
                    Ok(())
                }
                UiRequest::StartTimer {
                    timer_id,
                    interval,
                    repeat,
                } => {
                    self.timers
                        .start(target, timer_id, interval, repeat, Instant::now());
                    Ok(())
                }
                UiRequest::StopTimer(timer_id) => {
                    self.timers.stop(target, timer_id);
                    Ok(())
                }
                UiRequest::SetCursor(cursor) => {
                    let result = self.tree.set_cursor(target, cursor);
                    if self.capture.hovered() == Some(target) {
                        self.apply_cursor(cursor);
                    }
                    result
                }
                UiRequest::BringToFront => self.tree.bring_to_front(target),
                UiRequest::SendToBack => self.tree.send_to_back(target),
                UiRequest::CloseWindow => {
                    self.request_close();
                    Ok(())
                }
            };
            if let Err(err) = result {
                warn!(%err, element = ?target, "element request failed");
            }
        }
    }

    /// Start a timer on behalf of an element
    pub fn start_timer(&mut self, element: ElementId, timer_id: u64, interval: Duration, repeat: bool) {
        self.timers
            .start(element, timer_id, interval, repeat, Instant::now());
    }

    /// Deliver due timer events; returns how many fired
    pub fn process_timers(&mut self, now: Instant) -> usize {
        let due = self.timers.due(now);
        let count = due.len();
        for (element, timer_id) in due {
            let mut event = UcEvent::timer(timer_id);
            event.target_window = Some(self.id);
            self.deliver(element, &event);
        }
        count
    }

    pub fn next_timer_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────

    pub fn needs_redraw(&self) -> bool {
        !self.tree.dirty().is_empty()
    }

    pub fn mark_full_redraw(&mut self) {
        self.tree.mark_full_redraw();
    }

    /// Repaint the dirty regions and present; false if nothing was drawn
    pub fn render(&mut self) -> bool {
        let Some(mut held) = lock_context(&self.context) else {
            return false;
        };
        if !held.is_valid() {
            warn!(window = ?self.id, "render context invalid, frame skipped");
            return false;
        }
        let background = self.config.background;
        let (renderer, tree) = (&mut self.renderer, &mut self.tree);
        let rendered = with_active_context(&mut held, |ctx| {
            renderer.render(tree, ctx, background)
        });
        drop(held);
        if rendered {
            self.backend.swap_buffers();
        }
        rendered
    }

    pub fn render_stats(&self) -> &RenderStats {
        self.renderer.stats()
    }

    pub fn renderer(&self) -> &SelectiveRenderer {
        &self.renderer
    }
}

impl Drop for UcWindow {
    fn drop(&mut self) {
        unregister_window_context(self.id);
        debug!(window = ?self.id, "window dropped");
    }
}
