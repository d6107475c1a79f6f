//! Event dispatch for a window
//!
//! # Architecture
//!
//! ```text
//! UcEvent ──► window event? ──► window handler, then resize/close/focus
//!    │
//!    ├──► mouse: capture ──► popups (top first) ──► hit test + bubble ──► window handler
//!    │
//!    └──► keyboard: focused element + bubble ──► window handler
//! ```
//!
//! Mouse events reach elements in their own coordinates, except for the
//! captured element which sees window coordinates. A handler returning `true`
//! stops propagation.

use std::time::{Duration, Instant};

use tracing::trace;
use uc_core::{EventType, MouseButton, Point2Di, Rect2Di, UcEvent};
use uc_platform::WindowState;

use crate::element::{ElementId, EventContext};
use crate::window::UcWindow;

pub const DEFAULT_DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(400);
pub const DEFAULT_DOUBLE_CLICK_DISTANCE: f64 = 4.0;

/// Pixels scrolled per wheel step
pub const WHEEL_SCROLL_STEP: i32 = 40;

/// Detects double-clicks from consecutive presses
#[derive(Clone, Debug)]
pub struct ClickTracker {
    interval: Duration,
    distance: f64,
    last: Option<(MouseButton, Point2Di, Instant)>,
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DOUBLE_CLICK_INTERVAL, DEFAULT_DOUBLE_CLICK_DISTANCE)
    }
}

impl ClickTracker {
    pub fn new(interval: Duration, distance: f64) -> Self {
        Self {
            interval,
            distance,
            last: None,
        }
    }

    /// Record a press; true if it completes a double-click
    ///
    /// A completed pair is forgotten so a third press starts over.
    pub fn register_press(&mut self, button: MouseButton, position: Point2Di, at: Instant) -> bool {
        if let Some((last_button, last_position, last_at)) = self.last {
            let quick = at.saturating_duration_since(last_at) <= self.interval;
            let near = last_position.distance_to(position) <= self.distance;
            if last_button == button && quick && near {
                self.last = None;
                return true;
            }
        }
        self.last = Some((button, position, at));
        false
    }
}

impl UcWindow {
    /// Route one event through the window; true if something consumed it
    pub fn dispatch_event(&mut self, event: &UcEvent) -> bool {
        let mut event = event.clone();
        event.target_window = Some(self.id());
        let kind = event.event_type;
        trace!(window = ?self.id(), ?kind, x = event.x, y = event.y, "dispatch");

        if kind.is_window() {
            self.dispatch_window_event(&event)
        } else if kind.is_mouse() {
            self.dispatch_mouse(&event)
        } else if kind.is_keyboard() {
            self.dispatch_key(&event)
        } else {
            self.call_window_handler(&event)
        }
    }

    fn dispatch_window_event(&mut self, event: &UcEvent) -> bool {
        let handled = self.call_window_handler(event);
        match event.event_type {
            EventType::WindowResize => self.apply_resize(event.width, event.height),
            EventType::WindowMove => self.note_moved(event.x, event.y),
            EventType::WindowClose => {
                // a handler that consumes the close keeps the window open
                if !handled {
                    self.request_close();
                }
            }
            EventType::WindowMinimize => self.sync_native_state(WindowState::Minimized),
            EventType::WindowFocus => self.set_has_focus(true),
            EventType::WindowBlur => self.set_has_focus(false),
            EventType::WindowRepaint => {
                if event.width > 0 && event.height > 0 {
                    let rect = Rect2Di::new(event.x, event.y, event.width, event.height);
                    self.tree.dirty_mut().add(rect, false);
                } else {
                    self.tree.mark_full_redraw();
                }
            }
            _ => {}
        }
        true
    }

    fn dispatch_key(&mut self, event: &UcEvent) -> bool {
        if let Some(focused) = self.focused {
            if self.bubble(focused, event) {
                return true;
            }
        }
        self.call_window_handler(event)
    }

    fn dispatch_mouse(&mut self, event: &UcEvent) -> bool {
        self.pointer = event.position();
        match event.event_type {
            EventType::MouseLeave if !self.capture.is_captured() => {
                self.update_hover(None);
                return self.call_window_handler(event);
            }
            EventType::MouseEnter => {
                return self.route_mouse(&event.retyped(EventType::MouseMove));
            }
            _ => {}
        }

        let handled = self.route_mouse(event);
        if event.event_type == EventType::MouseDown
            && self
                .clicks
                .register_press(event.button, event.position(), event.timestamp)
        {
            let double = event.retyped(EventType::MouseDoubleClick);
            return self.route_mouse(&double) || handled;
        }
        handled
    }

    fn route_mouse(&mut self, event: &UcEvent) -> bool {
        if self.capture.is_captured() {
            return self.route_captured(event);
        }

        let position = event.position();
        let kind = event.event_type;

        if let Some(hit) = self.tree.hit_test_popups(position) {
            self.track_pointer(kind, hit);
            self.bubble(hit, event);
            if kind == EventType::MouseUp {
                self.clear_pressed();
            }
            return true;
        }

        let hit = self.tree.hit_test(position);
        if let Some(hit) = hit {
            self.track_pointer(kind, hit);
        } else if kind == EventType::MouseMove {
            self.update_hover(None);
        }

        let mut handled = hit.is_some_and(|h| self.bubble(h, event));
        if !handled && kind.is_wheel() {
            if let Some(hit) = hit {
                handled = self.scroll_wheel(hit, event);
            }
        }
        if kind == EventType::MouseUp {
            self.clear_pressed();
        }
        handled || self.call_window_handler(event)
    }

    /// Hover, focus and pressed bookkeeping for the element under the pointer
    fn track_pointer(&mut self, kind: EventType, hit: ElementId) {
        match kind {
            EventType::MouseMove => self.update_hover(Some(hit)),
            EventType::MouseDown => {
                self.focus_on_click(hit);
                self.press(hit);
            }
            _ => {}
        }
    }

    fn route_captured(&mut self, event: &UcEvent) -> bool {
        let Some(captured) = self.capture.captured() else {
            return false;
        };
        let kind = event.event_type;

        if matches!(kind, EventType::MouseMove | EventType::MouseDrag) {
            let mut handled = false;
            for synthesized in self.capture.track_move(event.position()) {
                let mut e = event.retyped(synthesized);
                let delta = self.capture.delta();
                e.delta_x = delta.x;
                e.delta_y = delta.y;
                e.button = self.capture.button();
                e.drag_data = self.capture.drag_payload().cloned();
                handled |= self.deliver_raw(captured, &e);
                if self.capture.captured() != Some(captured) {
                    break;
                }
            }
            return handled || self.call_window_handler(event);
        }

        if self.capture.is_release_event(kind, event.button) {
            return self.finish_capture(captured, event);
        }

        self.deliver_raw(captured, event) || self.call_window_handler(event)
    }

    /// Mouse-up of the capturing button: release, then resolve a drop
    fn finish_capture(&mut self, source: ElementId, event: &UcEvent) -> bool {
        let was_dragging = self.capture.is_dragging();
        let payload = self.capture.take_drag_payload();
        let handled = self.deliver_raw(source, event);
        self.release_mouse();
        self.clear_pressed();

        let position = event.position();
        let under = self
            .tree
            .hit_test_popups(position)
            .or_else(|| self.tree.hit_test(position));

        if was_dragging {
            let target = under.filter(|&t| t != source && !self.tree.is_ancestor(source, t));
            let mut drop = event.retyped(EventType::Drop);
            drop.drag_data = payload.clone();
            let accepted = target.is_some_and(|t| self.bubble(t, &drop));

            let mut end = event.retyped(EventType::DragEnd);
            end.drag_data = payload;
            end.drag_canceled = !accepted;
            self.deliver_raw(source, &end);
            trace!(?source, ?target, accepted, "drag finished");
        }

        self.update_hover(under);
        handled || was_dragging
    }

    /// Move focus to the nearest focusable element at or above `hit`
    fn focus_on_click(&mut self, hit: ElementId) {
        let mut current = Some(hit);
        while let Some(id) = current {
            let accepts = self
                .tree
                .core(id)
                .is_some_and(|c| c.is_active() && c.is_focusable());
            if accepts {
                self.set_focus(Some(id));
                return;
            }
            current = self.tree.parent(id);
        }
    }

    /// Scroll the nearest scrollable container that can still move
    fn scroll_wheel(&mut self, hit: ElementId, event: &UcEvent) -> bool {
        let step = event.wheel_delta * WHEEL_SCROLL_STEP;
        let (dx, dy) = match event.event_type {
            EventType::MouseWheelHorizontal => (step, 0),
            _ => (0, -step),
        };
        let mut current = Some(hit);
        while let Some(id) = current {
            let scrollable = self
                .tree
                .core(id)
                .and_then(|c| c.container())
                .is_some_and(|c| c.scrollable);
            if scrollable && self.tree.scroll_by(id, dx, dy).unwrap_or(false) {
                return true;
            }
            current = self.tree.parent(id);
        }
        false
    }

    fn update_hover(&mut self, top: Option<ElementId>) {
        let Some((left, entered)) = self.capture.update_hover(top) else {
            return;
        };
        let at = self.pointer;
        if let Some(left) = left {
            let _ = self.tree.set_hovered(left, false);
            let leave = UcEvent::mouse(EventType::MouseLeave, at.x, at.y, MouseButton::None);
            self.deliver(left, &leave);
        }
        if let Some(entered) = entered {
            let _ = self.tree.set_hovered(entered, true);
            let enter = UcEvent::mouse(EventType::MouseEnter, at.x, at.y, MouseButton::None);
            self.deliver(entered, &enter);
        }
        let cursor = entered
            .and_then(|e| self.tree.core(e))
            .map(|c| c.cursor())
            .unwrap_or_default();
        self.apply_cursor(cursor);
    }

    /// Offer `event` to `start` and then its active ancestors
    pub(crate) fn bubble(&mut self, start: ElementId, event: &UcEvent) -> bool {
        let mut current = Some(start);
        while let Some(id) = current {
            let parent = self.tree.parent(id);
            let active = self.tree.core(id).is_some_and(|c| c.is_active());
            if active && self.deliver(id, event) {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Deliver with mouse positions mapped into the element's coordinates
    pub(crate) fn deliver(&mut self, id: ElementId, event: &UcEvent) -> bool {
        if event.is_mouse() {
            let Some(bounds) = self.tree.actual_bounds_in_window(id) else {
                return false;
            };
            return self.deliver_raw(id, &event.with_offset(-bounds.x, -bounds.y));
        }
        self.deliver_raw(id, event)
    }

    fn deliver_raw(&mut self, id: ElementId, event: &UcEvent) -> bool {
        let mut cx = EventContext::new(id);
        let handled = self.tree.dispatch_to(id, event, &mut cx).unwrap_or(false);
        let requests = cx.into_requests();
        if !requests.is_empty() {
            self.apply_requests(id, requests);
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use uc_core::{DragDropData, KeyCode, Modifiers, RenderContext};
    use uc_platform::{HeadlessPlatform, WindowConfig};

    use crate::element::{ContainerData, Element, ElementCore, ElementOptions};

    type Log = Rc<RefCell<Vec<(&'static str, UcEvent)>>>;

    struct Tracer {
        name: &'static str,
        log: Log,
        consume: bool,
        capture_on_down: bool,
        drag_text: Option<&'static str>,
    }

    impl Tracer {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: Rc::clone(log),
                consume: true,
                capture_on_down: false,
                drag_text: None,
            }
        }

        fn passive(mut self) -> Self {
            self.consume = false;
            self
        }

        fn drag_source(mut self, text: &'static str) -> Self {
            self.capture_on_down = true;
            self.drag_text = Some(text);
            self
        }
    }

    impl Element for Tracer {
        fn render(&mut self, _core: &ElementCore, _ctx: &mut dyn RenderContext) {}

        fn on_event(&mut self, _core: &ElementCore, event: &UcEvent, cx: &mut EventContext) -> bool {
            self.log.borrow_mut().push((self.name, event.clone()));
            match event.event_type {
                EventType::MouseDown if self.capture_on_down => cx.capture_mouse(event.button),
                EventType::DragStart => {
                    if let Some(text) = self.drag_text {
                        cx.start_drag(DragDropData::text(text));
                    }
                }
                _ => {}
            }
            self.consume
        }
    }

    fn window() -> UcWindow {
        let mut platform = HeadlessPlatform::default();
        UcWindow::create(&mut platform, WindowConfig::new("dispatch").size(400, 300)).unwrap()
    }

    fn click(kind: EventType, x: i32, y: i32) -> UcEvent {
        UcEvent::mouse(kind, x, y, MouseButton::Left)
    }

    fn names(log: &Log) -> Vec<(&'static str, EventType)> {
        log.borrow().iter().map(|(n, e)| (*n, e.event_type)).collect()
    }

    #[test]
    fn test_popup_intercepts_click() {
        let log = Log::default();
        let mut w = window();
        let root = w.root();
        w.add_element(
            root,
            Tracer::new("button", &log),
            Rect2Di::new(10, 10, 100, 30),
            ElementOptions::new("button"),
        )
        .unwrap();
        let popup = w.tree_mut().insert(
            Tracer::new("popup", &log),
            Rect2Di::new(50, 20, 200, 150),
            ElementOptions::new("popup"),
        );
        w.open_popup(popup).unwrap();

        assert!(w.dispatch_event(&click(EventType::MouseDown, 60, 30)));
        let entries = log.borrow();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "popup");
        assert_eq!(entries[0].1.position(), Point2Di::new(10, 10));
    }

    #[test]
    fn test_click_bubbles_to_consuming_ancestor() {
        let log = Log::default();
        let mut w = window();
        let root = w.root();
        let panel = w
            .add_element(
                root,
                Tracer::new("panel", &log),
                Rect2Di::new(100, 100, 200, 100),
                ElementOptions::new("panel").container(ContainerData::new()),
            )
            .unwrap();
        w.add_element(
            panel,
            Tracer::new("label", &log).passive(),
            Rect2Di::new(10, 10, 50, 20),
            ElementOptions::new("label"),
        )
        .unwrap();

        assert!(w.dispatch_event(&click(EventType::MouseUp, 120, 115)));
        assert_eq!(
            names(&log),
            vec![("label", EventType::MouseUp), ("panel", EventType::MouseUp)]
        );
        assert_eq!(log.borrow()[0].1.position(), Point2Di::new(10, 5));
        assert_eq!(log.borrow()[1].1.position(), Point2Di::new(20, 15));
    }

    #[test]
    fn test_drag_threshold_and_drop() {
        let log = Log::default();
        let mut w = window();
        let root = w.root();
        let source = w
            .add_element(
                root,
                Tracer::new("source", &log).drag_source("payload"),
                Rect2Di::new(90, 90, 20, 20),
                ElementOptions::new("source"),
            )
            .unwrap();
        w.add_element(
            root,
            Tracer::new("target", &log),
            Rect2Di::new(200, 90, 50, 50),
            ElementOptions::new("target"),
        )
        .unwrap();

        w.dispatch_event(&click(EventType::MouseDown, 100, 100));
        assert_eq!(w.capture().captured(), Some(source));
        log.borrow_mut().clear();

        w.dispatch_event(&click(EventType::MouseMove, 103, 102));
        assert_eq!(names(&log), vec![("source", EventType::MouseMove)]);
        assert_eq!(log.borrow()[0].1.position(), Point2Di::new(103, 102));
        log.borrow_mut().clear();

        w.dispatch_event(&click(EventType::MouseMove, 106, 101));
        assert_eq!(
            names(&log),
            vec![("source", EventType::DragStart), ("source", EventType::MouseDrag)]
        );
        {
            let entries = log.borrow();
            let drag = &entries[1].1;
            assert_eq!((drag.delta_x, drag.delta_y), (3, -1));
            assert_eq!(drag.drag_data.as_ref().map(|d| d.text.as_str()), Some("payload"));
        }
        log.borrow_mut().clear();

        w.dispatch_event(&click(EventType::MouseMove, 210, 100));
        w.dispatch_event(&click(EventType::MouseUp, 210, 100));
        let entries = log.borrow();
        let kinds: Vec<_> = entries.iter().map(|(n, e)| (*n, e.event_type)).collect();
        assert!(kinds.contains(&("target", EventType::Drop)));
        let (_, end) = entries
            .iter()
            .find(|(n, e)| *n == "source" && e.event_type == EventType::DragEnd)
            .unwrap();
        assert!(!end.drag_canceled);
        assert!(!w.capture().is_captured());
    }

    #[test]
    fn test_drop_without_target_cancels() {
        let log = Log::default();
        let mut w = window();
        let root = w.root();
        w.add_element(
            root,
            Tracer::new("source", &log).drag_source("x"),
            Rect2Di::new(0, 0, 20, 20),
            ElementOptions::new("source"),
        )
        .unwrap();

        w.dispatch_event(&click(EventType::MouseDown, 5, 5));
        w.dispatch_event(&click(EventType::MouseMove, 150, 150));
        w.dispatch_event(&click(EventType::MouseUp, 150, 150));

        let entries = log.borrow();
        let (_, end) = entries
            .iter()
            .find(|(_, e)| e.event_type == EventType::DragEnd)
            .unwrap();
        assert!(end.drag_canceled);
    }

    #[test]
    fn test_focus_follows_clicks() {
        let log = Log::default();
        let mut w = window();
        let root = w.root();
        let a = w
            .add_element(
                root,
                Tracer::new("a", &log),
                Rect2Di::new(0, 0, 50, 50),
                ElementOptions::new("a").focusable(true),
            )
            .unwrap();
        let b = w
            .add_element(
                root,
                Tracer::new("b", &log),
                Rect2Di::new(100, 0, 50, 50),
                ElementOptions::new("b").focusable(true),
            )
            .unwrap();

        w.dispatch_event(&click(EventType::MouseDown, 10, 10));
        assert_eq!(w.focused(), Some(a));
        log.borrow_mut().clear();

        w.dispatch_event(&click(EventType::MouseDown, 110, 10));
        assert_eq!(w.focused(), Some(b));
        let kinds = names(&log);
        assert_eq!(kinds[0], ("a", EventType::FocusLost));
        assert_eq!(kinds[1], ("b", EventType::FocusGained));

        // empty area keeps focus
        w.dispatch_event(&click(EventType::MouseDown, 300, 200));
        assert_eq!(w.focused(), Some(b));

        log.borrow_mut().clear();
        let key = UcEvent::key(EventType::KeyDown, KeyCode::RETURN, Modifiers::NONE);
        assert!(w.dispatch_event(&key));
        assert_eq!(names(&log), vec![("b", EventType::KeyDown)]);
    }

    #[test]
    fn test_wheel_scrolls_container() {
        let log = Log::default();
        let mut w = window();
        let root = w.root();
        let list = w
            .add_element(
                root,
                Tracer::new("list", &log).passive(),
                Rect2Di::new(0, 0, 100, 100),
                ElementOptions::new("list").container(
                    ContainerData::new()
                        .with_content_size(100, 400)
                        .scrollable(true),
                ),
            )
            .unwrap();

        let mut wheel = UcEvent::mouse(EventType::MouseWheel, 50, 50, MouseButton::None);
        wheel.wheel_delta = -1;
        assert!(w.dispatch_event(&wheel));
        assert_eq!(w.tree().effective_scroll(list), (0, WHEEL_SCROLL_STEP));

        wheel.wheel_delta = 1;
        assert!(w.dispatch_event(&wheel));
        assert_eq!(w.tree().effective_scroll(list), (0, 0));
        // already at the top
        assert!(!w.dispatch_event(&wheel));
    }

    #[test]
    fn test_double_click_synthesized() {
        let log = Log::default();
        let mut w = window();
        let root = w.root();
        w.add_element(
            root,
            Tracer::new("item", &log),
            Rect2Di::new(0, 0, 100, 100),
            ElementOptions::new("item"),
        )
        .unwrap();

        w.dispatch_event(&click(EventType::MouseDown, 10, 10));
        w.dispatch_event(&click(EventType::MouseUp, 10, 10));
        w.dispatch_event(&click(EventType::MouseDown, 11, 11));
        let kinds = names(&log);
        assert_eq!(kinds.last(), Some(&("item", EventType::MouseDoubleClick)));

        log.borrow_mut().clear();
        w.dispatch_event(&click(EventType::MouseDown, 60, 60));
        assert!(!names(&log).contains(&("item", EventType::MouseDoubleClick)));
    }

    #[test]
    fn test_click_tracker_limits() {
        let start = Instant::now();
        let mut clicks = ClickTracker::default();
        let p = Point2Di::new(10, 10);
        assert!(!clicks.register_press(MouseButton::Left, p, start));
        assert!(!clicks.register_press(
            MouseButton::Left,
            p,
            start + Duration::from_millis(500)
        ));
        assert!(!clicks.register_press(
            MouseButton::Right,
            p,
            start + Duration::from_millis(600)
        ));
        assert!(clicks.register_press(
            MouseButton::Right,
            Point2Di::new(12, 12),
            start + Duration::from_millis(700)
        ));
    }

    #[test]
    fn test_hover_enter_leave_pairs() {
        let log = Log::default();
        let mut w = window();
        let root = w.root();
        let a = w
            .add_element(
                root,
                Tracer::new("a", &log),
                Rect2Di::new(0, 0, 50, 50),
                ElementOptions::new("a").cursor(uc_platform::Cursor::Pointer),
            )
            .unwrap();
        w.add_element(
            root,
            Tracer::new("b", &log),
            Rect2Di::new(60, 0, 50, 50),
            ElementOptions::new("b"),
        )
        .unwrap();

        w.dispatch_event(&click(EventType::MouseMove, 10, 10));
        assert!(w.tree().core(a).unwrap().is_hovered());
        assert_eq!(w.cursor(), uc_platform::Cursor::Pointer);
        w.dispatch_event(&click(EventType::MouseMove, 70, 10));

        let kinds: Vec<_> = names(&log)
            .into_iter()
            .filter(|(_, k)| matches!(k, EventType::MouseEnter | EventType::MouseLeave))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("a", EventType::MouseEnter),
                ("a", EventType::MouseLeave),
                ("b", EventType::MouseEnter),
            ]
        );
        assert!(!w.tree().core(a).unwrap().is_hovered());
        assert_eq!(w.cursor(), uc_platform::Cursor::Default);
    }

    #[test]
    fn test_close_handler_veto() {
        let mut w = window();
        w.show().unwrap();
        let veto = Rc::new(RefCell::new(true));
        let flag = Rc::clone(&veto);
        w.set_event_handler(move |e| e.event_type == EventType::WindowClose && *flag.borrow());

        w.dispatch_event(&UcEvent::new(EventType::WindowClose));
        assert_eq!(w.state(), WindowState::Normal);

        *veto.borrow_mut() = false;
        w.dispatch_event(&UcEvent::new(EventType::WindowClose));
        assert!(w.is_closing());
        assert!(w.show().is_err());
        assert!(w.maximize().is_err());
    }

    #[test]
    fn test_timer_reaches_element() {
        let log = Log::default();
        let mut w = window();
        let root = w.root();
        let e = w
            .add_element(
                root,
                Tracer::new("clock", &log),
                Rect2Di::new(0, 0, 10, 10),
                ElementOptions::new("clock"),
            )
            .unwrap();
        w.start_timer(e, 7, Duration::from_millis(10), false);
        assert_eq!(w.process_timers(Instant::now() + Duration::from_millis(20)), 1);
        let entries = log.borrow();
        assert_eq!(entries[0].1.event_type, EventType::Timer);
        assert_eq!(entries[0].1.timer_id, 7);
    }

    #[test]
    fn test_destroying_captured_element_releases() {
        let log = Log::default();
        let mut w = window();
        let root = w.root();
        let source = w
            .add_element(
                root,
                Tracer::new("source", &log).drag_source("x"),
                Rect2Di::new(0, 0, 20, 20),
                ElementOptions::new("source").focusable(true),
            )
            .unwrap();
        w.dispatch_event(&click(EventType::MouseDown, 5, 5));
        assert!(w.capture().is_captured());
        assert_eq!(w.focused(), Some(source));

        w.destroy_element(source).unwrap();
        assert!(!w.capture().is_captured());
        assert_eq!(w.focused(), None);
        assert!(!w.dispatch_event(&click(EventType::MouseMove, 30, 30)));
    }

    #[test]
    fn test_destroying_ancestor_releases_capture() {
        let log = Log::default();
        let mut w = window();
        let root = w.root();
        let panel = w
            .add_element(
                root,
                Tracer::new("panel", &log).passive(),
                Rect2Di::new(50, 50, 100, 100),
                ElementOptions::new("panel").container(ContainerData::new()),
            )
            .unwrap();
        w.add_element(
            panel,
            Tracer::new("source", &log).drag_source("x"),
            Rect2Di::new(10, 10, 20, 20),
            ElementOptions::new("source"),
        )
        .unwrap();
        w.dispatch_event(&click(EventType::MouseDown, 65, 65));
        assert!(w.capture().is_captured());

        w.destroy_element(panel).unwrap();
        assert!(!w.capture().is_captured());
        assert!(w.tree().find_child_by_id(root, "source").is_none());
    }
}
