//! Element records and the element behavior trait
//!
//! An element is split in two halves stored side by side in the tree arena:
//!
//! - [`ElementCore`]: identity, geometry, flags and container data, owned and
//!   mutated by the tree so every change can be tracked as a dirty region
//! - a boxed [`Element`] behavior: drawing and event handling supplied by the
//!   widget implementation
//!
//! Handlers never mutate the tree directly. They queue [`UiRequest`]s on the
//! [`EventContext`], and the window applies them once the handler returns.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use slotmap::new_key_type;
use uc_core::{DragDropData, Insets, MouseButton, Rect2Di, RenderContext, UcEvent};
use uc_platform::Cursor;

use crate::tree::ElementTree;

new_key_type! {
    /// Key of an element in the window's element arena
    pub struct ElementId;
}

/// How the element wants pointer input interpreted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MouseControl {
    Button,
    #[default]
    Object2D,
    Object3D,
    Input,
}

/// Child list and content geometry of a container element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContainerData {
    pub(crate) children: Vec<ElementId>,
    pub padding: Insets,
    pub border_width: f32,
    pub(crate) scroll_x: i32,
    pub(crate) scroll_y: i32,
    /// Explicit content size; `None` uses the children's extent
    pub content_size: Option<(i32, i32)>,
    /// Wheel events scroll this container
    pub scrollable: bool,
}

impl ContainerData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_border(mut self, width: f32) -> Self {
        self.border_width = width;
        self
    }

    pub fn with_content_size(mut self, width: i32, height: i32) -> Self {
        self.content_size = Some((width, height));
        self
    }

    pub fn scrollable(mut self, scrollable: bool) -> Self {
        self.scrollable = scrollable;
        self
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn scroll(&self) -> (i32, i32) {
        (self.scroll_x, self.scroll_y)
    }

    /// Content area relative to the container's top-left corner
    pub fn content_area(&self, bounds: &Rect2Di) -> Rect2Di {
        let b = self.border_width.max(0.0);
        Rect2Di::new(0, 0, bounds.width, bounds.height).inset(
            (b + self.padding.left).round() as i32,
            (b + self.padding.top).round() as i32,
            (b + self.padding.right).round() as i32,
            (b + self.padding.bottom).round() as i32,
        )
    }
}

/// Creation options for an element
#[derive(Clone, Debug, PartialEq)]
pub struct ElementOptions {
    pub identifier: String,
    pub z_index: i32,
    pub visible: bool,
    pub active: bool,
    pub focusable: bool,
    pub cursor: Cursor,
    pub mouse_control: MouseControl,
    pub container: Option<ContainerData>,
}

impl Default for ElementOptions {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            z_index: 0,
            visible: true,
            active: true,
            focusable: false,
            cursor: Cursor::Default,
            mouse_control: MouseControl::Object2D,
            container: None,
        }
    }
}

impl ElementOptions {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn z_index(mut self, z: i32) -> Self {
        self.z_index = z;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }

    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn mouse_control(mut self, control: MouseControl) -> Self {
        self.mouse_control = control;
        self
    }

    pub fn container(mut self, container: ContainerData) -> Self {
        self.container = Some(container);
        self
    }
}

/// Tree-owned half of an element
#[derive(Clone, Debug)]
pub struct ElementCore {
    identifier: String,
    numeric_id: u64,
    pub(crate) bounds: Rect2Di,
    pub(crate) visible: bool,
    pub(crate) active: bool,
    pub(crate) focusable: bool,
    pub(crate) focused: bool,
    pub(crate) hovered: bool,
    pub(crate) pressed: bool,
    pub(crate) needs_redraw: bool,
    pub(crate) parent: Option<ElementId>,
    pub(crate) z_index: i32,
    /// Insertion order, breaks z ties
    pub(crate) seq: u64,
    pub(crate) cursor: Cursor,
    pub(crate) mouse_control: MouseControl,
    pub(crate) container: Option<ContainerData>,
}

impl ElementCore {
    pub(crate) fn new(bounds: Rect2Di, options: ElementOptions) -> Self {
        static NEXT_NUMERIC_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            identifier: options.identifier,
            numeric_id: NEXT_NUMERIC_ID.fetch_add(1, Ordering::Relaxed),
            bounds,
            visible: options.visible,
            active: options.active,
            focusable: options.focusable,
            focused: false,
            hovered: false,
            pressed: false,
            needs_redraw: true,
            parent: None,
            z_index: options.z_index,
            seq: 0,
            cursor: options.cursor,
            mouse_control: options.mouse_control,
            container: options.container,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Process-unique numeric id
    pub fn numeric_id(&self) -> u64 {
        self.numeric_id
    }

    /// Bounds in the parent's content coordinates
    pub fn bounds(&self) -> Rect2Di {
        self.bounds
    }

    /// Bounds moved to the origin, the space `render` draws in
    pub fn local_bounds(&self) -> Rect2Di {
        Rect2Di::new(0, 0, self.bounds.width, self.bounds.height)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_focusable(&self) -> bool {
        self.focusable
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn mouse_control(&self) -> MouseControl {
        self.mouse_control
    }

    pub fn container(&self) -> Option<&ContainerData> {
        self.container.as_ref()
    }

    pub fn is_container(&self) -> bool {
        self.container.is_some()
    }

    /// Paint order key among siblings
    pub(crate) fn order_key(&self) -> (i32, u64) {
        (self.z_index, self.seq)
    }
}

/// Downcasting support for element behaviors
pub trait AsAny: 'static {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Element behavior
///
/// The renderer pushes a state frame and translates to the element's
/// top-left before calling [`Element::render`], so drawing happens in local
/// coordinates. Children are rendered separately by the tree.
pub trait Element: AsAny {
    /// Draw the element itself
    fn render(&mut self, core: &ElementCore, ctx: &mut dyn RenderContext);

    /// Handle an event already mapped to element coordinates
    ///
    /// Returning `true` stops propagation.
    fn on_event(&mut self, _core: &ElementCore, _event: &UcEvent, _cx: &mut EventContext) -> bool {
        false
    }

    /// Arrange children after a resize or child addition
    fn perform_layout(&mut self, _id: ElementId, _tree: &mut ElementTree) {}

    /// Hit test in parent-local coordinates
    fn contains(&self, core: &ElementCore, x: i32, y: i32) -> bool {
        core.bounds().contains_xy(x, y)
    }
}

/// Deferred change requested by an event handler
#[derive(Clone, Debug, PartialEq)]
pub enum UiRequest {
    Redraw,
    SetBounds(Rect2Di),
    SetVisible(bool),
    SetPressed(bool),
    Focus,
    Blur,
    CaptureMouse(MouseButton),
    ReleaseMouse,
    StartDrag(DragDropData),
    ScrollTo(i32, i32),
    ScrollBy(i32, i32),
    OpenPopup(ElementId),
    ClosePopup(ElementId),
    CloseAllPopups,
    StartTimer {
        timer_id: u64,
        interval: Duration,
        repeat: bool,
    },
    StopTimer(u64),
    SetCursor(Cursor),
    BringToFront,
    SendToBack,
    CloseWindow,
}

/// Request queue handed to [`Element::on_event`]
#[derive(Debug)]
pub struct EventContext {
    target: ElementId,
    requests: Vec<UiRequest>,
}

impl EventContext {
    pub(crate) fn new(target: ElementId) -> Self {
        Self {
            target,
            requests: Vec::new(),
        }
    }

    /// The element receiving the event
    pub fn target(&self) -> ElementId {
        self.target
    }

    pub fn request(&mut self, request: UiRequest) {
        self.requests.push(request);
    }

    /// Repaint after a text or style change
    pub fn request_redraw(&mut self) {
        self.request(UiRequest::Redraw);
    }

    pub fn set_bounds(&mut self, bounds: Rect2Di) {
        self.request(UiRequest::SetBounds(bounds));
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.request(UiRequest::SetVisible(visible));
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.request(UiRequest::SetPressed(pressed));
    }

    pub fn focus(&mut self) {
        self.request(UiRequest::Focus);
    }

    pub fn blur(&mut self) {
        self.request(UiRequest::Blur);
    }

    pub fn capture_mouse(&mut self, button: MouseButton) {
        self.request(UiRequest::CaptureMouse(button));
    }

    pub fn release_mouse(&mut self) {
        self.request(UiRequest::ReleaseMouse);
    }

    /// Attach the payload of a drag started from this element
    pub fn start_drag(&mut self, data: DragDropData) {
        self.request(UiRequest::StartDrag(data));
    }

    pub fn scroll_to(&mut self, x: i32, y: i32) {
        self.request(UiRequest::ScrollTo(x, y));
    }

    pub fn scroll_by(&mut self, dx: i32, dy: i32) {
        self.request(UiRequest::ScrollBy(dx, dy));
    }

    pub fn open_popup(&mut self, popup: ElementId) {
        self.request(UiRequest::OpenPopup(popup));
    }

    pub fn close_popup(&mut self, popup: ElementId) {
        self.request(UiRequest::ClosePopup(popup));
    }

    pub fn close_all_popups(&mut self) {
        self.request(UiRequest::CloseAllPopups);
    }

    pub fn start_timer(&mut self, timer_id: u64, interval: Duration, repeat: bool) {
        self.request(UiRequest::StartTimer {
            timer_id,
            interval,
            repeat,
        });
    }

    pub fn stop_timer(&mut self, timer_id: u64) {
        self.request(UiRequest::StopTimer(timer_id));
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.request(UiRequest::SetCursor(cursor));
    }

    pub fn bring_to_front(&mut self) {
        self.request(UiRequest::BringToFront);
    }

    pub fn send_to_back(&mut self) {
        self.request(UiRequest::SendToBack);
    }

    pub fn close_window(&mut self) {
        self.request(UiRequest::CloseWindow);
    }

    pub fn requests(&self) -> &[UiRequest] {
        &self.requests
    }

    pub(crate) fn into_requests(self) -> Vec<UiRequest> {
        self.requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_area_subtracts_border_and_padding() {
        let container = ContainerData::new()
            .with_border(2.0)
            .with_padding(Insets::new(3.0, 4.0, 5.0, 6.0));
        let area = container.content_area(&Rect2Di::new(50, 50, 100, 80));
        assert_eq!(area, Rect2Di::new(5, 6, 100 - 5 - 7, 80 - 6 - 8));
    }

    #[test]
    fn test_content_area_never_negative() {
        let container = ContainerData::new().with_padding(Insets::uniform(40.0));
        let area = container.content_area(&Rect2Di::new(0, 0, 50, 50));
        assert_eq!((area.width, area.height), (0, 0));
    }

    #[test]
    fn test_numeric_ids_unique() {
        let a = ElementCore::new(Rect2Di::default(), ElementOptions::new("a"));
        let b = ElementCore::new(Rect2Di::default(), ElementOptions::new("a"));
        assert_ne!(a.numeric_id(), b.numeric_id());
        assert_eq!(a.identifier(), b.identifier());
    }

    #[test]
    fn test_event_context_queues_in_order() {
        let mut cx = EventContext::new(ElementId::default());
        cx.capture_mouse(MouseButton::Left);
        cx.request_redraw();
        cx.start_timer(7, Duration::from_millis(10), false);
        assert_eq!(
            cx.requests(),
            &[
                UiRequest::CaptureMouse(MouseButton::Left),
                UiRequest::Redraw,
                UiRequest::StartTimer {
                    timer_id: 7,
                    interval: Duration::from_millis(10),
                    repeat: false
                },
            ]
        );
    }
}
