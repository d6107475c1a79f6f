//! Mouse capture, drag detection and hover tracking
//!
//! # Architecture
//!
//! ```text
//! MouseDown ──► capture(E) ──► Captured ──(moved ≥ threshold)──► Dragging
//!                                 │                                  │
//!                            MouseMove                     DragStart, MouseDrag…
//!                                 │                                  │
//!                      MouseUp(same button) ──► release ◄── Drop / DragEnd
//! ```
//!
//! Only one element per UI thread may hold the capture. The owning window is
//! recorded in a thread-local so a second window cannot capture concurrently.

use std::cell::Cell;

use smallvec::{smallvec, SmallVec};
use tracing::{debug, warn};
use uc_core::{CoreError, DragDropData, EventType, MouseButton, Point2Di, WindowId};

use crate::element::ElementId;

/// Default drag threshold in pixels
pub const DEFAULT_DRAG_THRESHOLD: f64 = 5.0;

thread_local! {
    static CAPTURE_OWNER: Cell<Option<WindowId>> = const { Cell::new(None) };
}

/// Window holding the capture on this thread
pub fn capture_owner() -> Option<WindowId> {
    CAPTURE_OWNER.with(|owner| owner.get())
}

/// Capture state machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaptureState {
    #[default]
    None,
    Captured,
    Dragging,
    Hovering,
}

/// Capture and hover bookkeeping for one window
#[derive(Clone, Debug)]
pub struct MouseCapture {
    window: WindowId,
    captured: Option<ElementId>,
    origin: Point2Di,
    current: Point2Di,
    delta: Point2Di,
    button: MouseButton,
    state: CaptureState,
    threshold: f64,
    hover_stack: Vec<ElementId>,
    payload: Option<DragDropData>,
}

impl MouseCapture {
    pub fn new(window: WindowId) -> Self {
        Self {
            window,
            captured: None,
            origin: Point2Di::default(),
            current: Point2Di::default(),
            delta: Point2Di::default(),
            button: MouseButton::None,
            state: CaptureState::None,
            threshold: DEFAULT_DRAG_THRESHOLD,
            hover_stack: Vec::new(),
            payload: None,
        }
    }

    pub fn set_drag_threshold(&mut self, threshold: f64) {
        self.threshold = threshold.max(0.0);
    }

    pub fn drag_threshold(&self) -> f64 {
        self.threshold
    }

    /// Route all mouse input to `element` until release
    pub fn capture(
        &mut self,
        element: ElementId,
        button: MouseButton,
        at: Point2Di,
    ) -> Result<(), CoreError> {
        match self.captured {
            Some(current) if current == element => return Ok(()),
            Some(current) => {
                return Err(CoreError::StateViolation(format!(
                    "mouse already captured by {:?}",
                    current
                )))
            }
            None => {}
        }
        let owner = capture_owner();
        if owner.is_some_and(|w| w != self.window) {
            return Err(CoreError::StateViolation(format!(
                "mouse already captured in window {:?}",
                owner
            )));
        }
        CAPTURE_OWNER.with(|o| o.set(Some(self.window)));
        self.captured = Some(element);
        self.button = button;
        self.origin = at;
        self.current = at;
        self.delta = Point2Di::default();
        self.state = CaptureState::Captured;
        self.payload = None;
        debug!(?element, ?button, "mouse captured");
        Ok(())
    }

    /// End the capture, returning the element that held it
    pub fn release(&mut self) -> Option<ElementId> {
        let released = self.captured.take()?;
        if capture_owner() == Some(self.window) {
            CAPTURE_OWNER.with(|o| o.set(None));
        }
        self.state = if self.hover_stack.is_empty() {
            CaptureState::None
        } else {
            CaptureState::Hovering
        };
        self.button = MouseButton::None;
        self.delta = Point2Di::default();
        debug!(element = ?released, "mouse released");
        Some(released)
    }

    pub fn captured(&self) -> Option<ElementId> {
        self.captured
    }

    pub fn is_captured(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.state == CaptureState::Dragging
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn button(&self) -> MouseButton {
        self.button
    }

    pub fn origin(&self) -> Point2Di {
        self.origin
    }

    pub fn current(&self) -> Point2Di {
        self.current
    }

    /// Motion since the previous move
    pub fn delta(&self) -> Point2Di {
        self.delta
    }

    /// Advance with a pointer move; returns the events for the captured element
    pub fn track_move(&mut self, position: Point2Di) -> SmallVec<[EventType; 2]> {
        self.delta = position - self.current;
        self.current = position;
        match self.state {
            CaptureState::Captured => {
                if self.origin.distance_to(position) >= self.threshold {
                    self.state = CaptureState::Dragging;
                    debug!(element = ?self.captured, "drag started");
                    smallvec![EventType::DragStart, EventType::MouseDrag]
                } else {
                    smallvec![EventType::MouseMove]
                }
            }
            CaptureState::Dragging => smallvec![EventType::MouseDrag],
            _ => smallvec![EventType::MouseMove],
        }
    }

    /// A mouse-up that ends the capture
    pub fn is_release_event(&self, event_type: EventType, button: MouseButton) -> bool {
        self.captured.is_some() && event_type == EventType::MouseUp && button == self.button
    }

    pub fn set_drag_payload(&mut self, data: DragDropData) {
        if self.captured.is_none() {
            warn!("drag payload set without a capture");
        }
        self.payload = Some(data);
    }

    pub fn drag_payload(&self) -> Option<&DragDropData> {
        self.payload.as_ref()
    }

    pub fn take_drag_payload(&mut self) -> Option<DragDropData> {
        self.payload.take()
    }

    pub fn hovered(&self) -> Option<ElementId> {
        self.hover_stack.last().copied()
    }

    pub fn hover_stack(&self) -> &[ElementId] {
        &self.hover_stack
    }

    /// Record the element under the pointer
    ///
    /// Returns `(left, entered)` when the hovered element changed.
    pub fn update_hover(
        &mut self,
        top: Option<ElementId>,
    ) -> Option<(Option<ElementId>, Option<ElementId>)> {
        if self.hovered() == top {
            return None;
        }
        let left = self.hover_stack.pop();
        self.hover_stack.clear();
        if let Some(top) = top {
            self.hover_stack.push(top);
        }
        if self.captured.is_none() {
            self.state = if top.is_some() {
                CaptureState::Hovering
            } else {
                CaptureState::None
            };
        }
        Some((left, top))
    }

    /// Forget a destroyed element; releases the capture it held
    pub fn element_removed(&mut self, element: ElementId) -> bool {
        self.hover_stack.retain(|&e| e != element);
        if self.captured == Some(element) {
            self.payload = None;
            self.release();
            return true;
        }
        false
    }
}

impl Drop for MouseCapture {
    fn drop(&mut self) {
        if self.captured.is_some() && capture_owner() == Some(self.window) {
            CAPTURE_OWNER.with(|o| o.set(None));
        }
    }
}
