//! Render context interface
//!
//! [`RenderContext`] is the abstract 2D drawing surface every backend
//! implements. State handling (the push/pop stack of styles, clip, transform
//! and alpha) is shared: implementors expose their [`StateStack`] and get the
//! state, transform, clip and style operations for free. Backends only
//! implement the primitives.
//!
//! Coordinates passed to drawing calls are in the current transformed space.
//! Clips are stored in device space, as the bounding box of the transformed
//! rectangle.

use std::any::Any;
use std::sync::Arc;

use tracing::warn;

use crate::color::Color;
use crate::geometry::{Point2Df, Rect2Df, Rect2Di};
use crate::style::{DrawingStyle, FillMode, TextAlign, TextStyle};
use crate::text::{text_measurer, TextLayout, TextMetrics};
use crate::transform::Affine2D;

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

/// One frame of the render state stack
#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
    pub drawing_style: DrawingStyle,
    pub text_style: TextStyle,
    /// Device-space clip; `None` is unbounded
    pub clip: Option<Rect2Df>,
    pub transform: Affine2D,
    pub global_alpha: f32,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            drawing_style: DrawingStyle::default(),
            text_style: TextStyle::default(),
            clip: None,
            transform: Affine2D::IDENTITY,
            global_alpha: 1.0,
        }
    }
}

/// Stack of render states; never empty
#[derive(Clone, Debug)]
pub struct StateStack {
    frames: Vec<RenderState>,
}

impl Default for StateStack {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStack {
    pub fn new() -> Self {
        Self {
            frames: vec![RenderState::default()],
        }
    }

    pub fn current(&self) -> &RenderState {
        // Invariant: the root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut RenderState {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Save a copy of the current frame
    pub fn push(&mut self) {
        let top = self.current().clone();
        self.frames.push(top);
    }

    /// Restore the previous frame; a no-op at the root
    pub fn pop(&mut self) -> bool {
        if self.frames.len() <= 1 {
            warn!("pop_state called on the root render state");
            return false;
        }
        self.frames.pop();
        true
    }

    /// Drop all saved frames and reset the root to defaults
    pub fn reset(&mut self) {
        self.frames.truncate(1);
        self.frames[0] = RenderState::default();
    }

    /// Number of pushed frames above the root
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Replace the current frame's clip
    pub fn set_clip(&mut self, rect: &Rect2Df) {
        let state = self.current_mut();
        state.clip = Some(state.transform.transform_rect(rect));
    }

    /// Narrow the current frame's clip
    pub fn intersect_clip(&mut self, rect: &Rect2Df) {
        let state = self.current_mut();
        let device = state.transform.transform_rect(rect);
        state.clip = Some(match state.clip {
            Some(clip) => clip
                .intersection(&device)
                .unwrap_or(Rect2Df::new(device.x, device.y, 0.0, 0.0)),
            None => device,
        });
    }

    pub fn clear_clip(&mut self) {
        self.current_mut().clip = None;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pixel snapshots
// ─────────────────────────────────────────────────────────────────────────────

/// Copy of surface pixels under a device rectangle
///
/// Pixels are straight RGBA8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelSnapshot {
    pub bounds: Rect2Di,
    pub pixels: Arc<Vec<u8>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Render context
// ─────────────────────────────────────────────────────────────────────────────

/// Abstract 2D drawing surface
///
/// Calls on an invalid context are logged no-ops. Backend failures fall back
/// to defaults rather than returning errors.
pub trait RenderContext {
    fn state_stack(&self) -> &StateStack;

    fn state_stack_mut(&mut self) -> &mut StateStack;

    fn text_layout(&self) -> &TextLayout;

    fn text_layout_mut(&mut self) -> &mut TextLayout;

    // ─────────────────────────────────────────────────────────────────────────
    // State
    // ─────────────────────────────────────────────────────────────────────────

    fn push_state(&mut self) {
        self.state_stack_mut().push();
    }

    fn pop_state(&mut self) {
        self.state_stack_mut().pop();
    }

    fn reset_state(&mut self) {
        self.state_stack_mut().reset();
    }

    fn state_depth(&self) -> usize {
        self.state_stack().depth()
    }

    fn current_state(&self) -> &RenderState {
        self.state_stack().current()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transform
    // ─────────────────────────────────────────────────────────────────────────

    fn translate(&mut self, dx: f32, dy: f32) {
        self.concat_transform(&Affine2D::translation(dx, dy));
    }

    /// Rotate by `angle` radians
    fn rotate(&mut self, angle: f32) {
        self.concat_transform(&Affine2D::rotation(angle));
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.concat_transform(&Affine2D::scale(sx, sy));
    }

    /// Multiply on the right: `other` applies before the current transform
    fn concat_transform(&mut self, other: &Affine2D) {
        let state = self.state_stack_mut().current_mut();
        state.transform = state.transform.then(other);
    }

    fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.state_stack_mut().current_mut().transform = Affine2D::new(a, b, c, d, e, f);
    }

    fn reset_transform(&mut self) {
        self.state_stack_mut().current_mut().transform = Affine2D::IDENTITY;
    }

    fn transform(&self) -> Affine2D {
        self.state_stack().current().transform
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Clipping
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the clip of the current state frame
    fn set_clip_rect(&mut self, rect: Rect2Df) {
        self.state_stack_mut().set_clip(&rect);
    }

    /// Narrow the current clip
    fn intersect_clip_rect(&mut self, rect: Rect2Df) {
        self.state_stack_mut().intersect_clip(&rect);
    }

    fn clear_clip_rect(&mut self) {
        self.state_stack_mut().clear_clip();
    }

    /// Device-space clip, `None` when unbounded
    fn clip_rect(&self) -> Option<Rect2Df> {
        self.state_stack().current().clip
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Style
    // ─────────────────────────────────────────────────────────────────────────

    fn set_drawing_style(&mut self, style: DrawingStyle) {
        self.state_stack_mut().current_mut().drawing_style = style;
    }

    fn drawing_style(&self) -> &DrawingStyle {
        &self.state_stack().current().drawing_style
    }

    fn set_text_style(&mut self, style: TextStyle) {
        self.state_stack_mut().current_mut().text_style = style;
    }

    fn text_style(&self) -> &TextStyle {
        &self.state_stack().current().text_style
    }

    /// Alpha multiplied into every subsequent draw
    fn set_global_alpha(&mut self, alpha: f32) {
        self.state_stack_mut().current_mut().global_alpha = alpha.clamp(0.0, 1.0);
    }

    fn global_alpha(&self) -> f32 {
        self.state_stack().current().global_alpha
    }

    fn set_fill_color(&mut self, color: Color) {
        let style = &mut self.state_stack_mut().current_mut().drawing_style;
        style.fill_mode = FillMode::Solid;
        style.fill_color = color;
    }

    fn set_stroke_color(&mut self, color: Color) {
        let style = &mut self.state_stack_mut().current_mut().drawing_style;
        style.has_stroke = true;
        style.stroke_color = color;
    }

    fn set_stroke_width(&mut self, width: f32) {
        self.state_stack_mut().current_mut().drawing_style.stroke_width = width.max(0.0);
    }

    fn set_font(&mut self, family: &str, size: f32) {
        let style = &mut self.state_stack_mut().current_mut().text_style;
        style.font_family = family.to_string();
        style.font_size = size;
    }

    fn set_text_color(&mut self, color: Color) {
        self.state_stack_mut().current_mut().text_style.color = color;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shapes
    // ─────────────────────────────────────────────────────────────────────────

    fn draw_line(&mut self, start: Point2Df, end: Point2Df);

    fn draw_rectangle(&mut self, rect: Rect2Df);

    fn fill_rectangle(&mut self, rect: Rect2Df);

    fn draw_rounded_rectangle(&mut self, rect: Rect2Df, radius: f32);

    fn fill_rounded_rectangle(&mut self, rect: Rect2Df, radius: f32);

    fn draw_circle(&mut self, center: Point2Df, radius: f32);

    fn fill_circle(&mut self, center: Point2Df, radius: f32);

    /// Ellipse inscribed in `rect`
    fn draw_ellipse(&mut self, rect: Rect2Df);

    fn fill_ellipse(&mut self, rect: Rect2Df);

    /// Arc from `start_angle` to `end_angle` radians, clockwise
    fn draw_arc(&mut self, center: Point2Df, radius: f32, start_angle: f32, end_angle: f32);

    /// Cubic Bézier curve
    fn draw_bezier(&mut self, start: Point2Df, c1: Point2Df, c2: Point2Df, end: Point2Df);

    /// Polyline, optionally closed
    fn draw_path(&mut self, points: &[Point2Df], closed: bool);

    /// Fill the closed polygon through `points`
    fn fill_path(&mut self, points: &[Point2Df]);

    /// Fill with the fill style, then stroke when enabled
    fn draw_filled_rectangle(&mut self, rect: Rect2Df) {
        if self.drawing_style().fill_mode != FillMode::None {
            self.fill_rectangle(rect);
        }
        if self.drawing_style().has_stroke {
            self.draw_rectangle(rect);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Text
    // ─────────────────────────────────────────────────────────────────────────

    /// Draw a single run with its baseline at `position`
    fn draw_text(&mut self, text: &str, position: Point2Df);

    /// Lay out and draw text inside `rect`
    fn draw_text_in_rect(&mut self, text: &str, rect: Rect2Df) {
        let style = self.text_style().clone();
        let block = self.text_layout().layout_in_rect(text, &style, &rect);

        for line in &block.lines {
            if style.align != TextAlign::Justify || line.extra_word_spacing <= 0.0 {
                self.draw_text(&line.text, Point2Df::new(line.x, line.baseline));
                continue;
            }
            // Justified: place words individually
            let space = self.measure_text(" ").width;
            let mut x = line.x;
            for word in line.text.split_whitespace() {
                self.draw_text(word, Point2Df::new(x, line.baseline));
                x += self.measure_text(word).width + space + line.extra_word_spacing;
            }
        }
    }

    /// Pixel size of the laid-out string under the current text style
    fn measure_text(&self, text: &str) -> TextMetrics {
        self.text_layout().measure(text, self.text_style())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Images
    // ─────────────────────────────────────────────────────────────────────────

    /// Draw an image at its natural size
    fn draw_image(&mut self, path: &str, position: Point2Df) {
        match self.image_dimensions(path) {
            Some((w, h)) => {
                let dest = Rect2Df::new(position.x, position.y, w as f32, h as f32);
                self.draw_image_in_rect(path, dest);
            }
            None => warn!(path, "image unavailable, skipping draw"),
        }
    }

    /// Scale an image into `dest`
    fn draw_image_in_rect(&mut self, path: &str, dest: Rect2Df) {
        match self.image_dimensions(path) {
            Some((w, h)) => {
                let src = Rect2Df::new(0.0, 0.0, w as f32, h as f32);
                self.draw_image_region(path, src, dest);
            }
            None => warn!(path, "image unavailable, skipping draw"),
        }
    }

    /// Blit the `src` sub-rectangle of an image into `dest`
    fn draw_image_region(&mut self, path: &str, src: Rect2Df, dest: Rect2Df);

    fn is_image_format_supported(&self, path: &str) -> bool;

    fn image_dimensions(&self, path: &str) -> Option<(u32, u32)>;

    // ─────────────────────────────────────────────────────────────────────────
    // Utility
    // ─────────────────────────────────────────────────────────────────────────

    /// Fill the whole surface, ignoring clip and transform
    fn clear(&mut self, color: Color);

    /// Commit pending drawing to the backend
    fn flush(&mut self);

    fn is_valid(&self) -> bool {
        true
    }

    /// Surface size in device pixels
    fn surface_size(&self) -> (u32, u32);

    /// Resize the backing surface
    fn resize_surface(&mut self, _width: u32, _height: u32) {}

    /// Backend-specific escape hatch
    fn native_context(&mut self) -> Option<&mut dyn Any> {
        None
    }

    /// Called when the context becomes current; re-reads font options
    fn on_bind(&mut self) {
        self.text_layout_mut().set_measurer(text_measurer());
    }

    /// Copy the pixels under `rect`, when the backend can
    fn snapshot_region(&mut self, _rect: Rect2Di) -> Option<PixelSnapshot> {
        None
    }

    /// Write back a snapshot taken with [`RenderContext::snapshot_region`]
    fn restore_snapshot(&mut self, _snapshot: &PixelSnapshot) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_restores_previous_frame() {
        let mut stack = StateStack::new();
        let before = stack.current().clone();

        stack.push();
        {
            let state = stack.current_mut();
            state.global_alpha = 0.3;
            state.transform = Affine2D::translation(4.0, 5.0);
            state.drawing_style.fill_color = Color::RED;
            state.text_style.font_size = 30.0;
        }
        stack.set_clip(&Rect2Df::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(stack.depth(), 1);

        assert!(stack.pop());
        assert_eq!(stack.current(), &before);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_pop_at_root_is_noop() {
        let mut stack = StateStack::new();
        assert!(!stack.pop());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_clip_is_device_space() {
        let mut stack = StateStack::new();
        stack.current_mut().transform = Affine2D::translation(100.0, 50.0);
        stack.set_clip(&Rect2Df::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(stack.current().clip, Some(Rect2Df::new(100.0, 50.0, 20.0, 20.0)));
    }

    #[test]
    fn test_set_clip_replaces_and_intersect_narrows() {
        let mut stack = StateStack::new();
        stack.set_clip(&Rect2Df::new(0.0, 0.0, 100.0, 100.0));
        stack.intersect_clip(&Rect2Df::new(50.0, 50.0, 100.0, 100.0));
        assert_eq!(stack.current().clip, Some(Rect2Df::new(50.0, 50.0, 50.0, 50.0)));

        stack.set_clip(&Rect2Df::new(200.0, 200.0, 10.0, 10.0));
        assert_eq!(stack.current().clip, Some(Rect2Df::new(200.0, 200.0, 10.0, 10.0)));

        // Disjoint intersection leaves an empty clip
        stack.intersect_clip(&Rect2Df::new(0.0, 0.0, 5.0, 5.0));
        assert!(stack.current().clip.map(|c| c.is_empty()).unwrap_or(false));

        stack.clear_clip();
        assert_eq!(stack.current().clip, None);
    }

    #[test]
    fn test_reset_drops_frames() {
        let mut stack = StateStack::new();
        stack.push();
        stack.push();
        stack.current_mut().global_alpha = 0.1;
        stack.reset();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current(), &RenderState::default());
    }
}
