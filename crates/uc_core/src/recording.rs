//! Recording render context
//!
//! Captures every draw call together with the state it was issued under
//! (resolved color, global alpha, transform, device clip). Used for headless
//! windows and for asserting on rendering in tests.

use std::any::Any;
use std::sync::Arc;

use tracing::debug;
use uc_image::ImageCache;

use crate::color::Color;
use crate::geometry::{Point2Df, Rect2Df};
use crate::gradient::Gradient;
use crate::render::{RenderContext, StateStack};
use crate::style::FillMode;
use crate::text::TextLayout;
use crate::transform::Affine2D;

/// A recorded drawing operation
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Line {
        start: Point2Df,
        end: Point2Df,
    },
    StrokeRect(Rect2Df),
    FillRect(Rect2Df),
    StrokeRoundedRect {
        rect: Rect2Df,
        radius: f32,
    },
    FillRoundedRect {
        rect: Rect2Df,
        radius: f32,
    },
    StrokeCircle {
        center: Point2Df,
        radius: f32,
    },
    FillCircle {
        center: Point2Df,
        radius: f32,
    },
    StrokeEllipse(Rect2Df),
    FillEllipse(Rect2Df),
    Arc {
        center: Point2Df,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    },
    Bezier {
        start: Point2Df,
        c1: Point2Df,
        c2: Point2Df,
        end: Point2Df,
    },
    StrokePath {
        points: Vec<Point2Df>,
        closed: bool,
    },
    FillPath {
        points: Vec<Point2Df>,
    },
    Text {
        text: String,
        position: Point2Df,
        font_family: String,
        font_size: f32,
    },
    Image {
        path: String,
        src: Rect2Df,
        dest: Rect2Df,
    },
    SetClip(Option<Rect2Df>),
    Flush,
}

impl DrawCommand {
    /// True for commands that put pixels on the surface
    pub fn is_drawing(&self) -> bool {
        !matches!(self, DrawCommand::SetClip(_) | DrawCommand::Flush)
    }
}

/// A command with the state it was issued under
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCommand {
    pub command: DrawCommand,
    /// Color after global alpha was applied
    pub color: Color,
    /// Gradient used by gradient fills
    pub gradient: Option<Gradient>,
    pub alpha: f32,
    pub transform: Affine2D,
    pub clip: Option<Rect2Df>,
}

/// Render context that records instead of rasterizing
pub struct RecordingContext {
    label: String,
    commands: Vec<RecordedCommand>,
    state: StateStack,
    text_layout: TextLayout,
    images: Arc<ImageCache>,
    size: (u32, u32),
    valid: bool,
}

impl std::fmt::Debug for RecordingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingContext")
            .field("label", &self.label)
            .field("commands", &self.commands.len())
            .field("size", &self.size)
            .field("valid", &self.valid)
            .finish()
    }
}

impl RecordingContext {
    /// Create a recording context with its own image cache
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_image_cache(width, height, Arc::new(ImageCache::default()))
    }

    pub fn with_image_cache(width: u32, height: u32, images: Arc<ImageCache>) -> Self {
        Self {
            label: String::new(),
            commands: Vec::new(),
            state: StateStack::new(),
            text_layout: TextLayout::default(),
            images,
            size: (width, height),
            valid: true,
        }
    }

    /// Name shown in logs and used to tell contexts apart in tests
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RecordedCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Text of every recorded text command, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match &c.command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded text commands drawing exactly `text`
    pub fn text_count(&self, text: &str) -> usize {
        self.texts().iter().filter(|t| **t == text).count()
    }

    /// Recorded clip changes
    pub fn clip_changes(&self) -> Vec<Option<Rect2Df>> {
        self.commands
            .iter()
            .filter_map(|c| match c.command {
                DrawCommand::SetClip(clip) => Some(clip),
                _ => None,
            })
            .collect()
    }

    /// Simulate a lost surface; drawing becomes a logged no-op
    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    pub fn image_cache(&self) -> &Arc<ImageCache> {
        &self.images
    }

    fn record(&mut self, command: DrawCommand, color: Color) {
        if !self.valid {
            debug!(label = %self.label, ?command, "draw on invalid context ignored");
            return;
        }
        let state = self.state.current();
        let gradient = match &command {
            DrawCommand::FillRect(_)
            | DrawCommand::FillRoundedRect { .. }
            | DrawCommand::FillCircle { .. }
            | DrawCommand::FillEllipse(_)
            | DrawCommand::FillPath { .. }
                if state.drawing_style.fill_mode == FillMode::Gradient =>
            {
                state.drawing_style.fill_gradient.clone()
            }
            _ => None,
        };
        let recorded = RecordedCommand {
            color: color.with_alpha_factor(state.global_alpha),
            gradient,
            alpha: state.global_alpha,
            transform: state.transform,
            clip: state.clip,
            command,
        };
        self.commands.push(recorded);
    }

    /// Color re-read from the current style for every stroke
    fn stroke_color(&self) -> Color {
        self.state.current().drawing_style.stroke_color
    }

    /// Color re-read from the current style for every fill
    fn fill_color(&self) -> Color {
        let style = &self.state.current().drawing_style;
        match (&style.fill_mode, &style.fill_gradient) {
            (FillMode::Gradient, Some(gradient)) => gradient.first_color(),
            _ => style.fill_color,
        }
    }

    fn record_stroke(&mut self, command: DrawCommand) {
        let color = self.stroke_color();
        self.record(command, color);
    }

    fn record_fill(&mut self, command: DrawCommand) {
        let color = self.fill_color();
        self.record(command, color);
    }

    fn record_clip(&mut self) {
        let clip = self.state.current().clip;
        self.record(DrawCommand::SetClip(clip), Color::TRANSPARENT);
    }
}

impl RenderContext for RecordingContext {
    fn state_stack(&self) -> &StateStack {
        &self.state
    }

    fn state_stack_mut(&mut self) -> &mut StateStack {
        &mut self.state
    }

    fn text_layout(&self) -> &TextLayout {
        &self.text_layout
    }

    fn text_layout_mut(&mut self) -> &mut TextLayout {
        &mut self.text_layout
    }

    fn set_clip_rect(&mut self, rect: Rect2Df) {
        self.state.set_clip(&rect);
        self.record_clip();
    }

    fn intersect_clip_rect(&mut self, rect: Rect2Df) {
        self.state.intersect_clip(&rect);
        self.record_clip();
    }

    fn clear_clip_rect(&mut self) {
        self.state.clear_clip();
        self.record_clip();
    }

    fn draw_line(&mut self, start: Point2Df, end: Point2Df) {
        self.record_stroke(DrawCommand::Line { start, end });
    }

    fn draw_rectangle(&mut self, rect: Rect2Df) {
        self.record_stroke(DrawCommand::StrokeRect(rect));
    }

    fn fill_rectangle(&mut self, rect: Rect2Df) {
        self.record_fill(DrawCommand::FillRect(rect));
    }

    fn draw_rounded_rectangle(&mut self, rect: Rect2Df, radius: f32) {
        self.record_stroke(DrawCommand::StrokeRoundedRect { rect, radius });
    }

    fn fill_rounded_rectangle(&mut self, rect: Rect2Df, radius: f32) {
        self.record_fill(DrawCommand::FillRoundedRect { rect, radius });
    }

    fn draw_circle(&mut self, center: Point2Df, radius: f32) {
        self.record_stroke(DrawCommand::StrokeCircle { center, radius });
    }

    fn fill_circle(&mut self, center: Point2Df, radius: f32) {
        self.record_fill(DrawCommand::FillCircle { center, radius });
    }

    fn draw_ellipse(&mut self, rect: Rect2Df) {
        self.record_stroke(DrawCommand::StrokeEllipse(rect));
    }

    fn fill_ellipse(&mut self, rect: Rect2Df) {
        self.record_fill(DrawCommand::FillEllipse(rect));
    }

    fn draw_arc(&mut self, center: Point2Df, radius: f32, start_angle: f32, end_angle: f32) {
        self.record_stroke(DrawCommand::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        });
    }

    fn draw_bezier(&mut self, start: Point2Df, c1: Point2Df, c2: Point2Df, end: Point2Df) {
        self.record_stroke(DrawCommand::Bezier { start, c1, c2, end });
    }

    fn draw_path(&mut self, points: &[Point2Df], closed: bool) {
        if points.len() < 2 {
            return;
        }
        self.record_stroke(DrawCommand::StrokePath {
            points: points.to_vec(),
            closed,
        });
    }

    fn fill_path(&mut self, points: &[Point2Df]) {
        if points.len() < 3 {
            return;
        }
        self.record_fill(DrawCommand::FillPath {
            points: points.to_vec(),
        });
    }

    fn draw_text(&mut self, text: &str, position: Point2Df) {
        if text.is_empty() {
            return;
        }
        let style = &self.state.current().text_style;
        let command = DrawCommand::Text {
            text: text.to_string(),
            position,
            font_family: style.font_family.clone(),
            font_size: self.text_layout.pixel_size(style),
        };
        let color = style.color;
        self.record(command, color);
    }

    fn draw_image_region(&mut self, path: &str, src: Rect2Df, dest: Rect2Df) {
        if let Err(err) = self.images.load(path) {
            debug!(path, %err, "image load failed, skipping");
            return;
        }
        self.record(
            DrawCommand::Image {
                path: path.to_string(),
                src,
                dest,
            },
            Color::WHITE,
        );
    }

    fn is_image_format_supported(&self, path: &str) -> bool {
        self.images.is_format_supported(path)
    }

    fn image_dimensions(&self, path: &str) -> Option<(u32, u32)> {
        self.images.dimensions(path)
    }

    fn clear(&mut self, color: Color) {
        self.record(DrawCommand::Clear(color), color);
    }

    fn flush(&mut self) {
        self.record(DrawCommand::Flush, Color::TRANSPARENT);
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    /// The recorder itself, for inspection through a trait object
    fn native_context(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{TextAlign, TextBaseline};
    use uc_image::ImageData;

    #[test]
    fn test_interleaved_fill_and_stroke_resolve_colors() {
        let mut ctx = RecordingContext::new(200, 200);
        ctx.set_fill_color(Color::RED);
        ctx.set_stroke_color(Color::BLUE);

        ctx.fill_rectangle(Rect2Df::new(0.0, 0.0, 10.0, 10.0));
        ctx.draw_rectangle(Rect2Df::new(0.0, 0.0, 10.0, 10.0));
        ctx.fill_circle(Point2Df::new(5.0, 5.0), 3.0);

        let colors: Vec<Color> = ctx.commands().iter().map(|c| c.color).collect();
        assert_eq!(colors, vec![Color::RED, Color::BLUE, Color::RED]);
    }

    #[test]
    fn test_global_alpha_applies_to_text_and_images() {
        let cache = Arc::new(ImageCache::default());
        cache.insert("/virtual/icon.png", ImageData::filled(4, 2, [0, 0, 0, 255]));
        let mut ctx = RecordingContext::with_image_cache(100, 100, cache);

        ctx.set_global_alpha(0.5);
        ctx.set_text_color(Color::BLACK);
        ctx.draw_text("hi", Point2Df::new(0.0, 10.0));
        ctx.draw_image("/virtual/icon.png", Point2Df::new(1.0, 2.0));

        let cmds = ctx.commands();
        assert_eq!(cmds.len(), 2);
        assert!(cmds.iter().all(|c| c.alpha == 0.5));
        assert_eq!(cmds[0].color.a, 128);
        assert_eq!(
            cmds[1].command,
            DrawCommand::Image {
                path: "/virtual/icon.png".to_string(),
                src: Rect2Df::new(0.0, 0.0, 4.0, 2.0),
                dest: Rect2Df::new(1.0, 2.0, 4.0, 2.0),
            }
        );
    }

    #[test]
    fn test_missing_image_is_skipped() {
        let mut ctx = RecordingContext::new(10, 10);
        ctx.draw_image("/virtual/missing.png", Point2Df::new(0.0, 0.0));
        ctx.draw_image_in_rect("/virtual/missing.png", Rect2Df::new(0.0, 0.0, 5.0, 5.0));
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn test_invalid_context_is_noop() {
        let mut ctx = RecordingContext::new(10, 10);
        ctx.set_valid(false);
        ctx.fill_rectangle(Rect2Df::new(0.0, 0.0, 1.0, 1.0));
        ctx.draw_text("x", Point2Df::new(0.0, 0.0));
        assert!(!ctx.is_valid());
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn test_push_pop_restores_state_bitwise() {
        let mut ctx = RecordingContext::new(100, 100);
        ctx.translate(3.0, 4.0);
        ctx.set_clip_rect(Rect2Df::new(0.0, 0.0, 50.0, 50.0));
        let before = ctx.current_state().clone();

        ctx.push_state();
        ctx.rotate(1.0);
        ctx.set_global_alpha(0.2);
        ctx.intersect_clip_rect(Rect2Df::new(10.0, 10.0, 5.0, 5.0));
        ctx.set_fill_color(Color::GREEN);
        ctx.set_font("Courier", 30.0);
        ctx.pop_state();

        assert_eq!(ctx.current_state(), &before);
        assert_eq!(ctx.state_depth(), 0);
    }

    #[test]
    fn test_commands_carry_transform_and_clip() {
        let mut ctx = RecordingContext::new(100, 100);
        ctx.set_clip_rect(Rect2Df::new(0.0, 0.0, 20.0, 20.0));
        ctx.translate(5.0, 5.0);
        ctx.fill_rectangle(Rect2Df::new(0.0, 0.0, 2.0, 2.0));

        let last = ctx.commands().last().unwrap();
        assert_eq!(last.clip, Some(Rect2Df::new(0.0, 0.0, 20.0, 20.0)));
        assert_eq!(
            last.transform.transform_point(Point2Df::new(0.0, 0.0)),
            Point2Df::new(5.0, 5.0)
        );
        assert_eq!(ctx.clip_changes().len(), 1);
    }

    #[test]
    fn test_text_in_rect_is_centered() {
        let mut ctx = RecordingContext::new(100, 100);
        ctx.text_layout_mut()
            .set_measurer(Arc::new(crate::text::EstimatedTextMeasurer));
        let mut style = ctx.text_style().clone();
        style.font_size = 10.0;
        style.align = TextAlign::Center;
        style.baseline = TextBaseline::Middle;
        ctx.set_text_style(style);

        ctx.draw_text_in_rect("ab", Rect2Df::new(0.0, 0.0, 100.0, 100.0));
        match &ctx.commands()[0].command {
            DrawCommand::Text { position, .. } => {
                assert!((position.x - 44.5).abs() < 1e-3);
                assert!((position.y - 53.0).abs() < 1e-3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
