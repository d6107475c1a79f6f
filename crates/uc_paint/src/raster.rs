//! Software raster render context
//!
//! [`RasterContext`] draws into a tiny-skia pixmap. Colors, gradients and
//! stroke settings are read from the current render state on every call, so
//! interleaved fill and stroke calls never reuse a stale paint. The device
//! clip becomes a mask per draw.

use std::any::Any;
use std::sync::{Arc, Mutex};

use tiny_skia::{
    BlendMode, FillRule, FilterQuality, GradientStop as SkGradientStop, IntRect, IntSize,
    LinearGradient, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Point, RadialGradient,
    Shader, SpreadMode, Stroke, StrokeDash, Transform,
};
use tracing::{debug, trace, warn};
use uc_core::{
    Affine2D, Color, DrawingStyle, FillMode, Gradient, GradientKind, LineCap, LineJoin,
    PixelSnapshot, Point2Df, Rect2Df, Rect2Di, RenderContext, RenderState, StateStack, TextLayout,
};
use uc_image::{ImageCache, ImageData};

use crate::error::{PaintError, Result};
use crate::fonts::{global_registry, lock_registry, FontRegistry, FontTextMeasurer};
use crate::shapes;

// ─────────────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────────────

fn sk_color(color: Color, alpha: f32) -> tiny_skia::Color {
    let c = color.with_alpha_factor(alpha);
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn sk_transform(t: &Affine2D) -> Transform {
    let [a, b, c, d, tx, ty] = t.elements;
    Transform::from_row(a, b, c, d, tx, ty)
}

fn sk_point(p: Point2Df) -> Point {
    Point::from_xy(p.x, p.y)
}

fn solid_paint(color: Color, alpha: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.set_color(sk_color(color, alpha));
    paint
}

fn gradient_shader(gradient: &Gradient, alpha: f32) -> Option<Shader<'static>> {
    let stops: Vec<SkGradientStop> = gradient
        .stops()
        .iter()
        .map(|s| SkGradientStop::new(s.position, sk_color(s.color, alpha)))
        .collect();
    if stops.is_empty() {
        return None;
    }
    match gradient.kind {
        GradientKind::Linear => LinearGradient::new(
            sk_point(gradient.p0),
            sk_point(gradient.p1),
            stops,
            SpreadMode::Pad,
            Transform::identity(),
        ),
        GradientKind::Radial => RadialGradient::new(
            sk_point(gradient.p0),
            sk_point(gradient.p1),
            gradient.r1,
            stops,
            SpreadMode::Pad,
            Transform::identity(),
        ),
        // no conic shader in tiny-skia
        GradientKind::Conic => None,
    }
}

fn fill_paint(style: &DrawingStyle, alpha: f32) -> Paint<'static> {
    match (style.fill_mode, &style.fill_gradient) {
        (FillMode::Gradient, Some(gradient)) => {
            let mut paint = solid_paint(gradient.first_color(), alpha);
            if let Some(shader) = gradient_shader(gradient, alpha) {
                paint.shader = shader;
            }
            paint
        }
        _ => solid_paint(style.fill_color, alpha),
    }
}

fn stroke_for(style: &DrawingStyle) -> Stroke {
    let mut stroke = Stroke {
        width: style.stroke_width,
        line_cap: match style.line_cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::Square => tiny_skia::LineCap::Square,
        },
        line_join: match style.line_join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        },
        ..Stroke::default()
    };

    let mut pattern = style.effective_dash_pattern().to_vec();
    if !pattern.is_empty() {
        // odd-length patterns repeat to make on/off pairs
        if pattern.len() % 2 == 1 {
            pattern.extend_from_within(..);
        }
        stroke.dash = StrokeDash::new(pattern, 0.0);
    }
    stroke
}

fn premultiply(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len());
    for px in rgba.chunks_exact(4) {
        let a = px[3] as u16;
        for &c in &px[..3] {
            out.push(((c as u16 * a + 127) / 255) as u8);
        }
        out.push(px[3]);
    }
    out
}

/// Convert premultiplied RGBA to straight alpha in place
fn unpremultiply(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn image_pixmap(image: &ImageData) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    Pixmap::from_vec(premultiply(image.pixels()), size)
}

enum Clip {
    Unbounded,
    Masked(Mask),
    Empty,
}

impl Clip {
    fn mask(&self) -> Option<&Mask> {
        match self {
            Clip::Masked(mask) => Some(mask),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// Render context backed by a CPU pixmap
pub struct RasterContext {
    pixmap: Pixmap,
    state: StateStack,
    text_layout: TextLayout,
    images: Arc<ImageCache>,
    fonts: Arc<Mutex<FontRegistry>>,
}

impl std::fmt::Debug for RasterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterContext")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("state_depth", &self.state.depth())
            .finish()
    }
}

impl RasterContext {
    /// Create a surface using the process-wide font registry
    pub fn new(width: u32, height: u32, images: Arc<ImageCache>) -> Result<Self> {
        Self::with_fonts(width, height, images, global_registry())
    }

    pub fn with_fonts(
        width: u32,
        height: u32,
        images: Arc<ImageCache>,
        fonts: Arc<Mutex<FontRegistry>>,
    ) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            PaintError::Surface(format!("cannot allocate {}x{} pixmap", width, height))
        })?;
        let measurer = Arc::new(FontTextMeasurer::new(Arc::clone(&fonts)));
        Ok(Self {
            pixmap,
            state: StateStack::new(),
            text_layout: TextLayout::new(measurer),
            images,
            fonts,
        })
    }

    pub fn image_cache(&self) -> &Arc<ImageCache> {
        &self.images
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha color of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba(c.red(), c.green(), c.blue(), c.alpha()))
    }

    /// Whole surface as straight RGBA8
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut data = self.pixmap.data().to_vec();
        unpremultiply(&mut data);
        data
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| PaintError::Encode(e.to_string()))
    }

    fn clip(&self) -> Clip {
        let Some(rect) = self.state.current().clip else {
            return Clip::Unbounded;
        };
        if rect.is_empty() {
            return Clip::Empty;
        }
        let (Some(mut mask), Some(path)) = (
            Mask::new(self.pixmap.width(), self.pixmap.height()),
            shapes::rect_path(&rect),
        ) else {
            return Clip::Empty;
        };
        mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
        Clip::Masked(mask)
    }

    fn paint_shadow(&mut self, path: &Path, state: &RenderState, clip: &Clip) {
        let style = &state.drawing_style;
        if !style.has_shadow() {
            return;
        }
        let paint = solid_paint(style.shadow_color, state.global_alpha);
        let transform = sk_transform(&state.transform)
            .pre_translate(style.shadow_offset.x, style.shadow_offset.y);
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, transform, clip.mask());
    }

    fn fill_shape(&mut self, path: Option<Path>) {
        let Some(path) = path else {
            trace!("degenerate fill skipped");
            return;
        };
        let clip = self.clip();
        if matches!(clip, Clip::Empty) {
            return;
        }
        let state = self.state.current().clone();
        self.paint_shadow(&path, &state, &clip);

        let paint = fill_paint(&state.drawing_style, state.global_alpha);
        self.pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            sk_transform(&state.transform),
            clip.mask(),
        );
    }

    fn stroke_shape(&mut self, path: Option<Path>) {
        let Some(path) = path else {
            trace!("degenerate stroke skipped");
            return;
        };
        let clip = self.clip();
        let state = self.state.current();
        let style = &state.drawing_style;
        if matches!(clip, Clip::Empty) || style.stroke_width <= 0.0 {
            return;
        }
        let paint = solid_paint(style.stroke_color, state.global_alpha);
        self.pixmap.stroke_path(
            &path,
            &paint,
            &stroke_for(style),
            sk_transform(&state.transform),
            clip.mask(),
        );
    }
}

impl RenderContext for RasterContext {
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

    // ─────────────────────────────────────────────────────────────────────────
    // Shapes
    // ─────────────────────────────────────────────────────────────────────────

    fn draw_line(&mut self, start: Point2Df, end: Point2Df) {
        self.stroke_shape(shapes::line_path(start, end));
    }

    fn draw_rectangle(&mut self, rect: Rect2Df) {
        self.stroke_shape(shapes::rect_path(&rect));
    }

    fn fill_rectangle(&mut self, rect: Rect2Df) {
        self.fill_shape(shapes::rect_path(&rect));
    }

    fn draw_rounded_rectangle(&mut self, rect: Rect2Df, radius: f32) {
        self.stroke_shape(shapes::rounded_rect_path(&rect, radius));
    }

    fn fill_rounded_rectangle(&mut self, rect: Rect2Df, radius: f32) {
        self.fill_shape(shapes::rounded_rect_path(&rect, radius));
    }

    fn draw_circle(&mut self, center: Point2Df, radius: f32) {
        self.stroke_shape(shapes::circle_path(center, radius));
    }

    fn fill_circle(&mut self, center: Point2Df, radius: f32) {
        self.fill_shape(shapes::circle_path(center, radius));
    }

    fn draw_ellipse(&mut self, rect: Rect2Df) {
        self.stroke_shape(shapes::ellipse_path(&rect));
    }

    fn fill_ellipse(&mut self, rect: Rect2Df) {
        self.fill_shape(shapes::ellipse_path(&rect));
    }

    fn draw_arc(&mut self, center: Point2Df, radius: f32, start_angle: f32, end_angle: f32) {
        self.stroke_shape(shapes::arc_path(center, radius, start_angle, end_angle));
    }

    fn draw_bezier(&mut self, start: Point2Df, c1: Point2Df, c2: Point2Df, end: Point2Df) {
        self.stroke_shape(shapes::bezier_path(start, c1, c2, end));
    }

    fn draw_path(&mut self, points: &[Point2Df], closed: bool) {
        self.stroke_shape(shapes::polyline_path(points, closed));
    }

    fn fill_path(&mut self, points: &[Point2Df]) {
        self.fill_shape(shapes::polyline_path(points, true));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Text
    // ─────────────────────────────────────────────────────────────────────────

    fn draw_text(&mut self, text: &str, position: Point2Df) {
        if text.is_empty() {
            return;
        }
        let clip = self.clip();
        if matches!(clip, Clip::Empty) {
            return;
        }
        let state = self.state.current().clone();
        let style = &state.text_style;
        let size = self.text_layout.pixel_size(style);

        let face = lock_registry(&self.fonts).resolve(&style.font_family, style.weight, style.slant);
        let Some(face) = face else {
            debug!(family = %style.font_family, "no font available, text skipped");
            return;
        };

        let mut pb = PathBuilder::new();
        let advance = face.append_outlines(
            &mut pb,
            text,
            position.x,
            position.y,
            size,
            style.letter_spacing,
            style.word_spacing,
        );
        let transform = sk_transform(&state.transform);

        if let Some(glyphs) = pb.finish() {
            if style.has_outline() {
                let stroke = Stroke {
                    width: style.outline_width,
                    ..Stroke::default()
                };
                let paint = solid_paint(style.outline_color, state.global_alpha);
                self.pixmap
                    .stroke_path(&glyphs, &paint, &stroke, transform, clip.mask());
            }
            let paint = solid_paint(style.color, state.global_alpha);
            self.pixmap
                .fill_path(&glyphs, &paint, FillRule::Winding, transform, clip.mask());
        }

        let thickness = (size / 16.0).max(1.0);
        let mut decorations = Vec::new();
        if style.underline {
            decorations.push(position.y + size * 0.1);
        }
        if style.strikethrough {
            decorations.push(position.y - size * 0.3);
        }
        let paint = solid_paint(style.color, state.global_alpha);
        for y in decorations {
            if let Some(line) = shapes::rect_path(&Rect2Df::new(position.x, y, advance, thickness)) {
                self.pixmap
                    .fill_path(&line, &paint, FillRule::Winding, transform, clip.mask());
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Images
    // ─────────────────────────────────────────────────────────────────────────

    fn draw_image_region(&mut self, path: &str, src: Rect2Df, dest: Rect2Df) {
        let image = match self.images.load(path) {
            Ok(image) => image,
            Err(err) => {
                warn!(path, %err, "image unavailable, skipping draw");
                return;
            }
        };
        let clip = self.clip();
        if matches!(clip, Clip::Empty) || dest.is_empty() {
            return;
        }

        let region = IntRect::from_xywh(
            src.x.round() as i32,
            src.y.round() as i32,
            src.width.round().max(1.0) as u32,
            src.height.round().max(1.0) as u32,
        );
        let Some(source) = image_pixmap(&image).and_then(|p| region.and_then(|r| p.clone_rect(r)))
        else {
            warn!(path, ?src, "image region outside the image");
            return;
        };

        let state = self.state.current();
        let transform = sk_transform(&state.transform)
            .pre_translate(dest.x, dest.y)
            .pre_scale(
                dest.width / source.width() as f32,
                dest.height / source.height() as f32,
            );
        let paint = PixmapPaint {
            opacity: state.global_alpha,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, clip.mask());
    }

    fn is_image_format_supported(&self, path: &str) -> bool {
        self.images.is_format_supported(path)
    }

    fn image_dimensions(&self, path: &str) -> Option<(u32, u32)> {
        self.images.dimensions(path)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Utility
    // ─────────────────────────────────────────────────────────────────────────

    fn clear(&mut self, color: Color) {
        self.pixmap.fill(sk_color(color, 1.0));
    }

    fn flush(&mut self) {
        trace!("raster flush");
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        if (width, height) == self.surface_size() {
            return;
        }
        match Pixmap::new(width, height) {
            Some(pixmap) => self.pixmap = pixmap,
            None => warn!(width, height, "cannot resize raster surface"),
        }
    }

    fn native_context(&mut self) -> Option<&mut dyn Any> {
        Some(&mut self.pixmap)
    }

    fn on_bind(&mut self) {
        let measurer = Arc::new(FontTextMeasurer::new(Arc::clone(&self.fonts)));
        self.text_layout.set_measurer(measurer);
    }

    fn snapshot_region(&mut self, rect: Rect2Di) -> Option<PixelSnapshot> {
        let (w, h) = self.surface_size();
        let surface = Rect2Di::new(0, 0, w as i32, h as i32);
        let bounds = rect.intersection(&surface)?;
        if bounds.is_empty() {
            return None;
        }

        let stride = w as usize * 4;
        let row_len = bounds.width as usize * 4;
        let data = self.pixmap.data();
        let mut pixels = Vec::with_capacity(row_len * bounds.height as usize);
        for row in bounds.y..bounds.bottom() {
            let start = row as usize * stride + bounds.x as usize * 4;
            pixels.extend_from_slice(&data[start..start + row_len]);
        }
        unpremultiply(&mut pixels);
        Some(PixelSnapshot {
            bounds,
            pixels: Arc::new(pixels),
        })
    }

    fn restore_snapshot(&mut self, snapshot: &PixelSnapshot) {
        let (w, h) = self.surface_size();
        let b = snapshot.bounds;
        let row_len = b.width.max(0) as usize * 4;
        let fits = b.x >= 0 && b.y >= 0 && b.right() <= w as i32 && b.bottom() <= h as i32;
        if !fits || snapshot.pixels.len() != row_len * b.height.max(0) as usize {
            warn!(bounds = ?b, "snapshot does not match surface, not restored");
            return;
        }

        let stride = w as usize * 4;
        let pixels = premultiply(&snapshot.pixels);
        let data = self.pixmap.data_mut();
        for (i, src) in pixels.chunks_exact(row_len).enumerate() {
            let start = (b.y as usize + i) * stride + b.x as usize * 4;
            data[start..start + row_len].copy_from_slice(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(w: u32, h: u32) -> RasterContext {
        let mut ctx = RasterContext::with_fonts(
            w,
            h,
            Arc::new(ImageCache::default()),
            Arc::new(Mutex::new(FontRegistry::empty())),
        )
        .unwrap();
        ctx.clear(Color::WHITE);
        ctx
    }

    #[test]
    fn test_zero_sized_surface_rejected() {
        let err = RasterContext::new(0, 10, Arc::new(ImageCache::default())).unwrap_err();
        assert!(matches!(err, PaintError::Surface(_)));
    }

    #[test]
    fn test_fill_rectangle_pixels() {
        let mut ctx = context(64, 64);
        ctx.set_fill_color(Color::RED);
        ctx.fill_rectangle(Rect2Df::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(ctx.pixel(15, 15), Some(Color::RED));
        assert_eq!(ctx.pixel(5, 5), Some(Color::WHITE));
        assert_eq!(ctx.pixel(35, 15), Some(Color::WHITE));
    }

    #[test]
    fn test_clip_limits_drawing() {
        let mut ctx = context(64, 64);
        ctx.set_clip_rect(Rect2Df::new(0.0, 0.0, 15.0, 64.0));
        ctx.set_fill_color(Color::RED);
        ctx.fill_rectangle(Rect2Df::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(ctx.pixel(12, 15), Some(Color::RED));
        assert_eq!(ctx.pixel(20, 15), Some(Color::WHITE));
    }

    #[test]
    fn test_empty_clip_draws_nothing() {
        let mut ctx = context(32, 32);
        ctx.set_clip_rect(Rect2Df::new(0.0, 0.0, 4.0, 4.0));
        ctx.intersect_clip_rect(Rect2Df::new(20.0, 20.0, 4.0, 4.0));
        ctx.set_fill_color(Color::RED);
        ctx.fill_rectangle(Rect2Df::new(0.0, 0.0, 32.0, 32.0));
        assert!(ctx.to_rgba().chunks_exact(4).all(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn test_transform_applies_to_fill() {
        let mut ctx = context(64, 64);
        ctx.translate(40.0, 0.0);
        ctx.set_fill_color(Color::BLUE);
        ctx.fill_rectangle(Rect2Df::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(ctx.pixel(45, 5), Some(Color::BLUE));
        assert_eq!(ctx.pixel(5, 5), Some(Color::WHITE));
    }

    #[test]
    fn test_global_alpha_blends() {
        let mut ctx = context(16, 16);
        ctx.set_global_alpha(0.5);
        ctx.set_fill_color(Color::RED);
        ctx.fill_rectangle(Rect2Df::new(0.0, 0.0, 16.0, 16.0));
        let px = ctx.pixel(8, 8).unwrap();
        assert_eq!(px.r, 255);
        assert!((126..=129).contains(&px.g), "g = {}", px.g);
        assert_eq!(px.a, 255);
    }

    #[test]
    fn test_stroke_uses_stroke_color() {
        let mut ctx = context(32, 32);
        ctx.set_fill_color(Color::RED);
        ctx.set_stroke_color(Color::BLUE);
        ctx.set_stroke_width(2.0);
        ctx.draw_line(Point2Df::new(0.0, 10.0), Point2Df::new(32.0, 10.0));
        assert_eq!(ctx.pixel(16, 10), Some(Color::BLUE));
        ctx.fill_rectangle(Rect2Df::new(0.0, 20.0, 32.0, 4.0));
        assert_eq!(ctx.pixel(16, 21), Some(Color::RED));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut ctx = context(32, 32);
        ctx.set_fill_color(Color::RED);
        ctx.fill_rectangle(Rect2Df::new(8.0, 8.0, 8.0, 8.0));

        let snapshot = ctx.snapshot_region(Rect2Di::new(8, 8, 8, 8)).unwrap();
        assert_eq!(snapshot.pixels.len(), 8 * 8 * 4);

        ctx.clear(Color::BLUE);
        ctx.restore_snapshot(&snapshot);
        assert_eq!(ctx.pixel(10, 10), Some(Color::RED));
        assert_eq!(ctx.pixel(0, 0), Some(Color::BLUE));
    }

    #[test]
    fn test_snapshot_clamped_to_surface() {
        let mut ctx = context(16, 16);
        let snapshot = ctx.snapshot_region(Rect2Di::new(10, 10, 20, 20)).unwrap();
        assert_eq!(snapshot.bounds, Rect2Di::new(10, 10, 6, 6));
        assert!(ctx.snapshot_region(Rect2Di::new(40, 40, 5, 5)).is_none());
    }

    #[test]
    fn test_image_drawn_scaled() {
        let mut ctx = context(64, 64);
        ctx.image_cache()
            .insert("/virtual/blue.png", ImageData::filled(2, 2, [0, 0, 255, 255]));
        ctx.draw_image_in_rect("/virtual/blue.png", Rect2Df::new(20.0, 20.0, 10.0, 10.0));
        assert_eq!(ctx.pixel(25, 25), Some(Color::BLUE));
        assert_eq!(ctx.pixel(35, 35), Some(Color::WHITE));
    }

    #[test]
    fn test_missing_image_and_font_are_skipped() {
        let mut ctx = context(16, 16);
        ctx.draw_image("/virtual/missing.png", Point2Df::new(0.0, 0.0));
        ctx.draw_text("hello", Point2Df::new(0.0, 12.0));
        assert!(ctx.to_rgba().chunks_exact(4).all(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn test_resize_surface() {
        let mut ctx = context(16, 16);
        ctx.resize_surface(40, 20);
        assert_eq!(ctx.surface_size(), (40, 20));
        ctx.resize_surface(0, 0);
        assert_eq!(ctx.surface_size(), (40, 20));
    }
}
