//! Shape to path conversion
//!
//! Every primitive of the render context is turned into a tiny-skia path in
//! user space; the current transform is applied when the path is drawn.

use std::f32::consts::FRAC_PI_2;

use tiny_skia::{Path, PathBuilder, Rect};
use uc_core::{Point2Df, Rect2Df};

/// Cubic control distance for a quarter circle
const KAPPA: f32 = 0.552_284_8;

pub(crate) fn to_sk_rect(rect: &Rect2Df) -> Option<Rect> {
    Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)
}

pub fn rect_path(rect: &Rect2Df) -> Option<Path> {
    to_sk_rect(rect).map(PathBuilder::from_rect)
}

/// Rounded rectangle; the radius is clamped to half the shorter side
pub fn rounded_rect_path(rect: &Rect2Df, radius: f32) -> Option<Path> {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0);
    if r <= 0.0 {
        return rect_path(rect);
    }
    let (x, y, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
    let k = r * KAPPA;

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

pub fn circle_path(center: Point2Df, radius: f32) -> Option<Path> {
    PathBuilder::from_circle(center.x, center.y, radius)
}

pub fn ellipse_path(rect: &Rect2Df) -> Option<Path> {
    to_sk_rect(rect).and_then(PathBuilder::from_oval)
}

/// Circular arc, angles in radians, increasing clockwise on screen
pub fn arc_path(center: Point2Df, radius: f32, start_angle: f32, end_angle: f32) -> Option<Path> {
    let sweep = end_angle - start_angle;
    if radius <= 0.0 || sweep == 0.0 {
        return None;
    }
    let segments = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / segments as f32;
    let k = 4.0 / 3.0 * (step / 4.0).tan() * radius;

    let point = |a: f32| (center.x + radius * a.cos(), center.y + radius * a.sin());

    let mut pb = PathBuilder::new();
    let (sx, sy) = point(start_angle);
    pb.move_to(sx, sy);
    for i in 0..segments {
        let a0 = start_angle + step * i as f32;
        let a1 = a0 + step;
        let (x0, y0) = point(a0);
        let (x1, y1) = point(a1);
        pb.cubic_to(
            x0 - k * a0.sin(),
            y0 + k * a0.cos(),
            x1 + k * a1.sin(),
            y1 - k * a1.cos(),
            x1,
            y1,
        );
    }
    pb.finish()
}

pub fn bezier_path(start: Point2Df, c1: Point2Df, c2: Point2Df, end: Point2Df) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(start.x, start.y);
    pb.cubic_to(c1.x, c1.y, c2.x, c2.y, end.x, end.y);
    pb.finish()
}

pub fn line_path(start: Point2Df, end: Point2Df) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(start.x, start.y);
    pb.line_to(end.x, end.y);
    pb.finish()
}

pub fn polyline_path(points: &[Point2Df], closed: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_rounded_rect_radius_clamped() {
        let rect = Rect2Df::new(10.0, 10.0, 40.0, 20.0);
        let path = rounded_rect_path(&rect, 100.0).unwrap();
        let bounds = path.bounds();
        assert!(close(bounds.left(), 10.0));
        assert!(close(bounds.top(), 10.0));
        assert!(close(bounds.right(), 50.0));
        assert!(close(bounds.bottom(), 30.0));
    }

    #[test]
    fn test_quarter_arc_bounds() {
        let path = arc_path(Point2Df::new(0.0, 0.0), 10.0, 0.0, FRAC_PI_2).unwrap();
        let bounds = path.bounds();
        assert!(close(bounds.left(), 0.0));
        assert!(close(bounds.right(), 10.0));
        assert!(close(bounds.top(), 0.0));
        assert!(close(bounds.bottom(), 10.0));
    }

    #[test]
    fn test_degenerate_shapes() {
        assert!(arc_path(Point2Df::new(0.0, 0.0), 10.0, 1.0, 1.0).is_none());
        assert!(polyline_path(&[], false).is_none());
        assert!(rect_path(&Rect2Df::new(0.0, 0.0, -5.0, 5.0)).is_none());
    }
}
