//! 2D affine transforms

use crate::geometry::{Point2Df, Rect2Df};

/// 2D affine transformation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2D {
    /// Matrix elements [a, b, c, d, tx, ty]
    /// | a  c  tx |
    /// | b  d  ty |
    /// | 0  0   1 |
    pub elements: [f32; 6],
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2D {
    pub const IDENTITY: Affine2D = Affine2D {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self {
            elements: [a, b, c, d, tx, ty],
        }
    }

    pub fn translation(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `angle` radians
    pub fn rotation(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    /// Concatenate (self * other): the result applies `other` first, then `self`
    pub fn then(&self, other: &Affine2D) -> Affine2D {
        let [a1, b1, c1, d1, tx1, ty1] = self.elements;
        let [a2, b2, c2, d2, tx2, ty2] = other.elements;
        Affine2D {
            elements: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * tx2 + c1 * ty2 + tx1,
                b1 * tx2 + d1 * ty2 + ty1,
            ],
        }
    }

    pub fn transform_point(&self, point: Point2Df) -> Point2Df {
        let [a, b, c, d, tx, ty] = self.elements;
        Point2Df::new(
            a * point.x + c * point.y + tx,
            b * point.x + d * point.y + ty,
        )
    }

    /// Axis-aligned bounding box of the transformed rect
    pub fn transform_rect(&self, rect: &Rect2Df) -> Rect2Df {
        let corners = [
            self.transform_point(Point2Df::new(rect.x, rect.y)),
            self.transform_point(Point2Df::new(rect.right(), rect.y)),
            self.transform_point(Point2Df::new(rect.x, rect.bottom())),
            self.transform_point(Point2Df::new(rect.right(), rect.bottom())),
        ];
        let mut min = corners[0];
        let mut max = corners[0];
        for p in &corners[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Rect2Df::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn determinant(&self) -> f32 {
        let [a, b, c, d, _, _] = self.elements;
        a * d - b * c
    }

    /// Inverse transform, `None` when singular
    pub fn inverse(&self) -> Option<Affine2D> {
        let det = self.determinant();
        if det.abs() < f32::EPSILON {
            return None;
        }
        let [a, b, c, d, tx, ty] = self.elements;
        let inv = 1.0 / det;
        Some(Affine2D::new(
            d * inv,
            -b * inv,
            -c * inv,
            a * inv,
            (c * ty - d * tx) * inv,
            (b * tx - a * ty) * inv,
        ))
    }

    /// Identity within a small tolerance
    pub fn is_identity(&self) -> bool {
        self.elements
            .iter()
            .zip(Self::IDENTITY.elements.iter())
            .all(|(x, y)| (x - y).abs() < 1e-5)
    }

    /// Pure translation (no scale, rotation or skew)
    pub fn is_translation(&self) -> bool {
        let [a, b, c, d, _, _] = self.elements;
        (a - 1.0).abs() < 1e-5 && b.abs() < 1e-5 && c.abs() < 1e-5 && (d - 1.0).abs() < 1e-5
    }
}
