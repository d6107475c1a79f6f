//! Geometry primitives
//!
//! Points and rectangles come in an integer and a float flavour sharing one
//! generic implementation. Rectangles are half-open: a point on the right or
//! bottom edge is outside.

use std::fmt::Debug;
use std::ops::{Add, Sub};

use crate::error::{CoreError, Result};

/// Numeric type usable as a coordinate
pub trait Scalar:
    Copy + Debug + Default + PartialEq + PartialOrd + Add<Output = Self> + Sub<Output = Self>
{
    const ZERO: Self;

    /// Half of the value (integer division for integers)
    fn half(self) -> Self;

    fn to_f64(self) -> f64;

    fn from_f64(value: f64) -> Self;

    fn min_of(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }

    fn max_of(self, other: Self) -> Self {
        if other > self {
            other
        } else {
            self
        }
    }
}

impl Scalar for i32 {
    const ZERO: Self = 0;

    fn half(self) -> Self {
        self / 2
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value.round() as i32
    }
}

impl Scalar for f32 {
    const ZERO: Self = 0.0;

    fn half(self) -> Self {
        self / 2.0
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point2D<T> {
    pub x: T,
    pub y: T,
}

pub type Point2Di = Point2D<i32>;
pub type Point2Df = Point2D<f32>;

impl<T: Scalar> Point2D<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: T, dy: T) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another point
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = other.x.to_f64() - self.x.to_f64();
        let dy = other.y.to_f64() - self.y.to_f64();
        (dx * dx + dy * dy).sqrt()
    }

    pub fn to_float(self) -> Point2Df {
        Point2D::new(self.x.to_f64() as f32, self.y.to_f64() as f32)
    }

    pub fn to_int(self) -> Point2Di {
        Point2D::new(i32::from_f64(self.x.to_f64()), i32::from_f64(self.y.to_f64()))
    }
}

impl<T: Scalar> Add for Point2D<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Scalar> Sub for Point2D<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect2D<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

pub type Rect2Di = Rect2D<i32>;
pub type Rect2Df = Rect2D<f32>;

impl<T: Scalar> Rect2D<T> {
    pub const fn new(x: T, y: T, width: T, height: T) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rect, rejecting negative dimensions
    pub fn try_new(x: T, y: T, width: T, height: T) -> Result<Self> {
        let rect = Self::new(x, y, width, height);
        if rect.is_valid() {
            Ok(rect)
        } else {
            Err(CoreError::InvalidArgument(format!(
                "rectangle has negative size: {:?}x{:?}",
                width, height
            )))
        }
    }

    pub fn from_points(p1: Point2D<T>, p2: Point2D<T>) -> Self {
        let min_x = p1.x.min_of(p2.x);
        let min_y = p1.y.min_of(p2.y);
        let max_x = p1.x.max_of(p2.x);
        let max_y = p1.y.max_of(p2.y);
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn origin(&self) -> Point2D<T> {
        Point2D::new(self.x, self.y)
    }

    pub fn right(&self) -> T {
        self.x + self.width
    }

    pub fn bottom(&self) -> T {
        self.y + self.height
    }

    /// Width and height are non-negative
    pub fn is_valid(&self) -> bool {
        self.width >= T::ZERO && self.height >= T::ZERO
    }

    /// Covers no area
    pub fn is_empty(&self) -> bool {
        self.width <= T::ZERO || self.height <= T::ZERO
    }

    pub fn area(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.width.to_f64() * self.height.to_f64()
        }
    }

    pub fn center(&self) -> Point2D<T> {
        Point2D::new(self.x + self.width.half(), self.y + self.height.half())
    }

    /// Half-open containment: `[x, x+w) × [y, y+h)`
    pub fn contains(&self, point: Point2D<T>) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn contains_xy(&self, x: T, y: T) -> bool {
        self.contains(Point2D::new(x, y))
    }

    pub fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// True if the two rects share any area
    pub fn intersects(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max_of(other.x);
        let y = self.y.max_of(other.y);
        let right = self.right().min_of(other.right());
        let bottom = self.bottom().min_of(other.bottom());
        Some(Self::new(x, y, right - x, bottom - y))
    }

    /// Smallest rect containing both; an empty operand is the identity
    pub fn union(&self, other: &Self) -> Self {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        let x = self.x.min_of(other.x);
        let y = self.y.min_of(other.y);
        let right = self.right().max_of(other.right());
        let bottom = self.bottom().max_of(other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }

    pub fn offset(&self, dx: T, dy: T) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shrink from all sides, never below zero size
    pub fn inset(&self, left: T, top: T, right: T, bottom: T) -> Self {
        let width = (self.width - left - right).max_of(T::ZERO);
        let height = (self.height - top - bottom).max_of(T::ZERO);
        Self::new(self.x + left, self.y + top, width, height)
    }

    pub fn to_float(&self) -> Rect2Df {
        Rect2D::new(
            self.x.to_f64() as f32,
            self.y.to_f64() as f32,
            self.width.to_f64() as f32,
            self.height.to_f64() as f32,
        )
    }
}

impl Rect2Df {
    /// Smallest integer rect covering this rect
    pub fn to_int_outer(&self) -> Rect2Di {
        let x = self.x.floor() as i32;
        let y = self.y.floor() as i32;
        let right = self.right().ceil() as i32;
        let bottom = self.bottom().ceil() as i32;
        Rect2D::new(x, y, (right - x).max(0), (bottom - y).max(0))
    }
}

/// Padding or border widths on four sides
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Insets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Insets {
    pub const ZERO: Insets = Insets {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

impl std::ops::Add for Insets {
    type Output = Insets;

    fn add(self, rhs: Insets) -> Insets {
        Insets::new(
            self.left + rhs.left,
            self.top + rhs.top,
            self.right + rhs.right,
            self.bottom + rhs.bottom,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_half_open() {
        let r = Rect2Di::new(10, 10, 5, 5);
        assert!(r.contains_xy(10, 10));
        assert!(r.contains_xy(14, 14));
        assert!(!r.contains_xy(15, 10));
        assert!(!r.contains_xy(10, 15));
        assert!(!r.contains_xy(9, 12));

        let f = Rect2Df::new(0.0, 0.0, 1.0, 1.0);
        assert!(f.contains_xy(0.999, 0.0));
        assert!(!f.contains_xy(1.0, 0.5));
    }

    #[test]
    fn test_negative_size_rejected() {
        assert!(Rect2Di::try_new(0, 0, -1, 5).is_err());
        assert!(Rect2Df::try_new(0.0, 0.0, 3.0, -0.5).is_err());
        assert!(Rect2Di::try_new(0, 0, 0, 0).is_ok());
        assert!(!Rect2Di::new(0, 0, -2, 2).is_valid());
    }

    #[test]
    fn test_union_with_empty_is_identity() {
        let r = Rect2Df::new(3.0, 4.0, 10.0, 20.0);
        assert_eq!(r.union(&Rect2Df::default()), r);
        assert_eq!(Rect2Df::default().union(&r), r);
    }

    #[test]
    fn test_union_contains_both_operands() {
        let a = Rect2Di::new(0, 0, 10, 10);
        let b = Rect2Di::new(20, 5, 5, 30);
        let u = a.union(&b);
        assert_eq!(u, Rect2Di::new(0, 0, 25, 35));
        for p in [Point2D::new(0, 0), Point2D::new(9, 9), Point2D::new(24, 34)] {
            assert!(a.contains(p) || b.contains(p));
            assert!(u.contains(p));
        }
    }

    #[test]
    fn test_intersection() {
        let a = Rect2Di::new(0, 0, 100, 100);
        let b = Rect2Di::new(50, 50, 100, 100);
        assert_eq!(a.intersection(&b), Some(Rect2Di::new(50, 50, 50, 50)));

        // Touching edges do not intersect
        let c = Rect2Di::new(100, 0, 10, 10);
        assert!(!a.intersects(&c));
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_center_and_distance() {
        let r = Rect2Df::new(0.0, 0.0, 10.0, 20.0);
        assert_eq!(r.center(), Point2Df::new(5.0, 10.0));

        let d = Point2Df::new(100.0, 100.0).distance_to(Point2Df::new(106.0, 101.0));
        assert!((d - 6.0828).abs() < 1e-3);
    }

    #[test]
    fn test_inset_and_outer_int() {
        let r = Rect2Df::new(0.0, 0.0, 10.0, 10.0).inset(1.0, 2.0, 3.0, 4.0);
        assert_eq!(r, Rect2Df::new(1.0, 2.0, 6.0, 4.0));

        let outer = Rect2Df::new(0.5, 0.5, 1.0, 1.0).to_int_outer();
        assert_eq!(outer, Rect2Di::new(0, 0, 2, 2));
    }
}
