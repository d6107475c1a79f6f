//! Gradients

use crate::color::Color;
use crate::geometry::Point2Df;

/// Gradient stop
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient (0.0 to 1.0)
    pub position: f32,
    /// Color at this stop
    pub color: Color,
}

impl GradientStop {
    pub fn new(position: f32, color: Color) -> Self {
        Self {
            position: position.clamp(0.0, 1.0),
            color,
        }
    }
}

/// Gradient geometry type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
    Conic,
}

/// Color gradient
///
/// Linear gradients run from `p0` to `p1`. Radial gradients interpolate
/// between the circle `(p0, r0)` and the circle `(p1, r1)`. Conic gradients
/// sweep around `p0`.
///
/// Stops are kept sorted by position. Stops sharing a position stay in
/// insertion order, which produces a hard transition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    pub p0: Point2Df,
    pub p1: Point2Df,
    pub r0: f32,
    pub r1: f32,
    stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn linear(p0: Point2Df, p1: Point2Df) -> Self {
        Self {
            kind: GradientKind::Linear,
            p0,
            p1,
            ..Default::default()
        }
    }

    pub fn radial(p0: Point2Df, r0: f32, p1: Point2Df, r1: f32) -> Self {
        Self {
            kind: GradientKind::Radial,
            p0,
            p1,
            r0: r0.max(0.0),
            r1: r1.max(0.0),
            ..Default::default()
        }
    }

    pub fn conic(center: Point2Df) -> Self {
        Self {
            kind: GradientKind::Conic,
            p0: center,
            p1: center,
            ..Default::default()
        }
    }

    /// Insert a stop, keeping stops sorted (stable for equal positions)
    pub fn add_stop(&mut self, position: f32, color: Color) {
        let stop = GradientStop::new(position, color);
        let index = self.stops.partition_point(|s| s.position <= stop.position);
        self.stops.insert(index, stop);
    }

    /// Builder form of [`Gradient::add_stop`]
    pub fn with_stop(mut self, position: f32, color: Color) -> Self {
        self.add_stop(position, color);
        self
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// First stop color, or black without stops
    pub fn first_color(&self) -> Color {
        self.stops.first().map(|s| s.color).unwrap_or(Color::BLACK)
    }

    /// Sample the color at a position, honoring hard transitions
    pub fn color_at(&self, position: f32) -> Color {
        let t = position.clamp(0.0, 1.0);
        let Some(first) = self.stops.first() else {
            return Color::BLACK;
        };
        if t <= first.position {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t < b.position {
                let span = b.position - a.position;
                if span <= f32::EPSILON {
                    return b.color;
                }
                return Color::lerp(&a.color, &b.color, (t - a.position) / span);
            }
        }
        self.stops.last().map(|s| s.color).unwrap_or(Color::BLACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_sorted_and_stable() {
        let g = Gradient::linear(Point2Df::new(0.0, 0.0), Point2Df::new(100.0, 0.0))
            .with_stop(1.0, Color::BLUE)
            .with_stop(0.0, Color::RED)
            .with_stop(0.5, Color::GREEN)
            .with_stop(0.5, Color::WHITE);

        let positions: Vec<f32> = g.stops().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0.0, 0.5, 0.5, 1.0]);
        // Equal positions keep insertion order
        assert_eq!(g.stops()[1].color, Color::GREEN);
        assert_eq!(g.stops()[2].color, Color::WHITE);
    }

    #[test]
    fn test_positions_clamped() {
        let g = Gradient::conic(Point2Df::new(0.0, 0.0))
            .with_stop(-1.0, Color::RED)
            .with_stop(3.0, Color::BLUE);
        assert_eq!(g.stops()[0].position, 0.0);
        assert_eq!(g.stops()[1].position, 1.0);
    }

    #[test]
    fn test_hard_transition() {
        let g = Gradient::linear(Point2Df::new(0.0, 0.0), Point2Df::new(1.0, 0.0))
            .with_stop(0.0, Color::RED)
            .with_stop(0.5, Color::RED)
            .with_stop(0.5, Color::BLUE)
            .with_stop(1.0, Color::BLUE);

        assert_eq!(g.color_at(0.49), Color::RED);
        assert_eq!(g.color_at(0.5), Color::BLUE);
        assert_eq!(g.color_at(0.9), Color::BLUE);
    }
}
