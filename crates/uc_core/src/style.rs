//! Drawing and text styles carried by the render state

use smallvec::SmallVec;

use crate::color::Color;
use crate::geometry::Point2Df;
use crate::gradient::Gradient;

/// How shapes are filled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillMode {
    None,
    #[default]
    Solid,
    Gradient,
    Pattern,
}

/// Stroke dash style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
    /// Uses [`DrawingStyle::dash_pattern`]
    Custom,
}

/// Line cap style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Line join style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Dash lengths, alternating on/off
pub type DashPattern = SmallVec<[f32; 4]>;

/// Fill, stroke and shadow parameters for shape drawing
#[derive(Clone, Debug, PartialEq)]
pub struct DrawingStyle {
    pub fill_mode: FillMode,
    pub fill_color: Color,
    pub fill_gradient: Option<Gradient>,
    /// Image path used as a repeating fill in [`FillMode::Pattern`]
    pub fill_pattern: Option<String>,

    pub has_stroke: bool,
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub stroke_style: StrokeStyle,
    pub dash_pattern: DashPattern,
    pub line_cap: LineCap,
    pub line_join: LineJoin,

    pub shadow_color: Color,
    pub shadow_offset: Point2Df,
    pub shadow_blur: f32,
}

impl Default for DrawingStyle {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Solid,
            fill_color: Color::BLACK,
            fill_gradient: None,
            fill_pattern: None,
            has_stroke: true,
            stroke_color: Color::BLACK,
            stroke_width: 1.0,
            stroke_style: StrokeStyle::Solid,
            dash_pattern: DashPattern::new(),
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            shadow_color: Color::TRANSPARENT,
            shadow_offset: Point2Df::new(0.0, 0.0),
            shadow_blur: 0.0,
        }
    }
}

impl DrawingStyle {
    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill_mode = FillMode::Solid;
        self.fill_color = color;
        self
    }

    pub fn with_gradient(mut self, gradient: Gradient) -> Self {
        self.fill_mode = FillMode::Gradient;
        self.fill_gradient = Some(gradient);
        self
    }

    pub fn with_stroke(mut self, color: Color, width: f32) -> Self {
        self.has_stroke = true;
        self.stroke_color = color;
        self.stroke_width = width.max(0.0);
        self
    }

    pub fn with_stroke_style(mut self, style: StrokeStyle) -> Self {
        self.stroke_style = style;
        self
    }

    pub fn with_dash(mut self, pattern: &[f32]) -> Self {
        self.stroke_style = StrokeStyle::Custom;
        self.dash_pattern = pattern.iter().copied().collect();
        self
    }

    pub fn without_stroke(mut self) -> Self {
        self.has_stroke = false;
        self
    }

    pub fn has_shadow(&self) -> bool {
        !self.shadow_color.is_transparent()
            && (self.shadow_blur > 0.0
                || self.shadow_offset.x != 0.0
                || self.shadow_offset.y != 0.0)
    }

    /// Dash array for the current stroke style, scaled by stroke width
    ///
    /// Empty for solid strokes.
    pub fn effective_dash_pattern(&self) -> DashPattern {
        let w = self.stroke_width.max(1.0);
        match self.stroke_style {
            StrokeStyle::Solid => DashPattern::new(),
            StrokeStyle::Dashed => [4.0 * w, 2.0 * w].into_iter().collect(),
            StrokeStyle::Dotted => [w, w].into_iter().collect(),
            StrokeStyle::DashDot => [4.0 * w, 2.0 * w, w, 2.0 * w].into_iter().collect(),
            StrokeStyle::Custom => self
                .dash_pattern
                .iter()
                .copied()
                .filter(|d| *d >= 0.0)
                .collect(),
        }
    }
}

/// Font weight
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FontWeight {
    Thin,
    Light,
    #[default]
    Normal,
    Medium,
    SemiBold,
    Bold,
    Black,
}

impl FontWeight {
    /// CSS-style numeric weight
    pub fn to_numeric(self) -> u16 {
        match self {
            FontWeight::Thin => 100,
            FontWeight::Light => 300,
            FontWeight::Normal => 400,
            FontWeight::Medium => 500,
            FontWeight::SemiBold => 600,
            FontWeight::Bold => 700,
            FontWeight::Black => 900,
        }
    }
}

/// Font slant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontSlant {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// Horizontal text alignment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Vertical text anchor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    Middle,
    Bottom,
    #[default]
    Baseline,
}

/// Text rendering parameters
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    pub weight: FontWeight,
    pub slant: FontSlant,
    pub color: Color,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    /// Line height multiplier
    pub line_height: f32,
    pub letter_spacing: f32,
    pub word_spacing: f32,
    pub underline: bool,
    pub strikethrough: bool,
    pub outline_color: Color,
    pub outline_width: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 12.0,
            weight: FontWeight::Normal,
            slant: FontSlant::Normal,
            color: Color::BLACK,
            align: TextAlign::Left,
            baseline: TextBaseline::Baseline,
            line_height: 1.2,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            underline: false,
            strikethrough: false,
            outline_color: Color::TRANSPARENT,
            outline_width: 0.0,
        }
    }
}

impl TextStyle {
    pub fn new(font_size: f32) -> Self {
        Self {
            font_size,
            ..Default::default()
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_slant(mut self, slant: FontSlant) -> Self {
        self.slant = slant;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_baseline(mut self, baseline: TextBaseline) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn has_outline(&self) -> bool {
        self.outline_width > 0.0 && !self.outline_color.is_transparent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_patterns_scale_with_width() {
        let style = DrawingStyle::default()
            .with_stroke(Color::RED, 2.0)
            .with_stroke_style(StrokeStyle::Dashed);
        assert_eq!(style.effective_dash_pattern().as_slice(), &[8.0, 4.0]);

        let solid = DrawingStyle::default();
        assert!(solid.effective_dash_pattern().is_empty());

        let custom = DrawingStyle::default().with_dash(&[3.0, 1.0, -2.0]);
        assert_eq!(custom.effective_dash_pattern().as_slice(), &[3.0, 1.0]);
    }

    #[test]
    fn test_text_style_builder() {
        let style = TextStyle::new(16.0)
            .with_color(Color::WHITE)
            .with_weight(FontWeight::Bold)
            .with_family("DejaVu Sans")
            .with_align(TextAlign::Center);

        assert_eq!(style.font_size, 16.0);
        assert_eq!(style.weight.to_numeric(), 700);
        assert_eq!(style.font_family, "DejaVu Sans");
        assert_eq!(style.align, TextAlign::Center);
        assert!(!style.has_outline());
    }
}
