//! Text measurement and layout
//!
//! Every render context owns a [`TextLayout`], which pairs a shared
//! [`TextMeasurer`] with a resolution (96 DPI unless overridden). Layout
//! breaks text into lines, wraps to a width and positions each line for the
//! requested alignment and vertical anchor.

use std::sync::{Arc, RwLock};

use crate::geometry::{Point2Df, Rect2Df};
use crate::style::{FontSlant, FontWeight, TextAlign, TextBaseline, TextStyle};

/// Reference resolution; font sizes are pixels at this DPI
pub const DEFAULT_DPI: f32 = 96.0;

/// Text layout options that affect measurement
#[derive(Debug, Clone)]
pub struct TextLayoutOptions {
    /// Line height multiplier (1.0 = default, 1.5 = 150%)
    pub line_height: f32,
    /// Extra spacing between letters in pixels
    pub letter_spacing: f32,
    /// Extra spacing between words in pixels
    pub word_spacing: f32,
    /// Maximum width for wrapping (None = no wrapping)
    pub max_width: Option<f32>,
    pub font_family: String,
    pub weight: FontWeight,
    pub slant: FontSlant,
}

impl Default for TextLayoutOptions {
    fn default() -> Self {
        Self {
            line_height: 1.2,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            max_width: None,
            font_family: "Arial".to_string(),
            weight: FontWeight::Normal,
            slant: FontSlant::Normal,
        }
    }
}

impl TextLayoutOptions {
    pub fn from_style(style: &TextStyle) -> Self {
        Self {
            line_height: style.line_height,
            letter_spacing: style.letter_spacing,
            word_spacing: style.word_spacing,
            max_width: None,
            font_family: style.font_family.clone(),
            weight: style.weight,
            slant: style.slant,
        }
    }

    pub fn with_max_width(mut self, width: f32) -> Self {
        self.max_width = Some(width);
        self
    }
}

/// Text measurement result
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    /// Width in pixels
    pub width: f32,
    /// Height in pixels (accounts for line height and number of lines)
    pub height: f32,
    /// Distance from baseline to top
    pub ascender: f32,
    /// Distance from baseline to bottom, typically negative
    pub descender: f32,
    pub line_count: u32,
}

/// Measures text dimensions
pub trait TextMeasurer: Send + Sync {
    /// Measure a string with full layout options
    fn measure_with_options(
        &self,
        text: &str,
        font_size: f32,
        options: &TextLayoutOptions,
    ) -> TextMetrics;

    /// Measure with default options
    fn measure(&self, text: &str, font_size: f32) -> TextMetrics {
        self.measure_with_options(text, font_size, &TextLayoutOptions::default())
    }
}

/// Estimating measurer used when no font engine is installed
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedTextMeasurer;

impl TextMeasurer for EstimatedTextMeasurer {
    fn measure_with_options(
        &self,
        text: &str,
        font_size: f32,
        options: &TextLayoutOptions,
    ) -> TextMetrics {
        let char_count = text.chars().count() as f32;
        let word_count = text.split_whitespace().count().max(1) as f32;

        // ~0.55 * font_size per character for proportional fonts
        let base_width = char_count * font_size * 0.55;
        let letter_spacing_total = (char_count - 1.0).max(0.0) * options.letter_spacing;
        let word_spacing_total = (word_count - 1.0).max(0.0) * options.word_spacing;
        let total_width = base_width + letter_spacing_total + word_spacing_total;

        let (width, line_count) = match options.max_width {
            Some(max_width) if max_width > 0.0 && total_width > max_width => {
                (max_width, ((total_width / max_width).ceil() as u32).max(1))
            }
            _ => (total_width, 1),
        };

        TextMetrics {
            width,
            height: font_size * options.line_height * line_count as f32,
            ascender: font_size * 0.8,
            descender: font_size * -0.2,
            line_count,
        }
    }
}

static TEXT_MEASURER: RwLock<Option<Arc<dyn TextMeasurer>>> = RwLock::new(None);

/// Install the process-wide default measurer
///
/// Call at startup with a measurer backed by a real font engine.
pub fn set_text_measurer(measurer: Arc<dyn TextMeasurer>) {
    let mut slot = TEXT_MEASURER
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = Some(measurer);
}

/// Current default measurer, falling back to [`EstimatedTextMeasurer`]
pub fn text_measurer() -> Arc<dyn TextMeasurer> {
    let slot = TEXT_MEASURER
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    slot.clone()
        .unwrap_or_else(|| Arc::new(EstimatedTextMeasurer) as Arc<dyn TextMeasurer>)
}

/// One positioned line of laid-out text
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutLine {
    pub text: String,
    /// Left edge of the line
    pub x: f32,
    /// Baseline position
    pub baseline: f32,
    pub width: f32,
    /// Extra space added to each inter-word gap (justified lines)
    pub extra_word_spacing: f32,
}

/// Result of laying out text inside a rectangle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<LaidOutLine>,
    pub metrics: TextMetrics,
}

/// Per-context text layout object
#[derive(Clone)]
pub struct TextLayout {
    measurer: Arc<dyn TextMeasurer>,
    dpi: f32,
}

impl std::fmt::Debug for TextLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayout").field("dpi", &self.dpi).finish()
    }
}

impl Default for TextLayout {
    fn default() -> Self {
        Self::new(text_measurer())
    }
}

impl TextLayout {
    pub fn new(measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            measurer,
            dpi: DEFAULT_DPI,
        }
    }

    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    /// Override the resolution; non-positive values restore the default
    pub fn set_dpi(&mut self, dpi: f32) {
        self.dpi = if dpi > 0.0 { dpi } else { DEFAULT_DPI };
    }

    pub fn set_measurer(&mut self, measurer: Arc<dyn TextMeasurer>) {
        self.measurer = measurer;
    }

    pub fn measurer(&self) -> &Arc<dyn TextMeasurer> {
        &self.measurer
    }

    /// Font size in device pixels at the current resolution
    pub fn pixel_size(&self, style: &TextStyle) -> f32 {
        style.font_size * self.dpi / DEFAULT_DPI
    }

    /// Measure the laid-out string (all lines, no wrapping)
    pub fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let size = self.pixel_size(style);
        let options = TextLayoutOptions::from_style(style);
        let mut metrics = TextMetrics {
            ascender: size * 0.8,
            descender: size * -0.2,
            ..Default::default()
        };
        for line in text.split('\n') {
            let m = self.measurer.measure_with_options(line, size, &options);
            metrics.width = metrics.width.max(m.width);
            metrics.ascender = m.ascender;
            metrics.descender = m.descender;
            metrics.line_count += 1;
        }
        metrics.height = size * style.line_height * metrics.line_count as f32;
        metrics
    }

    fn line_width(&self, text: &str, size: f32, options: &TextLayoutOptions) -> f32 {
        self.measurer.measure_with_options(text, size, options).width
    }

    /// Break text into lines no wider than `max_width` where word breaks allow
    pub fn wrap(&self, text: &str, style: &TextStyle, max_width: Option<f32>) -> Vec<String> {
        let size = self.pixel_size(style);
        let options = TextLayoutOptions::from_style(style);
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let Some(limit) = max_width.filter(|w| *w > 0.0) else {
                lines.push(paragraph.to_string());
                continue;
            };

            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                if current.is_empty() {
                    current.push_str(word);
                    continue;
                }
                let candidate = format!("{} {}", current, word);
                if self.line_width(&candidate, size, &options) <= limit {
                    current = candidate;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                }
            }
            lines.push(current);
        }
        lines
    }

    /// Lay out text inside `rect`, honoring alignment and vertical anchor
    ///
    /// `Middle` centers the whole laid-out block vertically.
    pub fn layout_in_rect(&self, text: &str, style: &TextStyle, rect: &Rect2Df) -> TextBlock {
        let size = self.pixel_size(style);
        let options = TextLayoutOptions::from_style(style);
        let wrapped = self.wrap(text, style, Some(rect.width));
        let line_height = size * style.line_height;
        let total_height = line_height * wrapped.len() as f32;
        let ascender = size * 0.8;

        let top = match style.baseline {
            TextBaseline::Top | TextBaseline::Baseline => rect.y,
            TextBaseline::Middle => rect.y + (rect.height - total_height) / 2.0,
            TextBaseline::Bottom => rect.bottom() - total_height,
        };

        let count = wrapped.len();
        let mut max_width = 0.0f32;
        let lines = wrapped
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let width = self.line_width(&line, size, &options);
                max_width = max_width.max(width);
                let gaps = line.split_whitespace().count().saturating_sub(1);
                let is_last = i + 1 == count;

                let (x, extra_word_spacing) = match style.align {
                    TextAlign::Left => (rect.x, 0.0),
                    TextAlign::Center => (rect.x + (rect.width - width) / 2.0, 0.0),
                    TextAlign::Right => (rect.right() - width, 0.0),
                    TextAlign::Justify if !is_last && gaps > 0 && width < rect.width => {
                        (rect.x, (rect.width - width) / gaps as f32)
                    }
                    TextAlign::Justify => (rect.x, 0.0),
                };

                LaidOutLine {
                    baseline: top + i as f32 * line_height + (line_height - size) / 2.0 + ascender,
                    text: line,
                    x,
                    width,
                    extra_word_spacing,
                }
            })
            .collect();

        TextBlock {
            lines,
            metrics: TextMetrics {
                width: max_width,
                height: total_height,
                ascender,
                descender: size * -0.2,
                line_count: count as u32,
            },
        }
    }

    /// Baseline origin for a single line drawn with its top-left at `origin`
    pub fn baseline_origin(&self, origin: Point2Df, style: &TextStyle) -> Point2Df {
        Point2Df::new(origin.x, origin.y + self.pixel_size(style) * 0.8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> TextLayout {
        TextLayout::new(Arc::new(EstimatedTextMeasurer))
    }

    #[test]
    fn test_estimated_measurement() {
        let m = EstimatedTextMeasurer.measure("Hello", 20.0);
        assert!((m.width - 55.0).abs() < 1e-3);
        assert!((m.height - 24.0).abs() < 1e-3);
        assert_eq!(m.line_count, 1);
    }

    #[test]
    fn test_dpi_scales_font_size() {
        let mut layout = layout();
        let style = TextStyle::new(12.0);
        let at_96 = layout.measure("abc", &style);
        layout.set_dpi(192.0);
        let at_192 = layout.measure("abc", &style);
        assert!((at_192.width - at_96.width * 2.0).abs() < 1e-3);

        layout.set_dpi(-1.0);
        assert_eq!(layout.dpi(), DEFAULT_DPI);
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        let style = TextStyle::new(10.0);
        // 5.5 px per char: "aaaa bbbb" is 49.5 px
        let lines = layout().wrap("aaaa bbbb cccc", &style, Some(50.0));
        assert_eq!(lines, vec!["aaaa bbbb".to_string(), "cccc".to_string()]);

        let unwrapped = layout().wrap("one\ntwo", &style, None);
        assert_eq!(unwrapped.len(), 2);
    }

    #[test]
    fn test_layout_alignment() {
        let rect = Rect2Df::new(0.0, 0.0, 100.0, 40.0);
        let style = TextStyle::new(10.0).with_align(TextAlign::Right);
        let block = layout().layout_in_rect("ab", &style, &rect);
        assert!((block.lines[0].x - 89.0).abs() < 1e-3);

        let centered = TextStyle::new(10.0).with_align(TextAlign::Center);
        let block = layout().layout_in_rect("ab", &centered, &rect);
        assert!((block.lines[0].x - 44.5).abs() < 1e-3);
    }

    #[test]
    fn test_middle_centers_block() {
        let rect = Rect2Df::new(0.0, 0.0, 200.0, 100.0);
        let style = TextStyle::new(10.0).with_baseline(TextBaseline::Middle);
        let block = layout().layout_in_rect("x", &style, &rect);
        // one 12 px line centered in 100 px: top at 44, baseline at 44 + 1 + 8
        assert!((block.lines[0].baseline - 53.0).abs() < 1e-3);
    }

    #[test]
    fn test_justify_spreads_all_but_last_line() {
        let rect = Rect2Df::new(0.0, 0.0, 60.0, 100.0);
        let style = TextStyle::new(10.0).with_align(TextAlign::Justify);
        let block = layout().layout_in_rect("aa bb cc dd", &style, &rect);
        assert!(block.lines.len() >= 2);
        assert!(block.lines[0].extra_word_spacing > 0.0);
        assert_eq!(block.lines.last().map(|l| l.extra_word_spacing), Some(0.0));
    }
}
