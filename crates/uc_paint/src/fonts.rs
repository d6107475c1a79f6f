//! Font discovery, metrics and glyph outlines
//!
//! Uses fontdb to find fonts by family and ttf-parser to read metrics and
//! outlines. The registry is a process-wide lazily-initialized singleton;
//! every lookup goes through its mutex. A family that cannot be found falls
//! back to "Arial", then to any sans-serif face, then to the first face in
//! the database.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use rustc_hash::FxHashMap;
use tiny_skia::PathBuilder;
use tracing::{debug, warn};
use uc_core::{
    EstimatedTextMeasurer, FontSlant, FontWeight, TextLayoutOptions, TextMeasurer, TextMetrics,
};

use crate::error::{PaintError, Result};

/// Family used when the requested one is missing
pub const FALLBACK_FAMILY: &str = "Arial";

/// Known system font paths loaded without a full scan
#[cfg(target_os = "macos")]
const KNOWN_FONT_PATHS: &[&str] = &[
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/Times.ttc",
    "/System/Library/Fonts/Menlo.ttc",
    "/Library/Fonts/Arial.ttf",
];

#[cfg(target_os = "windows")]
const KNOWN_FONT_PATHS: &[&str] = &[
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\times.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const KNOWN_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
];

/// A parsed font face with its metrics in font units
pub struct FontFace {
    data: Arc<Vec<u8>>,
    face_index: u32,
    family: String,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    line_gap: i16,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("face_index", &self.face_index)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

impl FontFace {
    pub fn from_data(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let data = Arc::new(data);
        let face = ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| PaintError::Font(format!("{:?}", e)))?;

        let family = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::FAMILY)
            .and_then(|n| n.to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let (units_per_em, ascender, descender, line_gap) = (
            face.units_per_em(),
            face.ascender(),
            face.descender(),
            face.line_gap(),
        );

        Ok(Self {
            data: Arc::clone(&data),
            face_index,
            family,
            units_per_em,
            ascender,
            descender,
            line_gap,
        })
    }

    fn parse(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.face_index).ok()
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    fn scale(&self, size: f32) -> f32 {
        size / self.units_per_em.max(1) as f32
    }

    pub fn ascender_px(&self, size: f32) -> f32 {
        self.ascender as f32 * self.scale(size)
    }

    pub fn descender_px(&self, size: f32) -> f32 {
        self.descender as f32 * self.scale(size)
    }

    pub fn line_gap_px(&self, size: f32) -> f32 {
        self.line_gap as f32 * self.scale(size)
    }

    /// Advance of one character in pixels, zero for unmapped glyphs
    pub fn advance_px(&self, c: char, size: f32) -> f32 {
        let Some(face) = self.parse() else {
            return 0.0;
        };
        face.glyph_index(c)
            .and_then(|id| face.glyph_hor_advance(id))
            .map(|adv| adv as f32 * self.scale(size))
            .unwrap_or(0.0)
    }

    /// Total advance of a run, including letter and word spacing
    pub fn run_width(&self, text: &str, size: f32, letter_spacing: f32, word_spacing: f32) -> f32 {
        let mut width = 0.0;
        let mut count = 0usize;
        for c in text.chars() {
            width += self.advance_px(c, size);
            if c == ' ' {
                width += word_spacing;
            }
            count += 1;
        }
        width + count.saturating_sub(1) as f32 * letter_spacing
    }

    /// Append glyph outlines of `text` to `builder`, baseline at (x, y)
    ///
    /// Returns the advance consumed.
    pub fn append_outlines(
        &self,
        builder: &mut PathBuilder,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        letter_spacing: f32,
        word_spacing: f32,
    ) -> f32 {
        let Some(face) = self.parse() else {
            return 0.0;
        };
        let scale = self.scale(size);
        let mut pen_x = x;
        for c in text.chars() {
            if c == ' ' {
                pen_x += word_spacing;
            }
            let Some(id) = face.glyph_index(c) else {
                continue;
            };
            let mut outline = GlyphOutline {
                builder: &mut *builder,
                origin_x: pen_x,
                origin_y: y,
                scale,
            };
            face.outline_glyph(id, &mut outline);
            let advance = face.glyph_hor_advance(id).unwrap_or(0) as f32 * scale;
            pen_x += advance + letter_spacing;
        }
        pen_x - x
    }
}

/// Adapts ttf-parser outlines (y up, font units) into a tiny-skia path
struct GlyphOutline<'a> {
    builder: &'a mut PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphOutline<'_> {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for GlyphOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Font database plus a cache of resolved faces
pub struct FontRegistry {
    db: Database,
    faces: FxHashMap<String, Option<Arc<FontFace>>>,
    system_fonts_loaded: bool,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    /// Registry seeded with well-known system fonts; full scan deferred
    pub fn new() -> Self {
        let mut db = Database::new();
        let mut loaded = 0;
        for path in KNOWN_FONT_PATHS {
            if Path::new(path).exists() && db.load_font_file(path).is_ok() {
                loaded += 1;
            }
        }
        debug!("Loaded {} known system fonts", loaded);
        Self {
            db,
            faces: FxHashMap::default(),
            system_fonts_loaded: false,
        }
    }

    /// Registry that never scans the system (bundled fonts only)
    pub fn empty() -> Self {
        Self {
            db: Database::new(),
            faces: FxHashMap::default(),
            system_fonts_loaded: true,
        }
    }

    /// Load fonts from raw data; returns the number of faces added
    pub fn load_font_data(&mut self, data: Vec<u8>) -> usize {
        let before = self.db.len();
        self.db.load_font_data(data);
        // negative lookups may now succeed
        self.faces.retain(|_, face| face.is_some());
        self.db.len() - before
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    fn ensure_system_fonts_loaded(&mut self) {
        if self.system_fonts_loaded {
            return;
        }
        debug!("Loading all system fonts (lazy scan)");
        self.db.load_system_fonts();
        self.system_fonts_loaded = true;
    }

    fn query(&self, family: Family<'_>, weight: FontWeight, slant: FontSlant) -> Option<fontdb::ID> {
        let style = match slant {
            FontSlant::Normal => Style::Normal,
            FontSlant::Italic => Style::Italic,
            FontSlant::Oblique => Style::Oblique,
        };
        let families = [family];
        self.db.query(&Query {
            families: &families,
            weight: Weight(weight.to_numeric()),
            stretch: Stretch::Normal,
            style,
        })
    }

    fn load_face(&self, id: fontdb::ID) -> Option<Arc<FontFace>> {
        let (data, index) = self
            .db
            .with_face_data(id, |data, index| (data.to_vec(), index))?;
        match FontFace::from_data(data, index) {
            Ok(face) => Some(Arc::new(face)),
            Err(err) => {
                warn!(%err, "failed to parse font face");
                None
            }
        }
    }

    fn find(&mut self, family: &str, weight: FontWeight, slant: FontSlant) -> Option<fontdb::ID> {
        if let Some(id) = self.query(Family::Name(family), weight, slant) {
            return Some(id);
        }
        self.ensure_system_fonts_loaded();
        self.query(Family::Name(family), weight, slant)
    }

    /// Resolve a face, walking the fallback chain
    pub fn resolve(
        &mut self,
        family: &str,
        weight: FontWeight,
        slant: FontSlant,
    ) -> Option<Arc<FontFace>> {
        let key = format!("{}:{:?}:{:?}", family, weight, slant);
        if let Some(cached) = self.faces.get(&key) {
            return cached.clone();
        }

        let id = self
            .find(family, weight, slant)
            .or_else(|| {
                debug!(family, "font not found, falling back to {}", FALLBACK_FAMILY);
                self.find(FALLBACK_FAMILY, weight, slant)
            })
            .or_else(|| self.query(Family::SansSerif, weight, slant))
            .or_else(|| self.db.faces().next().map(|f| f.id));

        let face = id.and_then(|id| self.load_face(id));
        if face.is_none() {
            warn!(family, "no usable font face available");
        }
        self.faces.insert(key, face.clone());
        face
    }
}

static REGISTRY: OnceLock<Arc<Mutex<FontRegistry>>> = OnceLock::new();

/// The process-wide font registry
pub fn global_registry() -> Arc<Mutex<FontRegistry>> {
    Arc::clone(REGISTRY.get_or_init(|| Arc::new(Mutex::new(FontRegistry::new()))))
}

pub(crate) fn lock_registry(registry: &Mutex<FontRegistry>) -> MutexGuard<'_, FontRegistry> {
    registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Text measurer backed by real font advances
///
/// Falls back to estimation when no face resolves.
#[derive(Clone)]
pub struct FontTextMeasurer {
    registry: Arc<Mutex<FontRegistry>>,
}

impl Default for FontTextMeasurer {
    fn default() -> Self {
        Self::new(global_registry())
    }
}

impl FontTextMeasurer {
    pub fn new(registry: Arc<Mutex<FontRegistry>>) -> Self {
        Self { registry }
    }
}

impl TextMeasurer for FontTextMeasurer {
    fn measure_with_options(
        &self,
        text: &str,
        font_size: f32,
        options: &TextLayoutOptions,
    ) -> TextMetrics {
        let face = lock_registry(&self.registry).resolve(
            &options.font_family,
            options.weight,
            options.slant,
        );
        let Some(face) = face else {
            return EstimatedTextMeasurer.measure_with_options(text, font_size, options);
        };

        let total = face.run_width(text, font_size, options.letter_spacing, options.word_spacing);
        let (width, line_count) = match options.max_width {
            Some(max) if max > 0.0 && total > max => (max, ((total / max).ceil() as u32).max(1)),
            _ => (total, 1),
        };

        TextMetrics {
            width,
            height: font_size * options.line_height * line_count as f32,
            ascender: face.ascender_px(font_size),
            descender: face.descender_px(font_size),
            line_count,
        }
    }
}

/// Install a font-backed measurer as the process default
pub fn install_font_measurer() {
    uc_core::set_text_measurer(Arc::new(FontTextMeasurer::default()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_resolves_nothing() {
        let mut registry = FontRegistry::empty();
        assert_eq!(registry.face_count(), 0);
        assert!(registry
            .resolve("Definitely Missing", FontWeight::Normal, FontSlant::Normal)
            .is_none());
    }

    #[test]
    fn test_measurer_falls_back_to_estimate() {
        let measurer = FontTextMeasurer::new(Arc::new(Mutex::new(FontRegistry::empty())));
        let options = TextLayoutOptions::default();
        let measured = measurer.measure_with_options("Hello", 20.0, &options);
        let estimated = EstimatedTextMeasurer.measure_with_options("Hello", 20.0, &options);
        assert_eq!(measured, estimated);
    }

    #[test]
    fn test_invalid_font_data_rejected() {
        assert!(FontFace::from_data(vec![0, 1, 2, 3], 0).is_err());
        let mut registry = FontRegistry::empty();
        assert_eq!(registry.load_font_data(vec![0; 16]), 0);
    }
}
