//! UltraCanvas Paint
//!
//! Software implementation of [`uc_core::RenderContext`]:
//!
//! - **Raster context**: tiny-skia pixmap with clip masks, gradients and images
//! - **Fonts**: fontdb discovery with an "Arial" fallback chain
//! - **Text measurement**: real glyph advances via ttf-parser
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use uc_core::{Color, Rect2Df, RenderContext};
//! use uc_image::ImageCache;
//! use uc_paint::RasterContext;
//!
//! let mut ctx = RasterContext::new(64, 64, Arc::new(ImageCache::default())).unwrap();
//! ctx.clear(Color::WHITE);
//! ctx.set_fill_color(Color::RED);
//! ctx.fill_rectangle(Rect2Df::new(8.0, 8.0, 16.0, 16.0));
//! assert_eq!(ctx.pixel(12, 12), Some(Color::RED));
//! ```

pub mod error;
pub mod fonts;
pub mod raster;
pub mod shapes;

pub use error::{PaintError, Result};
pub use fonts::{
    global_registry, install_font_measurer, FontFace, FontRegistry, FontTextMeasurer,
    FALLBACK_FAMILY,
};
pub use raster::RasterContext;
