//! Image decoder plugins

use std::path::Path;

use image::ImageFormat;

use crate::data::ImageData;
use crate::error::{ImageError, Result};

/// Decoder for one or more image formats
pub trait ImagePlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Lowercase extensions without the dot
    fn supported_extensions(&self) -> &[&'static str];

    fn can_handle(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext)
    }

    fn load(&self, path: &Path) -> Result<ImageData>;
}

/// Lowercase extension of a path, without the dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Decoder backed by the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultImagePlugin;

impl ImagePlugin for DefaultImagePlugin {
    fn name(&self) -> &str {
        "default"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["png", "jpg", "jpeg", "gif", "webp", "bmp"]
    }

    fn load(&self, path: &Path) -> Result<ImageData> {
        let data = std::fs::read(path)
            .map_err(|e| ImageError::FileLoad(format!("{}: {}", path.display(), e)))?;

        // Prefer the extension's format, fall back to sniffing content
        let decoded = match ImageFormat::from_path(path) {
            Ok(format) => image::load_from_memory_with_format(&data, format)
                .or_else(|_| image::load_from_memory(&data)),
            Err(_) => image::load_from_memory(&data),
        }?;
        Ok(ImageData::from_dynamic_image(decoded))
    }
}
