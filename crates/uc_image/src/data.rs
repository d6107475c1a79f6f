//! Decoded image data

use base64::Engine;
use image::{DynamicImage, GenericImageView};

use crate::error::{ImageError, Result};

/// Decoded straight-alpha RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl ImageData {
    /// Create from raw RGBA pixels
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected_len = width as usize * height as usize * 4;
        if pixels.len() != expected_len {
            return Err(ImageError::Decode(format!(
                "Invalid pixel data length: expected {}, got {}",
                expected_len,
                pixels.len()
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Solid-color image, mostly useful for tests and placeholders
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Decode from encoded bytes (format sniffed from content)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)?;
        Ok(Self::from_dynamic_image(img))
    }

    /// Decode a base64 payload or a `data:image/...;base64,` URI
    pub fn from_base64(data: &str) -> Result<Self> {
        let payload = if data.starts_with("data:") {
            data.find(";base64,")
                .map(|pos| &data[pos + 8..])
                .ok_or_else(|| ImageError::Base64("Invalid data URI format".to_string()))?
        } else {
            data
        };
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim())?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_dynamic_image(img: DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            pixels: img.to_rgba8().into_raw(),
            width,
            height,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes of pixel storage, used for cache accounting
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    /// RGBA of one pixel, `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED_PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_from_rgba() {
        let data = ImageData::from_rgba(vec![255, 0, 0, 255].repeat(4), 2, 2).unwrap();
        assert_eq!(data.dimensions(), (2, 2));
        assert_eq!(data.byte_len(), 16);
        assert_eq!(data.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(data.pixel(2, 0), None);
    }

    #[test]
    fn test_invalid_rgba_length() {
        assert!(ImageData::from_rgba(vec![255, 0, 0, 255], 2, 2).is_err());
    }

    #[test]
    fn test_base64_data_uri() {
        let img = ImageData::from_base64(RED_PIXEL_PNG).unwrap();
        assert_eq!(img.dimensions(), (1, 1));
    }

    #[test]
    fn test_filled() {
        let img = ImageData::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(img.byte_len(), 24);
        assert_eq!(img.pixel(2, 1), Some([1, 2, 3, 4]));
    }
}
