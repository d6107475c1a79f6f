//! UltraCanvas image loading
//!
//! Decoded image data, decoder plugins and the shared LRU [`ImageCache`]
//! that render contexts receive at construction.

pub mod cache;
pub mod data;
pub mod error;
pub mod plugin;

pub use cache::{ImageCache, ImageKey, DEFAULT_CACHE_BUDGET};
pub use data::ImageData;
pub use error::{ImageError, Result};
pub use plugin::{DefaultImagePlugin, ImagePlugin};
