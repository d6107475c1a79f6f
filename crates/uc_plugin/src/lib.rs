//! UltraCanvas Plugins
//!
//! Narrow interfaces for functionality the core treats opaquely:
//!
//! - **Audio**: open files or streams, transport, volume/rate, track lists,
//!   optional visualization data
//! - **Video**: the same transport plus frame access and track/quality
//!   selection
//! - **Diagram**: validate, describe and render text sources to SVG/PNG,
//!   synchronously or on a background worker with a timeout
//!
//! Image decoding plugins live in `uc_image`.
//!
//! # Example
//!
//! ```rust
//! use uc_plugin::{diagram_plugin_for, DiagramFormat};
//!
//! let plugin = diagram_plugin_for("edges").unwrap();
//! let svg = plugin.render("a -> b", DiagramFormat::Svg).unwrap();
//! assert!(svg.starts_with(b"<svg"));
//! ```

pub mod audio;
pub mod diagram;
pub mod error;
pub mod media;
pub mod registry;
pub mod video;

pub use audio::{AudioPlayer, AudioPlugin, AudioVisualization};
pub use diagram::{
    render_with_timeout, DiagramCapabilities, DiagramFormat, DiagramMetadata, DiagramPlugin,
    EdgeListPlugin, DEFAULT_RENDER_TIMEOUT,
};
pub use error::{PluginError, Result};
pub use media::{
    MediaSource, MediaTransport, PlaybackClock, PlaybackState, TrackInfo, MAX_PLAYBACK_RATE,
    MIN_PLAYBACK_RATE,
};
pub use registry::{
    audio_plugin_for, audio_plugins, diagram_plugin_for, diagram_plugins, video_plugin_for,
    video_plugins, PluginRegistry,
};
pub use video::{VideoFrame, VideoPlayer, VideoPlugin, VideoQuality};
