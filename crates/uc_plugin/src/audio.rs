//! Audio plugin interface

use crate::error::Result;
use crate::media::{MediaSource, MediaTransport, TrackInfo};

/// Spectrum and level data for visualizers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioVisualization {
    /// Magnitudes in `[0, 1]`, low to high frequency
    pub spectrum: Vec<f32>,
    /// Peak level per channel in `[0, 1]`
    pub peaks: Vec<f32>,
}

/// An opened audio source
pub trait AudioPlayer: MediaTransport {
    fn tracks(&self) -> Vec<TrackInfo>;

    fn select_track(&mut self, index: usize) -> Result<()>;

    fn current_track(&self) -> Option<usize>;

    /// Latest analysis frame, if the player computes one
    fn visualization(&self) -> Option<AudioVisualization> {
        None
    }
}

/// Opens audio sources of the formats it supports
pub trait AudioPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Lowercase extensions without the dot
    fn supported_extensions(&self) -> &[&'static str];

    fn can_handle(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext)
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    fn open(&self, source: &MediaSource) -> Result<Box<dyn AudioPlayer>>;
}
