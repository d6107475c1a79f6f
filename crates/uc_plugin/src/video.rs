//! Video plugin interface

use std::time::Duration;

use crate::error::Result;
use crate::media::{MediaSource, MediaTransport, TrackInfo};

/// One decoded frame, RGBA8 rows without padding
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VideoFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Duration,
    pub frame_number: u64,
}

impl VideoFrame {
    /// True when the buffer matches the dimensions
    pub fn is_complete(&self) -> bool {
        self.pixels.len() == self.width as usize * self.height as usize * 4
    }
}

/// Selectable rendition of a stream
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VideoQuality {
    pub index: usize,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub bitrate: u64,
}

/// An opened video source
pub trait VideoPlayer: MediaTransport {
    /// A frame newer than the last one taken is available
    fn has_new_frame(&self) -> bool;

    fn current_frame(&mut self) -> Option<VideoFrame>;

    fn audio_tracks(&self) -> Vec<TrackInfo>;

    fn select_audio_track(&mut self, index: usize) -> Result<()>;

    fn subtitle_tracks(&self) -> Vec<TrackInfo>;

    /// `None` turns subtitles off
    fn select_subtitle_track(&mut self, index: Option<usize>) -> Result<()>;

    fn qualities(&self) -> Vec<VideoQuality> {
        Vec::new()
    }

    fn select_quality(&mut self, _index: usize) -> Result<()> {
        Ok(())
    }
}

/// Opens video sources of the formats it supports
pub trait VideoPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn supported_extensions(&self) -> &[&'static str];

    fn can_handle(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext)
    }

    fn open(&self, source: &MediaSource) -> Result<Box<dyn VideoPlayer>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_completeness() {
        let frame = VideoFrame {
            pixels: vec![0; 2 * 2 * 4],
            width: 2,
            height: 2,
            ..Default::default()
        };
        assert!(frame.is_complete());
        let short = VideoFrame {
            pixels: vec![0; 3],
            ..frame
        };
        assert!(!short.is_complete());
    }
}
