//! Transport vocabulary shared by audio and video plugins
//!
//! [`MediaTransport`] is the narrow control surface a media widget drives.
//! [`PlaybackClock`] implements its bookkeeping (state machine, clamped
//! seeking, volume and rate) so decoders only have to feed it elapsed time.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{PluginError, Result};

pub const MIN_PLAYBACK_RATE: f32 = 0.25;
pub const MAX_PLAYBACK_RATE: f32 = 4.0;

/// Where media is read from
#[derive(Clone, Debug, PartialEq)]
pub enum MediaSource {
    File(PathBuf),
    /// Network or device stream address
    Stream(String),
    Memory {
        data: Arc<[u8]>,
        /// Format hint such as "mp3"
        extension: String,
    },
}

impl MediaSource {
    /// Lowercase extension used to pick a plugin
    pub fn extension(&self) -> Option<String> {
        match self {
            MediaSource::File(path) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase()),
            MediaSource::Stream(url) => url
                .rsplit('/')
                .next()
                .and_then(|last| last.split('?').next())
                .and_then(|name| name.rsplit_once('.'))
                .map(|(_, ext)| ext.to_ascii_lowercase()),
            MediaSource::Memory { extension, .. } => {
                Some(extension.trim_start_matches('.').to_ascii_lowercase())
            }
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, MediaSource::Stream(_))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Buffering,
    /// Reached the end of a finite source
    Ended,
    Error,
}

/// Audio, video or subtitle track description
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackInfo {
    pub index: usize,
    pub title: String,
    /// BCP 47 tag when known
    pub language: Option<String>,
    pub codec: String,
}

/// Playback controls common to every media player
pub trait MediaTransport: Send {
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    fn seek(&mut self, position: Duration) -> Result<()>;

    fn position(&self) -> Duration;

    /// `None` for live streams
    fn duration(&self) -> Option<Duration>;

    fn state(&self) -> PlaybackState;

    /// Volume in `[0, 1]`
    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    fn set_muted(&mut self, muted: bool);

    fn is_muted(&self) -> bool;

    fn set_rate(&mut self, rate: f32) -> Result<()>;

    fn rate(&self) -> f32;
}

/// Reference transport bookkeeping for player implementations
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackClock {
    state: PlaybackState,
    position: Duration,
    duration: Option<Duration>,
    volume: f32,
    muted: bool,
    rate: f32,
}

impl PlaybackClock {
    pub fn new(duration: Option<Duration>) -> Self {
        Self {
            state: PlaybackState::Stopped,
            position: Duration::ZERO,
            duration,
            volume: 1.0,
            muted: false,
            rate: 1.0,
        }
    }

    /// Advance by wall-clock `elapsed` scaled by the rate
    ///
    /// Returns the new state; a finite source stops at its end.
    pub fn advance(&mut self, elapsed: Duration) -> PlaybackState {
        if self.state != PlaybackState::Playing {
            return self.state;
        }
        self.position += elapsed.mul_f32(self.rate);
        if let Some(duration) = self.duration {
            if self.position >= duration {
                self.position = duration;
                self.state = PlaybackState::Ended;
                debug!(?duration, "playback ended");
            }
        }
        self.state
    }

    pub fn set_buffering(&mut self, buffering: bool) {
        match (buffering, self.state) {
            (true, PlaybackState::Playing) => self.state = PlaybackState::Buffering,
            (false, PlaybackState::Buffering) => self.state = PlaybackState::Playing,
            _ => {}
        }
    }

    pub fn fail(&mut self) {
        self.state = PlaybackState::Error;
    }

    /// Volume applied to samples: zero while muted
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    fn ensure_usable(&self, op: &str) -> Result<()> {
        if self.state == PlaybackState::Error {
            return Err(PluginError::InvalidOperation(format!(
                "{op} on a player in error state"
            )));
        }
        Ok(())
    }
}

impl MediaTransport for PlaybackClock {
    fn play(&mut self) -> Result<()> {
        self.ensure_usable("play")?;
        if self.state == PlaybackState::Ended {
            self.position = Duration::ZERO;
        }
        self.state = PlaybackState::Playing;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.ensure_usable("pause")?;
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Buffering) {
            self.state = PlaybackState::Paused;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.ensure_usable("stop")?;
        self.state = PlaybackState::Stopped;
        self.position = Duration::ZERO;
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        self.ensure_usable("seek")?;
        let Some(duration) = self.duration else {
            return Err(PluginError::InvalidOperation(
                "cannot seek a live stream".to_string(),
            ));
        };
        self.position = position.min(duration);
        if self.state == PlaybackState::Ended && self.position < duration {
            self.state = PlaybackState::Paused;
        }
        Ok(())
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn state(&self) -> PlaybackState {
        self.state
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_rate(&mut self, rate: f32) -> Result<()> {
        if !(MIN_PLAYBACK_RATE..=MAX_PLAYBACK_RATE).contains(&rate) {
            return Err(PluginError::InvalidOperation(format!(
                "playback rate {rate} outside [{MIN_PLAYBACK_RATE}, {MAX_PLAYBACK_RATE}]"
            )));
        }
        self.rate = rate;
        Ok(())
    }

    fn rate(&self) -> f32 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_extension() {
        assert_eq!(
            MediaSource::File(PathBuf::from("/music/Song.MP3")).extension(),
            Some("mp3".to_string())
        );
        assert_eq!(
            MediaSource::Stream("https://example.com/live/stream.m3u8?token=1".to_string())
                .extension(),
            Some("m3u8".to_string())
        );
        let memory = MediaSource::Memory {
            data: Arc::from(vec![0u8; 4]),
            extension: ".OGG".to_string(),
        };
        assert_eq!(memory.extension(), Some("ogg".to_string()));
        assert!(!memory.is_stream());
    }

    #[test]
    fn test_clock_plays_to_end_and_restarts() {
        let mut clock = PlaybackClock::new(Some(Duration::from_secs(10)));
        clock.play().unwrap();
        clock.set_rate(2.0).unwrap();
        assert_eq!(clock.advance(Duration::from_secs(3)), PlaybackState::Playing);
        assert_eq!(clock.position(), Duration::from_secs(6));
        assert_eq!(clock.advance(Duration::from_secs(3)), PlaybackState::Ended);
        assert_eq!(clock.position(), Duration::from_secs(10));

        clock.play().unwrap();
        assert_eq!(clock.position(), Duration::ZERO);
    }

    #[test]
    fn test_clock_limits() {
        let mut clock = PlaybackClock::new(Some(Duration::from_secs(5)));
        clock.seek(Duration::from_secs(60)).unwrap();
        assert_eq!(clock.position(), Duration::from_secs(5));
        assert!(clock.set_rate(8.0).is_err());
        clock.set_volume(1.5);
        assert_eq!(clock.volume(), 1.0);
        clock.set_muted(true);
        assert_eq!(clock.effective_volume(), 0.0);

        let mut live = PlaybackClock::new(None);
        assert!(live.seek(Duration::from_secs(1)).is_err());
        live.fail();
        assert!(live.play().is_err());
    }
}
