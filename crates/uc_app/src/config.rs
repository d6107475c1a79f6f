//! Application configuration
//!
//! Loaded from TOML; every field has a default so partial files work:
//!
//! ```toml
//! target_fps = 60
//! poll_timeout_ms = 16
//! drag_threshold = 5.0
//!
//! [double_click]
//! interval_ms = 400
//! distance = 4.0
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uc_image::DEFAULT_CACHE_BUDGET;

use crate::error::{AppError, Result};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Frame cap; 0 renders as fast as events arrive
    pub target_fps: u32,
    /// Longest blocking wait for native events when idle
    pub poll_timeout_ms: u64,
    pub drag_threshold: f64,
    pub double_click: DoubleClickConfig,
    pub image_cache_budget: usize,
    pub plugin_timeout_secs: u64,
    pub text_dpi: f32,
    /// Rasterize windows in memory instead of recording commands
    pub raster_surfaces: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DoubleClickConfig {
    pub interval_ms: u64,
    pub distance: f64,
}

impl Default for DoubleClickConfig {
    fn default() -> Self {
        Self {
            interval_ms: uc_ui::DEFAULT_DOUBLE_CLICK_INTERVAL.as_millis() as u64,
            distance: uc_ui::DEFAULT_DOUBLE_CLICK_DISTANCE,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            poll_timeout_ms: 16,
            drag_threshold: uc_ui::DEFAULT_DRAG_THRESHOLD,
            double_click: DoubleClickConfig::default(),
            image_cache_budget: DEFAULT_CACHE_BUDGET,
            plugin_timeout_secs: uc_plugin::DEFAULT_RENDER_TIMEOUT.as_secs(),
            text_dpi: uc_core::DEFAULT_DPI,
            raster_surfaces: false,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.drag_threshold < 0.0 || !self.drag_threshold.is_finite() {
            return Err(AppError::Config(format!(
                "drag_threshold must be a non-negative number, got {}",
                self.drag_threshold
            )));
        }
        if self.double_click.distance < 0.0 {
            return Err(AppError::Config(
                "double_click.distance must be non-negative".to_string(),
            ));
        }
        if self.text_dpi <= 0.0 {
            return Err(AppError::Config("text_dpi must be positive".to_string()));
        }
        if self.plugin_timeout_secs == 0 {
            return Err(AppError::Config(
                "plugin_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Minimum time between frames, if capped
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs_f64(1.0 / self.target_fps as f64))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn double_click_interval(&self) -> Duration {
        Duration::from_millis(self.double_click.interval_ms)
    }

    pub fn plugin_timeout(&self) -> Duration {
        Duration::from_secs(self.plugin_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = AppConfig::from_toml_str(
            "target_fps = 30\n[double_click]\ninterval_ms = 250\n",
        )
        .unwrap();
        assert_eq!(config.target_fps, 30);
        assert_eq!(config.double_click_interval(), Duration::from_millis(250));
        assert_eq!(config.double_click.distance, 4.0);
        assert_eq!(config.plugin_timeout(), Duration::from_secs(30));
        assert_eq!(config.drag_threshold, 5.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_toml_str("drag_threshold = -1.0").is_err());
        assert!(AppConfig::from_toml_str("text_dpi = 0.0").is_err());
        assert!(AppConfig::from_toml_str("target_fps = \"fast\"").is_err());
    }

    #[test]
    fn test_frame_interval() {
        let config = AppConfig {
            target_fps: 0,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), None);
        let text = AppConfig::default().to_toml_string().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text).unwrap(), AppConfig::default());
    }
}
