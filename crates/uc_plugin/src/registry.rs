//! Process-wide plugin registries
//!
//! Registries are append-only. Lookups return the most recently registered
//! plugin that accepts the format, so applications can override built-ins.

use std::sync::{Arc, OnceLock, RwLock};

use tracing::info;

use crate::audio::AudioPlugin;
use crate::diagram::{DiagramPlugin, EdgeListPlugin};
use crate::error::{PluginError, Result};
use crate::video::VideoPlugin;

/// Append-only list of plugins of one kind
pub struct PluginRegistry<P: ?Sized> {
    kind: &'static str,
    plugins: RwLock<Vec<Arc<P>>>,
}

impl<P: ?Sized> std::fmt::Debug for PluginRegistry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("kind", &self.kind)
            .field("plugins", &self.len())
            .finish()
    }
}

impl<P: ?Sized> PluginRegistry<P> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            plugins: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, plugin: Arc<P>) {
        let mut plugins = self.plugins.write().unwrap_or_else(|p| p.into_inner());
        plugins.push(plugin);
        info!(kind = self.kind, count = plugins.len(), "plugin registered");
    }

    /// Newest plugin matching `accepts`
    pub fn find(&self, accepts: impl Fn(&P) -> bool) -> Option<Arc<P>> {
        self.plugins
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .rev()
            .find(|plugin| accepts(plugin))
            .cloned()
    }

    pub fn all(&self) -> Vec<Arc<P>> {
        self.plugins
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.plugins
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn audio_plugins() -> &'static PluginRegistry<dyn AudioPlugin> {
    static REGISTRY: OnceLock<PluginRegistry<dyn AudioPlugin>> = OnceLock::new();
    REGISTRY.get_or_init(|| PluginRegistry::new("audio"))
}

pub fn video_plugins() -> &'static PluginRegistry<dyn VideoPlugin> {
    static REGISTRY: OnceLock<PluginRegistry<dyn VideoPlugin>> = OnceLock::new();
    REGISTRY.get_or_init(|| PluginRegistry::new("video"))
}

/// Diagram registry, seeded with [`EdgeListPlugin`]
pub fn diagram_plugins() -> &'static PluginRegistry<dyn DiagramPlugin> {
    static REGISTRY: OnceLock<PluginRegistry<dyn DiagramPlugin>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let registry = PluginRegistry::new("diagram");
        registry.register(Arc::new(EdgeListPlugin) as Arc<dyn DiagramPlugin>);
        registry
    })
}

pub fn audio_plugin_for(extension: &str) -> Result<Arc<dyn AudioPlugin>> {
    audio_plugins()
        .find(|p| p.can_handle(extension))
        .ok_or_else(|| PluginError::Unsupported(format!("audio format `{extension}`")))
}

pub fn video_plugin_for(extension: &str) -> Result<Arc<dyn VideoPlugin>> {
    video_plugins()
        .find(|p| p.can_handle(extension))
        .ok_or_else(|| PluginError::Unsupported(format!("video format `{extension}`")))
}

pub fn diagram_plugin_for(language: &str) -> Result<Arc<dyn DiagramPlugin>> {
    diagram_plugins()
        .find(|p| p.can_handle(language))
        .ok_or_else(|| PluginError::Unsupported(format!("diagram language `{language}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioPlayer;
    use crate::media::MediaSource;

    struct Named(&'static str, &'static [&'static str]);

    impl AudioPlugin for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn supported_extensions(&self) -> &[&'static str] {
            self.1
        }

        fn open(&self, _source: &MediaSource) -> Result<Box<dyn AudioPlayer>> {
            Err(PluginError::Load(self.0.to_string()))
        }
    }

    #[test]
    fn test_newest_plugin_wins() {
        let registry: PluginRegistry<dyn AudioPlugin> = PluginRegistry::new("audio");
        registry.register(Arc::new(Named("first", &["mp3", "wav"])));
        registry.register(Arc::new(Named("second", &["mp3"])));

        assert_eq!(registry.len(), 2);
        let mp3 = registry.find(|p| p.can_handle("MP3")).unwrap();
        assert_eq!(mp3.name(), "second");
        let wav = registry.find(|p| p.can_handle("wav")).unwrap();
        assert_eq!(wav.name(), "first");
        assert!(registry.find(|p| p.can_handle("flac")).is_none());
    }

    #[test]
    fn test_diagram_registry_has_builtin() {
        let plugin = diagram_plugin_for("edges").unwrap();
        assert_eq!(plugin.name(), "edge-list");
        assert!(matches!(
            diagram_plugin_for("plantuml"),
            Err(PluginError::Unsupported(_))
        ));
    }

    #[test]
    fn test_unknown_media_is_unsupported() {
        assert!(video_plugin_for("unknown-format-xyz").is_err());
        assert!(audio_plugin_for("unknown-format-xyz").is_err());
    }
}
