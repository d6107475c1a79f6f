//! Diagram plugin interface
//!
//! Diagram plugins turn a text source (PlantUML, Mermaid, Graphviz and the
//! like) into SVG or PNG bytes. Rendering can be slow, so
//! [`render_with_timeout`] runs it on a blocking worker and gives up after
//! a deadline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{PluginError, Result};

/// Default deadline for background renders
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagramFormat {
    Svg,
    Png,
}

impl DiagramFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            DiagramFormat::Svg => "image/svg+xml",
            DiagramFormat::Png => "image/png",
        }
    }
}

/// Optional features a plugin offers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiagramCapabilities {
    /// Fast enough to re-render while the source is edited
    pub live_preview: bool,
    pub interactive: bool,
    pub animation: bool,
}

/// Facts extracted from a source without rendering it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiagramMetadata {
    pub diagram_type: String,
    pub title: Option<String>,
    pub node_count: usize,
    pub edge_count: usize,
}

pub trait DiagramPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Source languages, lowercase ("mermaid", "dot", ...)
    fn languages(&self) -> &[&'static str];

    fn can_handle(&self, language: &str) -> bool {
        let language = language.to_ascii_lowercase();
        self.languages().iter().any(|l| *l == language)
    }

    fn formats(&self) -> &[DiagramFormat];

    fn capabilities(&self) -> DiagramCapabilities {
        DiagramCapabilities::default()
    }

    fn validate_source(&self, source: &str) -> Result<()>;

    fn metadata(&self, source: &str) -> Result<DiagramMetadata>;

    fn render(&self, source: &str, format: DiagramFormat) -> Result<Vec<u8>>;
}

/// Render on a blocking worker of the current tokio runtime
///
/// Returns [`PluginError::Timeout`] when the plugin does not finish within
/// `timeout`; the worker is abandoned and its result dropped.
pub async fn render_with_timeout(
    plugin: Arc<dyn DiagramPlugin>,
    source: String,
    format: DiagramFormat,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let name = plugin.name().to_string();
    let task = tokio::task::spawn_blocking(move || plugin.render(&source, format));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => {
            debug!(plugin = %name, ok = result.is_ok(), "diagram render finished");
            result
        }
        Ok(Err(join)) => Err(PluginError::Render(format!("{name} worker failed: {join}"))),
        Err(_) => {
            warn!(plugin = %name, ?timeout, "diagram render timed out");
            Err(PluginError::Timeout(timeout))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Edge list diagrams
// ─────────────────────────────────────────────────────────────────────────────

const NODE_WIDTH: u32 = 120;
const NODE_HEIGHT: u32 = 32;
const NODE_GAP: u32 = 24;
const MARGIN: u32 = 16;

/// Built-in plugin for `A -> B` edge lists
///
/// One edge per line; blank lines and lines starting with `#` are skipped.
/// A `title: ...` line names the diagram. Nodes are laid out in a column in
/// order of first appearance.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeListPlugin;

#[derive(Debug, Default)]
struct EdgeList<'a> {
    title: Option<&'a str>,
    nodes: Vec<&'a str>,
    edges: Vec<(usize, usize)>,
}

impl EdgeListPlugin {
    fn parse(source: &str) -> Result<EdgeList<'_>> {
        let mut list = EdgeList::default();
        for (number, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(title) = line.strip_prefix("title:") {
                list.title = Some(title.trim());
                continue;
            }
            let Some((from, to)) = line.split_once("->") else {
                return Err(PluginError::InvalidSource {
                    line: number + 1,
                    message: format!("expected `A -> B`, found `{line}`"),
                });
            };
            let (from, to) = (from.trim(), to.trim());
            if from.is_empty() || to.is_empty() {
                return Err(PluginError::InvalidSource {
                    line: number + 1,
                    message: "edge endpoint is empty".to_string(),
                });
            }
            let a = list.node_index(from);
            let b = list.node_index(to);
            list.edges.push((a, b));
        }
        Ok(list)
    }
}

impl<'a> EdgeList<'a> {
    fn node_index(&mut self, name: &'a str) -> usize {
        match self.nodes.iter().position(|n| *n == name) {
            Some(index) => index,
            None => {
                self.nodes.push(name);
                self.nodes.len() - 1
            }
        }
    }

    fn node_y(index: usize) -> u32 {
        MARGIN + index as u32 * (NODE_HEIGHT + NODE_GAP)
    }

    fn to_svg(&self) -> String {
        let width = NODE_WIDTH + 2 * MARGIN;
        let height = Self::node_y(self.nodes.len()).saturating_sub(NODE_GAP) + MARGIN;
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\">"
        );
        if let Some(title) = self.title {
            svg.push_str(&format!("<title>{}</title>", escape(title)));
        }
        let cx = MARGIN + NODE_WIDTH / 2;
        for &(a, b) in &self.edges {
            let y1 = Self::node_y(a) + NODE_HEIGHT / 2;
            let y2 = Self::node_y(b) + NODE_HEIGHT / 2;
            svg.push_str(&format!(
                "<line x1=\"{cx}\" y1=\"{y1}\" x2=\"{cx}\" y2=\"{y2}\" stroke=\"black\"/>"
            ));
        }
        for (index, name) in self.nodes.iter().enumerate() {
            let y = Self::node_y(index);
            svg.push_str(&format!(
                "<rect x=\"{MARGIN}\" y=\"{y}\" width=\"{NODE_WIDTH}\" height=\"{NODE_HEIGHT}\" fill=\"white\" stroke=\"black\"/>"
            ));
            svg.push_str(&format!(
                "<text x=\"{cx}\" y=\"{}\" text-anchor=\"middle\">{}</text>",
                y + NODE_HEIGHT / 2 + 5,
                escape(name)
            ));
        }
        svg.push_str("</svg>");
        svg
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl DiagramPlugin for EdgeListPlugin {
    fn name(&self) -> &str {
        "edge-list"
    }

    fn languages(&self) -> &[&'static str] {
        &["edges", "edgelist"]
    }

    fn formats(&self) -> &[DiagramFormat] {
        &[DiagramFormat::Svg]
    }

    fn capabilities(&self) -> DiagramCapabilities {
        DiagramCapabilities {
            live_preview: true,
            ..Default::default()
        }
    }

    fn validate_source(&self, source: &str) -> Result<()> {
        Self::parse(source).map(|_| ())
    }

    fn metadata(&self, source: &str) -> Result<DiagramMetadata> {
        let list = Self::parse(source)?;
        Ok(DiagramMetadata {
            diagram_type: "graph".to_string(),
            title: list.title.map(str::to_string),
            node_count: list.nodes.len(),
            edge_count: list.edges.len(),
        })
    }

    fn render(&self, source: &str, format: DiagramFormat) -> Result<Vec<u8>> {
        if format != DiagramFormat::Svg {
            return Err(PluginError::Unsupported(format!(
                "{} output from {}",
                format.mime_type(),
                self.name()
            )));
        }
        Ok(Self::parse(source)?.to_svg().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "title: Build\n# pipeline\nparse -> check\ncheck -> emit\nparse -> emit\n";

    struct Sleepy;

    impl DiagramPlugin for Sleepy {
        fn name(&self) -> &str {
            "sleepy"
        }

        fn languages(&self) -> &[&'static str] {
            &["slow"]
        }

        fn formats(&self) -> &[DiagramFormat] {
            &[DiagramFormat::Svg]
        }

        fn validate_source(&self, _source: &str) -> Result<()> {
            Ok(())
        }

        fn metadata(&self, _source: &str) -> Result<DiagramMetadata> {
            Ok(DiagramMetadata::default())
        }

        fn render(&self, _source: &str, _format: DiagramFormat) -> Result<Vec<u8>> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(Vec::new())
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
    }

    #[test]
    fn test_edge_list_metadata() {
        let meta = EdgeListPlugin.metadata(SOURCE).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Build"));
        assert_eq!(meta.node_count, 3);
        assert_eq!(meta.edge_count, 3);
        assert!(EdgeListPlugin.can_handle("EDGES"));
        assert!(EdgeListPlugin.capabilities().live_preview);
    }

    #[test]
    fn test_invalid_line_reports_position() {
        let err = EdgeListPlugin
            .validate_source("a -> b\nnot an edge\n")
            .unwrap_err();
        assert!(matches!(err, PluginError::InvalidSource { line: 2, .. }));
        assert!(EdgeListPlugin.validate_source("a -> \n").is_err());
    }

    #[test]
    fn test_render_svg_and_reject_png() {
        let svg = String::from_utf8(EdgeListPlugin.render(SOURCE, DiagramFormat::Svg).unwrap())
            .unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<rect").count(), 3);
        assert_eq!(svg.matches("<line").count(), 3);
        assert!(matches!(
            EdgeListPlugin.render(SOURCE, DiagramFormat::Png),
            Err(PluginError::Unsupported(_))
        ));
    }

    #[test]
    fn test_background_render_completes() {
        let plugin: Arc<dyn DiagramPlugin> = Arc::new(EdgeListPlugin);
        let bytes = runtime()
            .block_on(render_with_timeout(
                plugin,
                SOURCE.to_string(),
                DiagramFormat::Svg,
                DEFAULT_RENDER_TIMEOUT,
            ))
            .unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_background_render_times_out() {
        let plugin: Arc<dyn DiagramPlugin> = Arc::new(Sleepy);
        let result = runtime().block_on(render_with_timeout(
            plugin,
            String::new(),
            DiagramFormat::Svg,
            Duration::from_millis(20),
        ));
        assert_eq!(result, Err(PluginError::Timeout(Duration::from_millis(20))));
    }
}
