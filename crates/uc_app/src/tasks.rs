//! Background work and its completion queue
//!
//! Image loads and plugin renders run on a tokio runtime. Each finished job
//! posts a [`Completion`] on an unbounded channel that the main loop drains
//! once per iteration, so results are only ever applied on the UI thread.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use uc_core::{UcEvent, UserPayload, WindowId};
use uc_image::{ImageCache, ImageData, ImageError};
use uc_plugin::{render_with_timeout, DiagramFormat, DiagramPlugin, PluginError};

use crate::error::{AppError, Result};

/// Result of a background diagram render, delivered as a custom event
#[derive(Clone, Debug)]
pub struct DiagramRendered {
    pub format: DiagramFormat,
    pub result: std::result::Result<Vec<u8>, PluginError>,
}

/// Result of a background image load, delivered as a custom event
#[derive(Clone, Debug)]
pub struct ImageLoaded {
    pub path: PathBuf,
    pub result: std::result::Result<Arc<ImageData>, ImageError>,
}

/// A finished job addressed to a window
#[derive(Debug)]
pub struct Completion {
    pub window: WindowId,
    pub event: UcEvent,
}

pub struct TaskQueue {
    runtime: Runtime,
    sender: UnboundedSender<Completion>,
    receiver: UnboundedReceiver<Completion>,
    pending: usize,
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.pending)
            .finish()
    }
}

impl TaskQueue {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("uc-worker")
            .enable_time()
            .build()
            .map_err(|e| AppError::Runtime(e.to_string()))?;
        let (sender, receiver) = unbounded_channel();
        Ok(Self {
            runtime,
            sender,
            receiver,
            pending: 0,
        })
    }

    /// Jobs started and not yet drained
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Run `job` on a blocking worker and post its event to `window`
    pub fn spawn_blocking<F>(&mut self, window: WindowId, job: F)
    where
        F: FnOnce() -> UcEvent + Send + 'static,
    {
        let sender = self.sender.clone();
        self.pending += 1;
        self.runtime.spawn_blocking(move || {
            let event = job();
            if sender.send(Completion { window, event }).is_err() {
                debug!(?window, "completion dropped, queue closed");
            }
        });
    }

    /// Decode an image into the shared cache off the UI thread
    pub fn load_image(&mut self, window: WindowId, cache: Arc<ImageCache>, path: PathBuf) {
        self.spawn_blocking(window, move || {
            let result = cache.load(&path.to_string_lossy());
            if let Err(err) = &result {
                warn!(path = %path.display(), %err, "background image load failed");
            }
            UcEvent::custom(UserPayload::new(ImageLoaded { path, result }))
        });
    }

    /// Render a diagram; a timeout or failure posts an error result
    pub fn render_diagram(
        &mut self,
        window: WindowId,
        plugin: Arc<dyn DiagramPlugin>,
        source: String,
        format: DiagramFormat,
        timeout: Duration,
    ) {
        let sender = self.sender.clone();
        self.pending += 1;
        self.runtime.spawn(async move {
            let result = render_with_timeout(plugin, source, format, timeout).await;
            if let Err(err) = &result {
                warn!(?window, %err, "diagram render failed");
            }
            let event = UcEvent::custom(UserPayload::new(DiagramRendered { format, result }));
            if sender.send(Completion { window, event }).is_err() {
                debug!(?window, "completion dropped, queue closed");
            }
        });
    }

    /// Take every completion that has arrived
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        while let Ok(completion) = self.receiver.try_recv() {
            done.push(completion);
        }
        self.pending = self.pending.saturating_sub(done.len());
        done
    }

    /// Block until at least one completion arrives or `timeout` passes
    pub fn wait(&mut self, timeout: Duration) -> Vec<Completion> {
        let receiver = &mut self.receiver;
        let first = self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, receiver.recv()).await });
        let mut done: Vec<Completion> = first.ok().flatten().into_iter().collect();
        self.pending = self.pending.saturating_sub(done.len());
        done.extend(self.drain());
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uc_plugin::EdgeListPlugin;

    #[test]
    fn test_blocking_job_posts_completion() {
        let mut tasks = TaskQueue::new().unwrap();
        let window = WindowId::next();
        tasks.spawn_blocking(window, || UcEvent::timer(9));
        assert_eq!(tasks.pending(), 1);

        let done = tasks.wait(Duration::from_secs(5));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].window, window);
        assert_eq!(done[0].event.timer_id, 9);
        assert_eq!(tasks.pending(), 0);
    }

    #[test]
    fn test_diagram_render_result_event() {
        let mut tasks = TaskQueue::new().unwrap();
        let window = WindowId::next();
        tasks.render_diagram(
            window,
            Arc::new(EdgeListPlugin),
            "a -> b".to_string(),
            DiagramFormat::Svg,
            Duration::from_secs(5),
        );
        let done = tasks.wait(Duration::from_secs(5));
        let payload = done[0].event.user_data.as_ref().unwrap();
        let rendered = payload.downcast_ref::<DiagramRendered>().unwrap();
        assert!(rendered.result.as_ref().unwrap().starts_with(b"<svg"));
    }

    #[test]
    fn test_missing_image_reports_error() {
        let mut tasks = TaskQueue::new().unwrap();
        let window = WindowId::next();
        let cache = Arc::new(ImageCache::default());
        tasks.load_image(window, cache, PathBuf::from("/no/such/image.png"));
        let done = tasks.wait(Duration::from_secs(5));
        let loaded = done[0]
            .event
            .user_data
            .as_ref()
            .and_then(|p| p.downcast_ref::<ImageLoaded>())
            .unwrap();
        assert!(loaded.result.is_err());
    }
}
