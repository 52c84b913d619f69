//! Draw Engine
//!
//! Owns the registry, notifier, event queue and every background task
//! (ingestion loop plus one watchdog per live stroke) and exposes the three
//! boundary operations: submit, snapshot and subscribe.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = DrawEngine::start(EngineConfig::default());
//! let producer = engine.sender();
//! producer.submit(DrawEvent::new(StrokeKey::new(1, 255, 0, 0), Point::new(0.1, 0.1)))?;
//!
//! let mut redraws = engine.subscribe();
//! while redraws.changed().await.is_some() {
//!     let strokes = engine.snapshot().await;
//!     // paint strokes
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::ingest::IngestionLoop;
use crate::notifier::{RedrawListener, RedrawNotifier};
use crate::queue::{event_queue, EventSender};
use crate::registry::{StrokeRegistry, DEFAULT_POINT_CAPACITY};
use crate::stroke::{DrawEvent, StrokeSnapshot};
use crate::watchdog::DEFAULT_IDLE_TIMEOUT;

/// Default time allowed for background tasks to stop on shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Engine tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Inactivity after which a stroke is evicted
    pub idle_timeout: Duration,
    /// Initial point buffer per stroke
    pub point_capacity: usize,
    /// Upper bound on waiting for tasks during shutdown
    pub shutdown_timeout: Duration,
}

impl EngineConfig {
    /// Set the idle timeout
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the initial point buffer per stroke
    #[must_use]
    pub fn with_point_capacity(mut self, capacity: usize) -> Self {
        self.point_capacity = capacity;
        self
    }

    /// Set the shutdown timeout
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            point_capacity: DEFAULT_POINT_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// Running stroke engine.
///
/// Dropping the engine cancels the ingestion loop and all watchdogs.
#[derive(Debug)]
pub struct DrawEngine {
    config: EngineConfig,
    registry: Arc<StrokeRegistry>,
    notifier: RedrawNotifier,
    sender: EventSender,
    cancel: CancellationToken,
    tasks: TaskTracker,
    shut_down: AtomicBool,
}

impl DrawEngine {
    /// Start the ingestion loop on the current Tokio runtime
    #[must_use]
    pub fn start(config: EngineConfig) -> Self {
        let registry = Arc::new(StrokeRegistry::with_point_capacity(config.point_capacity));
        let notifier = RedrawNotifier::new();
        let cancel = CancellationToken::new();
        let tasks = TaskTracker::new();
        let (sender, receiver) = event_queue();

        let ingest = IngestionLoop::new(
            Arc::clone(&registry),
            notifier.clone(),
            tasks.clone(),
            cancel.clone(),
            config.idle_timeout,
        );
        tasks.spawn(ingest.run(receiver));

        info!(
            idle_timeout_secs = config.idle_timeout.as_secs_f64(),
            point_capacity = config.point_capacity,
            "Draw engine started"
        );

        Self {
            config,
            registry,
            notifier,
            sender,
            cancel,
            tasks,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Engine configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Producer handle for a new connection
    #[must_use]
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Submit one event
    pub fn submit(&self, event: DrawEvent) -> Result<()> {
        self.sender.submit(event)
    }

    /// Wait until everything submitted so far has been applied
    pub async fn flush(&self) -> Result<()> {
        self.sender.flush().await
    }

    /// Copy of all live strokes in creation order
    pub async fn snapshot(&self) -> Vec<StrokeSnapshot> {
        self.registry.snapshot().await
    }

    /// Number of live strokes
    pub async fn stroke_count(&self) -> usize {
        self.registry.len().await
    }

    /// Register a renderer for redraw advice
    #[must_use]
    pub fn subscribe(&self) -> RedrawListener {
        self.notifier.subscribe()
    }

    /// Shared registry
    #[must_use]
    pub fn registry(&self) -> &Arc<StrokeRegistry> {
        &self.registry
    }

    /// Redraw notifier
    #[must_use]
    pub fn notifier(&self) -> &RedrawNotifier {
        &self.notifier
    }

    /// Token cancelled when the engine shuts down, for tasks tied to it
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Running background tasks: the ingestion loop plus one watchdog per
    /// live stroke
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Shutdown has been initiated
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Stop ingestion, cancel every watchdog and drop all strokes.
    ///
    /// Waits up to the configured shutdown timeout for tasks to end.
    pub async fn shutdown(&self) {
        if self
            .shut_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Engine shutdown already initiated");
            return;
        }

        info!(tasks = self.tasks.len(), "Shutting down draw engine");
        self.cancel.cancel();
        self.tasks.close();

        if tokio::time::timeout(self.config.shutdown_timeout, self.tasks.wait())
            .await
            .is_err()
        {
            warn!(
                remaining = self.tasks.len(),
                timeout_secs = self.config.shutdown_timeout.as_secs(),
                "Engine tasks did not stop in time"
            );
        }

        let cleared = self.registry.lock().await.clear();
        self.notifier.notify();
        info!(cleared, "Draw engine stopped");
    }
}

impl Drop for DrawEngine {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
