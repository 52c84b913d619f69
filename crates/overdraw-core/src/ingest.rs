//! Ingestion Loop
//!
//! The single consumer of the event queue. Events are applied one at a time,
//! each as one locked lookup-then-mutate step on the registry, and the redraw
//! notifier is signalled after the lock is released.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::notifier::RedrawNotifier;
use crate::queue::{EventReceiver, QueueItem};
use crate::registry::StrokeRegistry;
use crate::stroke::{DrawEvent, StrokeKey};
use crate::watchdog::Watchdog;

/// What applying one event did to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// Point appended to a live stroke
    Appended {
        /// Stroke key
        key: StrokeKey,
        /// Point count after the append
        points: usize,
    },
    /// New stroke started and its watchdog spawned
    Created {
        /// Stroke key
        key: StrokeKey,
        /// Session number of the new stroke
        generation: u64,
    },
}

/// Serializing consumer of draw events
#[derive(Debug, Clone)]
pub struct IngestionLoop {
    registry: Arc<StrokeRegistry>,
    notifier: RedrawNotifier,
    watchdogs: TaskTracker,
    cancel: CancellationToken,
    idle_timeout: Duration,
}

impl IngestionLoop {
    /// Create a loop over shared registry and notifier.
    ///
    /// Watchdogs are spawned on `watchdogs` and observe `cancel`.
    #[must_use]
    pub fn new(
        registry: Arc<StrokeRegistry>,
        notifier: RedrawNotifier,
        watchdogs: TaskTracker,
        cancel: CancellationToken,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            notifier,
            watchdogs,
            cancel,
            idle_timeout,
        }
    }

    /// Drain `events` until every sender is gone or the loop is cancelled.
    ///
    /// Returns the number of events applied.
    pub async fn run(self, mut events: EventReceiver) -> u64 {
        let mut applied = 0u64;

        loop {
            let item = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Ingestion loop cancelled");
                    break;
                }
                item = events.recv() => item,
            };

            match item {
                Some(QueueItem::Draw(event)) => match self.apply(event).await {
                    Ok(_) => applied += 1,
                    Err(e) => warn!(error = %e, key = %event.key, "Failed to apply draw event"),
                },
                Some(QueueItem::Flush(ack)) => {
                    let _ = ack.send(());
                }
                None => {
                    debug!("All producers gone");
                    break;
                }
            }
        }

        events.close();
        info!(applied, "Ingestion loop stopped");
        applied
    }

    /// Apply one event: append to the live stroke for its key, or start a
    /// new stroke and arm its watchdog. Signals a redraw afterwards.
    pub async fn apply(&self, event: DrawEvent) -> Result<Ingested> {
        let outcome = {
            let mut table = self.registry.lock().await;

            if table.find_by_key(&event.key).is_some() {
                let stroke = table.append_point(&event.key, event.point)?;
                stroke.keep_alive();
                Ingested::Appended {
                    key: event.key,
                    points: stroke.points().len(),
                }
            } else {
                let stroke = table.insert(event.key, event.point)?;
                let generation = stroke.generation();
                let watchdog = Watchdog::new(stroke, self.idle_timeout);
                self.watchdogs.spawn(watchdog.run(
                    Arc::clone(&self.registry),
                    self.notifier.clone(),
                    self.cancel.child_token(),
                ));
                debug!(key = %event.key, generation, "Stroke started");
                Ingested::Created {
                    key: event.key,
                    generation,
                }
            }
        };

        trace!(key = %event.key, x = event.point.x, y = event.point.y, "Point applied");
        self.notifier.notify();
        Ok(outcome)
    }
}
