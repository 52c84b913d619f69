//! Eviction Scheduler
//!
//! Every stroke gets exactly one [`Watchdog`] when it is created. The
//! watchdog is Armed until either a keep-alive arrives (re-arm with the full
//! timeout) or the timeout elapses, at which point it expires: it removes its
//! own stroke session from the registry, advises a redraw and ends.
//!
//! The watchdog refers to its stroke by key and generation only, so an
//! expiry can never remove a different stroke, including a newer session of
//! the same key.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::notifier::RedrawNotifier;
use crate::registry::StrokeRegistry;
use crate::stroke::{Stroke, StrokeKey};

/// Default idle timeout before a stroke is evicted
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// How a watchdog finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogExit {
    /// Timer ran out; `removed` is false if the stroke was already gone
    Expired {
        /// The stroke was still live and has been removed
        removed: bool,
    },
    /// Engine shut down while the watchdog was armed
    Cancelled,
}

/// Idle-expiry timer for one stroke session
#[derive(Debug)]
pub struct Watchdog {
    key: StrokeKey,
    generation: u64,
    keep_alive: Arc<Notify>,
    idle_timeout: Duration,
}

impl Watchdog {
    /// Arm a watchdog for a freshly inserted stroke
    #[must_use]
    pub fn new(stroke: &Stroke, idle_timeout: Duration) -> Self {
        Self {
            key: stroke.key(),
            generation: stroke.generation(),
            keep_alive: stroke.keep_alive_handle(),
            idle_timeout,
        }
    }

    /// Run until expiry or cancellation
    pub async fn run(
        self,
        registry: Arc<StrokeRegistry>,
        notifier: RedrawNotifier,
        cancel: CancellationToken,
    ) -> WatchdogExit {
        // Armed
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    trace!(key = %self.key, "Watchdog cancelled");
                    return WatchdogExit::Cancelled;
                }
                _ = self.keep_alive.notified() => {
                    trace!(key = %self.key, "Keep-alive, re-arming");
                }
                _ = tokio::time::sleep(self.idle_timeout) => break,
            }
        }

        // Expiring
        let removed = {
            let mut table = registry.lock().await;
            table
                .remove_generation(&self.key, self.generation)
                .is_some()
        };

        if removed {
            debug!(
                key = %self.key,
                generation = self.generation,
                idle_secs = self.idle_timeout.as_secs_f64(),
                "Stroke expired"
            );
            notifier.notify();
        }

        WatchdogExit::Expired { removed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::Point;

    async fn armed(
        registry: &Arc<StrokeRegistry>,
        key: StrokeKey,
        timeout: Duration,
    ) -> Watchdog {
        let mut table = registry.lock().await;
        let stroke = table.insert(key, Point::new(0.5, 0.5)).unwrap();
        Watchdog::new(stroke, timeout)
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_idle_timeout() {
        let registry = Arc::new(StrokeRegistry::new());
        let notifier = RedrawNotifier::new();
        let key = StrokeKey::new(1, 255, 0, 0);
        let watchdog = armed(&registry, key, Duration::from_secs(10)).await;

        let start = tokio::time::Instant::now();
        let exit = watchdog
            .run(registry.clone(), notifier.clone(), CancellationToken::new())
            .await;

        assert_eq!(exit, WatchdogExit::Expired { removed: true });
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(registry.is_empty().await);
        assert_eq!(notifier.epoch(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_rearms_full_timeout() {
        let registry = Arc::new(StrokeRegistry::new());
        let key = StrokeKey::new(1, 255, 0, 0);
        let watchdog = armed(&registry, key, Duration::from_secs(10)).await;

        let start = tokio::time::Instant::now();
        let handle = tokio::spawn(watchdog.run(
            registry.clone(),
            RedrawNotifier::new(),
            CancellationToken::new(),
        ));

        tokio::time::sleep(Duration::from_secs(8)).await;
        registry
            .lock()
            .await
            .append_point(&key, Point::new(0.6, 0.6))
            .unwrap()
            .keep_alive();

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(registry.len().await, 1, "stroke evicted before re-armed timeout");

        let exit = handle.await.unwrap();
        assert_eq!(exit, WatchdogExit::Expired { removed: true });
        assert!(start.elapsed() >= Duration::from_secs(18));
        assert!(registry.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_leaves_stroke() {
        let registry = Arc::new(StrokeRegistry::new());
        let notifier = RedrawNotifier::new();
        let key = StrokeKey::new(1, 255, 0, 0);
        let watchdog = armed(&registry, key, Duration::from_secs(10)).await;
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(watchdog.run(
            registry.clone(),
            notifier.clone(),
            cancel.clone(),
        ));
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        assert_eq!(handle.await.unwrap(), WatchdogExit::Cancelled);
        assert_eq!(registry.len().await, 1);
        assert_eq!(notifier.epoch(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_watchdog_spares_new_session() {
        let registry = Arc::new(StrokeRegistry::new());
        let notifier = RedrawNotifier::new();
        let key = StrokeKey::new(1, 255, 0, 0);
        let stale = armed(&registry, key, Duration::from_secs(10)).await;

        {
            let mut table = registry.lock().await;
            table.remove(&key);
            table.insert(key, Point::new(0.9, 0.9)).unwrap();
        }

        let exit = stale
            .run(registry.clone(), notifier.clone(), CancellationToken::new())
            .await;

        assert_eq!(exit, WatchdogExit::Expired { removed: false });
        let strokes = registry.snapshot().await;
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].points, vec![Point::new(0.9, 0.9)]);
        assert_eq!(notifier.epoch(), 0);
    }
}
