//! Redraw Notifier - one-slot coalescing "state changed" signal.
//!
//! Built on `tokio::sync::watch` over a redraw epoch counter: a notification
//! overwrites the slot instead of queueing, so a fast producer can never
//! build a backlog and a slow renderer only ever sees the latest epoch.

use std::sync::Arc;
use tokio::sync::watch;

/// Sending half, cloned into the ingestion loop and every watchdog
#[derive(Debug, Clone)]
pub struct RedrawNotifier {
    sender: Arc<watch::Sender<u64>>,
}

impl RedrawNotifier {
    /// Create a notifier at epoch 0
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Advise a redraw. Never blocks and never fails, with or without
    /// listeners.
    pub fn notify(&self) {
        self.sender.send_modify(|epoch| *epoch = epoch.wrapping_add(1));
    }

    /// Number of notifications sent so far
    #[must_use]
    pub fn epoch(&self) -> u64 {
        *self.sender.borrow()
    }

    /// Register a renderer. The listener starts caught up with the current
    /// epoch.
    #[must_use]
    pub fn subscribe(&self) -> RedrawListener {
        RedrawListener {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for RedrawNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half held by a renderer
#[derive(Debug)]
pub struct RedrawListener {
    receiver: watch::Receiver<u64>,
}

impl RedrawListener {
    /// Wait until at least one notification arrived since the last call.
    ///
    /// Any number of notifications collapse into one wake-up. Returns the
    /// latest epoch, or `None` once every notifier is gone.
    pub async fn changed(&mut self) -> Option<u64> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }

    /// A notification is pending
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_wakes_listener() {
        let notifier = RedrawNotifier::new();
        let mut listener = notifier.subscribe();
        assert!(!listener.has_changed());

        notifier.notify();

        assert!(listener.has_changed());
        assert_eq!(listener.changed().await, Some(1));
        assert!(!listener.has_changed());
    }

    #[tokio::test]
    async fn test_notifications_coalesce() {
        let notifier = RedrawNotifier::new();
        let mut listener = notifier.subscribe();

        for _ in 0..1000 {
            notifier.notify();
        }

        assert_eq!(listener.changed().await, Some(1000));
        assert!(!listener.has_changed());
    }

    #[test]
    fn test_notify_without_listeners() {
        let notifier = RedrawNotifier::new();
        notifier.notify();
        notifier.notify();
        assert_eq!(notifier.epoch(), 2);
        assert_eq!(notifier.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_multiple_listeners() {
        let notifier = RedrawNotifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        assert_eq!(notifier.listener_count(), 2);

        notifier.notify();

        assert_eq!(a.changed().await, Some(1));
        assert_eq!(b.changed().await, Some(1));
    }

    #[tokio::test]
    async fn test_listener_ends_when_notifier_dropped() {
        let notifier = RedrawNotifier::new();
        let mut listener = notifier.subscribe();
        drop(notifier);

        assert_eq!(listener.changed().await, None);
    }

    #[tokio::test]
    async fn test_late_subscriber_starts_caught_up() {
        let notifier = RedrawNotifier::new();
        notifier.notify();

        let mut listener = notifier.subscribe();
        assert!(!listener.has_changed());

        let mut task = tokio_test::task::spawn(async move { listener.changed().await });
        tokio_test::assert_pending!(task.poll());

        notifier.notify();
        assert!(task.is_woken());
        tokio_test::assert_ready_eq!(task.poll(), Some(2));
    }
}
