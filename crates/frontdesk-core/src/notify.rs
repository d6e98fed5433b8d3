//! Single-slot notification channel.
//!
//! Short-lived status messages decoupled from the operations that trigger
//! them. Last write wins; there is no queue. A shown notice auto-dismisses
//! after the configured delay unless replaced or dismissed first, and a
//! stale timer can never hide a newer message.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// The currently displayed status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

#[derive(Clone)]
pub struct Notifier {
    tx: Arc<watch::Sender<Option<Notice>>>,
    // Bumped on every show/dismiss; an expiry timer only clears the slot
    // when its generation is still current.
    generation: Arc<AtomicU64>,
    ttl: Duration,
}

impl Notifier {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    /// Subscribe to the displayed notice.
    pub fn watch(&self) -> watch::Receiver<Option<Notice>> {
        self.tx.subscribe()
    }

    /// The notice currently on screen, if any.
    pub fn current(&self) -> Option<Notice> {
        self.tx.borrow().clone()
    }

    /// Replace the displayed notice and schedule its auto-dismissal.
    pub fn show(&self, message: impl Into<String>, kind: NoticeKind) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(Some(Notice {
            message: message.into(),
            kind,
        }));

        let notifier = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(notifier.ttl).await;
            if notifier.generation.load(Ordering::SeqCst) == generation {
                notifier.tx.send_replace(None);
            }
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(message, NoticeKind::Success);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(message, NoticeKind::Error);
    }

    /// Clear the slot now and invalidate any pending expiry timer.
    pub fn dismiss(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.tx.send_replace(None);
    }
}
