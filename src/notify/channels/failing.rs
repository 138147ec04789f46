//! Always-failing sender, a test double for delivery isolation.

use crate::core::{Error, Result};
use crate::notify::channel::{ChannelKind, DeliveryReceipt, NotificationSender, Urgency};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A sender that rejects every message. Lets tests verify that one
/// recipient's failure never blocks delivery to the others.
pub struct FailingSender {
    kind: ChannelKind,
    attempts: AtomicUsize,
}

impl FailingSender {
    /// Create a failing sender posing as `kind`.
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of sends attempted against this sender.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationSender for FailingSender {
    async fn send(
        &self,
        recipient: &str,
        _subject: Option<&str>,
        _body: &str,
        _urgency: Urgency,
    ) -> Result<DeliveryReceipt> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::Delivery {
            channel: self.kind.to_string(),
            recipient: recipient.to_string(),
            reason: "channel unavailable".to_string(),
        })
    }

    fn kind(&self) -> ChannelKind {
        self.kind
    }
}
