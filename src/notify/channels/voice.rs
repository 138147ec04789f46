//! Voice call channel implementation.

use crate::core::{generate_id, Error, Result};
use crate::notify::channel::{ChannelKind, DeliveryReceipt, NotificationSender, Urgency};
use crate::notify::channels::OutboundMessage;
use crate::notify::config::VoiceConfig;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Automated voice call sender.
///
/// Voice delivery is asynchronous: placing the call succeeds before the
/// callee answers, so receipts report `initiated` rather than `sent`.
pub struct VoiceSender {
    /// Configuration
    config: VoiceConfig,
    /// Calls placed (mock gateway)
    outbox: RwLock<Vec<OutboundMessage>>,
}

impl VoiceSender {
    /// Create a new voice sender.
    pub fn new(config: VoiceConfig) -> Self {
        Self {
            config,
            outbox: RwLock::new(Vec::new()),
        }
    }

    /// Caller number.
    pub fn from_number(&self) -> &str {
        &self.config.from_number
    }

    /// Calls placed so far.
    pub async fn outbox(&self) -> Vec<OutboundMessage> {
        self.outbox.read().await.clone()
    }
}

#[async_trait]
impl NotificationSender for VoiceSender {
    async fn send(
        &self,
        recipient: &str,
        _subject: Option<&str>,
        body: &str,
        urgency: Urgency,
    ) -> Result<DeliveryReceipt> {
        if !recipient.starts_with('+') {
            return Err(Error::Delivery {
                channel: "voice".to_string(),
                recipient: recipient.to_string(),
                reason: "phone number must be E.164".to_string(),
            });
        }

        let mut outbox = self.outbox.write().await;
        outbox.push(OutboundMessage::new(recipient, None, body, urgency));

        Ok(DeliveryReceipt::initiated(&generate_id("call")))
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Voice
    }
}
