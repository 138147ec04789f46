//! SMS channel implementation.

use crate::core::{generate_id, Error, Result};
use crate::notify::channel::{ChannelKind, DeliveryReceipt, NotificationSender, Urgency};
use crate::notify::channels::OutboundMessage;
use crate::notify::config::SmsGatewayConfig;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Maximum characters in one SMS segment.
const SMS_SEGMENT_LEN: usize = 160;

/// SMS gateway sender.
pub struct SmsSender {
    /// Configuration
    config: SmsGatewayConfig,
    /// Accepted messages (mock gateway)
    outbox: RwLock<Vec<OutboundMessage>>,
}

impl SmsSender {
    /// Create a new SMS sender from validated configuration.
    pub fn new(config: SmsGatewayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            outbox: RwLock::new(Vec::new()),
        })
    }

    /// Sender number.
    pub fn from_number(&self) -> &str {
        &self.config.from_number
    }

    /// Messages accepted so far.
    pub async fn outbox(&self) -> Vec<OutboundMessage> {
        self.outbox.read().await.clone()
    }
}

#[async_trait]
impl NotificationSender for SmsSender {
    async fn send(
        &self,
        recipient: &str,
        _subject: Option<&str>,
        body: &str,
        urgency: Urgency,
    ) -> Result<DeliveryReceipt> {
        if !recipient.starts_with('+') {
            return Err(Error::Delivery {
                channel: "sms".to_string(),
                recipient: recipient.to_string(),
                reason: "phone number must be E.164".to_string(),
            });
        }

        // Fit one segment; the full body is in the notification log.
        let text: String = body.chars().take(SMS_SEGMENT_LEN).collect();

        let mut outbox = self.outbox.write().await;
        outbox.push(OutboundMessage::new(recipient, None, &text, urgency));

        Ok(DeliveryReceipt::sent(&generate_id("sms")))
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_truncates_to_segment() {
        let sender = SmsSender::new(SmsGatewayConfig::default()).unwrap();
        let long_body = "x".repeat(400);
        sender
            .send("+15550100", None, &long_body, Urgency::High)
            .await
            .unwrap();

        let outbox = sender.outbox().await;
        assert_eq!(outbox[0].body.len(), SMS_SEGMENT_LEN);
    }

    #[tokio::test]
    async fn test_rejects_non_e164() {
        let sender = SmsSender::new(SmsGatewayConfig::default()).unwrap();
        assert!(sender
            .send("555-0100", None, "body", Urgency::Normal)
            .await
            .is_err());
    }
}
