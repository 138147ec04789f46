//! Email channel implementation.

use crate::core::{generate_id, Error, Result};
use crate::notify::channel::{ChannelKind, DeliveryReceipt, NotificationSender, Urgency};
use crate::notify::channels::OutboundMessage;
use crate::notify::config::SmtpConfig;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// SMTP email sender.
///
/// In production, would hand the message to an SMTP client pool.
pub struct EmailSender {
    /// Configuration
    config: SmtpConfig,
    /// Accepted messages (mock transport)
    outbox: RwLock<Vec<OutboundMessage>>,
}

impl EmailSender {
    /// Create a new email sender from validated configuration.
    pub fn new(config: SmtpConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            outbox: RwLock::new(Vec::new()),
        })
    }

    /// From address used on outgoing mail.
    pub fn from_address(&self) -> &str {
        &self.config.from_address
    }

    /// Messages accepted so far.
    pub async fn outbox(&self) -> Vec<OutboundMessage> {
        self.outbox.read().await.clone()
    }
}

#[async_trait]
impl NotificationSender for EmailSender {
    async fn send(
        &self,
        recipient: &str,
        subject: Option<&str>,
        body: &str,
        urgency: Urgency,
    ) -> Result<DeliveryReceipt> {
        if recipient.is_empty() || !recipient.contains('@') {
            return Err(Error::Delivery {
                channel: "email".to_string(),
                recipient: recipient.to_string(),
                reason: "invalid email address".to_string(),
            });
        }

        // In production:
        // let message = MessageBuilder::new()
        //     .from(self.config.from_address.as_str())
        //     .to(recipient)
        //     .subject(subject.unwrap_or("Backup alert"))
        //     .text_body(body);
        // self.transport.send(message).await?;

        let mut outbox = self.outbox.write().await;
        outbox.push(OutboundMessage::new(recipient, subject, body, urgency));

        Ok(DeliveryReceipt::sent(&generate_id("mail")))
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_records_message() {
        let sender = EmailSender::new(SmtpConfig::default()).unwrap();
        let receipt = sender
            .send("ana@example.com", Some("[CRITICAL] Disk full"), "95% used", Urgency::Critical)
            .await
            .unwrap();

        assert!(receipt.message_id.starts_with("mail-"));
        let outbox = sender.outbox().await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].subject.as_deref(), Some("[CRITICAL] Disk full"));
    }

    #[tokio::test]
    async fn test_invalid_address_rejected() {
        let sender = EmailSender::new(SmtpConfig::default()).unwrap();
        let result = sender.send("not-an-address", None, "body", Urgency::Normal).await;
        assert!(matches!(result, Err(Error::Delivery { .. })));
        assert!(sender.outbox().await.is_empty());
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = SmtpConfig {
            host: String::new(),
            ..Default::default()
        };
        assert!(EmailSender::new(config).is_err());
    }
}
