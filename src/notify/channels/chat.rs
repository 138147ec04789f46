//! Chat webhook channel implementation.

use crate::core::{generate_id, Error, Result};
use crate::notify::channel::{ChannelKind, DeliveryReceipt, NotificationSender, Urgency};
use crate::notify::channels::OutboundMessage;
use crate::notify::config::ChatConfig;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Chat webhook sender.
pub struct ChatSender {
    /// Configuration
    config: ChatConfig,
    /// Messages posted (mock webhook)
    outbox: RwLock<Vec<OutboundMessage>>,
}

impl ChatSender {
    /// Create a new chat sender. The webhook URL must be configured.
    pub fn new(config: ChatConfig) -> Result<Self> {
        if config.webhook_url.is_empty() {
            return Err(Error::Configuration(
                "chat webhook_url is required".to_string(),
            ));
        }
        Ok(Self {
            config,
            outbox: RwLock::new(Vec::new()),
        })
    }

    /// Room messages are posted to.
    pub fn room(&self) -> &str {
        &self.config.room
    }

    /// Messages posted so far.
    pub async fn outbox(&self) -> Vec<OutboundMessage> {
        self.outbox.read().await.clone()
    }
}

#[async_trait]
impl NotificationSender for ChatSender {
    async fn send(
        &self,
        recipient: &str,
        subject: Option<&str>,
        body: &str,
        urgency: Urgency,
    ) -> Result<DeliveryReceipt> {
        // Mentions route the message; the room comes from config.
        let text = match subject {
            Some(subject) => format!("@{} *{}*\n{}", recipient, subject, body),
            None => format!("@{} {}", recipient, body),
        };

        // In production:
        // self.client.post(&self.config.webhook_url)
        //     .json(&json!({"channel": self.config.room, "text": text}))
        //     .send().await?;

        let mut outbox = self.outbox.write().await;
        outbox.push(OutboundMessage::new(recipient, subject, &text, urgency));

        Ok(DeliveryReceipt::sent(&generate_id("chat")))
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Chat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> ChatConfig {
        ChatConfig {
            webhook_url: "https://chat.example.com/hooks/abc".to_string(),
            room: "#backup-alerts".to_string(),
        }
    }

    #[tokio::test]
    async fn test_message_mentions_recipient() {
        let sender = ChatSender::new(create_test_config()).unwrap();
        sender
            .send("oncall", Some("Backup failed"), "3 jobs failed", Urgency::High)
            .await
            .unwrap();

        let outbox = sender.outbox().await;
        assert!(outbox[0].body.starts_with("@oncall"));
        assert!(outbox[0].body.contains("Backup failed"));
    }

    #[test]
    fn test_missing_webhook_rejected() {
        assert!(ChatSender::new(ChatConfig::default()).is_err());
    }
}
