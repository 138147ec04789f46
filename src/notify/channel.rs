//! NotificationSender trait definition.
//!
//! Core trait that all delivery channels must implement.

use crate::core::{now, Result, Timestamp};
use crate::model::{ContactMethod, DeliveryStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Delivery channel identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// SMTP email
    Email,
    /// SMS gateway
    Sms,
    /// Automated voice call
    Voice,
    /// Chat webhook message
    Chat,
}

impl ChannelKind {
    /// The channel a contact method maps to.
    pub fn for_method(method: ContactMethod) -> Self {
        match method {
            ContactMethod::Email => ChannelKind::Email,
            ContactMethod::Sms => ChannelKind::Sms,
            ContactMethod::Voice => ChannelKind::Voice,
            ContactMethod::Chat => ChannelKind::Chat,
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Email => write!(f, "email"),
            ChannelKind::Sms => write!(f, "sms"),
            ChannelKind::Voice => write!(f, "voice"),
            ChannelKind::Chat => write!(f, "chat"),
        }
    }
}

impl std::str::FromStr for ChannelKind {
    type Err = crate::core::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "email" => Ok(ChannelKind::Email),
            "sms" => Ok(ChannelKind::Sms),
            "voice" => Ok(ChannelKind::Voice),
            "chat" => Ok(ChannelKind::Chat),
            other => Err(crate::core::Error::UnsupportedChannel(other.to_string())),
        }
    }
}

/// How urgently the channel should treat the message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    High,
    Critical,
}

/// Outcome reported by a channel for one send.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Delivery outcome
    pub status: DeliveryStatus,
    /// Channel-assigned message ID
    pub message_id: String,
    /// When the channel accepted the message
    pub timestamp: Timestamp,
}

impl DeliveryReceipt {
    /// A receipt for an accepted message.
    pub fn sent(message_id: &str) -> Self {
        Self {
            status: DeliveryStatus::Sent,
            message_id: message_id.to_string(),
            timestamp: now(),
        }
    }

    /// A receipt for an asynchronous delivery that has started.
    pub fn initiated(message_id: &str) -> Self {
        Self {
            status: DeliveryStatus::Initiated,
            message_id: message_id.to_string(),
            timestamp: now(),
        }
    }
}

/// Core trait for notification channels.
///
/// Implementations are opaque senders: the engine only needs the send
/// contract and never inspects channel internals.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver one message to a recipient address.
    ///
    /// `subject` is ignored by channels without a subject line.
    async fn send(
        &self,
        recipient: &str,
        subject: Option<&str>,
        body: &str,
        urgency: Urgency,
    ) -> Result<DeliveryReceipt>;

    /// Which channel this sender implements.
    fn kind(&self) -> ChannelKind;
}
