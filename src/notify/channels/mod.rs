//! Channel sender implementations.

pub mod chat;
pub mod email;
pub mod failing;
pub mod sms;
pub mod voice;

pub use chat::ChatSender;
pub use email::EmailSender;
pub use failing::FailingSender;
pub use sms::SmsSender;
pub use voice::VoiceSender;

use crate::core::{now, Timestamp};
use crate::notify::channel::Urgency;

/// A message handed to a channel, kept for inspection.
#[derive(Clone, Debug)]
pub struct OutboundMessage {
    /// Destination address
    pub recipient: String,
    /// Subject line, if the channel has one
    pub subject: Option<String>,
    /// Message body
    pub body: String,
    /// Requested urgency
    pub urgency: Urgency,
    /// When the channel accepted it
    pub accepted_at: Timestamp,
}

impl OutboundMessage {
    pub(crate) fn new(
        recipient: &str,
        subject: Option<&str>,
        body: &str,
        urgency: Urgency,
    ) -> Self {
        Self {
            recipient: recipient.to_string(),
            subject: subject.map(|s| s.to_string()),
            body: body.to_string(),
            urgency,
            accepted_at: now(),
        }
    }
}
