//! Notification delivery log. Append-only audit trail.

use crate::core::{generate_id, now, Timestamp};
use crate::model::contact::ContactMethod;
use serde::{Deserialize, Serialize};

/// Maximum characters of the message body kept in the log.
pub const BODY_PREVIEW_LEN: usize = 200;

/// Outcome of one delivery attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Handed to the channel successfully
    Sent,
    /// The channel rejected or timed out
    Failed,
    /// Asynchronous delivery started (e.g. voice call placed)
    Initiated,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
            DeliveryStatus::Initiated => write!(f, "initiated"),
        }
    }
}

/// Record of one delivery attempt. Used for audit and for suppressing
/// duplicate escalation notifications.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationLog {
    /// Unique log entry ID
    pub id: String,
    /// Alert this delivery belongs to
    pub alert_id: String,
    /// Recipient contact ID
    pub recipient_id: String,
    /// Delivery method used
    pub method: ContactMethod,
    /// Escalation level this delivery was sent at (0 = immediate)
    pub escalation_level: u8,
    /// Delivery outcome
    pub delivery_status: DeliveryStatus,
    /// Channel-assigned message ID, if delivery was accepted
    pub message_id: Option<String>,
    /// Truncated message body for audit
    pub body_preview: String,
    /// When the attempt was made
    pub sent_at: Timestamp,
}

impl NotificationLog {
    /// Record a delivery attempt.
    pub fn new(
        alert_id: &str,
        recipient_id: &str,
        method: ContactMethod,
        escalation_level: u8,
        delivery_status: DeliveryStatus,
        body: &str,
    ) -> Self {
        Self {
            id: generate_id("ntf"),
            alert_id: alert_id.to_string(),
            recipient_id: recipient_id.to_string(),
            method,
            escalation_level,
            delivery_status,
            message_id: None,
            body_preview: truncate_body(body),
            sent_at: now(),
        }
    }

    /// Attach the channel-assigned message ID.
    pub fn with_message_id(mut self, message_id: &str) -> Self {
        self.message_id = Some(message_id.to_string());
        self
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= BODY_PREVIEW_LEN {
        body.to_string()
    } else {
        body.chars().take(BODY_PREVIEW_LEN).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_truncation() {
        let long_body = "x".repeat(500);
        let log = NotificationLog::new(
            "alert-1",
            "c-1",
            ContactMethod::Email,
            0,
            DeliveryStatus::Sent,
            &long_body,
        );
        assert_eq!(log.body_preview.chars().count(), BODY_PREVIEW_LEN);
    }

    #[test]
    fn test_short_body_kept() {
        let log = NotificationLog::new(
            "alert-1",
            "c-1",
            ContactMethod::Sms,
            1,
            DeliveryStatus::Failed,
            "disk full",
        );
        assert_eq!(log.body_preview, "disk full");
        assert_eq!(log.escalation_level, 1);
    }
}
