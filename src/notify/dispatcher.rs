//! Notification dispatcher.
//!
//! Delivers one message through a named channel and records the outcome.
//! Every attempt is logged for audit, independent of success or failure.

use crate::core::{Error, Result};
use crate::model::{DeliveryStatus, EmergencyContact, NotificationLog};
use crate::notify::channel::{ChannelKind, DeliveryReceipt, NotificationSender, Urgency};
use crate::notify::config::ChannelsConfig;
use crate::notify::factory::create_senders;
use crate::store::MonitoringStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Default per-send timeout.
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;

/// Per-recipient outcome of a fan-out dispatch.
#[derive(Clone, Debug, serde::Serialize)]
pub struct DispatchOutcome {
    /// Recipient contact ID
    pub recipient_id: String,
    /// Recipient display name
    pub recipient_name: String,
    /// Channel used
    pub channel: ChannelKind,
    /// Whether the channel accepted the message
    pub success: bool,
    /// Channel message ID on success
    pub message_id: Option<String>,
    /// Failure reason, if any
    pub error: Option<String>,
}

/// Delivers messages through configured channels, with per-send timeout
/// and per-recipient failure isolation.
pub struct Dispatcher {
    senders: HashMap<ChannelKind, Arc<dyn NotificationSender>>,
    store: Arc<dyn MonitoringStore>,
    send_timeout: Duration,
}

impl Dispatcher {
    /// Build a dispatcher from channel configuration.
    pub fn new(config: &ChannelsConfig, store: Arc<dyn MonitoringStore>) -> Result<Self> {
        Ok(Self {
            senders: create_senders(config)?,
            store,
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
        })
    }

    /// Override the per-send timeout.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Register a sender directly. Replaces any configured sender for the
    /// same channel; test doubles go in this way.
    pub fn register_sender(&mut self, sender: Arc<dyn NotificationSender>) {
        self.senders.insert(sender.kind(), sender);
    }

    /// Channels this dispatcher can deliver through.
    pub fn supported_channels(&self) -> Vec<ChannelKind> {
        self.senders.keys().copied().collect()
    }

    /// Deliver one message to one contact over their preferred channel.
    ///
    /// The attempt is appended to the notification log whatever the
    /// outcome. An unconfigured channel is a configuration error and is
    /// not retried.
    pub async fn dispatch(
        &self,
        alert_id: &str,
        contact: &EmergencyContact,
        subject: Option<&str>,
        body: &str,
        urgency: Urgency,
        escalation_level: u8,
    ) -> Result<DeliveryReceipt> {
        let channel = ChannelKind::for_method(contact.preferred_contact_method);

        let sender = self
            .senders
            .get(&channel)
            .ok_or_else(|| Error::UnsupportedChannel(channel.to_string()))?;

        let recipient = contact
            .address_for(contact.preferred_contact_method)
            .ok_or_else(|| Error::Delivery {
                channel: channel.to_string(),
                recipient: contact.id.clone(),
                reason: "no address configured for preferred method".to_string(),
            });

        let recipient = match recipient {
            Ok(address) => address.to_string(),
            Err(err) => {
                self.log_attempt(alert_id, contact, escalation_level, DeliveryStatus::Failed, body, None)
                    .await;
                return Err(err);
            }
        };

        let send = sender.send(&recipient, subject, body, urgency);
        let result = match tokio::time::timeout(self.send_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(Error::DeliveryTimeout {
                channel: channel.to_string(),
                recipient: contact.id.clone(),
            }),
        };

        match result {
            Ok(receipt) => {
                info!(
                    alert_id,
                    contact = %contact.id,
                    %channel,
                    status = %receipt.status,
                    "notification delivered"
                );
                self.log_attempt(
                    alert_id,
                    contact,
                    escalation_level,
                    receipt.status,
                    body,
                    Some(&receipt.message_id),
                )
                .await;
                Ok(receipt)
            }
            Err(err) => {
                warn!(alert_id, contact = %contact.id, %channel, %err, "notification failed");
                self.log_attempt(alert_id, contact, escalation_level, DeliveryStatus::Failed, body, None)
                    .await;
                Err(err)
            }
        }
    }

    /// Fan one message out to many contacts concurrently.
    ///
    /// Failures are isolated per recipient: one failed or slow channel
    /// never blocks delivery to the others.
    pub async fn dispatch_all(
        &self,
        alert_id: &str,
        contacts: &[EmergencyContact],
        subject: Option<&str>,
        body: &str,
        urgency: Urgency,
        escalation_level: u8,
    ) -> Vec<DispatchOutcome> {
        let sends = contacts.iter().map(|contact| async move {
            let result = self
                .dispatch(alert_id, contact, subject, body, urgency, escalation_level)
                .await;
            match result {
                Ok(receipt) => DispatchOutcome {
                    recipient_id: contact.id.clone(),
                    recipient_name: contact.contact_name.clone(),
                    channel: ChannelKind::for_method(contact.preferred_contact_method),
                    success: true,
                    message_id: Some(receipt.message_id),
                    error: None,
                },
                Err(err) => DispatchOutcome {
                    recipient_id: contact.id.clone(),
                    recipient_name: contact.contact_name.clone(),
                    channel: ChannelKind::for_method(contact.preferred_contact_method),
                    success: false,
                    message_id: None,
                    error: Some(err.to_string()),
                },
            }
        });

        futures::future::join_all(sends).await
    }

    async fn log_attempt(
        &self,
        alert_id: &str,
        contact: &EmergencyContact,
        escalation_level: u8,
        status: DeliveryStatus,
        body: &str,
        message_id: Option<&str>,
    ) {
        let mut log = NotificationLog::new(
            alert_id,
            &contact.id,
            contact.preferred_contact_method,
            escalation_level,
            status,
            body,
        );
        if let Some(message_id) = message_id {
            log = log.with_message_id(message_id);
        }
        // A log write failure must not fail the delivery path.
        if let Err(err) = self.store.append_notification(log).await {
            error!(alert_id, %err, "failed to append notification log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContactMethod;
    use crate::notify::channels::FailingSender;
    use crate::store::MemoryStore;

    fn create_test_contact(id: &str, method: ContactMethod, level: u8) -> EmergencyContact {
        let contact = EmergencyContact::new("org-1", id, id, method, level);
        match method {
            ContactMethod::Email => contact.with_email(&format!("{}@example.com", id)),
            ContactMethod::Sms | ContactMethod::Voice => contact.with_phone("+15550100"),
            ContactMethod::Chat => contact.with_chat_handle(id),
        }
    }

    fn create_test_dispatcher(store: Arc<MemoryStore>) -> Dispatcher {
        Dispatcher::new(&ChannelsConfig::all_channels(), store).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_logs_success() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_test_dispatcher(store.clone());
        let contact = create_test_contact("c-1", ContactMethod::Email, 1);

        dispatcher
            .dispatch("alert-1", &contact, Some("subject"), "body", Urgency::High, 0)
            .await
            .unwrap();

        let logs = store.notifications_for_alert("alert-1").await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].delivery_status, DeliveryStatus::Sent);
        assert!(logs[0].message_id.is_some());
    }

    #[tokio::test]
    async fn test_dispatch_unsupported_channel() {
        let store = Arc::new(MemoryStore::new());
        let config = ChannelsConfig::email_only(Default::default());
        let dispatcher = Dispatcher::new(&config, store).unwrap();
        let contact = create_test_contact("c-1", ContactMethod::Sms, 1);

        let result = dispatcher
            .dispatch("alert-1", &contact, None, "body", Urgency::Normal, 0)
            .await;
        assert!(matches!(result, Err(Error::UnsupportedChannel(_))));
    }

    #[tokio::test]
    async fn test_fanout_isolates_failures() {
        let store = Arc::new(MemoryStore::new());
        let mut dispatcher = create_test_dispatcher(store.clone());
        // Recipient A's channel always fails; B's works.
        dispatcher.register_sender(Arc::new(FailingSender::new(ChannelKind::Sms)));

        let contacts = vec![
            create_test_contact("c-a", ContactMethod::Sms, 1),
            create_test_contact("c-b", ContactMethod::Email, 2),
        ];

        let outcomes = dispatcher
            .dispatch_all("alert-1", &contacts, None, "body", Urgency::Critical, 0)
            .await;

        assert_eq!(outcomes.len(), 2);
        let by_id: std::collections::HashMap<_, _> =
            outcomes.iter().map(|o| (o.recipient_id.as_str(), o)).collect();
        assert!(!by_id["c-a"].success);
        assert!(by_id["c-b"].success);

        // Both attempts audited; B logged as sent.
        let logs = store.notifications_for_alert("alert-1").await.unwrap();
        assert_eq!(logs.len(), 2);
        let sent: Vec<_> = logs
            .iter()
            .filter(|l| l.delivery_status == DeliveryStatus::Sent)
            .collect();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_id, "c-b");
    }

    #[tokio::test]
    async fn test_missing_address_logged_as_failed() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_test_dispatcher(store.clone());
        let contact = EmergencyContact::new("org-1", "c-1", "Ana", ContactMethod::Email, 1);

        let result = dispatcher
            .dispatch("alert-1", &contact, None, "body", Urgency::Normal, 0)
            .await;
        assert!(result.is_err());

        let logs = store.notifications_for_alert("alert-1").await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].delivery_status, DeliveryStatus::Failed);
    }
}
