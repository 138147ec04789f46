//! Alert processor.
//!
//! Converts a triggered condition into durable alert and incident
//! records, then drives immediate notification and escalation
//! scheduling. Persistence always commits before any send is attempted,
//! so a delivery failure never loses the alert.

use crate::alerting::escalation::EscalationScheduler;
use crate::alerting::policy::{business_impact_for, incident_type_for, EscalationPolicy};
use crate::core::{now, Error, Result};
use crate::model::{Alert, AlertType, EmergencyContact, Incident, Priority, Severity};
use crate::notify::{Dispatcher, Urgency};
use crate::store::MonitoringStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A triggered condition handed to the processor.
#[derive(Clone, Debug)]
pub struct AlertTrigger {
    /// Owning organization
    pub organization_id: String,
    /// Condition kind
    pub alert_type: AlertType,
    /// Severity of the condition
    pub severity: Severity,
    /// Short title
    pub title: String,
    /// Full message
    pub message: String,
    /// System that raised the condition
    pub source_system: String,
    /// Originating monitor, if any
    pub monitor_id: Option<String>,
    /// Observed value
    pub current_value: Option<f64>,
    /// Breached threshold
    pub threshold_value: Option<f64>,
    /// Additional context
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Summary returned after processing one trigger.
#[derive(Clone, Debug, Serialize)]
pub struct ProcessedAlert {
    /// Created alert ID
    pub alert_id: String,
    /// Created incident ID
    pub incident_id: String,
    /// Derived priority
    pub priority: Priority,
    /// Immediate notifications that were accepted by a channel
    pub notifications_sent: usize,
    /// Immediate-tier recipients attempted
    pub recipients_count: usize,
    /// Whether escalation was scheduled
    pub escalation_scheduled: bool,
}

/// The urgency a severity maps to on the wire.
fn urgency_for(severity: Severity) -> Urgency {
    match severity {
        Severity::Critical => Urgency::Critical,
        Severity::High => Urgency::High,
        Severity::Medium | Severity::Low => Urgency::Normal,
    }
}

/// Converts triggers into alerts, incidents, and notifications.
pub struct AlertProcessor {
    store: Arc<dyn MonitoringStore>,
    dispatcher: Arc<Dispatcher>,
    escalations: Arc<EscalationScheduler>,
    policy: EscalationPolicy,
}

impl AlertProcessor {
    /// Create a processor. The policy must already be validated.
    pub fn new(
        store: Arc<dyn MonitoringStore>,
        dispatcher: Arc<Dispatcher>,
        escalations: Arc<EscalationScheduler>,
        policy: EscalationPolicy,
    ) -> Self {
        Self {
            store,
            dispatcher,
            escalations,
            policy,
        }
    }

    /// Process one trigger into durable records plus notifications.
    pub async fn process(&self, trigger: AlertTrigger) -> Result<ProcessedAlert> {
        let rule = self.policy.rule(trigger.severity);

        let mut alert = Alert::new(
            &trigger.organization_id,
            trigger.alert_type.clone(),
            trigger.severity,
            rule.priority,
            &trigger.title,
            &trigger.message,
            &trigger.source_system,
        );
        if let Some(monitor_id) = &trigger.monitor_id {
            alert = alert.with_monitor(monitor_id);
        }
        if let (Some(current), Some(threshold)) = (trigger.current_value, trigger.threshold_value) {
            alert = alert.with_values(current, threshold);
        }
        for (key, value) in trigger.metadata {
            alert = alert.with_metadata(&key, value);
        }

        let mut incident = Incident::open(
            &trigger.organization_id,
            &alert.id,
            incident_type_for(&trigger.alert_type),
            business_impact_for(trigger.severity),
            &trigger.title,
        );
        incident
            .escalation_metadata
            .insert("priority_rank".to_string(), serde_json::Value::from(rule.priority_rank));
        alert.incident_id = Some(incident.id.clone());

        // Commit both records before any notification is attempted.
        self.store.insert_alert(alert.clone()).await?;
        self.store.insert_incident(incident.clone()).await?;

        info!(
            alert_id = %alert.id,
            incident_id = %incident.id,
            severity = %trigger.severity,
            priority = %rule.priority,
            "alert created"
        );

        let contacts = self.store.active_contacts(&trigger.organization_id).await?;
        let (immediate, escalation): (Vec<EmergencyContact>, Vec<EmergencyContact>) =
            contacts.into_iter().partition(|c| c.is_immediate_tier());

        // Only critical and high interrupt humans synchronously.
        let (notifications_sent, recipients_count) =
            if trigger.severity >= Severity::High && !immediate.is_empty() {
                let subject = format!("[{}] {}", trigger.severity.to_string().to_uppercase(), trigger.title);
                let outcomes = self
                    .dispatcher
                    .dispatch_all(
                        &alert.id,
                        &immediate,
                        Some(&subject),
                        &trigger.message,
                        urgency_for(trigger.severity),
                        0,
                    )
                    .await;
                let sent = outcomes.iter().filter(|o| o.success).count();
                (sent, outcomes.len())
            } else {
                (0, 0)
            };

        let escalation_scheduled = if rule.max_escalation_level > 0 && !escalation.is_empty() {
            let deadline = now() + chrono::Duration::seconds(rule.ack_window_secs);
            self.escalations.schedule(&alert, deadline).await;
            true
        } else {
            false
        };

        Ok(ProcessedAlert {
            alert_id: alert.id,
            incident_id: incident.id,
            priority: rule.priority,
            notifications_sent,
            recipients_count,
            escalation_scheduled,
        })
    }

    /// Acknowledge an alert: cancels pending escalations and moves the
    /// incident to investigating.
    pub async fn acknowledge(
        &self,
        alert_id: &str,
        acknowledged_by: &str,
        notes: Option<&str>,
    ) -> Result<Alert> {
        let mut alert = self
            .store
            .alert(alert_id)
            .await?
            .ok_or_else(|| Error::AlertNotFound(alert_id.to_string()))?;

        alert.acknowledge(acknowledged_by)?;
        self.store.update_alert(alert.clone()).await?;

        // Acknowledgment wins any race with a pending escalation.
        self.escalations.cancel(alert_id).await;

        if let Some(incident_id) = &alert.incident_id {
            if let Some(mut incident) = self.store.incident(incident_id).await? {
                incident.start_investigation(acknowledged_by, notes);
                self.store.update_incident(incident).await?;
            }
        }

        info!(alert_id, acknowledged_by, "alert acknowledged");
        Ok(alert)
    }

    /// Resolve an alert and its incident. Terminal.
    pub async fn resolve(
        &self,
        alert_id: &str,
        resolved_by: &str,
        notes: Option<&str>,
    ) -> Result<Alert> {
        let mut alert = self
            .store
            .alert(alert_id)
            .await?
            .ok_or_else(|| Error::AlertNotFound(alert_id.to_string()))?;

        alert.resolve(resolved_by, notes)?;
        self.store.update_alert(alert.clone()).await?;
        self.escalations.cancel(alert_id).await;

        if let Some(incident_id) = &alert.incident_id {
            if let Some(mut incident) = self.store.incident(incident_id).await? {
                incident.resolve(notes);
                self.store.update_incident(incident).await?;
            }
        }

        info!(alert_id, resolved_by, "alert resolved");
        Ok(alert)
    }
}
