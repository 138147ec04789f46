//! Escalation scheduler.
//!
//! State machine ensuring unacknowledged alerts are not silently
//! dropped: active -> acknowledged, or active -> escalated to the next
//! contact tier, up to the policy's maximum level.

use crate::alerting::policy::EscalationPolicy;
use crate::core::{now, Result, Timestamp};
use crate::model::{Alert, Severity};
use crate::notify::{DispatchOutcome, Dispatcher, Urgency};
use crate::store::MonitoringStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A scheduled escalation awaiting its deadline.
#[derive(Clone, Debug)]
struct PendingEscalation {
    alert_id: String,
    severity: Severity,
    next_level: u8,
    deadline: Timestamp,
}

/// Result of one escalation firing.
#[derive(Clone, Debug, Serialize)]
pub struct EscalationResult {
    /// Escalated alert
    pub alert_id: String,
    /// Level the alert was escalated to
    pub level: u8,
    /// Per-contact delivery outcomes
    pub outcomes: Vec<DispatchOutcome>,
}

/// Schedules and fires escalations against open alerts.
///
/// Poll-driven: `run_due` walks pending entries whose deadline has
/// passed; `run_loop` drives it on an interval for deployment use.
/// Cancellation is race-free against firing because the alert row is
/// re-read immediately before any dispatch; an acknowledged alert is
/// never escalated.
pub struct EscalationScheduler {
    store: Arc<dyn MonitoringStore>,
    dispatcher: Arc<Dispatcher>,
    policy: EscalationPolicy,
    pending: tokio::sync::RwLock<HashMap<String, PendingEscalation>>,
}

impl EscalationScheduler {
    /// Create a scheduler. The policy must already be validated.
    pub fn new(
        store: Arc<dyn MonitoringStore>,
        dispatcher: Arc<Dispatcher>,
        policy: EscalationPolicy,
    ) -> Self {
        Self {
            store,
            dispatcher,
            policy,
            pending: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    /// Schedule the next escalation for an alert.
    pub async fn schedule(&self, alert: &Alert, deadline: Timestamp) {
        let mut pending = self.pending.write().await;
        pending.insert(
            alert.id.clone(),
            PendingEscalation {
                alert_id: alert.id.clone(),
                severity: alert.severity,
                next_level: alert.escalation_level + 1,
                deadline,
            },
        );
        info!(alert_id = %alert.id, %deadline, "escalation scheduled");
    }

    /// Cancel any pending escalation for an alert.
    pub async fn cancel(&self, alert_id: &str) {
        let mut pending = self.pending.write().await;
        if pending.remove(alert_id).is_some() {
            info!(alert_id, "pending escalation cancelled");
        }
    }

    /// Whether an escalation is currently scheduled for an alert.
    pub async fn is_scheduled(&self, alert_id: &str) -> bool {
        self.pending.read().await.contains_key(alert_id)
    }

    /// Fire every escalation whose deadline has passed at `at`.
    pub async fn run_due(&self, at: Timestamp) -> Vec<EscalationResult> {
        let due: Vec<PendingEscalation> = {
            let pending = self.pending.read().await;
            pending
                .values()
                .filter(|p| p.deadline <= at)
                .cloned()
                .collect()
        };

        let mut results = Vec::new();
        for entry in due {
            match self.fire(&entry, at).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(err) => {
                    warn!(alert_id = %entry.alert_id, %err, "escalation firing failed");
                }
            }
        }
        results
    }

    /// Escalate one alert immediately, regardless of any deadline.
    /// Returns None when the alert is no longer active or the chain is
    /// exhausted.
    pub async fn escalate_now(&self, alert_id: &str) -> Result<Option<EscalationResult>> {
        let at = now();
        let entry = {
            let pending = self.pending.read().await;
            pending.get(alert_id).cloned()
        };

        let entry = match entry {
            Some(entry) => entry,
            None => {
                // Not scheduled: derive the next level from the alert row.
                let alert = self
                    .store
                    .alert(alert_id)
                    .await?
                    .ok_or_else(|| crate::core::Error::AlertNotFound(alert_id.to_string()))?;
                PendingEscalation {
                    alert_id: alert.id.clone(),
                    severity: alert.severity,
                    next_level: alert.escalation_level + 1,
                    deadline: at,
                }
            }
        };

        self.fire(&entry, at).await
    }

    async fn fire(&self, entry: &PendingEscalation, at: Timestamp) -> Result<Option<EscalationResult>> {
        // Acknowledgment wins: check the alert row right before dispatch.
        let mut alert = match self.store.alert(&entry.alert_id).await? {
            Some(alert) if alert.is_active() => alert,
            _ => {
                self.cancel(&entry.alert_id).await;
                return Ok(None);
            }
        };

        let rule = self.policy.rule(entry.severity);
        if entry.next_level > rule.max_escalation_level {
            self.cancel(&entry.alert_id).await;
            return Ok(None);
        }

        let contacts = self.store.active_contacts(&alert.organization_id).await?;
        let mut targets: Vec<_> = contacts
            .into_iter()
            .filter(|c| c.escalation_level == entry.next_level)
            .collect();

        // Never notify the same contact twice at the same level.
        let already_notified: Vec<String> = self
            .store
            .notifications_for_alert(&entry.alert_id)
            .await?
            .into_iter()
            .filter(|log| log.escalation_level == entry.next_level)
            .map(|log| log.recipient_id)
            .collect();
        targets.retain(|c| !already_notified.contains(&c.id));

        alert.escalate_to(entry.next_level)?;
        self.store.update_alert(alert.clone()).await?;

        let subject = format!(
            "ESCALATED [{}] {}",
            alert.severity.to_string().to_uppercase(),
            alert.title
        );
        let body = format!(
            "ESCALATED to level {}: alert has not been acknowledged.\n{}",
            entry.next_level, alert.message
        );
        let urgency = match alert.severity {
            Severity::Critical => Urgency::Critical,
            Severity::High => Urgency::High,
            _ => Urgency::Normal,
        };

        let outcomes = self
            .dispatcher
            .dispatch_all(
                &alert.id,
                &targets,
                Some(&subject),
                &body,
                urgency,
                entry.next_level,
            )
            .await;

        if let Some(incident_id) = &alert.incident_id {
            if let Some(mut incident) = self.store.incident(incident_id).await? {
                incident.record_escalation(entry.next_level, targets.len());
                self.store.update_incident(incident).await?;
            }
        }

        // Advance or exhaust the chain.
        {
            let mut pending = self.pending.write().await;
            if entry.next_level < rule.max_escalation_level {
                pending.insert(
                    entry.alert_id.clone(),
                    PendingEscalation {
                        alert_id: entry.alert_id.clone(),
                        severity: entry.severity,
                        next_level: entry.next_level + 1,
                        deadline: at + chrono::Duration::seconds(rule.ack_window_secs),
                    },
                );
            } else {
                pending.remove(&entry.alert_id);
            }
        }

        info!(
            alert_id = %entry.alert_id,
            level = entry.next_level,
            notified = targets.len(),
            "alert escalated"
        );

        Ok(Some(EscalationResult {
            alert_id: entry.alert_id.clone(),
            level: entry.next_level,
            outcomes,
        }))
    }

    /// Drive `run_due` on an interval until the task is aborted.
    pub fn run_loop(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let fired = self.run_due(now()).await;
                if !fired.is_empty() {
                    info!(count = fired.len(), "escalations fired");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertType, ContactMethod, EmergencyContact, Priority};
    use crate::notify::ChannelsConfig;
    use crate::store::MemoryStore;

    fn create_test_contact(id: &str, level: u8) -> EmergencyContact {
        EmergencyContact::new("org-1", id, id, ContactMethod::Email, level)
            .with_email(&format!("{}@example.com", id))
    }

    async fn create_test_scheduler(
        store: Arc<MemoryStore>,
    ) -> Arc<EscalationScheduler> {
        let dispatcher =
            Arc::new(Dispatcher::new(&ChannelsConfig::all_channels(), store.clone()).unwrap());
        Arc::new(EscalationScheduler::new(
            store,
            dispatcher,
            EscalationPolicy::default(),
        ))
    }

    async fn create_active_alert(store: &MemoryStore, severity: Severity) -> Alert {
        let alert = Alert::new(
            "org-1",
            AlertType::BackupFailure,
            severity,
            Priority::Urgent,
            "Backup failed",
            "3 failures in a row",
            "test",
        );
        store.insert_alert(alert.clone()).await.unwrap();
        alert
    }

    #[tokio::test]
    async fn test_due_escalation_notifies_next_tier() {
        let store = Arc::new(MemoryStore::new());
        // Two contacts at level 1, the first tier to escalate to.
        store.insert_contact(create_test_contact("c-1", 1)).await;
        store.insert_contact(create_test_contact("c-3", 1)).await;

        let scheduler = create_test_scheduler(store.clone()).await;
        let alert = create_active_alert(&store, Severity::Critical).await;

        let deadline = now() - chrono::Duration::seconds(1);
        scheduler.schedule(&alert, deadline).await;

        let results = scheduler.run_due(now()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].level, 1);
        assert_eq!(results[0].outcomes.len(), 2);

        let stored = store.alert(&alert.id).await.unwrap().unwrap();
        assert_eq!(stored.escalation_level, 1);

        // The escalation wording is distinct.
        let logs = store.notifications_for_alert(&alert.id).await.unwrap();
        assert!(logs.iter().all(|l| l.body_preview.contains("ESCALATED")));
    }

    #[tokio::test]
    async fn test_acknowledged_alert_never_escalates() {
        let store = Arc::new(MemoryStore::new());
        store.insert_contact(create_test_contact("c-1", 1)).await;
        let scheduler = create_test_scheduler(store.clone()).await;

        let mut alert = create_active_alert(&store, Severity::Critical).await;
        scheduler
            .schedule(&alert, now() - chrono::Duration::seconds(1))
            .await;

        // Acknowledge before the scheduler gets to run.
        alert.acknowledge("operator").unwrap();
        store.update_alert(alert.clone()).await.unwrap();

        let results = scheduler.run_due(now()).await;
        assert!(results.is_empty());
        assert!(!scheduler.is_scheduled(&alert.id).await);
        assert!(store
            .notifications_for_alert(&alert.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_cancel_removes_pending() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = create_test_scheduler(store.clone()).await;
        let alert = create_active_alert(&store, Severity::High).await;

        scheduler
            .schedule(&alert, now() + chrono::Duration::minutes(15))
            .await;
        assert!(scheduler.is_scheduled(&alert.id).await);

        scheduler.cancel(&alert.id).await;
        assert!(!scheduler.is_scheduled(&alert.id).await);
        assert!(scheduler.run_due(now() + chrono::Duration::hours(1)).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_duplicate_notifications_at_same_level() {
        let store = Arc::new(MemoryStore::new());
        store.insert_contact(create_test_contact("c-1", 1)).await;
        let scheduler = create_test_scheduler(store.clone()).await;
        let alert = create_active_alert(&store, Severity::Critical).await;

        scheduler
            .schedule(&alert, now() - chrono::Duration::seconds(1))
            .await;
        let first = scheduler.run_due(now()).await;
        assert_eq!(first[0].outcomes.len(), 1);

        // Re-fire the same level manually: the log guard filters c-1 out.
        let again = scheduler.escalate_now(&alert.id).await.unwrap();
        if let Some(result) = again {
            assert!(result.outcomes.is_empty() || result.level > 1);
        }

        let logs = store.notifications_for_alert(&alert.id).await.unwrap();
        let at_level_one = logs.iter().filter(|l| l.escalation_level == 1).count();
        assert_eq!(at_level_one, 1);
    }

    #[tokio::test]
    async fn test_chain_advances_then_exhausts() {
        let store = Arc::new(MemoryStore::new());
        store.insert_contact(create_test_contact("c-1", 1)).await;
        store.insert_contact(create_test_contact("c-2", 2)).await;
        store.insert_contact(create_test_contact("c-3", 3)).await;
        let scheduler = create_test_scheduler(store.clone()).await;
        // Critical: max level 3.
        let alert = create_active_alert(&store, Severity::Critical).await;

        let t = now();
        scheduler.schedule(&alert, t - chrono::Duration::seconds(1)).await;

        scheduler.run_due(t).await;
        scheduler.run_due(t + chrono::Duration::seconds(301)).await;
        scheduler.run_due(t + chrono::Duration::seconds(602)).await;

        let stored = store.alert(&alert.id).await.unwrap().unwrap();
        assert_eq!(stored.escalation_level, 3);
        // Chain exhausted.
        assert!(!scheduler.is_scheduled(&alert.id).await);
    }

    #[tokio::test]
    async fn test_escalate_now_unknown_alert() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = create_test_scheduler(store).await;
        assert!(scheduler.escalate_now("alert-missing").await.is_err());
    }
}
