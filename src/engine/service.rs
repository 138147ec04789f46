//! Monitoring engine: the single action-dispatch entry point.
//!
//! Every request is a pure request/response call; uncaught errors map
//! to a 500-equivalent response, unknown resources to 404.

use crate::alerting::{
    evaluate_monitor, AlertProcessor, AlertTrigger, EscalationScheduler, Evaluation,
    ThresholdEvaluator,
};
use crate::core::{generate_id, now, Result, TimeWindow};
use crate::digest::DigestReporter;
use crate::engine::config::EngineConfig;
use crate::engine::request::{EngineRequest, EngineResponse};
use crate::health::{checks::classify_job_performance, ConnectivityProbe, HealthOrchestrator};
use crate::model::{AlertStatus, AlertType, CheckSummary, Severity};
use crate::notify::{Dispatcher, Urgency};
use crate::store::MonitoringStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Alert and incident statistics over a rolling window.
#[derive(Clone, Debug, Serialize)]
pub struct MonitoringReport {
    /// Organization covered
    pub organization_id: String,
    /// Window length in hours
    pub window_hours: i64,
    /// Alerts currently active
    pub active_alerts: usize,
    /// Alerts triggered in the window
    pub total_alerts: usize,
    /// Alert counts keyed by severity
    pub alerts_by_severity: HashMap<String, usize>,
    /// Alert counts keyed by status
    pub alerts_by_status: HashMap<String, usize>,
    /// Incidents detected in the window
    pub incidents_total: usize,
    /// Incidents resolved in the window
    pub incidents_resolved: usize,
    /// Active monitors
    pub monitors_total: usize,
}

/// The health-check and alert-escalation engine.
pub struct MonitoringEngine {
    store: Arc<dyn MonitoringStore>,
    orchestrator: HealthOrchestrator,
    evaluator: ThresholdEvaluator,
    processor: AlertProcessor,
    escalations: Arc<EscalationScheduler>,
    dispatcher: Arc<Dispatcher>,
    digest: DigestReporter,
    probe: Arc<dyn ConnectivityProbe>,
    config: EngineConfig,
}

impl MonitoringEngine {
    /// Build the engine from configuration and its two external
    /// collaborators. Fails fast on invalid configuration.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn MonitoringStore>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Result<Self> {
        config.validate()?;

        let dispatcher = Arc::new(
            Dispatcher::new(&config.channels, store.clone())?
                .with_send_timeout(Duration::from_secs(config.send_timeout_secs)),
        );
        let escalations = Arc::new(EscalationScheduler::new(
            store.clone(),
            dispatcher.clone(),
            config.escalation.clone(),
        ));
        let processor = AlertProcessor::new(
            store.clone(),
            dispatcher.clone(),
            escalations.clone(),
            config.escalation.clone(),
        );
        let evaluator = ThresholdEvaluator::new(store.clone());
        let orchestrator =
            HealthOrchestrator::new(store.clone()).with_thresholds(config.thresholds.clone());
        let digest = DigestReporter::new(store.clone(), dispatcher.clone());

        Ok(Self {
            store,
            orchestrator,
            evaluator,
            processor,
            escalations,
            dispatcher,
            digest,
            probe,
            config,
        })
    }

    /// The escalation scheduler, for driving its timer loop.
    pub fn escalations(&self) -> Arc<EscalationScheduler> {
        self.escalations.clone()
    }

    /// The alert processor, for library callers that bypass the
    /// request surface.
    pub fn processor(&self) -> &AlertProcessor {
        &self.processor
    }

    /// Handle one request.
    pub async fn handle(&self, request: EngineRequest) -> EngineResponse {
        match self.dispatch(request).await {
            Ok(data) => EngineResponse::ok(data),
            Err(err) => {
                error!(%err, "request failed");
                EngineResponse::from_error(&err)
            }
        }
    }

    async fn dispatch(&self, request: EngineRequest) -> Result<serde_json::Value> {
        match request {
            EngineRequest::RunHealthChecks { organization_id } => {
                let report = self.orchestrator.run(&organization_id).await;
                Ok(serde_json::to_value(report)?)
            }

            EngineRequest::TestStorageConnection { location_id } => {
                let location = self
                    .store
                    .location(&location_id)
                    .await?
                    .ok_or_else(|| crate::core::Error::LocationNotFound(location_id.clone()))?;
                let report = self.probe.probe(&location).await?;
                Ok(serde_json::to_value(report)?)
            }

            EngineRequest::UpdateMonitorStatus {
                monitor_id,
                current_value,
                failed_checks,
                is_active,
            } => {
                let mut monitor = self
                    .store
                    .monitor(&monitor_id)
                    .await?
                    .ok_or_else(|| crate::core::Error::MonitorNotFound(monitor_id.clone()))?;
                monitor.observe(current_value, failed_checks);
                if let Some(active) = is_active {
                    monitor.is_active = active;
                }
                self.store.upsert_monitor(monitor.clone()).await?;
                Ok(serde_json::to_value(monitor)?)
            }

            EngineRequest::CheckThresholds { organization_id } => {
                let outcomes = self
                    .evaluator
                    .check_all(&organization_id, &self.processor, now())
                    .await?;
                Ok(serde_json::to_value(outcomes)?)
            }

            EngineRequest::GenerateMonitoringReport {
                organization_id,
                window_hours,
            } => {
                let window =
                    TimeWindow::hours(window_hours.unwrap_or(self.config.digest_window.hours));
                let report = self.monitoring_report(&organization_id, window).await?;
                Ok(serde_json::to_value(report)?)
            }

            EngineRequest::CheckBackupPerformance { organization_id } => {
                let since = now() - chrono::Duration::hours(24);
                let jobs = self.store.jobs_since(&organization_id, since).await?;
                let detail = classify_job_performance(&jobs, &self.config.thresholds);
                let summary = CheckSummary::from_results("job_performance", vec![detail]);
                Ok(serde_json::to_value(summary)?)
            }

            EngineRequest::ProcessAlert {
                organization_id,
                alert_type,
                severity,
                title,
                message,
                source_system,
                monitor_id,
                current_value,
                threshold_value,
                metadata,
            } => {
                let processed = self
                    .processor
                    .process(AlertTrigger {
                        organization_id,
                        alert_type,
                        severity,
                        title,
                        message,
                        source_system,
                        monitor_id,
                        current_value,
                        threshold_value,
                        metadata,
                    })
                    .await?;
                Ok(serde_json::to_value(processed)?)
            }

            EngineRequest::SendNotification {
                organization_id,
                recipient_id,
                subject,
                message,
                urgency,
            } => {
                let contact = self
                    .store
                    .active_contacts(&organization_id)
                    .await?
                    .into_iter()
                    .find(|c| c.id == recipient_id)
                    .ok_or_else(|| crate::core::Error::ContactNotFound(recipient_id.clone()))?;
                let receipt = self
                    .dispatcher
                    .dispatch(
                        &generate_id("manual"),
                        &contact,
                        subject.as_deref(),
                        &message,
                        urgency,
                        0,
                    )
                    .await?;
                Ok(serde_json::to_value(receipt)?)
            }

            EngineRequest::EscalateAlert { alert_id } => {
                let result = self.escalations.escalate_now(&alert_id).await?;
                Ok(serde_json::json!({
                    "escalated": result.is_some(),
                    "result": serde_json::to_value(result)?,
                }))
            }

            EngineRequest::AcknowledgeAlert {
                alert_id,
                acknowledged_by,
                notes,
            } => {
                let alert = self
                    .processor
                    .acknowledge(&alert_id, &acknowledged_by, notes.as_deref())
                    .await?;
                Ok(serde_json::to_value(alert)?)
            }

            EngineRequest::CheckAlertRules { organization_id } => {
                let rules = self.check_alert_rules(&organization_id).await?;
                Ok(serde_json::to_value(rules)?)
            }

            EngineRequest::SendDigest {
                organization_id,
                window_hours,
            } => {
                let window =
                    TimeWindow::hours(window_hours.unwrap_or(self.config.digest_window.hours));
                let delivery = self.digest.send(&organization_id, window).await?;
                Ok(serde_json::to_value(delivery)?)
            }

            EngineRequest::TestAlertSystem { organization_id } => {
                let result = self.test_alert_system(&organization_id).await?;
                Ok(result)
            }
        }
    }

    async fn monitoring_report(
        &self,
        organization_id: &str,
        window: TimeWindow,
    ) -> Result<MonitoringReport> {
        let since = window.start_from(now());
        let alerts = self.store.alerts_since(organization_id, since).await?;
        let incidents = self.store.incidents_since(organization_id, since).await?;
        let monitors = self.store.active_monitors(organization_id).await?;

        let mut alerts_by_severity: HashMap<String, usize> = HashMap::new();
        let mut alerts_by_status: HashMap<String, usize> = HashMap::new();
        for alert in &alerts {
            *alerts_by_severity
                .entry(alert.severity.to_string())
                .or_insert(0) += 1;
            let status = match alert.status {
                AlertStatus::Active => "active",
                AlertStatus::Acknowledged => "acknowledged",
                AlertStatus::Resolved => "resolved",
                AlertStatus::Suppressed => "suppressed",
            };
            *alerts_by_status.entry(status.to_string()).or_insert(0) += 1;
        }

        Ok(MonitoringReport {
            organization_id: organization_id.to_string(),
            window_hours: window.hours,
            active_alerts: alerts
                .iter()
                .filter(|a| a.status == AlertStatus::Active)
                .count(),
            total_alerts: alerts.len(),
            alerts_by_severity,
            alerts_by_status,
            incidents_total: incidents.len(),
            incidents_resolved: incidents
                .iter()
                .filter(|i| {
                    matches!(
                        i.incident_status,
                        crate::model::IncidentStatus::Resolved
                            | crate::model::IncidentStatus::Closed
                    )
                })
                .count(),
            monitors_total: monitors.len(),
        })
    }

    /// Dry-run evaluation: what each alert-enabled monitor would do
    /// right now, without creating alerts or stamping cooldowns.
    async fn check_alert_rules(&self, organization_id: &str) -> Result<Vec<serde_json::Value>> {
        let monitors = self.store.active_monitors(organization_id).await?;
        let at = now();
        let mut rules = Vec::new();

        for monitor in monitors.iter().filter(|m| m.alerts_enabled) {
            let (outcome, severity) = match evaluate_monitor(monitor, at) {
                Evaluation::Breach { severity, .. } => ("would_fire", Some(severity)),
                Evaluation::Suppressed { .. } => ("suppressed", None),
                Evaluation::Pass => ("pass", None),
            };
            rules.push(serde_json::json!({
                "monitor_id": monitor.id,
                "monitor_name": monitor.name,
                "current_value": monitor.current_value,
                "outcome": outcome,
                "severity": severity.map(|s| s.to_string()),
            }));
        }

        Ok(rules)
    }

    /// Drive a low-severity test alert through the full pipeline and
    /// report per-recipient outcomes, then resolve the test records.
    async fn test_alert_system(&self, organization_id: &str) -> Result<serde_json::Value> {
        let processed = self
            .processor
            .process(AlertTrigger {
                organization_id: organization_id.to_string(),
                alert_type: AlertType::Custom("alert_system_test".to_string()),
                severity: Severity::Low,
                title: "Alert system test".to_string(),
                message: "This is a test of the backup alerting pipeline.".to_string(),
                source_system: "self_test".to_string(),
                monitor_id: None,
                current_value: None,
                threshold_value: None,
                metadata: HashMap::new(),
            })
            .await?;

        // Exercise every contact's channel regardless of tier.
        let contacts = self.store.active_contacts(organization_id).await?;
        let outcomes = self
            .dispatcher
            .dispatch_all(
                &processed.alert_id,
                &contacts,
                Some("Alert system test"),
                "This is a test of the backup alerting pipeline.",
                Urgency::Normal,
                0,
            )
            .await;
        let successful_deliveries = outcomes.iter().filter(|o| o.success).count();

        self.processor
            .resolve(&processed.alert_id, "self_test", Some("test completed"))
            .await?;

        Ok(serde_json::json!({
            "alert_id": processed.alert_id,
            "incident_id": processed.incident_id,
            "recipients_count": contacts.len(),
            "successful_deliveries": successful_deliveries,
            "outcomes": serde_json::to_value(outcomes)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::StaticProbe;
    use crate::model::{
        BackupLocation, ContactMethod, EmergencyContact, HealthStatus, Monitor, MonitorType,
    };
    use crate::store::MemoryStore;

    async fn create_test_engine() -> (MonitoringEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = MonitoringEngine::new(
            EngineConfig::for_testing(),
            store.clone(),
            Arc::new(StaticProbe::reachable(5)),
        )
        .unwrap();
        (engine, store)
    }

    fn create_test_location(id: &str, used: u64) -> BackupLocation {
        BackupLocation {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            name: format!("Location {}", id),
            total_bytes: 1000,
            used_bytes: used,
            last_backup_at: Some(now() - chrono::Duration::hours(10)),
            health_status: HealthStatus::Healthy,
            is_active: true,
        }
    }

    fn create_test_contact(id: &str, level: u8) -> EmergencyContact {
        EmergencyContact::new("org-1", id, id, ContactMethod::Email, level)
            .with_email(&format!("{}@example.com", id))
    }

    #[tokio::test]
    async fn test_run_health_checks_action() {
        let (engine, store) = create_test_engine().await;
        store.insert_location(create_test_location("loc-1", 950)).await;

        let response = engine
            .handle(EngineRequest::RunHealthChecks {
                organization_id: "org-1".to_string(),
            })
            .await;

        assert!(response.is_ok());
        let data = response.data().unwrap();
        assert_eq!(data["overall_status"], "critical");
    }

    #[tokio::test]
    async fn test_storage_connection_action() {
        let (engine, store) = create_test_engine().await;
        store.insert_location(create_test_location("loc-1", 100)).await;

        let response = engine
            .handle(EngineRequest::TestStorageConnection {
                location_id: "loc-1".to_string(),
            })
            .await;
        assert!(response.is_ok());
        assert_eq!(response.data().unwrap()["reachable"], true);

        let missing = engine
            .handle(EngineRequest::TestStorageConnection {
                location_id: "loc-9".to_string(),
            })
            .await;
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn test_check_thresholds_cooldown_idempotent() {
        let (engine, store) = create_test_engine().await;
        let mut monitor = Monitor::new("org-1", "Capacity", MonitorType::StorageCapacity, "loc-1")
            .with_thresholds(80.0, 90.0)
            .with_cooldown_minutes(30);
        monitor.observe(92.0, 0);
        let monitor_id = monitor.id.clone();
        store.upsert_monitor(monitor).await.unwrap();

        // First sweep fires.
        let first = engine
            .handle(EngineRequest::CheckThresholds {
                organization_id: "org-1".to_string(),
            })
            .await;
        assert!(first.is_ok());
        assert_eq!(first.data().unwrap()[0]["outcome"], "breach");

        // Second sweep inside the cooldown suppresses.
        let second = engine
            .handle(EngineRequest::CheckThresholds {
                organization_id: "org-1".to_string(),
            })
            .await;
        assert_eq!(second.data().unwrap()[0]["outcome"], "suppressed");

        // Exactly one alert row exists.
        let alerts = store
            .alerts_since("org-1", now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].monitor_id.as_deref(), Some(monitor_id.as_str()));
    }

    #[tokio::test]
    async fn test_acknowledge_cancels_escalation_end_to_end() {
        let (engine, store) = create_test_engine().await;
        store.insert_contact(create_test_contact("c-1", 1)).await;
        store.insert_contact(create_test_contact("c-3", 3)).await;

        let response = engine
            .handle(EngineRequest::ProcessAlert {
                organization_id: "org-1".to_string(),
                alert_type: AlertType::BackupFailure,
                severity: Severity::Critical,
                title: "Backups down".to_string(),
                message: "all jobs failing".to_string(),
                source_system: "test".to_string(),
                monitor_id: None,
                current_value: None,
                threshold_value: None,
                metadata: HashMap::new(),
            })
            .await;
        let alert_id = response.data().unwrap()["alert_id"].as_str().unwrap().to_string();
        assert_eq!(response.data().unwrap()["escalation_scheduled"], true);

        // Acknowledge one minute in; window is 300s.
        let ack = engine
            .handle(EngineRequest::AcknowledgeAlert {
                alert_id: alert_id.clone(),
                acknowledged_by: "operator".to_string(),
                notes: None,
            })
            .await;
        assert!(ack.is_ok());

        // Past the deadline, nothing fires.
        let fired = engine
            .escalations()
            .run_due(now() + chrono::Duration::minutes(15))
            .await;
        assert!(fired.is_empty());

        // Only the immediate notification was ever sent.
        let logs = store.notifications_for_alert(&alert_id).await.unwrap();
        assert!(logs.iter().all(|l| l.escalation_level == 0));
    }

    #[tokio::test]
    async fn test_monitoring_report_action() {
        let (engine, _store) = create_test_engine().await;
        engine
            .handle(EngineRequest::ProcessAlert {
                organization_id: "org-1".to_string(),
                alert_type: AlertType::StorageCapacity,
                severity: Severity::High,
                title: "t".to_string(),
                message: "m".to_string(),
                source_system: "test".to_string(),
                monitor_id: None,
                current_value: None,
                threshold_value: None,
                metadata: HashMap::new(),
            })
            .await;

        let response = engine
            .handle(EngineRequest::GenerateMonitoringReport {
                organization_id: "org-1".to_string(),
                window_hours: Some(24),
            })
            .await;
        let data = response.data().unwrap();
        assert_eq!(data["total_alerts"], 1);
        assert_eq!(data["active_alerts"], 1);
        assert_eq!(data["alerts_by_severity"]["high"], 1);
        assert_eq!(data["incidents_total"], 1);
    }

    #[tokio::test]
    async fn test_check_alert_rules_dry_run_creates_nothing() {
        let (engine, store) = create_test_engine().await;
        let mut monitor = Monitor::new("org-1", "Capacity", MonitorType::StorageCapacity, "loc-1");
        monitor.observe(95.0, 0);
        store.upsert_monitor(monitor).await.unwrap();

        let response = engine
            .handle(EngineRequest::CheckAlertRules {
                organization_id: "org-1".to_string(),
            })
            .await;
        assert_eq!(response.data().unwrap()[0]["outcome"], "would_fire");

        let alerts = store
            .alerts_since("org-1", now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn test_send_notification_action() {
        let (engine, store) = create_test_engine().await;
        store.insert_contact(create_test_contact("c-1", 1)).await;

        let response = engine
            .handle(EngineRequest::SendNotification {
                organization_id: "org-1".to_string(),
                recipient_id: "c-1".to_string(),
                subject: Some("Heads up".to_string()),
                message: "maintenance window tonight".to_string(),
                urgency: Urgency::Normal,
            })
            .await;
        assert!(response.is_ok());
        assert_eq!(response.data().unwrap()["status"], "sent");

        let missing = engine
            .handle(EngineRequest::SendNotification {
                organization_id: "org-1".to_string(),
                recipient_id: "c-9".to_string(),
                subject: None,
                message: "m".to_string(),
                urgency: Urgency::Normal,
            })
            .await;
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn test_alert_system_self_test() {
        let (engine, store) = create_test_engine().await;
        store.insert_contact(create_test_contact("c-1", 1)).await;
        store.insert_contact(create_test_contact("c-3", 3)).await;

        let response = engine
            .handle(EngineRequest::TestAlertSystem {
                organization_id: "org-1".to_string(),
            })
            .await;
        assert!(response.is_ok());
        let data = response.data().unwrap();
        assert_eq!(data["recipients_count"], 2);
        assert_eq!(data["successful_deliveries"], 2);

        // The test alert ends resolved.
        let alert_id = data["alert_id"].as_str().unwrap();
        let alert = store.alert(alert_id).await.unwrap().unwrap();
        assert_eq!(alert.status, AlertStatus::Resolved);
    }

    #[tokio::test]
    async fn test_update_monitor_status_action() {
        let (engine, store) = create_test_engine().await;
        let monitor = Monitor::new("org-1", "Capacity", MonitorType::StorageCapacity, "loc-1");
        let monitor_id = monitor.id.clone();
        store.upsert_monitor(monitor).await.unwrap();

        let response = engine
            .handle(EngineRequest::UpdateMonitorStatus {
                monitor_id: monitor_id.clone(),
                current_value: 77.5,
                failed_checks: 1,
                is_active: Some(false),
            })
            .await;
        assert!(response.is_ok());

        let stored = store.monitor(&monitor_id).await.unwrap().unwrap();
        assert_eq!(stored.current_value, 77.5);
        assert!(!stored.is_active);
    }
}
