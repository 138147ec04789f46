//! Health check orchestrator.
//!
//! Runs the full check battery for one organization and produces a
//! consolidated report. Never lets a single check abort the run.

use crate::core::{now, Result};
use crate::health::checks::{
    classify_capacity_trend, classify_job_performance, classify_location, classify_procedure,
    HealthThresholds,
};
use crate::model::{CheckSummary, HealthReport, Monitor, MonitorType};
use crate::store::MonitoringStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Name of the rollup monitor the orchestrator maintains.
pub const ROLLUP_MONITOR_NAME: &str = "System Health Check";

/// Produces consolidated health reports on demand or on a schedule.
///
/// Runs for different organizations may proceed concurrently; checks for
/// a single organization belong to one `run` call and are sequenced by
/// the caller's scheduler.
pub struct HealthOrchestrator {
    store: Arc<dyn MonitoringStore>,
    thresholds: HealthThresholds,
}

impl HealthOrchestrator {
    /// Create an orchestrator over a store.
    pub fn new(store: Arc<dyn MonitoringStore>) -> Self {
        Self {
            store,
            thresholds: HealthThresholds::default(),
        }
    }

    /// Override classification thresholds.
    pub fn with_thresholds(mut self, thresholds: HealthThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Run the full battery for one organization.
    ///
    /// A failure inside any check becomes a `failed`/`critical` detail;
    /// this method always returns a report.
    pub async fn run(&self, organization_id: &str) -> HealthReport {
        info!(organization_id, "health check run started");

        let (locations, jobs, trend, procedures) = tokio::join!(
            self.check_locations(organization_id),
            self.check_job_performance(organization_id),
            self.check_capacity_trend(organization_id),
            self.check_procedures(organization_id),
        );

        let checks = vec![
            locations.unwrap_or_else(|err| CheckSummary::failed("location_health", &err.to_string())),
            jobs.unwrap_or_else(|err| CheckSummary::failed("job_performance", &err.to_string())),
            trend.unwrap_or_else(|err| CheckSummary::failed("capacity_trend", &err.to_string())),
            procedures
                .unwrap_or_else(|err| CheckSummary::failed("recovery_currency", &err.to_string())),
        ];

        let report = HealthReport::aggregate(organization_id, checks);

        // Side effects are best-effort: the report stands even if a
        // cache write fails.
        if let Err(err) = self.apply_side_effects(&report).await {
            warn!(organization_id, %err, "health report side effects incomplete");
        }

        info!(
            organization_id,
            status = %report.overall_status,
            pass_rate = report.pass_rate,
            "health check run finished"
        );
        report
    }

    async fn check_locations(&self, organization_id: &str) -> Result<CheckSummary> {
        let locations = self.store.active_locations(organization_id).await?;
        let at = now();
        let details = locations
            .iter()
            .map(|location| classify_location(location, &self.thresholds, at))
            .collect();
        Ok(CheckSummary::from_results("location_health", details))
    }

    async fn check_job_performance(&self, organization_id: &str) -> Result<CheckSummary> {
        let since = now() - chrono::Duration::hours(24);
        let jobs = self.store.jobs_since(organization_id, since).await?;
        let detail = classify_job_performance(&jobs, &self.thresholds);
        Ok(CheckSummary::from_results("job_performance", vec![detail]))
    }

    async fn check_capacity_trend(&self, organization_id: &str) -> Result<CheckSummary> {
        let snapshot = self.store.latest_capacity_snapshot(organization_id).await?;
        let detail = classify_capacity_trend(snapshot.as_ref(), &self.thresholds);
        Ok(CheckSummary::from_results("capacity_trend", vec![detail]))
    }

    async fn check_procedures(&self, organization_id: &str) -> Result<CheckSummary> {
        let procedures = self.store.approved_procedures(organization_id).await?;
        let at = now();
        let details = procedures
            .iter()
            .map(|procedure| classify_procedure(procedure, at))
            .collect();
        Ok(CheckSummary::from_results("recovery_currency", details))
    }

    /// Persist the rollup monitor and refresh each location's cached
    /// health status.
    async fn apply_side_effects(&self, report: &HealthReport) -> Result<()> {
        for summary in &report.checks {
            if summary.check_name != "location_health" {
                continue;
            }
            for detail in &summary.details {
                if let Some(location_id) = &detail.resource_id {
                    self.store
                        .update_location_health(location_id, detail.status)
                        .await?;
                }
            }
        }

        self.upsert_rollup_monitor(report).await
    }

    async fn upsert_rollup_monitor(&self, report: &HealthReport) -> Result<()> {
        let existing = self
            .store
            .active_monitors(&report.organization_id)
            .await?
            .into_iter()
            .find(|m| m.monitor_type == MonitorType::SystemHealth);

        match existing {
            Some(monitor) => {
                self.store
                    .record_monitor_observation(&monitor.id, report.pass_rate, 0)
                    .await
            }
            None => {
                // The rollup tracks pass rate, where low is bad; it is a
                // record of record, not an alert source.
                let mut monitor = Monitor::new(
                    &report.organization_id,
                    ROLLUP_MONITOR_NAME,
                    MonitorType::SystemHealth,
                    "system",
                );
                monitor.alerts_enabled = false;
                monitor.observe(report.pass_rate, 0);
                self.store.upsert_monitor(monitor).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BackupJob, BackupLocation, HealthStatus, JobStatus};
    use crate::store::MemoryStore;

    fn create_test_location(id: &str, used: u64, backup_hours_ago: i64) -> BackupLocation {
        BackupLocation {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            name: format!("Location {}", id),
            total_bytes: 1000,
            used_bytes: used,
            last_backup_at: Some(now() - chrono::Duration::hours(backup_hours_ago)),
            health_status: HealthStatus::Healthy,
            is_active: true,
        }
    }

    fn create_test_job(status: JobStatus, hours_ago: i64) -> BackupJob {
        BackupJob {
            id: crate::core::generate_id("job"),
            organization_id: "org-1".to_string(),
            location_id: "loc-1".to_string(),
            status,
            started_at: now() - chrono::Duration::hours(hours_ago),
            finished_at: Some(now() - chrono::Duration::hours(hours_ago)),
            bytes_processed: 1024,
        }
    }

    async fn create_seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_location(create_test_location("loc-1", 500, 2)).await;
        store.insert_job(create_test_job(JobStatus::Completed, 1)).await;
        store
    }

    #[tokio::test]
    async fn test_run_healthy_org() {
        let store = create_seeded_store().await;
        let orchestrator = HealthOrchestrator::new(store.clone());
        let report = orchestrator.run("org-1").await;

        // Location and jobs healthy; missing capacity snapshot is a warning.
        assert_eq!(report.overall_status, HealthStatus::Warning);
        assert_eq!(report.checks.len(), 4);
        assert!(report.critical_count == 0);
    }

    #[tokio::test]
    async fn test_run_critical_location_wins() {
        let store = Arc::new(MemoryStore::new());
        store.insert_location(create_test_location("loc-1", 950, 10)).await;
        store.insert_job(create_test_job(JobStatus::Completed, 1)).await;

        let orchestrator = HealthOrchestrator::new(store.clone());
        let report = orchestrator.run("org-1").await;

        assert_eq!(report.overall_status, HealthStatus::Critical);

        // Location cache refreshed.
        let location = store.location("loc-1").await.unwrap().unwrap();
        assert_eq!(location.health_status, HealthStatus::Critical);
    }

    #[tokio::test]
    async fn test_run_persists_rollup_monitor() {
        let store = create_seeded_store().await;
        let orchestrator = HealthOrchestrator::new(store.clone());
        orchestrator.run("org-1").await;

        let monitors = store.active_monitors("org-1").await.unwrap();
        let rollup = monitors
            .iter()
            .find(|m| m.monitor_type == MonitorType::SystemHealth)
            .expect("rollup monitor created");
        assert_eq!(rollup.name, ROLLUP_MONITOR_NAME);
        assert!(!rollup.alerts_enabled);
        assert!(rollup.current_value > 0.0);

        // Second run updates the same monitor instead of adding one.
        orchestrator.run("org-1").await;
        let monitors = store.active_monitors("org-1").await.unwrap();
        let rollups = monitors
            .iter()
            .filter(|m| m.monitor_type == MonitorType::SystemHealth)
            .count();
        assert_eq!(rollups, 1);
    }

    #[tokio::test]
    async fn test_run_empty_org_still_reports() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = HealthOrchestrator::new(store);
        let report = orchestrator.run("org-empty").await;

        assert_eq!(report.checks.len(), 4);
        // No locations or procedures: zero details there, but job and
        // trend batteries still classify.
        assert!(report.checks_performed >= 2);
    }
}
