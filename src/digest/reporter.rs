//! Digest reporting.
//!
//! Periodic rollup of backup, incident, and health statistics for
//! management-tier recipients, distinct from real-time alerting.

use crate::core::{generate_id, now, Result, TimeWindow, Timestamp};
use crate::model::{
    BusinessImpact, EmergencyContact, HealthStatus, IncidentStatus, JobStatus, MonitorType,
};
use crate::notify::{Dispatcher, Urgency};
use crate::store::MonitoringStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Backup job statistics over the digest window.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackupStats {
    /// Terminal jobs in the window
    pub total_jobs: usize,
    /// Completed jobs
    pub successful_jobs: usize,
    /// Failed jobs
    pub failed_jobs: usize,
    /// Success rate 0..100
    pub success_rate: f64,
    /// Mean completed-job duration in seconds
    pub average_duration_seconds: f64,
    /// Total bytes processed
    pub total_bytes_processed: u64,
}

/// Incident statistics over the digest window.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IncidentStats {
    /// Incidents detected in the window
    pub total: usize,
    /// Incidents with significant business impact
    pub critical: usize,
    /// Incidents resolved in the window
    pub resolved: usize,
    /// Mean minutes from detection to resolution
    pub average_resolution_minutes: f64,
}

/// Snapshot of current system health from persisted state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthSummary {
    /// Worst cached location status
    pub overall_status: HealthStatus,
    /// Locations currently critical
    pub critical_locations: usize,
    /// Locations currently warning
    pub warning_locations: usize,
    /// Pass rate from the rollup monitor, if one exists
    pub pass_rate: Option<f64>,
}

/// A periodic digest report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DigestReport {
    /// Unique report ID
    pub id: String,
    /// Organization covered
    pub organization_id: String,
    /// Window start
    pub period_start: Timestamp,
    /// Window end
    pub period_end: Timestamp,
    /// Generated timestamp
    pub generated: Timestamp,
    /// Backup job rollup
    pub backup_stats: BackupStats,
    /// Incident rollup
    pub incident_stats: IncidentStats,
    /// Current health snapshot
    pub health_summary: HealthSummary,
    /// Rule-based recommendations
    pub recommendations: Vec<String>,
}

/// Delivery summary for one digest send.
#[derive(Clone, Debug, Serialize)]
pub struct DigestDelivery {
    /// The report that was sent
    pub report: DigestReport,
    /// Management-tier recipients attempted
    pub recipients_count: usize,
    /// Deliveries accepted by a channel
    pub successful_deliveries: usize,
}

/// Generates and delivers digest reports.
pub struct DigestReporter {
    store: Arc<dyn MonitoringStore>,
    dispatcher: Arc<Dispatcher>,
}

impl DigestReporter {
    /// Create a reporter.
    pub fn new(store: Arc<dyn MonitoringStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Build the digest for a rolling window ending now.
    pub async fn generate(
        &self,
        organization_id: &str,
        window: TimeWindow,
    ) -> Result<DigestReport> {
        let period_end = now();
        let period_start = window.start_from(period_end);

        let jobs = self.store.jobs_since(organization_id, period_start).await?;
        let terminal: Vec<_> = jobs.iter().filter(|j| j.is_terminal()).collect();
        let successful = terminal
            .iter()
            .filter(|j| j.status == JobStatus::Completed)
            .count();
        let failed = terminal.len() - successful;
        let success_rate = if terminal.is_empty() {
            100.0
        } else {
            successful as f64 / terminal.len() as f64 * 100.0
        };
        let durations: Vec<i64> = terminal
            .iter()
            .filter(|j| j.status == JobStatus::Completed)
            .filter_map(|j| j.duration_seconds())
            .collect();
        let average_duration_seconds = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<i64>() as f64 / durations.len() as f64
        };
        let backup_stats = BackupStats {
            total_jobs: terminal.len(),
            successful_jobs: successful,
            failed_jobs: failed,
            success_rate,
            average_duration_seconds,
            total_bytes_processed: terminal.iter().map(|j| j.bytes_processed).sum(),
        };

        let incidents = self
            .store
            .incidents_since(organization_id, period_start)
            .await?;
        let resolved: Vec<_> = incidents
            .iter()
            .filter(|i| {
                matches!(
                    i.incident_status,
                    IncidentStatus::Resolved | IncidentStatus::Closed
                )
            })
            .collect();
        let resolution_minutes: Vec<i64> = resolved
            .iter()
            .filter_map(|i| i.resolution_minutes())
            .collect();
        let incident_stats = IncidentStats {
            total: incidents.len(),
            critical: incidents
                .iter()
                .filter(|i| i.business_impact == BusinessImpact::Significant)
                .count(),
            resolved: resolved.len(),
            average_resolution_minutes: if resolution_minutes.is_empty() {
                0.0
            } else {
                resolution_minutes.iter().sum::<i64>() as f64 / resolution_minutes.len() as f64
            },
        };

        let health_summary = self.health_summary(organization_id).await?;

        let recommendations =
            build_recommendations(&backup_stats, &incident_stats, &health_summary);

        Ok(DigestReport {
            id: generate_id("digest"),
            organization_id: organization_id.to_string(),
            period_start,
            period_end,
            generated: now(),
            backup_stats,
            incident_stats,
            health_summary,
            recommendations,
        })
    }

    /// Generate and deliver the digest to management-tier recipients.
    ///
    /// Best-effort per recipient: partial failure is reported in the
    /// result, never raised as an error.
    pub async fn send(
        &self,
        organization_id: &str,
        window: TimeWindow,
    ) -> Result<DigestDelivery> {
        let report = self.generate(organization_id, window).await?;

        let recipients: Vec<EmergencyContact> = self
            .store
            .active_contacts(organization_id)
            .await?
            .into_iter()
            .filter(|c| !c.is_immediate_tier())
            .collect();

        let subject = format!(
            "Backup digest for {} ({}h window)",
            organization_id, window.hours
        );
        let body = Self::to_text(&report);

        let outcomes = self
            .dispatcher
            .dispatch_all(&report.id, &recipients, Some(&subject), &body, Urgency::Normal, 0)
            .await;
        let successful_deliveries = outcomes.iter().filter(|o| o.success).count();

        info!(
            organization_id,
            recipients = recipients.len(),
            delivered = successful_deliveries,
            "digest sent"
        );

        Ok(DigestDelivery {
            report,
            recipients_count: recipients.len(),
            successful_deliveries,
        })
    }

    async fn health_summary(&self, organization_id: &str) -> Result<HealthSummary> {
        let locations = self.store.active_locations(organization_id).await?;
        let critical_locations = locations
            .iter()
            .filter(|l| {
                matches!(
                    l.health_status,
                    HealthStatus::Critical | HealthStatus::Failed
                )
            })
            .count();
        let warning_locations = locations
            .iter()
            .filter(|l| l.health_status == HealthStatus::Warning)
            .count();
        let overall_status = locations
            .iter()
            .fold(HealthStatus::Healthy, |acc, l| {
                HealthStatus::worst(acc, l.health_status)
            });

        let pass_rate = self
            .store
            .active_monitors(organization_id)
            .await?
            .into_iter()
            .find(|m| m.monitor_type == MonitorType::SystemHealth)
            .map(|m| m.current_value);

        Ok(HealthSummary {
            overall_status,
            critical_locations,
            warning_locations,
            pass_rate,
        })
    }

    /// Render a report as plain text.
    pub fn to_text(report: &DigestReport) -> String {
        let mut output = String::new();

        output.push_str(&format!("Backup Digest: {}\n", report.organization_id));
        output.push_str(&format!(
            "Period: {} - {}\n\n",
            report.period_start, report.period_end
        ));

        output.push_str("Backup Jobs:\n");
        output.push_str(&format!(
            "  {} total, {} succeeded, {} failed ({:.1}% success)\n",
            report.backup_stats.total_jobs,
            report.backup_stats.successful_jobs,
            report.backup_stats.failed_jobs,
            report.backup_stats.success_rate
        ));
        output.push_str(&format!(
            "  avg duration {:.0}s, {} bytes processed\n",
            report.backup_stats.average_duration_seconds,
            report.backup_stats.total_bytes_processed
        ));

        output.push_str("\nIncidents:\n");
        output.push_str(&format!(
            "  {} total, {} critical, {} resolved (avg {:.0} min to resolve)\n",
            report.incident_stats.total,
            report.incident_stats.critical,
            report.incident_stats.resolved,
            report.incident_stats.average_resolution_minutes
        ));

        output.push_str(&format!(
            "\nSystem Health: {}\n",
            report.health_summary.overall_status
        ));
        if let Some(pass_rate) = report.health_summary.pass_rate {
            output.push_str(&format!("  check pass rate {:.1}%\n", pass_rate));
        }

        if !report.recommendations.is_empty() {
            output.push_str("\nRecommendations:\n");
            for recommendation in &report.recommendations {
                output.push_str(&format!("  - {}\n", recommendation));
            }
        }

        output
    }
}

fn build_recommendations(
    backup: &BackupStats,
    incidents: &IncidentStats,
    health: &HealthSummary,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if backup.total_jobs == 0 {
        recommendations.push(
            "No backup jobs ran in the reporting window; verify backup schedules".to_string(),
        );
    } else if backup.success_rate < 95.0 {
        recommendations.push(format!(
            "Backup success rate is {:.1}%; review failing jobs",
            backup.success_rate
        ));
    }

    if health.critical_locations > 0 {
        recommendations.push(format!(
            "{} storage location(s) are critical; plan capacity expansion",
            health.critical_locations
        ));
    }

    if incidents.critical > incidents.resolved {
        recommendations.push(
            "Critical incidents are outpacing resolutions; review escalation staffing".to_string(),
        );
    }

    recommendations
}
