//! Health check classification rules.
//!
//! Pure functions from read models to check results; the orchestrator
//! supplies the rows and persists the side effects.

use crate::core::Timestamp;
use crate::model::{
    BackupJob, BackupLocation, CapacitySnapshot, HealthCheckResult, HealthStatus, JobStatus,
    RecoveryProcedure,
};
use serde::{Deserialize, Serialize};

/// Thresholds for health classification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthThresholds {
    /// Capacity percentage at which a location is a warning
    pub capacity_warning_percent: f64,
    /// Capacity percentage at which a location is critical
    pub capacity_critical_percent: f64,
    /// Hours without a successful backup before a location is a warning
    pub stale_backup_hours: i64,
    /// Job success rate below which performance is critical
    pub job_success_critical_percent: f64,
    /// Job success rate below which performance is a warning
    pub job_success_warning_percent: f64,
    /// Days of headroom below which the capacity trend is a warning
    pub trend_warning_days: i64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            capacity_warning_percent: 80.0,
            capacity_critical_percent: 90.0,
            stale_backup_hours: 24,
            job_success_critical_percent: 80.0,
            job_success_warning_percent: 95.0,
            trend_warning_days: 7,
        }
    }
}

/// Classify one backup location: capacity and backup recency, worst of
/// the two.
pub fn classify_location(
    location: &BackupLocation,
    thresholds: &HealthThresholds,
    at: Timestamp,
) -> HealthCheckResult {
    let usage = location.capacity_used_percent();

    let capacity_status = if usage >= thresholds.capacity_critical_percent {
        HealthStatus::Critical
    } else if usage >= thresholds.capacity_warning_percent {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    };

    let (recency_status, recency_note) = match location.hours_since_backup(at) {
        Some(hours) if hours > thresholds.stale_backup_hours => (
            HealthStatus::Warning,
            format!("last successful backup {}h ago", hours),
        ),
        Some(hours) => (
            HealthStatus::Healthy,
            format!("last successful backup {}h ago", hours),
        ),
        None => (
            HealthStatus::Warning,
            "no successful backup recorded".to_string(),
        ),
    };

    let status = HealthStatus::worst(capacity_status, recency_status);
    let label = match status {
        HealthStatus::Critical | HealthStatus::Failed => "CRITICAL",
        HealthStatus::Warning => "WARNING",
        HealthStatus::Healthy => "OK",
    };
    let message = format!(
        "{}: {} at {:.1}% capacity; {}",
        label, location.name, usage, recency_note
    );

    HealthCheckResult::new("location_health", status, &message).for_resource(&location.id)
}

/// Classify recent job performance from the 24h success rate.
pub fn classify_job_performance(
    jobs: &[BackupJob],
    thresholds: &HealthThresholds,
) -> HealthCheckResult {
    let terminal: Vec<&BackupJob> = jobs.iter().filter(|j| j.is_terminal()).collect();

    if terminal.is_empty() {
        return HealthCheckResult::new(
            "job_performance",
            HealthStatus::Warning,
            "no backup jobs completed in the window",
        );
    }

    let completed = terminal
        .iter()
        .filter(|j| j.status == JobStatus::Completed)
        .count();
    let success_rate = completed as f64 / terminal.len() as f64 * 100.0;

    let status = if success_rate < thresholds.job_success_critical_percent {
        HealthStatus::Critical
    } else if success_rate < thresholds.job_success_warning_percent {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    };

    let message = format!(
        "{} of {} jobs succeeded ({:.1}%)",
        completed,
        terminal.len(),
        success_rate
    );

    HealthCheckResult::new("job_performance", status, &message)
}

/// Classify the storage capacity trend from the latest snapshot.
pub fn classify_capacity_trend(
    snapshot: Option<&CapacitySnapshot>,
    thresholds: &HealthThresholds,
) -> HealthCheckResult {
    let snapshot = match snapshot {
        Some(snapshot) => snapshot,
        None => {
            return HealthCheckResult::new(
                "capacity_trend",
                HealthStatus::Warning,
                "no capacity snapshot available",
            )
        }
    };

    let usage = snapshot.used_percent();
    let days_until_warning = snapshot.days_until_percent(thresholds.capacity_warning_percent);

    let status = if usage >= thresholds.capacity_critical_percent {
        HealthStatus::Critical
    } else if usage >= thresholds.capacity_warning_percent {
        HealthStatus::Warning
    } else if matches!(days_until_warning, Some(days) if days <= thresholds.trend_warning_days) {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    };

    let trend_note = match days_until_warning {
        Some(days) => format!("~{} days until {}% usage", days, thresholds.capacity_warning_percent),
        None => "no measurable growth".to_string(),
    };
    let message = format!("storage at {:.1}% used; {}", usage, trend_note);

    HealthCheckResult::new("capacity_trend", status, &message)
}

/// Classify one recovery procedure's currency.
pub fn classify_procedure(procedure: &RecoveryProcedure, at: Timestamp) -> HealthCheckResult {
    let (status, message) = if procedure.never_tested() {
        (
            HealthStatus::Critical,
            format!("procedure '{}' has never been tested", procedure.name),
        )
    } else if procedure.test_overdue(at) {
        (
            HealthStatus::Warning,
            format!("procedure '{}' test is overdue", procedure.name),
        )
    } else if procedure.review_overdue(at) {
        (
            HealthStatus::Warning,
            format!("procedure '{}' review is overdue", procedure.name),
        )
    } else {
        (
            HealthStatus::Healthy,
            format!("procedure '{}' is current", procedure.name),
        )
    };

    HealthCheckResult::new("recovery_currency", status, &message).for_resource(&procedure.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::now;

    fn create_test_location(used: u64, backup_hours_ago: Option<i64>) -> BackupLocation {
        BackupLocation {
            id: "loc-1".to_string(),
            organization_id: "org-1".to_string(),
            name: "Primary NAS".to_string(),
            total_bytes: 1000,
            used_bytes: used,
            last_backup_at: backup_hours_ago.map(|h| now() - chrono::Duration::hours(h)),
            health_status: HealthStatus::Healthy,
            is_active: true,
        }
    }

    fn create_test_job(status: JobStatus) -> BackupJob {
        BackupJob {
            id: crate::core::generate_id("job"),
            organization_id: "org-1".to_string(),
            location_id: "loc-1".to_string(),
            status,
            started_at: now() - chrono::Duration::hours(1),
            finished_at: Some(now()),
            bytes_processed: 1024,
        }
    }

    #[test]
    fn test_location_critical_at_95_percent() {
        // 95% capacity, last backup 10h ago.
        let location = create_test_location(950, Some(10));
        let result = classify_location(&location, &HealthThresholds::default(), now());

        assert_eq!(result.status, HealthStatus::Critical);
        assert!(result.message.contains("CRITICAL"));
        assert!(result.message.contains("95.0%"));
    }

    #[test]
    fn test_location_warning_from_stale_backup() {
        let location = create_test_location(500, Some(30));
        let result = classify_location(&location, &HealthThresholds::default(), now());

        assert_eq!(result.status, HealthStatus::Warning);
        assert!(result.message.contains("30h ago"));
    }

    #[test]
    fn test_location_healthy() {
        let location = create_test_location(500, Some(2));
        let result = classify_location(&location, &HealthThresholds::default(), now());
        assert_eq!(result.status, HealthStatus::Healthy);
    }

    #[test]
    fn test_job_performance_70_percent_critical() {
        // 20 jobs, 14 completed, 6 failed -> 70%.
        let mut jobs: Vec<BackupJob> =
            (0..14).map(|_| create_test_job(JobStatus::Completed)).collect();
        jobs.extend((0..6).map(|_| create_test_job(JobStatus::Failed)));

        let result = classify_job_performance(&jobs, &HealthThresholds::default());
        assert_eq!(result.status, HealthStatus::Critical);
        assert!(result.message.contains("70.0%"));
    }

    #[test]
    fn test_job_performance_warning_band() {
        // 19 of 20 -> 95% is healthy; 18 of 20 -> 90% is warning.
        let mut jobs: Vec<BackupJob> =
            (0..18).map(|_| create_test_job(JobStatus::Completed)).collect();
        jobs.extend((0..2).map(|_| create_test_job(JobStatus::Failed)));
        let result = classify_job_performance(&jobs, &HealthThresholds::default());
        assert_eq!(result.status, HealthStatus::Warning);

        let jobs: Vec<BackupJob> =
            (0..20).map(|_| create_test_job(JobStatus::Completed)).collect();
        let result = classify_job_performance(&jobs, &HealthThresholds::default());
        assert_eq!(result.status, HealthStatus::Healthy);
    }

    #[test]
    fn test_job_performance_running_jobs_excluded() {
        let jobs = vec![
            create_test_job(JobStatus::Completed),
            create_test_job(JobStatus::Running),
            create_test_job(JobStatus::Queued),
        ];
        let result = classify_job_performance(&jobs, &HealthThresholds::default());
        assert!(result.message.contains("1 of 1"));
    }

    #[test]
    fn test_capacity_trend_days_warning() {
        let snapshot = CapacitySnapshot {
            organization_id: "org-1".to_string(),
            total_bytes: 1000,
            used_bytes: 750,
            daily_growth_bytes: 10,
            captured_at: now(),
        };
        // 75% used, 5 days to the 80% line.
        let result = classify_capacity_trend(Some(&snapshot), &HealthThresholds::default());
        assert_eq!(result.status, HealthStatus::Warning);
        assert!(result.message.contains("5 days"));
    }

    #[test]
    fn test_capacity_trend_critical() {
        let snapshot = CapacitySnapshot {
            organization_id: "org-1".to_string(),
            total_bytes: 1000,
            used_bytes: 920,
            daily_growth_bytes: 1,
            captured_at: now(),
        };
        let result = classify_capacity_trend(Some(&snapshot), &HealthThresholds::default());
        assert_eq!(result.status, HealthStatus::Critical);
    }

    #[test]
    fn test_procedure_never_tested_critical() {
        let procedure = RecoveryProcedure {
            id: "rp-1".to_string(),
            organization_id: "org-1".to_string(),
            name: "Restore DB".to_string(),
            approved: true,
            last_tested_at: None,
            last_reviewed_at: Some(now()),
            test_interval_days: 90,
            review_interval_days: 180,
        };
        let result = classify_procedure(&procedure, now());
        assert_eq!(result.status, HealthStatus::Critical);
        assert!(result.message.contains("never been tested"));
    }
}
