//! Read models for the backup infrastructure being monitored.
//!
//! These mirror rows owned by the backup engine; this crate performs
//! filtered reads and targeted health-status updates only.

use crate::core::Timestamp;
use crate::model::health::HealthStatus;
use serde::{Deserialize, Serialize};

/// A storage destination for backups.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackupLocation {
    /// Unique location ID
    pub id: String,
    /// Owning organization
    pub organization_id: String,
    /// Display name
    pub name: String,
    /// Total capacity in bytes
    pub total_bytes: u64,
    /// Bytes currently used
    pub used_bytes: u64,
    /// Last successful backup to this location
    pub last_backup_at: Option<Timestamp>,
    /// Cached health status, updated by the orchestrator
    pub health_status: HealthStatus,
    /// Whether this location is in service
    pub is_active: bool,
}

impl BackupLocation {
    /// Capacity usage as a percentage (0..100).
    pub fn capacity_used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64 * 100.0
    }

    /// Hours since the last successful backup, if any.
    pub fn hours_since_backup(&self, at: Timestamp) -> Option<i64> {
        self.last_backup_at.map(|last| (at - last).num_hours())
    }
}

/// Backup job execution state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
    Running,
    Queued,
}

/// One backup job run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackupJob {
    /// Unique job ID
    pub id: String,
    /// Owning organization
    pub organization_id: String,
    /// Destination location
    pub location_id: String,
    /// Execution state
    pub status: JobStatus,
    /// When the job started
    pub started_at: Timestamp,
    /// When the job finished, if it has
    pub finished_at: Option<Timestamp>,
    /// Bytes copied
    pub bytes_processed: u64,
}

impl BackupJob {
    /// Job duration in seconds, if finished.
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Whether the run counts toward the success rate denominator.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A documented recovery procedure subject to periodic testing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecoveryProcedure {
    /// Unique procedure ID
    pub id: String,
    /// Owning organization
    pub organization_id: String,
    /// Display name
    pub name: String,
    /// Whether the procedure has been approved for use
    pub approved: bool,
    /// When the procedure was last exercised
    pub last_tested_at: Option<Timestamp>,
    /// When the document was last reviewed
    pub last_reviewed_at: Option<Timestamp>,
    /// Maximum days between tests
    pub test_interval_days: i64,
    /// Maximum days between reviews
    pub review_interval_days: i64,
}

impl RecoveryProcedure {
    /// Whether the procedure's test is overdue at `at`.
    pub fn test_overdue(&self, at: Timestamp) -> bool {
        match self.last_tested_at {
            Some(tested) => (at - tested).num_days() > self.test_interval_days,
            None => true,
        }
    }

    /// Whether the procedure's review is overdue at `at`.
    pub fn review_overdue(&self, at: Timestamp) -> bool {
        match self.last_reviewed_at {
            Some(reviewed) => (at - reviewed).num_days() > self.review_interval_days,
            None => true,
        }
    }

    /// Whether the procedure has never been exercised.
    pub fn never_tested(&self) -> bool {
        self.last_tested_at.is_none()
    }
}

/// Latest capacity measurement with growth rate, for trend projection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    /// Owning organization
    pub organization_id: String,
    /// Total capacity in bytes across locations
    pub total_bytes: u64,
    /// Bytes currently used
    pub used_bytes: u64,
    /// Observed daily growth in bytes
    pub daily_growth_bytes: u64,
    /// When the snapshot was taken
    pub captured_at: Timestamp,
}

impl CapacitySnapshot {
    /// Usage as a percentage (0..100).
    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64 * 100.0
    }

    /// Days until usage reaches `threshold_percent`, given current growth.
    /// Returns None when there is no growth or the threshold is already hit.
    pub fn days_until_percent(&self, threshold_percent: f64) -> Option<i64> {
        if self.daily_growth_bytes == 0 {
            return None;
        }
        let threshold_bytes = self.total_bytes as f64 * threshold_percent / 100.0;
        let headroom = threshold_bytes - self.used_bytes as f64;
        if headroom <= 0.0 {
            return Some(0);
        }
        Some((headroom / self.daily_growth_bytes as f64).floor() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::now;

    #[test]
    fn test_capacity_percent() {
        let location = BackupLocation {
            id: "loc-1".to_string(),
            organization_id: "org-1".to_string(),
            name: "Primary NAS".to_string(),
            total_bytes: 1000,
            used_bytes: 950,
            last_backup_at: None,
            health_status: HealthStatus::Healthy,
            is_active: true,
        };
        assert_eq!(location.capacity_used_percent(), 95.0);
    }

    #[test]
    fn test_capacity_percent_empty_location() {
        let location = BackupLocation {
            id: "loc-1".to_string(),
            organization_id: "org-1".to_string(),
            name: "New volume".to_string(),
            total_bytes: 0,
            used_bytes: 0,
            last_backup_at: None,
            health_status: HealthStatus::Healthy,
            is_active: true,
        };
        assert_eq!(location.capacity_used_percent(), 0.0);
    }

    #[test]
    fn test_job_duration() {
        let started = now();
        let job = BackupJob {
            id: "job-1".to_string(),
            organization_id: "org-1".to_string(),
            location_id: "loc-1".to_string(),
            status: JobStatus::Completed,
            started_at: started,
            finished_at: Some(started + chrono::Duration::seconds(90)),
            bytes_processed: 1024,
        };
        assert_eq!(job.duration_seconds(), Some(90));
        assert!(job.is_terminal());
    }

    #[test]
    fn test_procedure_overdue() {
        let at = now();
        let procedure = RecoveryProcedure {
            id: "rp-1".to_string(),
            organization_id: "org-1".to_string(),
            name: "Restore primary DB".to_string(),
            approved: true,
            last_tested_at: Some(at - chrono::Duration::days(100)),
            last_reviewed_at: Some(at - chrono::Duration::days(10)),
            test_interval_days: 90,
            review_interval_days: 180,
        };
        assert!(procedure.test_overdue(at));
        assert!(!procedure.review_overdue(at));
        assert!(!procedure.never_tested());
    }

    #[test]
    fn test_days_until_percent() {
        let snapshot = CapacitySnapshot {
            organization_id: "org-1".to_string(),
            total_bytes: 1000,
            used_bytes: 700,
            daily_growth_bytes: 10,
            captured_at: now(),
        };
        // Warning threshold at 80% = 800 bytes; 100 bytes headroom at 10/day.
        assert_eq!(snapshot.days_until_percent(80.0), Some(10));
        assert_eq!(snapshot.used_percent(), 70.0);
    }

    #[test]
    fn test_days_until_percent_no_growth() {
        let snapshot = CapacitySnapshot {
            organization_id: "org-1".to_string(),
            total_bytes: 1000,
            used_bytes: 700,
            daily_growth_bytes: 0,
            captured_at: now(),
        };
        assert_eq!(snapshot.days_until_percent(80.0), None);
    }
}
