//! Health check results and consolidated reports.

use crate::core::{now, Timestamp};
use crate::model::alert::Severity;
use serde::{Deserialize, Serialize};

/// Outcome classification for a health check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Everything within limits
    Healthy,
    /// Attention needed soon
    Warning,
    /// Immediate attention needed
    Critical,
    /// The check itself could not run
    Failed,
}

impl HealthStatus {
    /// Rank for worst-of aggregation. Higher is worse.
    fn rank(self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Warning => 1,
            HealthStatus::Critical => 2,
            HealthStatus::Failed => 3,
        }
    }

    /// Combine two statuses, keeping the worse one.
    pub fn worst(a: HealthStatus, b: HealthStatus) -> HealthStatus {
        if a.rank() >= b.rank() {
            a
        } else {
            b
        }
    }

    /// The severity an alert for this status would carry.
    pub fn severity(self) -> Severity {
        match self {
            HealthStatus::Healthy => Severity::Low,
            HealthStatus::Warning => Severity::Medium,
            HealthStatus::Critical | HealthStatus::Failed => Severity::Critical,
        }
    }

    /// Whether the check passed.
    pub fn is_passing(self) -> bool {
        self == HealthStatus::Healthy
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Warning => write!(f, "warning"),
            HealthStatus::Critical => write!(f, "critical"),
            HealthStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Immutable record of one check's outcome. Append-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Name of the check that produced this result
    pub check_name: String,
    /// Outcome classification
    pub status: HealthStatus,
    /// Severity an alert for this result would carry
    pub severity: Severity,
    /// Human-readable detail
    pub message: String,
    /// Correlated resource, if any (location ID, procedure ID, ...)
    pub resource_id: Option<String>,
    /// When the check ran
    pub timestamp: Timestamp,
}

impl HealthCheckResult {
    /// Create a result for a named check.
    pub fn new(check_name: &str, status: HealthStatus, message: &str) -> Self {
        Self {
            check_name: check_name.to_string(),
            status,
            severity: status.severity(),
            message: message.to_string(),
            resource_id: None,
            timestamp: now(),
        }
    }

    /// Attach the correlated resource.
    pub fn for_resource(mut self, resource_id: &str) -> Self {
        self.resource_id = Some(resource_id.to_string());
        self
    }
}

/// Counts and details for one check battery.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Check battery name
    pub check_name: String,
    /// Overall status for this battery (worst of details)
    pub status: HealthStatus,
    /// Checks performed
    pub performed: usize,
    /// Checks that passed
    pub passed: usize,
    /// Checks that did not pass
    pub failed: usize,
    /// Individual results
    pub details: Vec<HealthCheckResult>,
}

impl CheckSummary {
    /// Build a summary from individual results.
    pub fn from_results(check_name: &str, details: Vec<HealthCheckResult>) -> Self {
        let performed = details.len();
        let passed = details.iter().filter(|d| d.status.is_passing()).count();
        let status = details
            .iter()
            .fold(HealthStatus::Healthy, |acc, d| HealthStatus::worst(acc, d.status));
        Self {
            check_name: check_name.to_string(),
            status,
            performed,
            passed,
            failed: performed - passed,
            details,
        }
    }

    /// A summary for a battery that could not run at all.
    pub fn failed(check_name: &str, message: &str) -> Self {
        let detail = HealthCheckResult::new(check_name, HealthStatus::Failed, message);
        Self {
            check_name: check_name.to_string(),
            status: HealthStatus::Failed,
            performed: 1,
            passed: 0,
            failed: 1,
            details: vec![detail],
        }
    }
}

/// Consolidated health report for one organization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthReport {
    /// Organization the report covers
    pub organization_id: String,
    /// Worst status across all batteries
    pub overall_status: HealthStatus,
    /// Per-battery summaries
    pub checks: Vec<CheckSummary>,
    /// Total critical details across batteries
    pub critical_count: usize,
    /// Total warning details across batteries
    pub warning_count: usize,
    /// Total checks performed
    pub checks_performed: usize,
    /// Total checks passed
    pub checks_passed: usize,
    /// Pass rate 0..100
    pub pass_rate: f64,
    /// When the report was generated
    pub generated_at: Timestamp,
}

impl HealthReport {
    /// Aggregate battery summaries into a report. Worst-of rule:
    /// critical if any detail is critical (or failed), else warning if
    /// any is warning, else healthy.
    pub fn aggregate(organization_id: &str, checks: Vec<CheckSummary>) -> Self {
        let mut critical_count = 0;
        let mut warning_count = 0;
        let mut performed = 0;
        let mut passed = 0;

        for summary in &checks {
            performed += summary.performed;
            passed += summary.passed;
            for detail in &summary.details {
                match detail.status {
                    HealthStatus::Critical | HealthStatus::Failed => critical_count += 1,
                    HealthStatus::Warning => warning_count += 1,
                    HealthStatus::Healthy => {}
                }
            }
        }

        let overall_status = if critical_count > 0 {
            HealthStatus::Critical
        } else if warning_count > 0 {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };

        let pass_rate = if performed > 0 {
            passed as f64 / performed as f64 * 100.0
        } else {
            100.0
        };

        Self {
            organization_id: organization_id.to_string(),
            overall_status,
            checks,
            critical_count,
            warning_count,
            checks_performed: performed,
            checks_passed: passed,
            pass_rate,
            generated_at: now(),
        }
    }
}
