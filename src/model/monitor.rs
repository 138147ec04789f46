//! Configured monitors with thresholds and cooldown tracking.

use crate::core::{generate_id, now, Timestamp};
use crate::model::alert::AlertType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a monitor measures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorType {
    /// Storage capacity usage percentage
    StorageCapacity,
    /// Backup job failure tracking
    BackupFailure,
    /// Throughput / duration degradation
    PerformanceDegradation,
    /// Aggregate system health pass rate
    SystemHealth,
    /// Custom metric
    Custom(String),
}

impl std::fmt::Display for MonitorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorType::StorageCapacity => write!(f, "storage_capacity"),
            MonitorType::BackupFailure => write!(f, "backup_failure"),
            MonitorType::PerformanceDegradation => write!(f, "performance_degradation"),
            MonitorType::SystemHealth => write!(f, "system_health"),
            MonitorType::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// A named, periodically-evaluated metric source with thresholds.
///
/// Monitors are never deleted while in use, only deactivated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Monitor {
    /// Unique monitor ID
    pub id: String,
    /// Owning organization
    pub organization_id: String,
    /// Display name
    pub name: String,
    /// What this monitor measures
    pub monitor_type: MonitorType,
    /// The resource being measured (location ID, job group, ...)
    pub monitored_resource: String,
    /// Most recent observed value
    pub current_value: f64,
    /// Warning threshold
    pub warning_threshold: f64,
    /// Critical threshold
    pub critical_threshold: f64,
    /// Consecutive failed checks observed
    pub failed_checks: u32,
    /// Failure count that forces an alert regardless of value
    pub consecutive_failures_alert: u32,
    /// Minimum minutes between alerts of the same type
    pub alert_cooldown_minutes: i64,
    /// When an alert was last sent, keyed by alert type.
    /// Cooldown is therefore per monitor + alert type.
    pub last_alert_sent: HashMap<String, Timestamp>,
    /// Whether threshold breaches create alerts
    pub alerts_enabled: bool,
    /// Whether this monitor is evaluated at all
    pub is_active: bool,
    /// When the monitor last ran
    pub last_checked_at: Option<Timestamp>,
}

impl Monitor {
    /// Create a new active monitor.
    pub fn new(
        organization_id: &str,
        name: &str,
        monitor_type: MonitorType,
        monitored_resource: &str,
    ) -> Self {
        Self {
            id: generate_id("mon"),
            organization_id: organization_id.to_string(),
            name: name.to_string(),
            monitor_type,
            monitored_resource: monitored_resource.to_string(),
            current_value: 0.0,
            warning_threshold: 80.0,
            critical_threshold: 90.0,
            failed_checks: 0,
            consecutive_failures_alert: 3,
            alert_cooldown_minutes: 30,
            last_alert_sent: HashMap::new(),
            alerts_enabled: true,
            is_active: true,
            last_checked_at: None,
        }
    }

    /// Set warning and critical thresholds.
    pub fn with_thresholds(mut self, warning: f64, critical: f64) -> Self {
        self.warning_threshold = warning;
        self.critical_threshold = critical;
        self
    }

    /// Set the cooldown window.
    pub fn with_cooldown_minutes(mut self, minutes: i64) -> Self {
        self.alert_cooldown_minutes = minutes;
        self
    }

    /// Set the consecutive-failure alert count.
    pub fn with_failure_limit(mut self, failures: u32) -> Self {
        self.consecutive_failures_alert = failures;
        self
    }

    /// Record an observation without any alerting decision.
    pub fn observe(&mut self, value: f64, failed_checks: u32) {
        self.current_value = value;
        self.failed_checks = failed_checks;
        self.last_checked_at = Some(now());
    }

    /// Whether a new alert of `alert_type` is still inside the cooldown
    /// window at `at`.
    pub fn in_cooldown(&self, alert_type: &AlertType, at: Timestamp) -> bool {
        match self.last_alert_sent.get(&alert_type.to_string()) {
            Some(last) => (at - *last) < chrono::Duration::minutes(self.alert_cooldown_minutes),
            None => false,
        }
    }

    /// Stamp the cooldown clock for `alert_type`.
    pub fn mark_alert_sent(&mut self, alert_type: &AlertType, at: Timestamp) {
        self.last_alert_sent.insert(alert_type.to_string(), at);
    }

    /// Deactivate the monitor. Monitors are never deleted while referenced.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::now;

    fn create_test_monitor() -> Monitor {
        Monitor::new(
            "org-1",
            "Primary storage capacity",
            MonitorType::StorageCapacity,
            "loc-1",
        )
        .with_thresholds(80.0, 90.0)
        .with_cooldown_minutes(30)
    }

    #[test]
    fn test_cooldown_window() {
        let mut monitor = create_test_monitor();
        let t0 = now();
        assert!(!monitor.in_cooldown(&AlertType::StorageCapacity, t0));

        monitor.mark_alert_sent(&AlertType::StorageCapacity, t0);
        let five_min_later = t0 + chrono::Duration::minutes(5);
        assert!(monitor.in_cooldown(&AlertType::StorageCapacity, five_min_later));

        let later = t0 + chrono::Duration::minutes(31);
        assert!(!monitor.in_cooldown(&AlertType::StorageCapacity, later));
    }

    #[test]
    fn test_cooldown_keyed_per_alert_type() {
        let mut monitor = create_test_monitor();
        let t0 = now();
        monitor.mark_alert_sent(&AlertType::StorageCapacity, t0);

        let soon = t0 + chrono::Duration::minutes(1);
        assert!(monitor.in_cooldown(&AlertType::StorageCapacity, soon));
        assert!(!monitor.in_cooldown(&AlertType::BackupFailure, soon));
    }

    #[test]
    fn test_observe_updates_value() {
        let mut monitor = create_test_monitor();
        monitor.observe(85.5, 1);
        assert_eq!(monitor.current_value, 85.5);
        assert_eq!(monitor.failed_checks, 1);
        assert!(monitor.last_checked_at.is_some());
    }

    #[test]
    fn test_deactivate() {
        let mut monitor = create_test_monitor();
        monitor.deactivate();
        assert!(!monitor.is_active);
    }
}
