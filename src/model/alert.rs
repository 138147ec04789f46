//! Alert records and severity classification.

use crate::core::{generate_id, now, Error, Result, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alert severity level, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action expected
    Low,
    /// Needs attention during business hours
    Medium,
    /// Needs prompt attention
    High,
    /// Needs immediate attention
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Notification priority derived from severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

/// The kind of condition that triggered an alert.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// A backup job failed or jobs are failing repeatedly
    BackupFailure,
    /// Storage capacity threshold breached
    StorageCapacity,
    /// A monitored metric crossed its threshold
    ThresholdExceeded,
    /// A backup location is unreachable
    ConnectivityLost,
    /// A recovery procedure's test or review is overdue
    RecoveryOverdue,
    /// Aggregate system health degraded
    SystemHealth,
    /// Ad-hoc alert from an external source
    Custom(String),
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::BackupFailure => write!(f, "backup_failure"),
            AlertType::StorageCapacity => write!(f, "storage_capacity"),
            AlertType::ThresholdExceeded => write!(f, "threshold_exceeded"),
            AlertType::ConnectivityLost => write!(f, "connectivity_lost"),
            AlertType::RecoveryOverdue => write!(f, "recovery_overdue"),
            AlertType::SystemHealth => write!(f, "system_health"),
            AlertType::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Alert lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// Triggered, awaiting acknowledgment
    Active,
    /// A responder has taken ownership
    Acknowledged,
    /// Terminal: condition addressed
    Resolved,
    /// Muted by cooldown or operator action
    Suppressed,
}

/// A triggered condition derived from a monitor breach or ad-hoc source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert ID
    pub id: String,
    /// Owning organization
    pub organization_id: String,
    /// Originating monitor, if any
    pub monitor_id: Option<String>,
    /// Condition kind
    pub alert_type: AlertType,
    /// Severity at trigger time
    pub severity: Severity,
    /// Derived notification priority
    pub priority: Priority,
    /// Current escalation level (increases monotonically while active)
    pub escalation_level: u8,
    /// Lifecycle state
    pub status: AlertStatus,
    /// Short human-readable title
    pub title: String,
    /// Full message body
    pub message: String,
    /// System that raised the condition
    pub source_system: String,
    /// Observed value at trigger time
    pub current_value: Option<f64>,
    /// Threshold that was breached
    pub threshold_value: Option<f64>,
    /// Linked incident, set by the alert processor
    pub incident_id: Option<String>,
    /// When the condition triggered
    pub triggered_at: Timestamp,
    /// When acknowledged
    pub acknowledged_at: Option<Timestamp>,
    /// Who acknowledged
    pub acknowledged_by: Option<String>,
    /// When resolved
    pub resolved_at: Option<Timestamp>,
    /// Resolution notes
    pub resolution_notes: Option<String>,
    /// Additional context
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Alert {
    /// Create a new active alert.
    pub fn new(
        organization_id: &str,
        alert_type: AlertType,
        severity: Severity,
        priority: Priority,
        title: &str,
        message: &str,
        source_system: &str,
    ) -> Self {
        Self {
            id: generate_id("alert"),
            organization_id: organization_id.to_string(),
            monitor_id: None,
            alert_type,
            severity,
            priority,
            escalation_level: 0,
            status: AlertStatus::Active,
            title: title.to_string(),
            message: message.to_string(),
            source_system: source_system.to_string(),
            current_value: None,
            threshold_value: None,
            incident_id: None,
            triggered_at: now(),
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            resolution_notes: None,
            metadata: HashMap::new(),
        }
    }

    /// Set the originating monitor.
    pub fn with_monitor(mut self, monitor_id: &str) -> Self {
        self.monitor_id = Some(monitor_id.to_string());
        self
    }

    /// Set observed and threshold values.
    pub fn with_values(mut self, current: f64, threshold: f64) -> Self {
        self.current_value = Some(current);
        self.threshold_value = Some(threshold);
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Whether the alert is awaiting acknowledgment.
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    /// Raise the escalation level. Only valid while active, and the level
    /// never decreases.
    pub fn escalate_to(&mut self, level: u8) -> Result<()> {
        if self.status != AlertStatus::Active {
            return Err(Error::InvalidTransition(format!(
                "cannot escalate alert {} in state {:?}",
                self.id, self.status
            )));
        }
        if level <= self.escalation_level {
            return Err(Error::InvalidTransition(format!(
                "escalation level must increase: {} -> {}",
                self.escalation_level, level
            )));
        }
        self.escalation_level = level;
        Ok(())
    }

    /// Acknowledge the alert.
    pub fn acknowledge(&mut self, by: &str) -> Result<()> {
        match self.status {
            AlertStatus::Active | AlertStatus::Suppressed => {
                self.status = AlertStatus::Acknowledged;
                self.acknowledged_at = Some(now());
                self.acknowledged_by = Some(by.to_string());
                Ok(())
            }
            _ => Err(Error::InvalidTransition(format!(
                "cannot acknowledge alert {} in state {:?}",
                self.id, self.status
            ))),
        }
    }

    /// Resolve the alert. Terminal.
    pub fn resolve(&mut self, by: &str, notes: Option<&str>) -> Result<()> {
        if self.status == AlertStatus::Resolved {
            return Err(Error::InvalidTransition(format!(
                "alert {} already resolved",
                self.id
            )));
        }
        self.status = AlertStatus::Resolved;
        self.resolved_at = Some(now());
        self.resolution_notes = notes.map(|n| n.to_string());
        self.metadata.insert(
            "resolved_by".to_string(),
            serde_json::Value::String(by.to_string()),
        );
        Ok(())
    }
}
