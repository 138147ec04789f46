//! Fixed alerting policy tables.
//!
//! Severity drives priority, business impact, escalation pacing, and
//! incident classification through explicit lookup tables validated at
//! startup.

use crate::core::{Error, Result};
use crate::model::{AlertType, BusinessImpact, IncidentType, Priority, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-severity escalation and priority rules.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeverityPolicy {
    /// Notification priority
    pub priority: Priority,
    /// Priority rank, 1 = most urgent
    pub priority_rank: u8,
    /// Seconds to wait for acknowledgment before escalating
    pub ack_window_secs: i64,
    /// Highest escalation level for this severity
    pub max_escalation_level: u8,
}

/// The full escalation policy: one entry per severity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscalationPolicy {
    /// Rules keyed by severity
    pub rules: HashMap<Severity, SeverityPolicy>,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        let mut rules = HashMap::new();
        rules.insert(
            Severity::Critical,
            SeverityPolicy {
                priority: Priority::Urgent,
                priority_rank: 1,
                ack_window_secs: 300,
                max_escalation_level: 3,
            },
        );
        rules.insert(
            Severity::High,
            SeverityPolicy {
                priority: Priority::High,
                priority_rank: 2,
                ack_window_secs: 900,
                max_escalation_level: 2,
            },
        );
        rules.insert(
            Severity::Medium,
            SeverityPolicy {
                priority: Priority::Medium,
                priority_rank: 3,
                ack_window_secs: 1800,
                max_escalation_level: 1,
            },
        );
        rules.insert(
            Severity::Low,
            SeverityPolicy {
                priority: Priority::Low,
                priority_rank: 4,
                ack_window_secs: 3600,
                max_escalation_level: 0,
            },
        );
        Self { rules }
    }
}

impl EscalationPolicy {
    /// Validate that every declared severity has a rule. Called at
    /// engine construction so a bad policy fails fast.
    pub fn validate(&self) -> Result<()> {
        for severity in [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ] {
            if !self.rules.contains_key(&severity) {
                return Err(Error::Configuration(format!(
                    "escalation policy missing rule for severity '{}'",
                    severity
                )));
            }
        }
        Ok(())
    }

    /// The rule for a severity. `validate` guarantees presence.
    pub fn rule(&self, severity: Severity) -> &SeverityPolicy {
        self.rules
            .get(&severity)
            .expect("policy validated at startup")
    }
}

/// Incident classification for an alert type. Fixed mapping.
pub fn incident_type_for(alert_type: &AlertType) -> IncidentType {
    match alert_type {
        AlertType::BackupFailure => IncidentType::BackupFailure,
        AlertType::StorageCapacity => IncidentType::SystemOutage,
        AlertType::ThresholdExceeded => IncidentType::PerformanceDegradation,
        AlertType::ConnectivityLost => IncidentType::SystemOutage,
        AlertType::RecoveryOverdue => IncidentType::DataLoss,
        AlertType::SystemHealth => IncidentType::SystemOutage,
        AlertType::Custom(_) => IncidentType::PerformanceDegradation,
    }
}

/// Business impact for a severity. Fixed mapping.
pub fn business_impact_for(severity: Severity) -> BusinessImpact {
    match severity {
        Severity::Critical => BusinessImpact::Significant,
        Severity::High => BusinessImpact::Moderate,
        Severity::Medium => BusinessImpact::Minimal,
        Severity::Low => BusinessImpact::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_valid() {
        let policy = EscalationPolicy::default();
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_missing_severity_rejected() {
        let mut policy = EscalationPolicy::default();
        policy.rules.remove(&Severity::High);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_priority_mapping() {
        let policy = EscalationPolicy::default();
        assert_eq!(policy.rule(Severity::Critical).priority, Priority::Urgent);
        assert_eq!(policy.rule(Severity::Critical).priority_rank, 1);
        assert_eq!(policy.rule(Severity::High).priority, Priority::High);
        assert_eq!(policy.rule(Severity::Medium).priority, Priority::Medium);
        assert_eq!(policy.rule(Severity::Low).priority, Priority::Low);
        assert_eq!(policy.rule(Severity::Low).priority_rank, 4);
    }

    #[test]
    fn test_escalation_pacing() {
        let policy = EscalationPolicy::default();
        assert_eq!(policy.rule(Severity::Critical).ack_window_secs, 300);
        assert_eq!(policy.rule(Severity::Critical).max_escalation_level, 3);
        assert_eq!(policy.rule(Severity::Low).max_escalation_level, 0);
    }

    #[test]
    fn test_incident_type_mapping() {
        assert_eq!(
            incident_type_for(&AlertType::BackupFailure),
            IncidentType::BackupFailure
        );
        assert_eq!(
            incident_type_for(&AlertType::StorageCapacity),
            IncidentType::SystemOutage
        );
        assert_eq!(
            incident_type_for(&AlertType::ThresholdExceeded),
            IncidentType::PerformanceDegradation
        );
    }

    #[test]
    fn test_business_impact_mapping() {
        assert_eq!(
            business_impact_for(Severity::Critical),
            BusinessImpact::Significant
        );
        assert_eq!(business_impact_for(Severity::High), BusinessImpact::Moderate);
        assert_eq!(business_impact_for(Severity::Medium), BusinessImpact::Minimal);
        assert_eq!(business_impact_for(Severity::Low), BusinessImpact::None);
    }
}
