//! Incident records: the human-tracked case opened for an alert.

use crate::core::{generate_id, now, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Incident classification, derived from the alert type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    BackupFailure,
    SystemOutage,
    PerformanceDegradation,
    SecurityBreach,
    DataLoss,
}

/// Incident lifecycle: open -> investigating -> resolved/closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Resolved,
    Closed,
}

/// Business impact classification, derived from severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessImpact {
    None,
    Minimal,
    Moderate,
    Significant,
}

/// A human-facing case linked to an alert.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Incident {
    /// Unique incident ID
    pub id: String,
    /// Owning organization
    pub organization_id: String,
    /// The alert this incident tracks
    pub alert_id: String,
    /// Classification
    pub incident_type: IncidentType,
    /// Lifecycle state
    pub incident_status: IncidentStatus,
    /// Impact on the business
    pub business_impact: BusinessImpact,
    /// Short title, mirrors the alert title
    pub title: String,
    /// Assigned responder
    pub assigned_to: Option<String>,
    /// Investigation notes
    pub notes: Vec<String>,
    /// Escalation bookkeeping (level, last escalated at, ...)
    pub escalation_metadata: HashMap<String, serde_json::Value>,
    /// When the condition was detected
    pub detected_at: Timestamp,
    /// When a responder took ownership
    pub acknowledged_at: Option<Timestamp>,
    /// When resolved
    pub resolved_at: Option<Timestamp>,
}

impl Incident {
    /// Open a new incident for an alert.
    pub fn open(
        organization_id: &str,
        alert_id: &str,
        incident_type: IncidentType,
        business_impact: BusinessImpact,
        title: &str,
    ) -> Self {
        Self {
            id: generate_id("inc"),
            organization_id: organization_id.to_string(),
            alert_id: alert_id.to_string(),
            incident_type,
            incident_status: IncidentStatus::Open,
            business_impact,
            title: title.to_string(),
            assigned_to: None,
            notes: Vec::new(),
            escalation_metadata: HashMap::new(),
            detected_at: now(),
            acknowledged_at: None,
            resolved_at: None,
        }
    }

    /// Move to investigating with an assignee.
    pub fn start_investigation(&mut self, assignee: &str, note: Option<&str>) {
        self.incident_status = IncidentStatus::Investigating;
        self.assigned_to = Some(assignee.to_string());
        self.acknowledged_at = Some(now());
        if let Some(note) = note {
            self.notes.push(note.to_string());
        }
    }

    /// Record an escalation on this incident.
    pub fn record_escalation(&mut self, level: u8, notified: usize) {
        self.escalation_metadata.insert(
            "escalation_level".to_string(),
            serde_json::Value::from(level),
        );
        self.escalation_metadata.insert(
            "last_escalated_at".to_string(),
            serde_json::Value::String(now().to_rfc3339()),
        );
        self.escalation_metadata.insert(
            "contacts_notified".to_string(),
            serde_json::Value::from(notified),
        );
    }

    /// Resolve the incident.
    pub fn resolve(&mut self, note: Option<&str>) {
        self.incident_status = IncidentStatus::Resolved;
        self.resolved_at = Some(now());
        if let Some(note) = note {
            self.notes.push(note.to_string());
        }
    }

    /// Minutes from detection to resolution, if resolved.
    pub fn resolution_minutes(&self) -> Option<i64> {
        self.resolved_at
            .map(|resolved| (resolved - self.detected_at).num_minutes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_incident() -> Incident {
        Incident::open(
            "org-1",
            "alert-1",
            IncidentType::BackupFailure,
            BusinessImpact::Moderate,
            "Nightly backup failed",
        )
    }

    #[test]
    fn test_open_incident() {
        let incident = create_test_incident();
        assert_eq!(incident.incident_status, IncidentStatus::Open);
        assert!(incident.assigned_to.is_none());
        assert!(incident.id.starts_with("inc-"));
    }

    #[test]
    fn test_start_investigation() {
        let mut incident = create_test_incident();
        incident.start_investigation("operator", Some("checking job logs"));
        assert_eq!(incident.incident_status, IncidentStatus::Investigating);
        assert_eq!(incident.assigned_to.as_deref(), Some("operator"));
        assert_eq!(incident.notes.len(), 1);
        assert!(incident.acknowledged_at.is_some());
    }

    #[test]
    fn test_record_escalation() {
        let mut incident = create_test_incident();
        incident.record_escalation(2, 3);
        assert_eq!(
            incident.escalation_metadata.get("escalation_level"),
            Some(&serde_json::Value::from(2))
        );
        assert_eq!(
            incident.escalation_metadata.get("contacts_notified"),
            Some(&serde_json::Value::from(3))
        );
    }

    #[test]
    fn test_resolution_minutes() {
        let mut incident = create_test_incident();
        assert!(incident.resolution_minutes().is_none());
        incident.resolve(Some("restarted agent"));
        assert!(incident.resolution_minutes().is_some());
    }
}
