//! Typed invocation surface.
//!
//! A closed enumeration of request variants with an action tag, so
//! adding a new action is a compile-time-checked change rather than a
//! string match.

use crate::core::Error;
use crate::model::{AlertType, Severity};
use crate::notify::Urgency;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One engine request. Wire form is `{"action": "...", ...payload}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EngineRequest {
    /// Run the full health battery for an organization.
    RunHealthChecks { organization_id: String },
    /// Probe one backup location end to end.
    TestStorageConnection { location_id: String },
    /// Record an observation on a monitor, optionally (de)activating it.
    UpdateMonitorStatus {
        monitor_id: String,
        current_value: f64,
        #[serde(default)]
        failed_checks: u32,
        #[serde(default)]
        is_active: Option<bool>,
    },
    /// Sweep active monitors and raise alerts for breaches.
    CheckThresholds { organization_id: String },
    /// Alert and incident statistics over a rolling window.
    GenerateMonitoringReport {
        organization_id: String,
        #[serde(default)]
        window_hours: Option<i64>,
    },
    /// Classify the last 24 hours of job performance.
    CheckBackupPerformance { organization_id: String },
    /// Process an ad-hoc triggered condition.
    ProcessAlert {
        organization_id: String,
        alert_type: AlertType,
        severity: Severity,
        title: String,
        message: String,
        source_system: String,
        #[serde(default)]
        monitor_id: Option<String>,
        #[serde(default)]
        current_value: Option<f64>,
        #[serde(default)]
        threshold_value: Option<f64>,
        #[serde(default)]
        metadata: HashMap<String, serde_json::Value>,
    },
    /// Send one message to one contact.
    SendNotification {
        organization_id: String,
        recipient_id: String,
        #[serde(default)]
        subject: Option<String>,
        message: String,
        #[serde(default = "default_urgency")]
        urgency: Urgency,
    },
    /// Escalate an alert immediately.
    EscalateAlert { alert_id: String },
    /// Acknowledge an alert.
    AcknowledgeAlert {
        alert_id: String,
        acknowledged_by: String,
        #[serde(default)]
        notes: Option<String>,
    },
    /// Dry-run evaluation: report what each monitor would do, without
    /// creating alerts.
    CheckAlertRules { organization_id: String },
    /// Generate and deliver the digest.
    SendDigest {
        organization_id: String,
        #[serde(default)]
        window_hours: Option<i64>,
    },
    /// Drive a low-severity test alert through the full pipeline.
    TestAlertSystem { organization_id: String },
}

fn default_urgency() -> Urgency {
    Urgency::Normal
}

/// Error payload in a response body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

/// Response body: `{"data": ...}` on success, `{"error": {...}}` on
/// failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// Success payload
    Data { data: serde_json::Value },
    /// Failure payload
    Error { error: ErrorBody },
}

/// One engine response with its HTTP-equivalent status.
#[derive(Clone, Debug, Serialize)]
pub struct EngineResponse {
    /// 200 on success, 404 for unknown resources, 500 otherwise
    pub status: u16,
    /// Response body
    #[serde(flatten)]
    pub body: ResponseBody,
}

impl EngineResponse {
    /// Success response.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: ResponseBody::Data { data },
        }
    }

    /// Failure response with status derived from the error class.
    pub fn from_error(err: &Error) -> Self {
        let status = if err.is_not_found() { 404 } else { 500 };
        Self {
            status,
            body: ResponseBody::Error {
                error: ErrorBody {
                    code: err.code().to_string(),
                    message: err.to_string(),
                },
            },
        }
    }

    /// Whether this is a success response.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// The data payload, if this is a success response.
    pub fn data(&self) -> Option<&serde_json::Value> {
        match &self.body {
            ResponseBody::Data { data } => Some(data),
            ResponseBody::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let json = r#"{"action": "run_health_checks", "organization_id": "org-1"}"#;
        let request: EngineRequest = serde_json::from_str(json).unwrap();
        assert!(matches!(
            request,
            EngineRequest::RunHealthChecks { organization_id } if organization_id == "org-1"
        ));
    }

    #[test]
    fn test_process_alert_wire_format() {
        let json = r#"{
            "action": "process_alert",
            "organization_id": "org-1",
            "alert_type": "backup_failure",
            "severity": "critical",
            "title": "Backups failing",
            "message": "3 failures",
            "source_system": "external"
        }"#;
        let request: EngineRequest = serde_json::from_str(json).unwrap();
        match request {
            EngineRequest::ProcessAlert {
                severity,
                alert_type,
                metadata,
                ..
            } => {
                assert_eq!(severity, Severity::Critical);
                assert_eq!(alert_type, AlertType::BackupFailure);
                assert!(metadata.is_empty());
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_unknown_action_rejected() {
        let json = r#"{"action": "drop_all_tables"}"#;
        assert!(serde_json::from_str::<EngineRequest>(json).is_err());
    }

    #[test]
    fn test_response_shapes() {
        let ok = EngineResponse::ok(serde_json::json!({"x": 1}));
        assert!(ok.is_ok());
        let rendered = serde_json::to_value(&ok).unwrap();
        assert_eq!(rendered["data"]["x"], 1);

        let not_found = EngineResponse::from_error(&Error::AlertNotFound("a-1".to_string()));
        assert_eq!(not_found.status, 404);
        let rendered = serde_json::to_value(&not_found).unwrap();
        assert_eq!(rendered["error"]["code"], "alert_not_found");

        let internal = EngineResponse::from_error(&Error::Store("down".to_string()));
        assert_eq!(internal.status, 500);
    }
}
