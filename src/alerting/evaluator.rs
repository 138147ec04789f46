//! Threshold evaluator.
//!
//! Decides, per monitor, whether the current state should produce a new
//! alert. Pure decision logic plus a sweep over a store.

use crate::core::{Result, Timestamp};
use crate::model::{AlertType, Monitor, MonitorType, Severity};
use crate::store::MonitoringStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of evaluating one monitor.
#[derive(Clone, Debug, PartialEq)]
pub enum Evaluation {
    /// A new alert should fire.
    Breach {
        severity: Severity,
        alert_type: AlertType,
        message: String,
    },
    /// A breach exists but the cooldown window has not elapsed.
    Suppressed { until: Timestamp },
    /// Within thresholds.
    Pass,
}

/// Per-monitor result of a sweep, for the caller's summary.
#[derive(Clone, Debug, Serialize)]
pub struct SweepOutcome {
    /// Monitor evaluated
    pub monitor_id: String,
    /// "breach" | "suppressed" | "pass"
    pub outcome: String,
    /// Alert created for a breach
    pub alert_id: Option<String>,
}

/// The alert type a monitor's breaches carry.
fn alert_type_for(monitor_type: &MonitorType) -> AlertType {
    match monitor_type {
        MonitorType::StorageCapacity => AlertType::StorageCapacity,
        MonitorType::BackupFailure => AlertType::BackupFailure,
        MonitorType::PerformanceDegradation
        | MonitorType::SystemHealth
        | MonitorType::Custom(_) => AlertType::ThresholdExceeded,
    }
}

/// Pure threshold decision for one monitor at one instant.
///
/// Critical threshold wins over everything; the consecutive-failure
/// override raises anything below critical to high; the warning
/// threshold maps to medium. Idempotent: the same inputs inside one
/// cooldown window yield `Suppressed`, never a second breach.
pub fn evaluate_monitor(monitor: &Monitor, at: Timestamp) -> Evaluation {
    let alert_type = alert_type_for(&monitor.monitor_type);

    let severity = if monitor.current_value >= monitor.critical_threshold {
        Some(Severity::Critical)
    } else if monitor.consecutive_failures_alert > 0
        && monitor.failed_checks >= monitor.consecutive_failures_alert
    {
        Some(Severity::High)
    } else if monitor.current_value >= monitor.warning_threshold {
        Some(Severity::Medium)
    } else {
        None
    };

    let severity = match severity {
        Some(severity) => severity,
        None => return Evaluation::Pass,
    };

    if monitor.in_cooldown(&alert_type, at) {
        let last = monitor.last_alert_sent[&alert_type.to_string()];
        return Evaluation::Suppressed {
            until: last + chrono::Duration::minutes(monitor.alert_cooldown_minutes),
        };
    }

    let message = match severity {
        Severity::Critical => format!(
            "{}: value {:.1} breached critical threshold {:.1}",
            monitor.name, monitor.current_value, monitor.critical_threshold
        ),
        Severity::High => format!(
            "{}: {} consecutive failed checks (limit {})",
            monitor.name, monitor.failed_checks, monitor.consecutive_failures_alert
        ),
        _ => format!(
            "{}: value {:.1} breached warning threshold {:.1}",
            monitor.name, monitor.current_value, monitor.warning_threshold
        ),
    };

    Evaluation::Breach {
        severity,
        alert_type,
        message,
    }
}

/// Sweeps active monitors and hands breaches to the alert processor.
pub struct ThresholdEvaluator {
    store: Arc<dyn MonitoringStore>,
}

impl ThresholdEvaluator {
    /// Create an evaluator over a store.
    pub fn new(store: Arc<dyn MonitoringStore>) -> Self {
        Self { store }
    }

    /// Evaluate every active, alert-enabled monitor for an organization.
    ///
    /// Breaches are handed to `processor`; the cooldown clock is stamped
    /// only after a successful handoff. Monitors are touched even when
    /// suppressed so their observation timestamps stay current.
    pub async fn check_all(
        &self,
        organization_id: &str,
        processor: &crate::alerting::processor::AlertProcessor,
        at: Timestamp,
    ) -> Result<Vec<SweepOutcome>> {
        let monitors = self.store.active_monitors(organization_id).await?;
        let mut outcomes = Vec::new();

        for monitor in monitors.into_iter().filter(|m| m.alerts_enabled) {
            let outcome = self.check_one(&monitor, processor, at).await?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn check_one(
        &self,
        monitor: &Monitor,
        processor: &crate::alerting::processor::AlertProcessor,
        at: Timestamp,
    ) -> Result<SweepOutcome> {
        // Keep the observation fresh regardless of the decision.
        self.store
            .record_monitor_observation(&monitor.id, monitor.current_value, monitor.failed_checks)
            .await?;

        match evaluate_monitor(monitor, at) {
            Evaluation::Pass => {
                debug!(monitor_id = %monitor.id, "monitor within thresholds");
                Ok(SweepOutcome {
                    monitor_id: monitor.id.clone(),
                    outcome: "pass".to_string(),
                    alert_id: None,
                })
            }
            Evaluation::Suppressed { until } => {
                debug!(monitor_id = %monitor.id, %until, "breach suppressed by cooldown");
                Ok(SweepOutcome {
                    monitor_id: monitor.id.clone(),
                    outcome: "suppressed".to_string(),
                    alert_id: None,
                })
            }
            Evaluation::Breach {
                severity,
                alert_type,
                message,
            } => {
                let trigger = crate::alerting::processor::AlertTrigger {
                    organization_id: monitor.organization_id.clone(),
                    alert_type: alert_type.clone(),
                    severity,
                    title: monitor.name.clone(),
                    message,
                    source_system: "threshold_evaluator".to_string(),
                    monitor_id: Some(monitor.id.clone()),
                    current_value: Some(monitor.current_value),
                    threshold_value: Some(if severity == Severity::Critical {
                        monitor.critical_threshold
                    } else {
                        monitor.warning_threshold
                    }),
                    metadata: Default::default(),
                };

                let processed = processor.process(trigger).await?;
                // Stamp the cooldown clock only now that the alert exists.
                self.store
                    .mark_alert_sent(&monitor.id, &alert_type, at)
                    .await?;

                info!(
                    monitor_id = %monitor.id,
                    alert_id = %processed.alert_id,
                    %severity,
                    "monitor breach raised alert"
                );
                Ok(SweepOutcome {
                    monitor_id: monitor.id.clone(),
                    outcome: "breach".to_string(),
                    alert_id: Some(processed.alert_id),
                })
            }
        }
    }
}
