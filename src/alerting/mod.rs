//! Alerting pipeline
//!
//! Provides breach-to-responder routing:
//! - Threshold evaluation with per-type cooldown
//! - Alert and incident creation with fixed policy tables
//! - Immediate notification fan-out
//! - Escalation scheduling with acknowledgment cancellation

pub mod escalation;
pub mod evaluator;
pub mod policy;
pub mod processor;

pub use escalation::{EscalationResult, EscalationScheduler};
pub use evaluator::{evaluate_monitor, Evaluation, SweepOutcome, ThresholdEvaluator};
pub use policy::{business_impact_for, incident_type_for, EscalationPolicy, SeverityPolicy};
pub use processor::{AlertProcessor, AlertTrigger, ProcessedAlert};
