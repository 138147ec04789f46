//! Health checking
//!
//! Provides the periodic health battery:
//! - Location capacity and backup recency
//! - Recent job performance
//! - Storage capacity trend
//! - Recovery procedure currency
//! - Storage connectivity probes

pub mod checks;
pub mod orchestrator;
pub mod probe;

pub use checks::HealthThresholds;
pub use orchestrator::{HealthOrchestrator, ROLLUP_MONITOR_NAME};
pub use probe::{ConnectivityProbe, MemoryProbeTarget, ProbeReport, ProbeTarget, RoundTripProbe, StaticProbe};
