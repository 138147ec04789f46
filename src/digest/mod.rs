//! Digest reporting
//!
//! Periodic rollup for management-tier recipients:
//! - Backup job and incident statistics
//! - Current system-health summary
//! - Rule-based recommendations

pub mod reporter;

pub use reporter::{
    BackupStats, DigestDelivery, DigestReport, DigestReporter, HealthSummary, IncidentStats,
};
