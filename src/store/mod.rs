//! Data store boundary
//!
//! Trait-based access to the monitoring tables:
//! - Filtered reads (by organization, active flag, time window)
//! - Targeted updates and inserts
//! - Append-only notification log

pub mod backend;
pub mod memory;

pub use backend::MonitoringStore;
pub use memory::MemoryStore;
