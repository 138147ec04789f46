//! # Backup Sentinel
//!
//! Health-check and alert-escalation engine for backup infrastructure
//! monitoring:
//! - **Health**: location, job-performance, capacity-trend, and
//!   recovery-currency checks rolled into one report
//! - **Alerting**: threshold evaluation, alert/incident creation, and
//!   tiered escalation with acknowledgment cancellation
//! - **Notify**: pluggable email/SMS/voice/chat delivery with audit
//!   logging
//! - **Digest**: periodic rollup reports for management recipients
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use backup_sentinel::engine::{EngineConfig, EngineRequest, MonitoringEngine};
//! use backup_sentinel::health::StaticProbe;
//! use backup_sentinel::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let probe = Arc::new(StaticProbe::reachable(5));
//!     let engine =
//!         MonitoringEngine::new(EngineConfig::for_testing(), store, probe).unwrap();
//!
//!     let response = engine
//!         .handle(EngineRequest::RunHealthChecks {
//!             organization_id: "org-1".to_string(),
//!         })
//!         .await;
//!     println!("overall: {}", response.data().unwrap()["overall_status"]);
//! }
//! ```

pub mod alerting;
pub mod core;
pub mod digest;
pub mod engine;
pub mod health;
pub mod model;
pub mod notify;
pub mod store;

pub use core::error::{Error, Result};
