//! Engine entry point
//!
//! Provides the invocation surface:
//! - Explicit configuration built once at process start
//! - Closed request enumeration with an action tag
//! - Request/response dispatch with HTTP-equivalent statuses

pub mod config;
pub mod request;
pub mod service;

pub use config::{EngineConfig, StoreConfig};
pub use request::{EngineRequest, EngineResponse, ErrorBody, ResponseBody};
pub use service::{MonitoringEngine, MonitoringReport};
