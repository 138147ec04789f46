//! Core utilities and common types for the monitoring engine.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
