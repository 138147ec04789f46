//! Error types for the monitoring engine.

use thiserror::Error;

/// Result type alias for monitoring engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in monitoring engine operations.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported notification channel: {0}")]
    UnsupportedChannel(String),

    // Data store errors
    #[error("Store operation failed: {0}")]
    Store(String),

    // Delivery errors
    #[error("Delivery via {channel} to {recipient} failed: {reason}")]
    Delivery {
        channel: String,
        recipient: String,
        reason: String,
    },

    #[error("Delivery timed out via {channel} to {recipient}")]
    DeliveryTimeout { channel: String, recipient: String },

    // Lookup errors
    #[error("Monitor not found: {0}")]
    MonitorNotFound(String),

    #[error("Backup location not found: {0}")]
    LocationNotFound(String),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Incident not found: {0}")]
    IncidentNotFound(String),

    #[error("Emergency contact not found: {0}")]
    ContactNotFound(String),

    // State errors
    #[error("Invalid alert state transition: {0}")]
    InvalidTransition(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error maps to a missing-resource response (4xx-equivalent)
    /// rather than an internal failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::MonitorNotFound(_)
                | Error::LocationNotFound(_)
                | Error::AlertNotFound(_)
                | Error::IncidentNotFound(_)
                | Error::ContactNotFound(_)
        )
    }

    /// Short machine-readable code for response payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration_error",
            Error::UnsupportedChannel(_) => "unsupported_channel",
            Error::Store(_) => "store_error",
            Error::Delivery { .. } => "delivery_failed",
            Error::DeliveryTimeout { .. } => "delivery_timeout",
            Error::MonitorNotFound(_) => "monitor_not_found",
            Error::LocationNotFound(_) => "location_not_found",
            Error::AlertNotFound(_) => "alert_not_found",
            Error::IncidentNotFound(_) => "incident_not_found",
            Error::ContactNotFound(_) => "contact_not_found",
            Error::InvalidTransition(_) => "invalid_transition",
            Error::Serialization(_) => "serialization_error",
            Error::Internal(_) => "internal_error",
            Error::Io(_) => "io_error",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
