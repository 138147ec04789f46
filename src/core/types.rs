//! Common types used across monitoring engine modules.

use serde::{Deserialize, Serialize};

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Generate a prefixed unique identifier (e.g. `alert-5f3a…`).
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

/// A window of time used for rolling queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window length in hours
    pub hours: i64,
}

impl TimeWindow {
    /// A window covering the last `hours` hours.
    pub fn hours(hours: i64) -> Self {
        Self { hours }
    }

    /// Last 24 hours.
    pub fn last_day() -> Self {
        Self { hours: 24 }
    }

    /// Last 7 days.
    pub fn last_week() -> Self {
        Self { hours: 24 * 7 }
    }

    /// The start of the window, measured back from `end`.
    pub fn start_from(&self, end: Timestamp) -> Timestamp {
        end - chrono::Duration::hours(self.hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_prefix() {
        let id = generate_id("alert");
        assert!(id.starts_with("alert-"));
        assert_ne!(generate_id("alert"), generate_id("alert"));
    }

    #[test]
    fn test_window_start() {
        let end = now();
        let window = TimeWindow::last_day();
        assert_eq!(end - window.start_from(end), chrono::Duration::hours(24));
    }

    #[test]
    fn test_window_week() {
        assert_eq!(TimeWindow::last_week().hours, 168);
    }
}
