//! MonitoringStore trait definition.
//!
//! The data store is an external collaborator: this engine performs
//! filtered reads and targeted updates only, never schema changes.

use crate::core::{Result, Timestamp};
use crate::model::{
    Alert, AlertType, BackupJob, BackupLocation, CapacitySnapshot, EmergencyContact, HealthStatus,
    Incident, Monitor, NotificationLog, RecoveryProcedure,
};
use async_trait::async_trait;

/// Core trait for monitoring data stores.
///
/// All reads are scoped by organization, active flag, or time window.
#[async_trait]
pub trait MonitoringStore: Send + Sync {
    // Backup locations

    /// Active backup locations for an organization.
    async fn active_locations(&self, organization_id: &str) -> Result<Vec<BackupLocation>>;

    /// Look up one location.
    async fn location(&self, location_id: &str) -> Result<Option<BackupLocation>>;

    /// Update a location's cached health status.
    ///
    /// Implementations must serialize updates per location so overlapping
    /// check cycles cannot interleave a read-modify-write.
    async fn update_location_health(&self, location_id: &str, status: HealthStatus) -> Result<()>;

    // Backup jobs and analytics

    /// Jobs started since `since` for an organization.
    async fn jobs_since(&self, organization_id: &str, since: Timestamp) -> Result<Vec<BackupJob>>;

    /// Latest capacity snapshot for an organization.
    async fn latest_capacity_snapshot(
        &self,
        organization_id: &str,
    ) -> Result<Option<CapacitySnapshot>>;

    // Recovery procedures

    /// Approved recovery procedures for an organization.
    async fn approved_procedures(&self, organization_id: &str)
        -> Result<Vec<RecoveryProcedure>>;

    // Monitors

    /// Active monitors for an organization.
    async fn active_monitors(&self, organization_id: &str) -> Result<Vec<Monitor>>;

    /// Look up one monitor.
    async fn monitor(&self, monitor_id: &str) -> Result<Option<Monitor>>;

    /// Insert or replace a monitor row.
    async fn upsert_monitor(&self, monitor: Monitor) -> Result<()>;

    /// Record an observed value and failure count on a monitor.
    async fn record_monitor_observation(
        &self,
        monitor_id: &str,
        value: f64,
        failed_checks: u32,
    ) -> Result<()>;

    /// Stamp a monitor's cooldown clock for one alert type.
    async fn mark_alert_sent(
        &self,
        monitor_id: &str,
        alert_type: &AlertType,
        at: Timestamp,
    ) -> Result<()>;

    // Alerts

    /// Persist a new alert.
    async fn insert_alert(&self, alert: Alert) -> Result<()>;

    /// Look up one alert.
    async fn alert(&self, alert_id: &str) -> Result<Option<Alert>>;

    /// Replace an existing alert row.
    async fn update_alert(&self, alert: Alert) -> Result<()>;

    /// Alerts currently in the active state for an organization.
    async fn active_alerts(&self, organization_id: &str) -> Result<Vec<Alert>>;

    /// Alerts triggered since `since` for an organization.
    async fn alerts_since(&self, organization_id: &str, since: Timestamp) -> Result<Vec<Alert>>;

    // Incidents

    /// Persist a new incident.
    async fn insert_incident(&self, incident: Incident) -> Result<()>;

    /// Look up one incident.
    async fn incident(&self, incident_id: &str) -> Result<Option<Incident>>;

    /// Replace an existing incident row.
    async fn update_incident(&self, incident: Incident) -> Result<()>;

    /// Incidents detected since `since` for an organization.
    async fn incidents_since(
        &self,
        organization_id: &str,
        since: Timestamp,
    ) -> Result<Vec<Incident>>;

    // Contacts

    /// Active emergency contacts for an organization.
    async fn active_contacts(&self, organization_id: &str) -> Result<Vec<EmergencyContact>>;

    // Notification log

    /// Append one delivery record. The log is append-only.
    async fn append_notification(&self, log: NotificationLog) -> Result<()>;

    /// All delivery records for an alert, oldest first.
    async fn notifications_for_alert(&self, alert_id: &str) -> Result<Vec<NotificationLog>>;
}
