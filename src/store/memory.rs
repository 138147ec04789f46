//! In-memory store backend.
//!
//! Backs unit tests and the engine's self-test action. A production
//! deployment points the engine at a relational implementation of
//! `MonitoringStore` instead.

use crate::core::{Error, Result, Timestamp};
use crate::model::{
    Alert, AlertStatus, AlertType, BackupJob, BackupLocation, CapacitySnapshot, EmergencyContact,
    HealthStatus, Incident, Monitor, NotificationLog, RecoveryProcedure,
};
use crate::store::backend::MonitoringStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    locations: HashMap<String, BackupLocation>,
    jobs: Vec<BackupJob>,
    procedures: HashMap<String, RecoveryProcedure>,
    snapshots: HashMap<String, CapacitySnapshot>,
    monitors: HashMap<String, Monitor>,
    alerts: HashMap<String, Alert>,
    incidents: HashMap<String, Incident>,
    contacts: HashMap<String, EmergencyContact>,
    notifications: Vec<NotificationLog>,
}

/// In-memory monitoring store.
///
/// A single write lock covers all tables, which also serializes
/// per-location health updates across overlapping check cycles.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a backup location.
    pub async fn insert_location(&self, location: BackupLocation) {
        let mut tables = self.tables.write().await;
        tables.locations.insert(location.id.clone(), location);
    }

    /// Seed a backup job.
    pub async fn insert_job(&self, job: BackupJob) {
        let mut tables = self.tables.write().await;
        tables.jobs.push(job);
    }

    /// Seed a recovery procedure.
    pub async fn insert_procedure(&self, procedure: RecoveryProcedure) {
        let mut tables = self.tables.write().await;
        tables.procedures.insert(procedure.id.clone(), procedure);
    }

    /// Seed an emergency contact.
    pub async fn insert_contact(&self, contact: EmergencyContact) {
        let mut tables = self.tables.write().await;
        tables.contacts.insert(contact.id.clone(), contact);
    }

    /// Set the capacity snapshot for an organization.
    pub async fn set_capacity_snapshot(&self, snapshot: CapacitySnapshot) {
        let mut tables = self.tables.write().await;
        tables
            .snapshots
            .insert(snapshot.organization_id.clone(), snapshot);
    }
}

#[async_trait]
impl MonitoringStore for MemoryStore {
    async fn active_locations(&self, organization_id: &str) -> Result<Vec<BackupLocation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .locations
            .values()
            .filter(|l| l.organization_id == organization_id && l.is_active)
            .cloned()
            .collect())
    }

    async fn location(&self, location_id: &str) -> Result<Option<BackupLocation>> {
        let tables = self.tables.read().await;
        Ok(tables.locations.get(location_id).cloned())
    }

    async fn update_location_health(&self, location_id: &str, status: HealthStatus) -> Result<()> {
        let mut tables = self.tables.write().await;
        let location = tables
            .locations
            .get_mut(location_id)
            .ok_or_else(|| Error::LocationNotFound(location_id.to_string()))?;
        location.health_status = status;
        Ok(())
    }

    async fn jobs_since(&self, organization_id: &str, since: Timestamp) -> Result<Vec<BackupJob>> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .iter()
            .filter(|j| j.organization_id == organization_id && j.started_at >= since)
            .cloned()
            .collect())
    }

    async fn latest_capacity_snapshot(
        &self,
        organization_id: &str,
    ) -> Result<Option<CapacitySnapshot>> {
        let tables = self.tables.read().await;
        Ok(tables.snapshots.get(organization_id).cloned())
    }

    async fn approved_procedures(
        &self,
        organization_id: &str,
    ) -> Result<Vec<RecoveryProcedure>> {
        let tables = self.tables.read().await;
        Ok(tables
            .procedures
            .values()
            .filter(|p| p.organization_id == organization_id && p.approved)
            .cloned()
            .collect())
    }

    async fn active_monitors(&self, organization_id: &str) -> Result<Vec<Monitor>> {
        let tables = self.tables.read().await;
        Ok(tables
            .monitors
            .values()
            .filter(|m| m.organization_id == organization_id && m.is_active)
            .cloned()
            .collect())
    }

    async fn monitor(&self, monitor_id: &str) -> Result<Option<Monitor>> {
        let tables = self.tables.read().await;
        Ok(tables.monitors.get(monitor_id).cloned())
    }

    async fn upsert_monitor(&self, monitor: Monitor) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.monitors.insert(monitor.id.clone(), monitor);
        Ok(())
    }

    async fn record_monitor_observation(
        &self,
        monitor_id: &str,
        value: f64,
        failed_checks: u32,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let monitor = tables
            .monitors
            .get_mut(monitor_id)
            .ok_or_else(|| Error::MonitorNotFound(monitor_id.to_string()))?;
        monitor.observe(value, failed_checks);
        Ok(())
    }

    async fn mark_alert_sent(
        &self,
        monitor_id: &str,
        alert_type: &AlertType,
        at: Timestamp,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let monitor = tables
            .monitors
            .get_mut(monitor_id)
            .ok_or_else(|| Error::MonitorNotFound(monitor_id.to_string()))?;
        monitor.mark_alert_sent(alert_type, at);
        Ok(())
    }

    async fn insert_alert(&self, alert: Alert) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.alerts.insert(alert.id.clone(), alert);
        Ok(())
    }

    async fn alert(&self, alert_id: &str) -> Result<Option<Alert>> {
        let tables = self.tables.read().await;
        Ok(tables.alerts.get(alert_id).cloned())
    }

    async fn update_alert(&self, alert: Alert) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.alerts.contains_key(&alert.id) {
            return Err(Error::AlertNotFound(alert.id));
        }
        tables.alerts.insert(alert.id.clone(), alert);
        Ok(())
    }

    async fn active_alerts(&self, organization_id: &str) -> Result<Vec<Alert>> {
        let tables = self.tables.read().await;
        Ok(tables
            .alerts
            .values()
            .filter(|a| a.organization_id == organization_id && a.status == AlertStatus::Active)
            .cloned()
            .collect())
    }

    async fn alerts_since(&self, organization_id: &str, since: Timestamp) -> Result<Vec<Alert>> {
        let tables = self.tables.read().await;
        Ok(tables
            .alerts
            .values()
            .filter(|a| a.organization_id == organization_id && a.triggered_at >= since)
            .cloned()
            .collect())
    }

    async fn insert_incident(&self, incident: Incident) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.incidents.insert(incident.id.clone(), incident);
        Ok(())
    }

    async fn incident(&self, incident_id: &str) -> Result<Option<Incident>> {
        let tables = self.tables.read().await;
        Ok(tables.incidents.get(incident_id).cloned())
    }

    async fn update_incident(&self, incident: Incident) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.incidents.contains_key(&incident.id) {
            return Err(Error::IncidentNotFound(incident.id));
        }
        tables.incidents.insert(incident.id.clone(), incident);
        Ok(())
    }

    async fn incidents_since(
        &self,
        organization_id: &str,
        since: Timestamp,
    ) -> Result<Vec<Incident>> {
        let tables = self.tables.read().await;
        Ok(tables
            .incidents
            .values()
            .filter(|i| i.organization_id == organization_id && i.detected_at >= since)
            .cloned()
            .collect())
    }

    async fn active_contacts(&self, organization_id: &str) -> Result<Vec<EmergencyContact>> {
        let tables = self.tables.read().await;
        let mut contacts: Vec<EmergencyContact> = tables
            .contacts
            .values()
            .filter(|c| c.organization_id == organization_id && c.is_active)
            .cloned()
            .collect();
        contacts.sort_by_key(|c| c.escalation_level);
        Ok(contacts)
    }

    async fn append_notification(&self, log: NotificationLog) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.notifications.push(log);
        Ok(())
    }

    async fn notifications_for_alert(&self, alert_id: &str) -> Result<Vec<NotificationLog>> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.alert_id == alert_id)
            .cloned()
            .collect())
    }
}
