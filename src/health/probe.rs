//! Storage connectivity probes.
//!
//! A probe verifies a backup location end to end by writing a marker,
//! reading it back, and deleting it, rather than guessing from cached
//! state.

use crate::core::{generate_id, now, Error, Result, Timestamp};
use crate::model::BackupLocation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of one connectivity probe.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Location probed
    pub location_id: String,
    /// Whether the full round trip succeeded
    pub reachable: bool,
    /// Round-trip latency in milliseconds
    pub round_trip_ms: u64,
    /// Marker bytes written and verified
    pub bytes_verified: usize,
    /// Human-readable detail
    pub message: String,
    /// When the probe ran
    pub timestamp: Timestamp,
}

/// Core trait for storage connectivity probes.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Probe one backup location.
    async fn probe(&self, location: &BackupLocation) -> Result<ProbeReport>;
}

/// Raw I/O against a storage backend, the integration seam for probes.
#[async_trait]
pub trait ProbeTarget: Send + Sync {
    /// Write marker bytes under a key.
    async fn write(&self, location_id: &str, key: &str, data: &[u8]) -> Result<()>;

    /// Read marker bytes back.
    async fn read(&self, location_id: &str, key: &str) -> Result<Vec<u8>>;

    /// Remove the marker.
    async fn delete(&self, location_id: &str, key: &str) -> Result<()>;
}

/// Probe that performs a real write/read/delete round trip.
pub struct RoundTripProbe {
    target: Arc<dyn ProbeTarget>,
}

impl RoundTripProbe {
    /// Create a probe against a storage target.
    pub fn new(target: Arc<dyn ProbeTarget>) -> Self {
        Self { target }
    }
}

#[async_trait]
impl ConnectivityProbe for RoundTripProbe {
    async fn probe(&self, location: &BackupLocation) -> Result<ProbeReport> {
        let key = generate_id("probe");
        let marker = key.as_bytes();
        let started = std::time::Instant::now();

        let round_trip = async {
            self.target.write(&location.id, &key, marker).await?;
            let read_back = self.target.read(&location.id, &key).await?;
            if read_back != marker {
                return Err(Error::Store(format!(
                    "probe marker mismatch on location {}",
                    location.id
                )));
            }
            Ok::<usize, Error>(marker.len())
        }
        .await;

        // Cleanup failure does not change the verdict.
        let _ = self.target.delete(&location.id, &key).await;

        let round_trip_ms = started.elapsed().as_millis() as u64;
        match round_trip {
            Ok(bytes_verified) => Ok(ProbeReport {
                location_id: location.id.clone(),
                reachable: true,
                round_trip_ms,
                bytes_verified,
                message: format!(
                    "location {} verified in {}ms",
                    location.name, round_trip_ms
                ),
                timestamp: now(),
            }),
            Err(err) => Ok(ProbeReport {
                location_id: location.id.clone(),
                reachable: false,
                round_trip_ms,
                bytes_verified: 0,
                message: format!("location {} unreachable: {}", location.name, err),
                timestamp: now(),
            }),
        }
    }
}

/// In-memory probe target. Backs tests and the engine self-test.
#[derive(Default)]
pub struct MemoryProbeTarget {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    /// Location IDs that refuse all I/O.
    offline: RwLock<Vec<String>>,
}

impl MemoryProbeTarget {
    /// Create an empty target where every location is reachable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a location as offline.
    pub async fn set_offline(&self, location_id: &str) {
        self.offline.write().await.push(location_id.to_string());
    }

    async fn check_online(&self, location_id: &str) -> Result<()> {
        if self.offline.read().await.iter().any(|l| l == location_id) {
            return Err(Error::Store(format!("location {} offline", location_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ProbeTarget for MemoryProbeTarget {
    async fn write(&self, location_id: &str, key: &str, data: &[u8]) -> Result<()> {
        self.check_online(location_id).await?;
        let mut objects = self.objects.write().await;
        objects.insert(format!("{}/{}", location_id, key), data.to_vec());
        Ok(())
    }

    async fn read(&self, location_id: &str, key: &str) -> Result<Vec<u8>> {
        self.check_online(location_id).await?;
        let objects = self.objects.read().await;
        objects
            .get(&format!("{}/{}", location_id, key))
            .cloned()
            .ok_or_else(|| Error::Store(format!("probe marker missing on {}", location_id)))
    }

    async fn delete(&self, location_id: &str, key: &str) -> Result<()> {
        self.check_online(location_id).await?;
        let mut objects = self.objects.write().await;
        objects.remove(&format!("{}/{}", location_id, key));
        Ok(())
    }
}

/// Fixed-outcome probe for unit tests.
pub struct StaticProbe {
    reachable: bool,
    round_trip_ms: u64,
}

impl StaticProbe {
    /// A probe that always reports the location reachable.
    pub fn reachable(round_trip_ms: u64) -> Self {
        Self {
            reachable: true,
            round_trip_ms,
        }
    }

    /// A probe that always reports the location unreachable.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            round_trip_ms: 0,
        }
    }
}

#[async_trait]
impl ConnectivityProbe for StaticProbe {
    async fn probe(&self, location: &BackupLocation) -> Result<ProbeReport> {
        Ok(ProbeReport {
            location_id: location.id.clone(),
            reachable: self.reachable,
            round_trip_ms: self.round_trip_ms,
            bytes_verified: 0,
            message: if self.reachable {
                format!("location {} reachable", location.name)
            } else {
                format!("location {} unreachable", location.name)
            },
            timestamp: now(),
        })
    }
}
