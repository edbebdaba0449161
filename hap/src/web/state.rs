//! Shared bridge state for the status endpoint and metrics.
//!
//! Every device cache reports the outcome of its refreshes and writes here,
//! so a persistently failing vendor API is visible without reading logs.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Type of device mounted on the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Thermostat,
    Switch,
}

impl DeviceType {
    /// Returns the device type as a string for labels and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Thermostat => "thermostat",
            DeviceType::Switch => "switch",
        }
    }
}

/// What the bridge knows about one device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub device_type: DeviceType,
    /// Human readable summary of the last cached state.
    pub status: String,
    /// Last successful refresh.
    pub last_refresh: Option<Instant>,
    pub refresh_count: u64,
    pub refresh_failures: u64,
    pub patch_failures: u64,
    /// Last refresh or mount error, cleared by a successful refresh.
    pub last_error: Option<String>,
    pub last_patch_error: Option<String>,
}

impl DeviceInfo {
    pub fn new(id: &str, name: &str, device_type: DeviceType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            device_type,
            status: "unknown".to_string(),
            last_refresh: None,
            refresh_count: 0,
            refresh_failures: 0,
            patch_failures: 0,
            last_error: None,
            last_patch_error: None,
        }
    }

    /// A device is failing when its most recent refresh attempt failed or
    /// its accessory could not be mounted. Failed writes do not count.
    pub fn is_failing(&self) -> bool {
        self.last_error.is_some()
    }
}

#[derive(Debug)]
struct BridgeStateInner {
    start_time: Instant,
    pairing_pin: String,
    pairing_url: String,
    devices: HashMap<String, DeviceInfo>,
}

/// Shared bridge state.
///
/// This is thread-safe and can be shared between the device caches and the
/// web server.
#[derive(Debug, Clone)]
pub struct BridgeState {
    inner: Arc<RwLock<BridgeStateInner>>,
}

impl Default for BridgeState {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BridgeStateInner {
                start_time: Instant::now(),
                pairing_pin: String::new(),
                pairing_url: String::new(),
                devices: HashMap::new(),
            })),
        }
    }

    pub fn start_time(&self) -> Instant {
        self.inner.read().start_time
    }

    pub fn set_pairing(&self, pin: String, url: String) {
        let mut inner = self.inner.write();
        inner.pairing_pin = pin;
        inner.pairing_url = url;
    }

    pub fn register_device(&self, device: DeviceInfo) {
        self.inner.write().devices.insert(device.id.clone(), device);
    }

    pub fn record_refresh(&self, id: &str, status: String) {
        if let Some(device) = self.inner.write().devices.get_mut(id) {
            device.status = status;
            device.last_refresh = Some(Instant::now());
            device.refresh_count += 1;
            device.last_error = None;
        }
    }

    pub fn record_refresh_failure(&self, id: &str, error: String) {
        if let Some(device) = self.inner.write().devices.get_mut(id) {
            device.refresh_count += 1;
            device.refresh_failures += 1;
            device.last_error = Some(error);
        }
    }

    pub fn record_patch_failure(&self, id: &str, error: String) {
        if let Some(device) = self.inner.write().devices.get_mut(id) {
            device.patch_failures += 1;
            device.last_patch_error = Some(error);
        }
    }

    pub fn record_mount_failure(&self, id: &str, error: String) {
        if let Some(device) = self.inner.write().devices.get_mut(id) {
            device.status = "not mounted".to_string();
            device.last_error = Some(error);
        }
    }

    pub fn devices(&self) -> Vec<DeviceInfo> {
        let mut devices: Vec<_> = self.inner.read().devices.values().cloned().collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        devices
    }

    #[cfg(test)]
    pub fn device(&self, id: &str) -> Option<DeviceInfo> {
        self.inner.read().devices.get(id).cloned()
    }

    #[cfg(test)]
    pub fn device_count(&self) -> usize {
        self.inner.read().devices.len()
    }

    pub fn device_counts(&self) -> HashMap<DeviceType, usize> {
        let mut counts = HashMap::new();
        for device in self.inner.read().devices.values() {
            *counts.entry(device.device_type).or_insert(0) += 1;
        }
        counts
    }

    /// Get a snapshot of the bridge state for the status endpoint.
    pub fn summary(&self) -> BridgeStateSummary {
        let inner = self.inner.read();
        BridgeStateSummary {
            uptime_seconds: inner.start_time.elapsed().as_secs(),
            pairing_pin: inner.pairing_pin.clone(),
            pairing_url: inner.pairing_url.clone(),
            device_count: inner.devices.len(),
            failing_devices: inner
                .devices
                .values()
                .filter(|d| d.is_failing())
                .map(|d| d.id.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BridgeStateSummary {
    pub uptime_seconds: u64,
    pub pairing_pin: String,
    pub pairing_url: String,
    pub device_count: usize,
    pub failing_devices: Vec<String>,
}

impl BridgeStateSummary {
    /// Format uptime as a human-readable string.
    pub fn uptime_display(&self) -> String {
        let secs = self.uptime_seconds;
        let (days, hours, mins, secs) = (
            secs / 86400,
            (secs % 86400) / 3600,
            (secs % 3600) / 60,
            secs % 60,
        );
        match (days, hours, mins) {
            (0, 0, 0) => format!("{secs}s"),
            (0, 0, _) => format!("{mins}m {secs}s"),
            (0, _, _) => format!("{hours}h {mins}m {secs}s"),
            _ => format!("{days}d {hours}h {mins}m {secs}s"),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.failing_devices.is_empty()
    }
}
