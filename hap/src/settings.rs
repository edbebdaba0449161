use std::time::Duration;

use hap::accessory::AccessoryInformation;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::accessories::DEFAULT_TTL;
use crate::web::state::DeviceType;

const MIN_CACHE_TTL_SECS: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pairing_code: [u8; 8],
    pub setup_id: String,
    pub bridge_name: String,
    /// How long a device state is served from cache, in seconds.
    pub cache_ttl_secs: u64,
    pub web_enabled: bool,
    pub web_port: u16,
    pub devices: Vec<DeviceConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pairing_code: [1, 1, 1, 2, 2, 3, 3, 3],
            setup_id: String::from("NVWB"),
            bridge_name: String::from("Neviweb Bridge"),
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            web_enabled: true,
            web_port: 8080,
            devices: vec![],
        }
    }
}

impl Settings {
    /// Cache TTL, at least one second.
    pub fn cache_ttl(&self) -> Duration {
        if self.cache_ttl_secs == 0 {
            warn!("cache_ttl_secs is 0, using {}s", MIN_CACHE_TTL_SECS);
        }
        Duration::from_secs(self.cache_ttl_secs.max(MIN_CACHE_TTL_SECS))
    }
}

/// A Neviweb device to mount on the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Gateway or thermostat this device hangs off, when there is one.
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl DeviceConfig {
    pub fn accessory_information(&self) -> AccessoryInformation {
        AccessoryInformation {
            name: self.name.clone(),
            manufacturer: self
                .manufacturer
                .clone()
                .unwrap_or_else(|| "Sinopé".to_string()),
            model: self.model.clone().unwrap_or_else(|| "Neviweb".to_string()),
            serial_number: self.id.clone(),
            ..Default::default()
        }
    }
}
