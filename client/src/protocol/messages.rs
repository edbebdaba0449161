use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Attributes requested on every device fetch.
pub const SNAPSHOT_ATTRIBUTES: &[&str] = &[
    "roomTemperature",
    "roomSetpoint",
    "outputPercentDisplay",
    "setpointMode",
    "onOff",
    "wattageInstant",
    "errorCode",
    "drStatus",
];

/// A numeric reading. Neviweb reports some readings as a bare number and
/// others wrapped in an object carrying a `value` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum Reading {
    Plain(f64),
    Wrapped { value: Option<f64> },
}

fn deserialize_reading<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let reading = Option::<Reading>::deserialize(deserializer)?;
    Ok(match reading {
        Some(Reading::Plain(v)) => Some(v),
        Some(Reading::Wrapped { value }) => value,
        None => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SetpointMode {
    #[default]
    Auto,
    Off,
    Other(String),
}

impl SetpointMode {
    pub fn as_str(&self) -> &str {
        match self {
            SetpointMode::Auto => "auto",
            SetpointMode::Off => "off",
            SetpointMode::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for SetpointMode {
    fn from(value: &str) -> Self {
        match value {
            "auto" => SetpointMode::Auto,
            "off" => SetpointMode::Off,
            other => SetpointMode::Other(other.to_string()),
        }
    }
}

impl Display for SetpointMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SetpointMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SetpointMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(SetpointMode::from(s.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOff {
    On,
    Off,
}

impl From<bool> for OnOff {
    fn from(value: bool) -> Self {
        if value { OnOff::On } else { OnOff::Off }
    }
}

/// Device attributes as reported by the vendor on a single fetch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStateSnapshot {
    #[serde(default, deserialize_with = "deserialize_reading")]
    pub room_temperature: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_reading")]
    pub room_setpoint: Option<f64>,
    #[serde(
        default,
        rename = "outputPercentDisplay",
        deserialize_with = "deserialize_reading"
    )]
    pub output_percent: Option<f64>,
    #[serde(default)]
    pub setpoint_mode: Option<SetpointMode>,
    /// Raw on/off string; only `"on"` means on.
    #[serde(default)]
    pub on_off: Option<String>,
    #[serde(
        default,
        rename = "wattageInstant",
        deserialize_with = "deserialize_reading"
    )]
    pub wattage: Option<f64>,
    #[serde(default)]
    pub error_code: Option<Value>,
    #[serde(default, rename = "drStatus")]
    pub demand_response: Option<Value>,
}

impl DeviceStateSnapshot {
    /// Thermostat-class devices report a room temperature.
    pub fn is_thermostat(&self) -> bool {
        self.room_temperature.is_some()
    }

    pub fn is_on(&self) -> Option<bool> {
        self.on_off.as_deref().map(|s| s == "on")
    }
}

/// Sparse write request. Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_setpoint: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setpoint_mode: Option<SetpointMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_off: Option<OnOff>,
}

impl DeviceStatePatch {
    pub fn room_setpoint(value: f64) -> Self {
        Self {
            room_setpoint: Some(value),
            ..Default::default()
        }
    }

    pub fn setpoint_mode(mode: SetpointMode) -> Self {
        Self {
            setpoint_mode: Some(mode),
            ..Default::default()
        }
    }

    pub fn on_off(on: bool) -> Self {
        Self {
            on_off: Some(OnOff::from(on)),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.room_setpoint.is_none() && self.setpoint_mode.is_none() && self.on_off.is_none()
    }
}

/// Error payload returned by the API in place of the requested data.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub(crate) error: ApiErrorBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_thermostat_snapshot() {
        let json = r#"{
            "roomTemperature": {"value": 21.5, "error": null},
            "roomSetpoint": 22,
            "outputPercentDisplay": 37,
            "setpointMode": "auto",
            "wattageInstant": 1500,
            "errorCode": null,
            "drStatus": {"drActive": "off"}
        }"#;
        let snapshot = serde_json::from_str::<DeviceStateSnapshot>(json).unwrap();
        assert!(snapshot.is_thermostat());
        assert_eq!(snapshot.room_temperature, Some(21.5));
        assert_eq!(snapshot.room_setpoint, Some(22.0));
        assert_eq!(snapshot.output_percent, Some(37.0));
        assert_eq!(snapshot.setpoint_mode, Some(SetpointMode::Auto));
        assert_eq!(snapshot.wattage, Some(1500.0));
        assert!(snapshot.on_off.is_none());
        assert!(snapshot.demand_response.is_some());
    }

    #[test]
    fn parse_switch_snapshot() {
        let json = r#"{"onOff": "on", "wattageInstant": {"value": 12.0}}"#;
        let snapshot = serde_json::from_str::<DeviceStateSnapshot>(json).unwrap();
        assert!(!snapshot.is_thermostat());
        assert_eq!(snapshot.is_on(), Some(true));
        assert_eq!(snapshot.wattage, Some(12.0));
    }

    #[test]
    fn unknown_setpoint_mode_is_kept_verbatim() {
        let snapshot =
            serde_json::from_value::<DeviceStateSnapshot>(json!({"setpointMode": "autoBypass"}))
                .unwrap();
        assert_eq!(
            snapshot.setpoint_mode,
            Some(SetpointMode::Other("autoBypass".to_string()))
        );
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = DeviceStatePatch::room_setpoint(20.5);
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"roomSetpoint": 20.5})
        );

        let patch = DeviceStatePatch::setpoint_mode(SetpointMode::Off);
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"setpointMode": "off"})
        );

        let patch = DeviceStatePatch::on_off(true);
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"onOff": "on"}));
        assert!(DeviceStatePatch::default().is_empty());
    }
}
