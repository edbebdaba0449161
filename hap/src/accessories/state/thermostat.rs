use neviweb_client_rs::{DeviceStatePatch, DeviceStateSnapshot, SetpointMode};

use crate::accessories::state::DeviceState;
use crate::web::state::DeviceType;

/// HomeKit rejects target temperatures below 10°C.
pub(crate) const MIN_TARGET_TEMPERATURE: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ThermostatState {
    pub(crate) current_temperature: f32,
    pub(crate) target_temperature: f32,
    pub(crate) current_heating_cooling_state: HeatingCoolingState,
    pub(crate) target_heating_cooling_state: HeatingCoolingState,
}

impl Default for ThermostatState {
    fn default() -> Self {
        Self {
            current_temperature: 0.0,
            target_temperature: MIN_TARGET_TEMPERATURE,
            current_heating_cooling_state: HeatingCoolingState::Off,
            target_heating_cooling_state: HeatingCoolingState::Off,
        }
    }
}

impl DeviceState for ThermostatState {
    const DEVICE_TYPE: DeviceType = DeviceType::Thermostat;

    fn apply(&mut self, snapshot: &DeviceStateSnapshot) {
        let Some(room_temperature) = snapshot.room_temperature else {
            return;
        };
        self.current_temperature = room_temperature as f32;
        if let Some(setpoint) = snapshot.room_setpoint {
            self.target_temperature = setpoint as f32;
        }
        self.current_heating_cooling_state = if snapshot.output_percent.unwrap_or_default() > 0.0
        {
            HeatingCoolingState::Heat
        } else {
            HeatingCoolingState::Off
        };
        self.target_heating_cooling_state = snapshot
            .setpoint_mode
            .as_ref()
            .map(HeatingCoolingState::from)
            .unwrap_or(HeatingCoolingState::Heat);
    }

    fn describe(&self) -> String {
        format!(
            "{:.1}°C -> {:.1}°C ({:?}, target {:?})",
            self.current_temperature,
            self.target_temperature,
            self.current_heating_cooling_state,
            self.target_heating_cooling_state
        )
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
#[repr(u8)]
pub enum HeatingCoolingState {
    #[default]
    Off = 0,
    Heat = 1,
    Cool = 2,
    Auto = 3,
}

impl TryFrom<u8> for HeatingCoolingState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(HeatingCoolingState::Off),
            1 => Ok(HeatingCoolingState::Heat),
            2 => Ok(HeatingCoolingState::Cool),
            3 => Ok(HeatingCoolingState::Auto),
            other => Err(other),
        }
    }
}

impl From<HeatingCoolingState> for u8 {
    fn from(value: HeatingCoolingState) -> Self {
        value as u8
    }
}

impl From<&SetpointMode> for HeatingCoolingState {
    fn from(mode: &SetpointMode) -> Self {
        match mode {
            SetpointMode::Auto => HeatingCoolingState::Auto,
            SetpointMode::Off => HeatingCoolingState::Off,
            SetpointMode::Other(_) => HeatingCoolingState::Heat,
        }
    }
}

/// Decides which patch, if any, a target mode write turns into.
///
/// Turning off is always sent. Turning on is sent as `auto` only when the
/// device is currently off: once a running thermostat gets a manual
/// setpoint, Neviweb moves it into an internal bypass mode that it does not
/// accept as input, so re-sending a mode to a running device is skipped.
pub(crate) fn target_mode_patch(
    requested: HeatingCoolingState,
    previous: HeatingCoolingState,
) -> Option<DeviceStatePatch> {
    match (requested, previous) {
        (HeatingCoolingState::Off, _) => Some(DeviceStatePatch::setpoint_mode(SetpointMode::Off)),
        (_, HeatingCoolingState::Off) => Some(DeviceStatePatch::setpoint_mode(SetpointMode::Auto)),
        _ => None,
    }
}
