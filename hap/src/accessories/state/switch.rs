use neviweb_client_rs::DeviceStateSnapshot;

use crate::accessories::state::DeviceState;
use crate::web::state::DeviceType;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SwitchState {
    pub(crate) on: bool,
}

impl DeviceState for SwitchState {
    const DEVICE_TYPE: DeviceType = DeviceType::Switch;

    fn apply(&mut self, snapshot: &DeviceStateSnapshot) {
        if snapshot.is_thermostat() {
            return;
        }
        if let Some(on) = snapshot.is_on() {
            self.on = on;
        }
    }

    fn describe(&self) -> String {
        if self.on { "on" } else { "off" }.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(on_off: Option<&str>) -> DeviceStateSnapshot {
        DeviceStateSnapshot {
            on_off: on_off.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_on_off_mapping() {
        let mut state = SwitchState::default();
        state.apply(&snapshot(Some("on")));
        assert!(state.on);
        state.apply(&snapshot(Some("off")));
        assert!(!state.on);
    }

    #[test]
    fn test_only_on_means_on() {
        let mut state = SwitchState { on: true };
        state.apply(&snapshot(Some("ON")));
        assert!(!state.on);
    }

    #[test]
    fn test_missing_on_off_keeps_value() {
        let mut state = SwitchState { on: true };
        state.apply(&snapshot(None));
        assert!(state.on);
    }

    #[test]
    fn test_thermostat_snapshot_is_ignored() {
        let mut state = SwitchState { on: true };
        state.apply(&DeviceStateSnapshot {
            room_temperature: Some(20.0),
            on_off: Some("off".to_string()),
            ..Default::default()
        });
        assert!(state.on);
    }
}
