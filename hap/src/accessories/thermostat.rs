use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use hap::{
    accessory::thermostat::ThermostatAccessory,
    characteristic::{AsyncCharacteristicCallbacks, HapCharacteristic},
    server::{IpServer, Server},
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::accessories::cached_device::CachedDevice;
use crate::accessories::state::thermostat::{
    HeatingCoolingState, ThermostatState, target_mode_patch,
};
use crate::settings::DeviceConfig;
use neviweb_client_rs::DeviceStatePatch;

/// HomeKit display unit for Celsius. Neviweb has no unit setting.
pub(crate) const CELSIUS: u8 = 0;

/// HomeKit sends `f32` setpoints; Neviweb takes tenths of a degree.
fn setpoint_from_homekit(value: f32) -> f64 {
    (f64::from(value) * 10.0).round() / 10.0
}

/// Thermostat operations backed by a [`CachedDevice`].
#[derive(Clone)]
pub(crate) struct ThermostatAdapter {
    device: Arc<CachedDevice<ThermostatState>>,
}

impl ThermostatAdapter {
    pub(crate) fn new(device: CachedDevice<ThermostatState>) -> Self {
        Self {
            device: Arc::new(device),
        }
    }

    pub(crate) fn device_id(&self) -> &str {
        self.device.device_id()
    }

    pub(crate) async fn current_temperature(&self) -> f32 {
        self.device.state().await.current_temperature
    }

    pub(crate) async fn target_temperature(&self) -> f32 {
        self.device.state().await.target_temperature
    }

    pub(crate) async fn current_heating_cooling_state(&self) -> HeatingCoolingState {
        self.device.state().await.current_heating_cooling_state
    }

    pub(crate) async fn target_heating_cooling_state(&self) -> HeatingCoolingState {
        self.device.state().await.target_heating_cooling_state
    }

    pub(crate) async fn set_target_temperature(&self, value: f32) {
        info!("Thermostat {} target temperature -> {}", self.device_id(), value);
        self.device
            .send(DeviceStatePatch::room_setpoint(setpoint_from_homekit(value)))
            .await;
    }

    pub(crate) async fn set_target_heating_cooling_state(&self, requested: HeatingCoolingState) {
        let previous = self.device.peek().await.target_heating_cooling_state;
        match target_mode_patch(requested, previous) {
            Some(patch) => {
                info!(
                    "Thermostat {} target mode {:?} -> {:?}",
                    self.device_id(),
                    previous,
                    requested
                );
                self.device.send(patch).await;
            }
            None => debug!(
                "Thermostat {} already running ({:?}), ignoring mode {:?}",
                self.device_id(),
                previous,
                requested
            ),
        }
    }

    pub(crate) fn temperature_display_units(&self) -> u8 {
        CELSIUS
    }

    pub(crate) fn set_temperature_display_units(&self, units: u8) {
        debug!(
            "Thermostat {} display units set to {}, ignored",
            self.device_id(),
            units
        );
    }
}

pub(crate) struct NeviwebThermostatAccessory {
    id: String,
}

impl NeviwebThermostatAccessory {
    pub(crate) async fn new(
        id: u64,
        config: &DeviceConfig,
        adapter: ThermostatAdapter,
        server: &IpServer,
    ) -> Result<Self> {
        let mut accessory = ThermostatAccessory::new(id, config.accessory_information())?;

        accessory.thermostat.cooling_threshold_temperature = None;
        accessory.thermostat.heating_threshold_temperature = None;
        accessory.thermostat.current_relative_humidity = None;
        accessory.thermostat.target_relative_humidity = None;
        accessory
            .thermostat
            .temperature_display_units
            .set_value(Value::from(CELSIUS))
            .await?;

        Self::setup_read_characteristics(&mut accessory, adapter.clone());
        Self::setup_update_characteristics(&mut accessory, adapter);

        server.add_accessory(accessory).await?;
        Ok(Self {
            id: config.id.clone(),
        })
    }

    pub(crate) fn get_neviweb_id(&self) -> &str {
        &self.id
    }

    fn setup_read_characteristics(accessory: &mut ThermostatAccessory, adapter: ThermostatAdapter) {
        let adapter_ = adapter.clone();
        accessory
            .thermostat
            .current_temperature
            .on_read_async(Some(move || {
                let adapter = adapter_.clone();
                async move { Ok(Some(adapter.current_temperature().await)) }.boxed()
            }));

        let adapter_ = adapter.clone();
        accessory
            .thermostat
            .target_temperature
            .on_read_async(Some(move || {
                let adapter = adapter_.clone();
                async move { Ok(Some(adapter.target_temperature().await)) }.boxed()
            }));

        let adapter_ = adapter.clone();
        accessory
            .thermostat
            .current_heating_cooling_state
            .on_read_async(Some(move || {
                let adapter = adapter_.clone();
                async move { Ok(Some(u8::from(adapter.current_heating_cooling_state().await))) }
                    .boxed()
            }));

        let adapter_ = adapter.clone();
        accessory
            .thermostat
            .target_heating_cooling_state
            .on_read_async(Some(move || {
                let adapter = adapter_.clone();
                async move { Ok(Some(u8::from(adapter.target_heating_cooling_state().await))) }
                    .boxed()
            }));

        accessory
            .thermostat
            .temperature_display_units
            .on_read_async(Some(move || {
                let adapter = adapter.clone();
                async move { Ok(Some(adapter.temperature_display_units())) }.boxed()
            }));
    }

    /// Update handlers always acknowledge: HomeKit gets `Ok` even when the
    /// vendor rejected the write.
    fn setup_update_characteristics(
        accessory: &mut ThermostatAccessory,
        adapter: ThermostatAdapter,
    ) {
        let adapter_ = adapter.clone();
        accessory
            .thermostat
            .target_temperature
            .on_update_async(Some(move |_prev: f32, new: f32| {
                let adapter = adapter_.clone();
                async move {
                    adapter.set_target_temperature(new).await;
                    Ok(())
                }
                .boxed()
            }));

        let adapter_ = adapter.clone();
        accessory
            .thermostat
            .target_heating_cooling_state
            .on_update_async(Some(move |_prev: u8, new: u8| {
                let adapter = adapter_.clone();
                async move {
                    match HeatingCoolingState::try_from(new) {
                        Ok(mode) => adapter.set_target_heating_cooling_state(mode).await,
                        Err(value) => warn!(
                            "Thermostat {} got invalid target mode {}",
                            adapter.device_id(),
                            value
                        ),
                    }
                    Ok(())
                }
                .boxed()
            }));

        accessory
            .thermostat
            .temperature_display_units
            .on_update_async(Some(move |_prev: u8, new: u8| {
                let adapter = adapter.clone();
                async move {
                    adapter.set_temperature_display_units(new);
                    Ok(())
                }
                .boxed()
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessories::cached_device::DEFAULT_TTL;
    use crate::accessories::test_helper::FakeNeviwebClient;
    use neviweb_client_rs::{DeviceStateSnapshot, SetpointMode};

    fn snapshot(mode: &str) -> DeviceStateSnapshot {
        DeviceStateSnapshot {
            room_temperature: Some(20.0),
            room_setpoint: Some(22.5),
            output_percent: Some(0.0),
            setpoint_mode: Some(SetpointMode::from(mode)),
            ..Default::default()
        }
    }

    fn adapter(client: &FakeNeviwebClient) -> ThermostatAdapter {
        ThermostatAdapter::new(CachedDevice::new(
            "thermo-1",
            Arc::new(client.clone()),
            DEFAULT_TTL,
        ))
    }

    #[tokio::test]
    async fn test_reads_share_the_cache() {
        let client = FakeNeviwebClient::with_snapshot(snapshot("auto"));
        let adapter = adapter(&client);

        assert_eq!(adapter.current_temperature().await, 20.0);
        assert_eq!(adapter.target_temperature().await, 22.5);
        assert_eq!(
            adapter.current_heating_cooling_state().await,
            HeatingCoolingState::Off
        );
        assert_eq!(
            adapter.target_heating_cooling_state().await,
            HeatingCoolingState::Auto
        );
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_set_target_temperature_sends_setpoint() {
        let client = FakeNeviwebClient::with_snapshot(snapshot("auto"));
        let adapter = adapter(&client);

        adapter.set_target_temperature(19.5).await;

        let calls = client.update_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            (
                "thermo-1".to_string(),
                DeviceStatePatch::room_setpoint(19.5)
            )
        );
    }

    #[tokio::test]
    async fn test_set_target_temperature_rounds_to_tenths() {
        let client = FakeNeviwebClient::default();
        let adapter = adapter(&client);

        adapter.set_target_temperature(21.1).await;
        adapter.set_target_temperature(18.25).await;

        let calls = client.update_calls().await;
        assert_eq!(calls[0].1, DeviceStatePatch::room_setpoint(21.1));
        assert_eq!(calls[1].1, DeviceStatePatch::room_setpoint(18.3));
    }

    #[tokio::test]
    async fn test_heat_from_off_sends_auto() {
        let client = FakeNeviwebClient::with_snapshot(snapshot("off"));
        let adapter = adapter(&client);
        adapter.target_heating_cooling_state().await;

        adapter
            .set_target_heating_cooling_state(HeatingCoolingState::Heat)
            .await;

        let calls = client.update_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].1,
            DeviceStatePatch::setpoint_mode(SetpointMode::Auto)
        );
    }

    #[tokio::test]
    async fn test_heat_while_heating_sends_nothing() {
        let client = FakeNeviwebClient::with_snapshot(snapshot("manual"));
        let adapter = adapter(&client);
        assert_eq!(
            adapter.target_heating_cooling_state().await,
            HeatingCoolingState::Heat
        );

        adapter
            .set_target_heating_cooling_state(HeatingCoolingState::Heat)
            .await;

        assert!(client.update_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_off_is_always_sent() {
        for mode in ["auto", "off", "manual"] {
            let client = FakeNeviwebClient::with_snapshot(snapshot(mode));
            let adapter = adapter(&client);
            adapter.target_heating_cooling_state().await;

            adapter
                .set_target_heating_cooling_state(HeatingCoolingState::Off)
                .await;

            let calls = client.update_calls().await;
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].1, DeviceStatePatch::setpoint_mode(SetpointMode::Off));
        }
    }

    #[tokio::test]
    async fn test_mode_write_does_not_refresh() {
        let client = FakeNeviwebClient::with_snapshot(snapshot("auto"));
        let adapter = adapter(&client);

        adapter
            .set_target_heating_cooling_state(HeatingCoolingState::Heat)
            .await;

        // Nothing cached yet, so the previous mode is the default Off.
        assert_eq!(client.fetch_count(), 0);
        assert_eq!(
            client.update_calls().await[0].1,
            DeviceStatePatch::setpoint_mode(SetpointMode::Auto)
        );
    }

    #[tokio::test]
    async fn test_update_failure_is_swallowed() {
        let client = FakeNeviwebClient::failing();
        let adapter = adapter(&client);

        adapter.set_target_temperature(21.0).await;
        adapter
            .set_target_heating_cooling_state(HeatingCoolingState::Off)
            .await;

        assert_eq!(client.update_calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_display_units_are_fixed() {
        let client = FakeNeviwebClient::default();
        let adapter = adapter(&client);

        adapter.set_temperature_display_units(1);

        assert_eq!(adapter.temperature_display_units(), CELSIUS);
        assert!(client.update_calls().await.is_empty());
    }
}
