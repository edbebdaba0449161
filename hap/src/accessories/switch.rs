use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use hap::{
    accessory::switch::SwitchAccessory,
    characteristic::AsyncCharacteristicCallbacks,
    server::{IpServer, Server},
};
use tracing::info;

use crate::accessories::cached_device::CachedDevice;
use crate::accessories::state::switch::SwitchState;
use crate::settings::DeviceConfig;
use neviweb_client_rs::DeviceStatePatch;

/// On/off operations backed by a [`CachedDevice`].
#[derive(Clone)]
pub(crate) struct SwitchAdapter {
    device: Arc<CachedDevice<SwitchState>>,
}

impl SwitchAdapter {
    pub(crate) fn new(device: CachedDevice<SwitchState>) -> Self {
        Self {
            device: Arc::new(device),
        }
    }

    pub(crate) async fn is_on(&self) -> bool {
        self.device.state().await.on
    }

    pub(crate) async fn set_on(&self, on: bool) {
        info!(
            "Switch {} power -> {}",
            self.device.device_id(),
            if on { "on" } else { "off" }
        );
        self.device.send(DeviceStatePatch::on_off(on)).await;
    }
}

pub(crate) struct NeviwebSwitchAccessory {
    id: String,
}

impl NeviwebSwitchAccessory {
    pub(crate) async fn new(
        id: u64,
        config: &DeviceConfig,
        adapter: SwitchAdapter,
        server: &IpServer,
    ) -> Result<Self> {
        let mut accessory = SwitchAccessory::new(id, config.accessory_information())?;

        let adapter_ = adapter.clone();
        accessory
            .switch
            .power_state
            .on_read_async(Some(move || {
                let adapter = adapter_.clone();
                async move { Ok(Some(adapter.is_on().await)) }.boxed()
            }));

        accessory
            .switch
            .power_state
            .on_update_async(Some(move |_prev: bool, new: bool| {
                let adapter = adapter.clone();
                async move {
                    adapter.set_on(new).await;
                    Ok(())
                }
                .boxed()
            }));

        server.add_accessory(accessory).await?;
        Ok(Self {
            id: config.id.clone(),
        })
    }

    pub(crate) fn get_neviweb_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessories::cached_device::DEFAULT_TTL;
    use crate::accessories::test_helper::FakeNeviwebClient;
    use neviweb_client_rs::DeviceStateSnapshot;

    fn adapter(client: &FakeNeviwebClient) -> SwitchAdapter {
        SwitchAdapter::new(CachedDevice::new(
            "switch-1",
            Arc::new(client.clone()),
            DEFAULT_TTL,
        ))
    }

    #[tokio::test]
    async fn test_read_on_off() {
        let client = FakeNeviwebClient::with_snapshot(DeviceStateSnapshot {
            on_off: Some("on".to_string()),
            ..Default::default()
        });
        let adapter = adapter(&client);

        assert!(adapter.is_on().await);
        assert!(adapter.is_on().await);
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_write_sends_on_off_patch() {
        let client = FakeNeviwebClient::default();
        let adapter = adapter(&client);

        adapter.set_on(true).await;
        adapter.set_on(false).await;

        let calls = client.update_calls().await;
        assert_eq!(
            calls,
            vec![
                ("switch-1".to_string(), DeviceStatePatch::on_off(true)),
                ("switch-1".to_string(), DeviceStatePatch::on_off(false)),
            ]
        );
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let client = FakeNeviwebClient::failing();
        let adapter = adapter(&client);

        assert!(!adapter.is_on().await);
        adapter.set_on(true).await;

        assert_eq!(client.update_calls().await.len(), 1);
    }
}
