use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use neviweb_client_rs::{DeviceApi, DeviceStatePatch, DeviceStateSnapshot, NeviwebClientError};
use tokio::sync::RwLock;

/// In-memory [`DeviceApi`] recording every call it receives.
#[derive(Clone, Default)]
pub struct FakeNeviwebClient {
    snapshot: Arc<RwLock<DeviceStateSnapshot>>,
    fetch_calls: Arc<AtomicUsize>,
    update_calls: Arc<RwLock<Vec<(String, DeviceStatePatch)>>>,
    should_fail: Arc<AtomicBool>,
    fetch_delay: Option<Duration>,
}

#[allow(dead_code)]
impl FakeNeviwebClient {
    pub fn with_snapshot(snapshot: DeviceStateSnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        let client = Self::default();
        client.set_failing(true);
        client
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    pub async fn set_snapshot(&self, snapshot: DeviceStateSnapshot) {
        *self.snapshot.write().await = snapshot;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub async fn update_calls(&self) -> Vec<(String, DeviceStatePatch)> {
        self.update_calls.read().await.clone()
    }

    fn failure() -> NeviwebClientError {
        NeviwebClientError::ApiError {
            status: 500,
            code: "SIMULATED".to_string(),
        }
    }
}

#[async_trait]
impl DeviceApi for FakeNeviwebClient {
    async fn fetch_device(
        &self,
        _device_id: &str,
    ) -> Result<DeviceStateSnapshot, NeviwebClientError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self.snapshot.read().await.clone())
    }

    async fn update_device(
        &self,
        device_id: &str,
        patch: &DeviceStatePatch,
    ) -> Result<(), NeviwebClientError> {
        self.update_calls
            .write()
            .await
            .push((device_id.to_string(), patch.clone()));
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(())
    }
}
