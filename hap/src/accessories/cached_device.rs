//! Per-device view of the Neviweb API with a TTL-gated state cache.
//!
//! Reads are served from the cache while it is valid. Once it expires, the
//! first reader refreshes it while holding the cache lock; readers queued
//! behind it re-check the cache when they get the lock, so one expiry costs
//! one vendor call. Writes go straight to the API and do not touch the
//! cache. Vendor failures are logged, counted and swallowed: readers get
//! whatever the cache held before, writers get nothing back.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use neviweb_client_rs::{DeviceApi, DeviceStatePatch};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::accessories::state::DeviceState;
use crate::web::metrics::Metrics;
use crate::web::state::BridgeState;

pub(crate) const DEFAULT_TTL: Duration = Duration::from_secs(10);

struct Cached<S> {
    value: S,
    /// Unset until the first successful refresh.
    expires_at: Option<Instant>,
}

impl<S> Cached<S> {
    fn is_valid(&self) -> bool {
        self.expires_at.is_some_and(|at| at > Instant::now())
    }
}

pub(crate) struct CachedDevice<S> {
    device_id: String,
    api: Arc<dyn DeviceApi>,
    ttl: Duration,
    cached: Mutex<Cached<S>>,
    /// Completed refresh attempts, successful or not.
    attempts: AtomicU64,
    bridge_state: Option<BridgeState>,
}

impl<S: DeviceState> CachedDevice<S> {
    pub(crate) fn new(device_id: &str, api: Arc<dyn DeviceApi>, ttl: Duration) -> Self {
        Self {
            device_id: device_id.to_string(),
            api,
            ttl,
            cached: Mutex::new(Cached {
                value: S::default(),
                expires_at: None,
            }),
            attempts: AtomicU64::new(0),
            bridge_state: None,
        }
    }

    pub(crate) fn with_bridge_state(mut self, bridge_state: BridgeState) -> Self {
        self.bridge_state = Some(bridge_state);
        self
    }

    pub(crate) fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Returns the cached state, refreshing it first when it has expired.
    ///
    /// A caller that was queued while another caller's refresh attempt
    /// completed is served that attempt's result, even if it failed.
    pub(crate) async fn state(&self) -> S {
        let seen = self.attempts.load(Ordering::Acquire);
        let mut cached = self.cached.lock().await;

        if cached.is_valid() {
            Metrics::inc_cache_hits(S::DEVICE_TYPE.as_str());
            return cached.value.clone();
        }
        if self.attempts.load(Ordering::Acquire) != seen {
            debug!(
                "Device {} refreshed while waiting, serving that result",
                self.device_id
            );
            return cached.value.clone();
        }

        self.refresh(&mut cached).await;
        cached.value.clone()
    }

    /// Returns the cached state as is, without refreshing.
    pub(crate) async fn peek(&self) -> S {
        self.cached.lock().await.value.clone()
    }

    async fn refresh(&self, cached: &mut Cached<S>) {
        let device_type = S::DEVICE_TYPE.as_str();
        Metrics::inc_refreshes(device_type);

        match self.api.fetch_device(&self.device_id).await {
            Ok(snapshot) => {
                cached.value.apply(&snapshot);
                cached.expires_at = Some(Instant::now() + self.ttl);
                debug!("Device {} refreshed: {:?}", self.device_id, cached.value);
                if let Some(bridge_state) = &self.bridge_state {
                    bridge_state.record_refresh(&self.device_id, cached.value.describe());
                }
            }
            Err(e) => {
                error!(
                    "Failed to refresh {} {}, serving cached state: {}",
                    device_type, self.device_id, e
                );
                Metrics::inc_refresh_errors(device_type);
                if let Some(bridge_state) = &self.bridge_state {
                    bridge_state.record_refresh_failure(&self.device_id, e.to_string());
                }
            }
        }

        self.attempts.fetch_add(1, Ordering::AcqRel);
    }

    /// Sends a patch to the device. Best effort: failures are only logged.
    pub(crate) async fn send(&self, patch: DeviceStatePatch) {
        let device_type = S::DEVICE_TYPE.as_str();
        Metrics::inc_patches(device_type);

        match self.api.update_device(&self.device_id, &patch).await {
            Ok(()) => debug!("Device {} updated with {:?}", self.device_id, patch),
            Err(e) => {
                error!(
                    "Failed to update {} {} with {:?}: {}",
                    device_type, self.device_id, patch, e
                );
                Metrics::inc_patch_errors(device_type);
                if let Some(bridge_state) = &self.bridge_state {
                    bridge_state.record_patch_failure(&self.device_id, e.to_string());
                }
            }
        }
    }
}
