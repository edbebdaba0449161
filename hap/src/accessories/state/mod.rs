pub(crate) mod switch;
pub(crate) mod thermostat;

use std::fmt::Debug;

use neviweb_client_rs::DeviceStateSnapshot;

use crate::web::state::DeviceType;

/// Hub-facing view of a device, derived from vendor snapshots.
pub(crate) trait DeviceState: Debug + Clone + Default + Send + Sync + 'static {
    const DEVICE_TYPE: DeviceType;

    /// Folds a fresh snapshot into the cached fields. Fields the snapshot
    /// does not carry keep their previous value.
    fn apply(&mut self, snapshot: &DeviceStateSnapshot);

    /// Short status line for the bridge status endpoint.
    fn describe(&self) -> String;
}
