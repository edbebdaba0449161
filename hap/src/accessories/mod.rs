mod cached_device;
mod state;
mod switch;
#[cfg(test)]
mod test_helper;
mod thermostat;

pub(crate) use cached_device::{CachedDevice, DEFAULT_TTL};
pub(crate) use switch::{NeviwebSwitchAccessory, SwitchAdapter};
pub(crate) use thermostat::{NeviwebThermostatAccessory, ThermostatAdapter};
