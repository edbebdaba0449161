mod device;
mod switch;
mod thermostat;

pub use device::print_device;
pub use switch::switch;
pub use thermostat::{set_mode, set_temperature};
