use neviweb_client_rs::{DeviceApi, DeviceStatePatch, NeviwebClientError, SetpointMode};

use crate::{Params, utils::create_client};

pub async fn set_temperature(
    params: &Params,
    id: &str,
    value: f64,
) -> Result<(), NeviwebClientError> {
    let client = create_client(params)?;
    client
        .update_device(id, &DeviceStatePatch::room_setpoint(value))
        .await?;
    println!("Device {id} setpoint set to {value:.1}");
    Ok(())
}

pub async fn set_mode(params: &Params, id: &str, mode: &str) -> Result<(), NeviwebClientError> {
    let client = create_client(params)?;
    let mode = SetpointMode::from(mode);
    client
        .update_device(id, &DeviceStatePatch::setpoint_mode(mode.clone()))
        .await?;
    println!("Device {id} setpoint mode set to {mode}");
    Ok(())
}
