use neviweb_client_rs::{DeviceApi, DeviceStatePatch, NeviwebClientError};

use crate::{Params, utils::create_client};

pub async fn switch(params: &Params, id: &str, on: bool) -> Result<(), NeviwebClientError> {
    let client = create_client(params)?;
    client.update_device(id, &DeviceStatePatch::on_off(on)).await?;
    println!("Device {} turned {}", id, if on { "on" } else { "off" });
    Ok(())
}
