use neviweb_client_rs::{DeviceApi, NeviwebClientError};

use crate::{Params, utils::create_client};

pub async fn print_device(params: &Params, id: &str) -> Result<(), NeviwebClientError> {
    let client = create_client(params)?;
    let snapshot = client.fetch_device(id).await?;
    println!("Device {id}");
    if let Some(temperature) = snapshot.room_temperature {
        println!("  room temperature: {temperature:.1}");
    }
    if let Some(setpoint) = snapshot.room_setpoint {
        println!("  setpoint:         {setpoint:.1}");
    }
    if let Some(mode) = &snapshot.setpoint_mode {
        println!("  setpoint mode:    {mode}");
    }
    if let Some(output) = snapshot.output_percent {
        println!("  output:           {output}%");
    }
    if let Some(on_off) = &snapshot.on_off {
        println!("  on/off:           {on_off}");
    }
    if let Some(wattage) = snapshot.wattage {
        println!("  wattage:          {wattage} W");
    }
    if let Some(code) = &snapshot.error_code {
        println!("  error code:       {code}");
    }
    if let Some(dr) = &snapshot.demand_response {
        println!("  demand response:  {dr}");
    }
    Ok(())
}
