use crate::accessories::{
    CachedDevice, NeviwebSwitchAccessory, NeviwebThermostatAccessory, SwitchAdapter,
    ThermostatAdapter,
};
use crate::settings::{DeviceConfig, Settings};
use crate::web::state::{BridgeState, DeviceInfo, DeviceType};
use anyhow::{Context, Result};
use hap::{
    Config, MacAddress, Pin,
    accessory::{AccessoryCategory, AccessoryInformation, bridge::BridgeAccessory},
    server::{IpServer, Server},
    storage::{FileStorage, Storage},
};
use neviweb_client_rs::{DeviceApi, NeviwebClient, NeviwebOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

/// HomeKit category code for bridges, as used in setup URIs.
const BRIDGE_CATEGORY: u64 = 2;
/// Used when the host has no readable MAC address.
const FALLBACK_DEVICE_ID: [u8; 6] = [0x4e, 0x56, 0x57, 0x42, 0x00, 0x01];

/// Builds the `X-HM://` URI encoded in HomeKit pairing QR codes.
fn generate_setup_uri(pincode: &str, category: u64, setup_id: &str) -> String {
    const VERSION: u64 = 0;
    const RESERVED: u64 = 0;
    // Supports IP transport.
    const FLAGS: u64 = 2;

    let code = pincode.replace('-', "").parse::<u64>().unwrap_or(0);
    let payload = ((VERSION & 0x7) << 43)
        | ((RESERVED & 0xf) << 39)
        | ((category & 0xff) << 31)
        | ((FLAGS & 0xf) << 27)
        | (code & 0x07ff_ffff);

    format!("X-HM://{:0>9}{setup_id}", to_base36(payload))
}

fn to_base36(mut num: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(num % 36) as usize]);
        num /= 36;
        if num == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

async fn load_or_create_config(storage: &mut FileStorage, settings: &Settings) -> Result<Config> {
    if let Ok(mut config) = storage.load_config().await {
        info!("Loaded config");
        config.redetermine_local_ip();
        storage.save_config(&config).await?;
        return Ok(config);
    }

    info!("Creating new config");
    let device_id = match mac_address::get_mac_address() {
        Ok(Some(mac)) => mac.bytes(),
        Ok(None) | Err(_) => {
            warn!("Could not read a MAC address, using a fixed device id");
            FALLBACK_DEVICE_ID
        }
    };
    let config = Config {
        pin: Pin::new(settings.pairing_code).context("Invalid pairing code")?,
        name: settings.bridge_name.clone(),
        device_id: MacAddress::from(device_id),
        category: AccessoryCategory::Bridge,
        ..Default::default()
    };
    storage.save_config(&config).await?;
    Ok(config)
}

async fn mount_device(
    aid: u64,
    device: &DeviceConfig,
    api: Arc<dyn DeviceApi>,
    ttl: Duration,
    server: &IpServer,
    bridge_state: &BridgeState,
) -> Result<()> {
    bridge_state.register_device(DeviceInfo::new(
        &device.id,
        &device.name,
        device.device_type,
    ));

    match device.device_type {
        DeviceType::Thermostat => {
            let cache =
                CachedDevice::new(&device.id, api, ttl).with_bridge_state(bridge_state.clone());
            let adapter = ThermostatAdapter::new(cache);
            let accessory = NeviwebThermostatAccessory::new(aid, device, adapter, server).await?;
            info!("Thermostat {} added to the hub", accessory.get_neviweb_id());
        }
        DeviceType::Switch => {
            let cache =
                CachedDevice::new(&device.id, api, ttl).with_bridge_state(bridge_state.clone());
            let adapter = SwitchAdapter::new(cache);
            let accessory = NeviwebSwitchAccessory::new(aid, device, adapter, server).await?;
            info!("Switch {} added to the hub", accessory.get_neviweb_id());
        }
    }
    Ok(())
}

pub async fn start_bridge(
    options: NeviwebOptions,
    settings: Settings,
    bridge_state: BridgeState,
) -> Result<()> {
    let client = NeviwebClient::new(options).context("Failed to create Neviweb client")?;
    let api: Arc<dyn DeviceApi> = Arc::new(client);

    let bridge = BridgeAccessory::new(
        1,
        AccessoryInformation {
            name: settings.bridge_name.clone(),
            serial_number: "NVWB-0001".into(),
            manufacturer: "Neviweb".into(),
            model: "Neviweb HomeKit Bridge".into(),
            ..Default::default()
        },
    )?;

    let mut storage = FileStorage::current_dir().await?;
    let config = load_or_create_config(&mut storage, &settings).await?;
    let pin = config.pin.to_string();

    let server = IpServer::new(config, storage).await?;
    info!("IP server created, adding bridge accessory...");
    server.add_accessory(bridge).await?;

    let ttl = settings.cache_ttl();
    info!("Device state cache TTL: {:?}", ttl);

    let mut aid: u64 = 1;
    let mut mounted = std::collections::HashSet::new();
    for device in &settings.devices {
        if !mounted.insert(device.id.as_str()) {
            warn!("Device {} is listed twice, skipping", device.id);
            continue;
        }
        aid += 1;
        info!(
            "Adding {} {} ({}) with id {aid}{}",
            device.device_type.as_str(),
            device.id,
            device.name,
            device
                .parent_id
                .as_deref()
                .map(|p| format!(", parent {p}"))
                .unwrap_or_default()
        );
        if let Err(err) =
            mount_device(aid, device, api.clone(), ttl, &server, &bridge_state).await
        {
            error!("Failed to add device {}: {}", device.id, err);
            bridge_state.record_mount_failure(&device.id, format!("mount failed: {err}"));
        }
    }

    info!("Starting HAP bridge server...");
    let handle = server.run_handle();
    let uri = generate_setup_uri(&pin, BRIDGE_CATEGORY, &settings.setup_id);
    info!(
        "PIN for the bridge accessory is: {pin}, setup ID: {}",
        settings.setup_id
    );
    bridge_state.set_pairing(pin, uri.clone());
    if let Err(e) = qr2term::print_qr(&uri) {
        warn!("Failed to print pairing QR code: {}", e);
    }

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        res = handle => {
            res.context("HAP server stopped")
        }
        _ = ctrl_c => {
            info!("signal received, shutting down");
            Ok(())
        },
        _ = terminate => {
            info!("signal received, shutting down");
            Ok(())
        },
    }
}
