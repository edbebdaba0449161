mod accessories;
mod bridge;
mod logging;
mod settings;
mod web;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use logging::{LogConfig, RotationPeriod, setup_logging};
use neviweb_client_rs::{DEFAULT_BASE_URL, NeviwebOptions};
use settings::Settings;
use tracing::warn;
use web::{WebConfig, start_web_server, state::BridgeState};

#[derive(Parser, Debug)]
pub struct Params {
    /// Session token of an authenticated Neviweb session
    #[clap(long, env = "NEVIWEB_SESSION_ID")]
    session_id: String,
    /// Base URL of the Neviweb API
    #[clap(long, env = "NEVIWEB_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Settings file (JSON) listing the devices to mount
    #[clap(long)]
    settings: Option<PathBuf>,
    /// Port for the status and metrics server (overrides the settings file)
    #[clap(long)]
    web_port: Option<u16>,
    /// Directory for rotated log files (if not set, logs go to stdout)
    #[clap(long)]
    log_dir: Option<PathBuf>,
    /// Log rotation period: hourly, daily or never
    #[clap(long, default_value = "daily")]
    log_rotation: RotationPeriod,
    /// Number of log files to keep (0 keeps all)
    #[clap(long, default_value = "7")]
    max_log_files: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let params = Params::parse();

    let _log_guard = setup_logging(params.log_dir.as_ref().map(|dir| LogConfig {
        log_dir: dir.clone(),
        rotation: params.log_rotation,
        max_log_files: params.max_log_files,
        ..Default::default()
    }))?;

    let settings = load_settings(params.settings.as_ref());
    if settings.devices.is_empty() {
        warn!("No devices configured, the bridge will only expose itself");
    }

    let bridge_state = BridgeState::new();
    start_web_server(
        WebConfig {
            port: params.web_port.unwrap_or(settings.web_port),
            enabled: settings.web_enabled,
        },
        bridge_state.clone(),
    )
    .await
    .context("Failed to start web server")?;

    let options = NeviwebOptions::builder()
        .base_url(params.base_url)
        .session_id(params.session_id)
        .build()?;

    bridge::start_bridge(options, settings, bridge_state).await
}

fn load_settings(path: Option<&PathBuf>) -> Settings {
    let Some(path) = path else {
        return Settings::default();
    };
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(
                "Invalid settings file {}: {}, using default settings",
                path.display(),
                e
            );
            Settings::default()
        }),
        Err(e) => {
            warn!(
                "Failed to read settings file {}: {}, using default settings",
                path.display(),
                e
            );
            Settings::default()
        }
    }
}
