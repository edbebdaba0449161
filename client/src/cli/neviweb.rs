mod commands;
mod utils;

use clap::{Parser, Subcommand, ValueEnum};
use neviweb_client_rs::{DEFAULT_BASE_URL, NeviwebClientError};
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Mode {
    Auto,
    Off,
    Manual,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Power {
    On,
    Off,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Print the current attributes of a device
    Get {
        #[arg(long)]
        id: String,
    },
    /// Change the setpoint of a thermostat
    SetTemperature {
        #[arg(long)]
        id: String,
        #[arg(long)]
        value: f64,
    },
    /// Change the setpoint mode of a thermostat
    SetMode {
        #[arg(long)]
        id: String,
        #[arg(long, value_enum)]
        mode: Mode,
    },
    /// Turn a switch on or off
    Switch {
        #[arg(long)]
        id: String,
        #[arg(long, value_enum)]
        power: Power,
    },
}

#[derive(Parser, Debug)]
struct Params {
    /// Session token of an authenticated Neviweb session
    #[clap(long, env = "NEVIWEB_SESSION_ID")]
    session_id: String,
    /// Base URL of the Neviweb API
    #[clap(long, env = "NEVIWEB_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), NeviwebClientError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let params = Params::parse();

    match &params.command {
        Commands::Get { id } => commands::print_device(&params, id).await?,
        Commands::SetTemperature { id, value } => {
            commands::set_temperature(&params, id, *value).await?
        }
        Commands::SetMode { id, mode } => {
            let mode = match mode {
                Mode::Auto => "auto",
                Mode::Off => "off",
                Mode::Manual => "manual",
            };
            commands::set_mode(&params, id, mode).await?
        }
        Commands::Switch { id, power } => {
            commands::switch(&params, id, matches!(power, Power::On)).await?
        }
    }

    Ok(())
}
