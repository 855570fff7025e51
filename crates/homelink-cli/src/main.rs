use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use homelink_core::{
    telemetry, DeviceLink, JsonFileStore, LinkConfig, SerialLink, StateStore, StoreDocument,
    Supervisor, SupervisorConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "homelinkd")]
#[command(about = "LED zone and temperature controller daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Shared state store, also read/written by the dashboard.
    #[arg(long, default_value = "./data/homelink.json")]
    store: PathBuf,

    #[arg(long, default_value_t = 9600)]
    baud_rate: u32,

    #[arg(long, default_value_t = 100)]
    read_timeout_ms: u64,

    #[arg(long, default_value_t = 800)]
    poll_interval_ms: u64,

    #[arg(long, default_value_t = 1000)]
    settle_delay_ms: u64,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the device supervisor until interrupted.
    Run {
        /// Serial port seeded into a fresh store; an existing store keeps
        /// its own port.
        #[arg(long, default_value = "/dev/ttyACM0")]
        port: String,
    },
    /// Connect, read one line, and print a diagnostic report.
    Once,
    /// Print the shared status, port, and zone colors.
    Status,
    /// Update a zone color and request a push to the device.
    SetColor {
        #[arg(long)]
        zone: String,
        #[arg(short, long)]
        red: u8,
        #[arg(short, long)]
        green: u8,
        #[arg(short, long)]
        blue: u8,
    },
    /// Change the serial port picked up at the next reconnect.
    SetPort { port: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let link_config = LinkConfig {
        baud_rate: cli.baud_rate,
        read_timeout: Duration::from_millis(cli.read_timeout_ms),
    };
    let config = SupervisorConfig {
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
        settle_delay: Duration::from_millis(cli.settle_delay_ms),
        ..SupervisorConfig::default()
    };

    let store = JsonFileStore::open(&cli.store);

    match cli.command {
        Command::Run { port } => {
            if let Some(parent) = cli.store.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            store.seed_if_missing(&StoreDocument::seed(&port, &config.zones))?;

            let link = SerialLink::new(link_config);
            let supervisor = Supervisor::new(link, store, config);
            let task = tokio::spawn(supervisor.run());

            tokio::signal::ctrl_c().await?;
            warn!("received ctrl-c, stopping");
            task.abort();
        }
        Command::Once => {
            let port = store.get_port()?;
            let mut link = SerialLink::new(link_config);

            let report = match link.connect(&port).await {
                Err(err) => serde_json::json!({
                    "port": port,
                    "connected": false,
                    "error": err.to_string(),
                }),
                Ok(()) => match link.read().await {
                    Err(err) => serde_json::json!({
                        "port": port,
                        "connected": false,
                        "error": err.to_string(),
                    }),
                    Ok(bytes) => {
                        let text = String::from_utf8_lossy(&bytes);
                        let line = text.trim_end_matches(['\r', '\n']);
                        let parsed = telemetry::parse_line(line);
                        serde_json::json!({
                            "port": port,
                            "connected": true,
                            "bytes": bytes.len(),
                            "line": line,
                            "temperature": parsed.as_ref().ok().map(|frame| frame.value),
                            "parse_error": parsed.err().map(|err| err.to_string()),
                        })
                    }
                },
            };
            link.close().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Status => {
            let doc = store.document()?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Command::SetColor {
            zone,
            red,
            green,
            blue,
        } => {
            store.set_zone_color(&zone, red, green, blue)?;
            store.request_update()?;
            info!(zone = %zone, red, green, blue, "color updated, push requested");
        }
        Command::SetPort { port } => {
            store.set_port(&port)?;
            info!(port = %port, "port updated");
        }
    }

    Ok(())
}
