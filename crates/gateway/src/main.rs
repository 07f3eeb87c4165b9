//! NMEA2000 Telemetry Gateway - Main Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use gateway::{init_logging, run, spawn_operator_reader, Gateway, GatewayConfig};
use n2k_protocol::open_serial;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use storage::{CsvSink, Repository, SampleSink};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "n2k-gateway")]
#[command(about = "NMEA2000 telemetry gateway over an SLCAN serial bridge", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "N2K_CONFIG")]
    config: Option<PathBuf>,

    /// Serial device, overrides the configuration file
    #[arg(short, long)]
    device: Option<String>,

    /// CSV log directory, overrides the configuration file
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = GatewayConfig::load(cli.config.as_deref())?;
    if let Some(device) = cli.device {
        config.serial.device = device;
    }
    if let Some(dir) = cli.log_dir {
        config.storage.log_dir = Some(dir);
    }

    init_logging(&config.log_level).context("Failed to set tracing subscriber")?;
    info!("=== NMEA2000 Gateway v{} ===", env!("CARGO_PKG_VERSION"));

    let mut memory = None;
    let sink: Box<dyn SampleSink + Send> = match &config.storage.log_dir {
        Some(dir) => Box::new(CsvSink::open(dir)?),
        None => {
            info!("No log directory configured, keeping samples in memory");
            let repo = Arc::new(Repository::new());
            memory = Some(Arc::clone(&repo));
            Box::new(repo)
        }
    };

    let mut gateway = Gateway::new(&config, sink)?;
    let (reader, writer) = open_serial(&config.serial.device, config.serial.baud_rate)
        .with_context(|| format!("Failed to open {}", config.serial.device))?;

    let (tx, rx) = mpsc::channel(16);
    spawn_operator_reader(BufReader::new(std::io::stdin()), tx);

    tokio::select! {
        result = run(&mut gateway, reader, writer, rx) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    let session = gateway.aggregator().session();
    info!(
        "Session: {} samples, true wind {:?}..{:?} m/s, {} sink failures",
        session.samples,
        session.true_wind_min_ms,
        session.true_wind_max_ms,
        gateway.aggregator().total_sink_failures()
    );
    if let Some(repo) = memory {
        info!("{} points held in memory", repo.count());
    }
    Ok(())
}
