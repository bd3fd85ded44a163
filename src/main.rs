//! Herpstat SpyderWeb Exporter Binary
//!
//! Serves Prometheus metrics for a Herpstat SpyderWeb, or prints a single
//! snapshot of it.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use herpstat_exporter::{
    device::{HttpStatusSource, TokioClock},
    metrics::{encode, snapshot_families, Descriptors},
    start_web_server, DeviceCollector, DeviceConfig, PollCoordinator, Snapshot, WebConfig,
    DEFAULT_TELEMETRY_PATH, DEFAULT_WEB_PORT,
};
use std::time::Duration;
use tracing::{info, info_span};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "herpstat_exporter")]
#[command(about = "Prometheus exporter for Herpstat SpyderWeb controllers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Polls a Herpstat SpyderWeb's /RAWSTATUS page on every scrape (at most once every 10 seconds) and exposes the readings as Prometheus metrics"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Your Herpstat SpyderWeb's address
    #[arg(long, env = "HERPSTAT_ADDRESS", value_name = "1.2.3.4")]
    herpstat_address: String,

    /// Web server bind address
    #[arg(long, env = "HERPSTAT_EXPORTER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Web server port
    #[arg(short, long, env = "HERPSTAT_EXPORTER_PORT", default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Path under which to expose metrics
    #[arg(long, env = "HERPSTAT_EXPORTER_TELEMETRY_PATH", default_value = DEFAULT_TELEMETRY_PATH)]
    telemetry_path: String,

    /// Timeout for each request to the device, in seconds
    #[arg(long, default_value_t = 5)]
    request_timeout: u64,

    /// Enable debug logging. It's very noisy!
    #[arg(short, long, env = "HERPSTAT_EXPORTER_DEBUG")]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the metrics server (default)
    Serve,

    /// Poll the device once, print the snapshot and exit
    Snapshot {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = SnapshotFormat::Pretty)]
        format: SnapshotFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SnapshotFormat {
    Json,
    Pretty,
    Metrics,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Snapshot { format }) => snapshot_command(&cli, *format).await,
        Some(Commands::Serve) | None => serve_command(&cli).await,
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let default_level = if cli.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(cli.debug)
        .with_line_number(cli.debug)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn device_config(cli: &Cli) -> DeviceConfig {
    DeviceConfig::new(cli.herpstat_address.trim())
        .with_request_timeout(Duration::from_secs(cli.request_timeout))
}

async fn serve_command(cli: &Cli) -> anyhow::Result<()> {
    info!("Starting Herpstat SpyderWeb Exporter");

    let device = device_config(cli);
    info!("Herpstat URL: {}", device.status_url());

    let collector = DeviceCollector::for_device(&device).context("invalid device configuration")?;
    let web_config = WebConfig::new(&cli.host, cli.port).with_telemetry_path(&cli.telemetry_path);

    info!("Web server configuration:");
    info!("  - Bind address: {}", web_config.bind_address());
    info!("  - Telemetry path: {}", web_config.telemetry_path);
    info!("  - Poll interval: {}s", device.poll_interval.as_secs());

    start_web_server(web_config, collector).await?;

    Ok(())
}

async fn snapshot_command(cli: &Cli, format: SnapshotFormat) -> anyhow::Result<()> {
    let device = device_config(cli);
    device.validate().context("invalid device configuration")?;

    let source = HttpStatusSource::new(&device)?;
    let span = info_span!("herpstat", device = %device.address);
    let mut coordinator = PollCoordinator::new(source, TokioClock, &device, span);

    let outcome = coordinator.poll_outcome().await;
    if !outcome.is_success() {
        bail!("unable to get data from {}", device.status_url());
    }
    let snapshot = coordinator.cache().current();

    match format {
        SnapshotFormat::Json => {
            println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
        }
        SnapshotFormat::Pretty => print_pretty_snapshot(&snapshot),
        SnapshotFormat::Metrics => {
            print!("{}", encode(&snapshot_families(&Descriptors::new(), &snapshot, outcome)));
        }
    }

    Ok(())
}

fn print_pretty_snapshot(snapshot: &Snapshot) {
    let system = &snapshot.system;

    println!("🦎 Herpstat Snapshot");
    println!("==========================================");
    if let Some(fetched_at) = snapshot.fetched_at {
        println!("  Fetched: {}", fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!();

    println!("🖥️  System:");
    println!("  Name: {}", system.name);
    println!("  IP: {}  MAC: {}", system.ip, system.mac);
    println!("  Firmware: {}", system.firmware_label());
    println!("  Internal temperature: {:.1}", system.temp);
    println!("  Power resets: {:.0}", system.power_resets);
    if system.safety_relay_tripped() {
        println!("  Safety relay: 🔥 {}", system.safety_relay);
    } else {
        println!("  Safety relay: ✅ {}", system.safety_relay);
    }
    println!();

    println!("🔌 Outputs ({:.0} declared):", system.output_count);
    for output in snapshot.reported_outputs() {
        println!("  [{}] {} ({})", output.id, output.name, output.mode);
        println!(
            "      Power: {:.0}% (limit {:.0}%)",
            output.power, output.power_limit
        );
        println!(
            "      Probe: {:.1}° / {:.1}% RH",
            output.probe_temp, output.probe_humidity
        );
        if output.is_ramping() {
            println!("      Ramping: {} (ends at {:.1})", output.ramping, output.ramp_end);
        }
        if output.error_code != 0.0 {
            println!(
                "      Error {:.0}: {}",
                output.error_code, output.error_description
            );
        }
    }
}
