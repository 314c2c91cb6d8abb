//! CLI for reading bluetooth values from OWON multimeters.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

use owon_ble::{
    BleTransport, DeviceSession, DiscoveryCoordinator, MeasurementFormatter, OutputEncoding,
    Result, DEVICE_NAME,
};

/// How long to wait for a multimeter to appear before giving up.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(60);

/// A tool for reading bluetooth values from OWON multimeters.
#[derive(Parser, Debug)]
#[command(author, about, version)]
struct Options {
    /// Set custom format type. Omit to get a legible tabular output.
    #[arg(long, value_enum)]
    format: Option<OutputEncoding>,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(options: Options) -> Result<()> {
    // Configuration errors fail before any transport activity starts.
    let formatter = MeasurementFormatter::new(options.format.unwrap_or_default())?;

    let coordinator = DiscoveryCoordinator::new().await?;
    info!("Looking for multimeters...");
    let device = coordinator
        .discover(|name| name == DEVICE_NAME, DISCOVERY_TIMEOUT)
        .await?;

    let transport = BleTransport::new(coordinator.adapter().clone(), device.peripheral);
    let session = DeviceSession::new(device.address, transport, true);

    let mut measurements = session.subscribe_measurements();
    let printer = tokio::spawn(async move {
        loop {
            match measurements.recv().await {
                Ok(event) => {
                    let line =
                        formatter.format(&event.address, event.timestamp, &event.measurement);
                    // Flush per line; consumers may be piping into a live plot.
                    let mut stdout = std::io::stdout().lock();
                    if writeln!(stdout, "{line}")
                        .and_then(|_| stdout.flush())
                        .is_err()
                    {
                        break;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = session.run().await;
    printer.abort();
    result
}

#[tokio::main]
async fn main() {
    let options = Options::parse();
    init_logging(options.verbose);

    if let Err(e) = run(options).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
