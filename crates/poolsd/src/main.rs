// # poolsd - instance pool service discovery daemon
//
// Publishes the IP addresses of the members of an Exoscale instance pool
// as a Prometheus static service discovery file, refreshed on a fixed
// interval.
//
// This daemon is a thin integration layer: it reads configuration, sets
// up logging and the runtime, and runs a `poolsd_core::Poller`. Lookup,
// output and the failure policy live in the library crates.
//
// ## Configuration
//
// Every flag can also be set through the environment:
//
// - `--instance-pool-id` / `POOLSD_INSTANCE_POOL_ID`: ID of the instance pool to query
// - `--exoscale-zone-id` / `POOLSD_EXOSCALE_ZONE_ID`: Exoscale zone ID
// - `--exoscale-endpoint` / `POOLSD_EXOSCALE_ENDPOINT`: Endpoint URL of the Exoscale API
// - `--exoscale-api-key` / `POOLSD_EXOSCALE_API_KEY`: API key for Exoscale
// - `--exoscale-api-secret` / `POOLSD_EXOSCALE_API_SECRET`: API secret for Exoscale
// - `--prometheus-file` / `POOLSD_PROMETHEUS_FILE`: Static service discovery file for Prometheus
// - `--poll-interval-secs` / `POOLSD_POLL_INTERVAL_SECS`: Seconds between refreshes (default 10)
// - `--max-consecutive-failures` / `POOLSD_MAX_CONSECUTIVE_FAILURES`: Transient API failures tolerated in a row (default 0)
// - `--log-level` / `POOLSD_LOG_LEVEL`: trace, debug, info, warn or error
//
// ## Example
//
// ```bash
// export POOLSD_EXOSCALE_API_KEY=EXO...
// export POOLSD_EXOSCALE_API_SECRET=...
//
// poolsd \
//     --exoscale-zone-id 4da1b188-dcd6-4ff5-b7fd-bde984055548 \
//     --instance-pool-id e3c5d2a4-9b1c-4f3e-8a7d-2b6f0c1d9e8f \
//     --prometheus-file /var/run/prometheus-sd-exoscale-instance-pools/config.json
// ```

mod config;

use anyhow::Result;
use poolsd_core::{FileTargetSink, Poller, PollerEvent};
use poolsd_provider_exoscale::ExoscaleClient;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

use config::Config;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum PoolsdExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (API or output failure)
    RuntimeError = 2,
}

impl From<PoolsdExitCode> for ExitCode {
    fn from(code: PoolsdExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load configuration from flags and environment
    let config = match Config::load() {
        Ok(Some(cfg)) => cfg,
        Ok(None) => return PoolsdExitCode::CleanShutdown.into(),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return PoolsdExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return PoolsdExitCode::ConfigError.into();
    }

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return PoolsdExitCode::ConfigError.into();
    }

    info!("Starting poolsd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PoolsdExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let poller = match build_poller(&config).await {
            Ok(poller) => poller,
            Err(e) => {
                error!("Startup error: {}", e);
                return PoolsdExitCode::ConfigError;
            }
        };

        if let Err(e) = poller.run().await {
            error!("Failed to refresh instance pool targets, crashing out: {}", e);
            PoolsdExitCode::RuntimeError
        } else {
            info!("Shutting down daemon");
            PoolsdExitCode::CleanShutdown
        }
    })
    .into()
}

/// Wire the Exoscale source and the file sink into a poller
async fn build_poller(config: &Config) -> Result<Poller> {
    let poller_config = config.to_poller_config();
    poller_config.validate()?;

    let source = ExoscaleClient::from_config(&poller_config.provider)?;
    info!("Using Exoscale API endpoint {}", source.endpoint());

    let sink = FileTargetSink::new(&poller_config.output.path).await?;

    let (poller, event_rx) = Poller::new(Box::new(source), Box::new(sink), &poller_config)?;
    tokio::spawn(log_events(event_rx));

    Ok(poller)
}

/// Drain poller events into the debug log
async fn log_events(mut event_rx: mpsc::Receiver<PollerEvent>) {
    while let Some(event) = event_rx.recv().await {
        debug!("Poller event: {:?}", event);
    }
}
