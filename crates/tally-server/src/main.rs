//! # Tally
//!
//! Host process relaying analytics events from stdin to a vendor client.
//!
//! ## Usage
//!
//! ```bash
//! # Relay newline-delimited JSON events
//! cat events.ndjson | tally
//!
//! # Supply the vendor token from the environment
//! TALLY_TOKEN=abc123 tally < events.ndjson
//!
//! # Print the vendor calls instead of logging them (dry_run = true in tally.toml)
//! tally < events.ndjson
//! ```

mod config;
mod ingest;
mod metrics;

use anyhow::Result;
use std::sync::Arc;
use tenvis_tally_core::{Router, INTEGRATION_KEY};
use tenvis_tally_vendor::{ClientFactory, RecordingFactory, TracingFactory};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the dry-run journal
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tally=info,tenvis_tally_core=info,tenvis_tally_vendor=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config::Config::load()?;

    info!(
        integration = INTEGRATION_KEY,
        format = ?config.input.format,
        dry_run = config.dry_run,
        "Starting Tally"
    );

    metrics::init_metrics();
    if config.metrics.enabled {
        metrics::start_metrics_server(config.metrics.port)?;
    }

    let recording = config.dry_run.then(|| Arc::new(RecordingFactory::new()));
    let factory: Arc<dyn ClientFactory> = match &recording {
        Some(recording) => Arc::clone(recording) as Arc<dyn ClientFactory>,
        None => Arc::new(TracingFactory::new()),
    };

    let router = Router::from_settings(&config.bundle(), factory);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    ingest::run(tokio::io::stdin(), &router, &config.input, shutdown).await?;

    if let Some(recording) = recording {
        for call in recording.journal().calls() {
            println!("{call:?}");
        }
    }

    Ok(())
}
