//! # Graceful Sample
//!
//! A small backend made of four services with dependencies between them.
//!
//! ## 🚀 What it shows
//!
//! - **[services](graceful_sample::services)**: `Database`, `Cache`, `Queue` and `HttpApi`,
//!   each a [`graceful::Service`].
//! - **[lifecycle](graceful_sample::lifecycle)**: `AppSystem` registers them with a
//!   [`graceful::Graceful`] manager, starts them in dependency order and shuts them down in
//!   reverse.
//!
//! ## 📚 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run -p graceful-sample
//! RUST_LOG=debug cargo run -p graceful-sample   # dependency waits, queue ticks
//! ```

use std::time::Duration;

use graceful::setup_tracing;
use graceful_sample::lifecycle::{AppConfig, AppSystem};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), graceful::Error> {
    setup_tracing();

    let config = AppConfig::default();
    info!(?config, "Starting sample system");

    let system = AppSystem::new(&config);
    let ctx = CancellationToken::new();

    if let Err(e) = system.start(ctx.clone()).await {
        error!(error = %e, "System failed to start");
        system.shutdown(ctx).await?;
        return Err(e);
    }

    let span = tracing::info_span!("requests");
    async {
        for key in ["user:1", "user:2", "user:9"] {
            match system.http.handle(key).await {
                Ok(Some(value)) => info!(key, value = %value, "Hit"),
                Ok(None) => info!(key, "Miss"),
                Err(e) => error!(key, error = %e, "Request failed"),
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    .instrument(span)
    .await;

    system.shutdown(ctx).await?;
    info!(queue_ticks = system.queue.processed(), "Sample completed");
    Ok(())
}
