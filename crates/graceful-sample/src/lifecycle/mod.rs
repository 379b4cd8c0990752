//! # System Lifecycle & Orchestration
//!
//! [`AppSystem`] is the conductor of the sample: it builds every service, hands the shared
//! instances to each other, registers them with a [`Graceful`] manager under their
//! dependency names and exposes one `start` and one `shutdown` for the whole set.
//!
//! ```text
//!            ┌──────────┐
//!            │ database │
//!            └────▲─────┘
//!                 │
//!            ┌────┴─────┐      ┌───────┐
//!            │  cache   │      │ queue │
//!            └────▲─────┘      └───▲───┘
//!                 │                │
//!                 └──── http ──────┘
//! ```
//!
//! `database` and `queue` start in parallel, `cache` waits for `database`, and `http` waits
//! for both `cache` and `queue`. Shutdown runs the manager's stop as a deadline-bounded
//! cleanup, so services go down in the reverse of the order they came up.
//!
//! ## Configuration
//!
//! [`AppConfig`] deserializes with every field optional; the lifecycle section is the core
//! [`Config`] flattened in:
//!
//! ```json
//! { "database_url": "postgres://db/app", "http_port": 9000, "failure_policy": "include" }
//! ```

use std::sync::Arc;
use std::time::Duration;

use graceful::{run_cleanups, Config, Graceful};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use crate::services::{Cache, Database, HttpApi, Queue};

pub const DATABASE: &str = "database";
pub const CACHE: &str = "cache";
pub const QUEUE: &str = "queue";
pub const HTTP: &str = "http";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub http_port: u16,
    pub connect_latency_ms: u64,
    pub queue_poll_ms: u64,
    #[serde(flatten)]
    pub lifecycle: Config,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/app".to_string(),
            http_port: 8080,
            connect_latency_ms: 50,
            queue_poll_ms: 10,
            lifecycle: Config::default(),
        }
    }
}

/// Every sample service, wired and registered with one manager.
pub struct AppSystem {
    pub database: Arc<Database>,
    pub cache: Arc<Cache>,
    pub queue: Arc<Queue>,
    pub http: Arc<HttpApi>,
    manager: Arc<Graceful>,
}

impl AppSystem {
    pub fn new(config: &AppConfig) -> Self {
        let database = Arc::new(Database::new(
            config.database_url.clone(),
            Duration::from_millis(config.connect_latency_ms),
        ));
        let cache = Arc::new(Cache::new(Arc::clone(&database)));
        // A zero period would make the worker's interval panic.
        let queue = Arc::new(Queue::new(Duration::from_millis(config.queue_poll_ms.max(1))));
        let http = Arc::new(HttpApi::new(
            config.http_port,
            Arc::clone(&cache),
            Arc::clone(&queue),
        ));

        let mut manager = Graceful::with_config(config.lifecycle.clone());
        manager.add_arc(HTTP, http.clone(), &[CACHE, QUEUE]);
        manager.add_arc(CACHE, cache.clone(), &[DATABASE]);
        manager.add_arc(QUEUE, queue.clone(), &[]);
        manager.add_arc(DATABASE, database.clone(), &[]);

        Self {
            database,
            cache,
            queue,
            http,
            manager: Arc::new(manager),
        }
    }

    pub fn manager(&self) -> &Graceful {
        &self.manager
    }

    /// Starts every service and waits until each one started or failed.
    pub async fn start(&self, ctx: CancellationToken) -> Result<(), graceful::Error> {
        async {
            self.manager.start(ctx).await?;
            self.manager.wait_started().await?;
            info!(order = ?self.manager.started(), "System up");
            Ok::<(), graceful::Error>(())
        }
        .instrument(tracing::info_span!("system_start"))
        .await
    }

    /// Stops every started service in reverse order within the configured cleanup timeout.
    pub async fn shutdown(&self, ctx: CancellationToken) -> Result<(), graceful::Error> {
        let timeout = self.manager.config().cleanup_timeout;
        info!(?timeout, "Shutting down system");
        let result = run_cleanups(ctx, vec![self.manager.stop_cleanup()], timeout)
            .instrument(tracing::info_span!("system_shutdown"))
            .await;
        if let Err(e) = result {
            for failure in self.manager.errors() {
                warn!(error = %failure, "Shutdown left a failure behind");
            }
            return Err(e.into());
        }
        info!("System shutdown complete");
        Ok(())
    }
}
