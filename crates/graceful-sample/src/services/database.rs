use std::time::Duration;

use async_trait::async_trait;
use graceful::{BoxError, Service};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{SampleError, Status};

/// Simulated database connection.
#[derive(Debug)]
pub struct Database {
    url: String,
    connect_latency: Duration,
    status: Status,
}

impl Database {
    pub fn new(url: impl Into<String>, connect_latency: Duration) -> Self {
        Self {
            url: url.into(),
            connect_latency,
            status: Status::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Rows served to the cache warm-up.
    pub fn load(&self) -> Result<Vec<(String, String)>, SampleError> {
        if !self.is_running() {
            return Err(SampleError::NotRunning("database"));
        }
        Ok((1..=3)
            .map(|i| (format!("user:{i}"), format!("user-{i}")))
            .collect())
    }
}

#[async_trait]
impl Service for Database {
    async fn start(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        debug!(url = %self.url, latency = ?self.connect_latency, "Connecting");
        tokio::select! {
            _ = tokio::time::sleep(self.connect_latency) => {}
            _ = ctx.cancelled() => return Err(SampleError::Interrupted("database").into()),
        }
        self.status.set(true);
        info!(url = %self.url, "Database connected");
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        self.status.set(false);
        info!(url = %self.url, "Database disconnected");
        Ok(())
    }
}
