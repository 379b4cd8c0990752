use std::sync::Arc;

use async_trait::async_trait;
use graceful::{BoxError, Service};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{Cache, Queue, SampleError, Status};

/// Front door of the sample: serves from the [`Cache`] and enqueues on the [`Queue`].
#[derive(Debug)]
pub struct HttpApi {
    port: u16,
    cache: Arc<Cache>,
    queue: Arc<Queue>,
    status: Status,
}

impl HttpApi {
    pub fn new(port: u16, cache: Arc<Cache>, queue: Arc<Queue>) -> Self {
        Self {
            port,
            cache,
            queue,
            status: Status::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Answers a lookup the way a `GET /users/{id}` handler would.
    pub async fn handle(&self, key: &str) -> Result<Option<String>, SampleError> {
        if !self.is_running() {
            return Err(SampleError::NotRunning("http api"));
        }
        Ok(self.cache.get(key).await)
    }
}

#[async_trait]
impl Service for HttpApi {
    async fn start(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        if !self.cache.is_running() {
            return Err(SampleError::Unavailable {
                service: "http api",
                upstream: "cache",
            }
            .into());
        }
        if !self.queue.is_running().await {
            return Err(SampleError::Unavailable {
                service: "http api",
                upstream: "queue",
            }
            .into());
        }
        self.status.set(true);
        info!(port = self.port, "HTTP API listening");
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        self.status.set(false);
        info!(port = self.port, "HTTP API closed");
        Ok(())
    }
}
