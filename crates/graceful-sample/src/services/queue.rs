use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graceful::{BoxError, Service};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Job queue with a background worker that drains one tick per `poll_interval`.
#[derive(Debug)]
pub struct Queue {
    poll_interval: Duration,
    processed: Arc<AtomicU64>,
    worker: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl Queue {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            processed: Arc::new(AtomicU64::new(0)),
            worker: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.worker.lock().await.is_some()
    }

    /// Ticks handled by the worker so far.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Service for Queue {
    async fn start(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        // Cancelling the run also ends the worker; `stop` cancels only this child.
        let token = ctx.child_token();
        let worker_token = token.clone();
        let processed = Arc::clone(&self.processed);
        let mut interval = tokio::time::interval(self.poll_interval);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = worker_token.cancelled() => break,
                    _ = interval.tick() => {
                        let n = processed.fetch_add(1, Ordering::Relaxed) + 1;
                        debug!(processed = n, "Queue tick");
                    }
                }
            }
        });

        *self.worker.lock().await = Some((token, handle));
        info!(interval = ?self.poll_interval, "Queue worker running");
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        let Some((token, handle)) = self.worker.lock().await.take() else {
            return Ok(());
        };
        token.cancel();
        handle.await?;
        info!(processed = self.processed(), "Queue worker drained");
        Ok(())
    }
}
