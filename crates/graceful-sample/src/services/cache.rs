use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use graceful::{BoxError, Service};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{Database, SampleError, Status};

/// Read-through cache warmed from the [`Database`] at start.
#[derive(Debug)]
pub struct Cache {
    database: Arc<Database>,
    entries: RwLock<HashMap<String, String>>,
    status: Status,
}

impl Cache {
    pub fn new(database: Arc<Database>) -> Self {
        Self {
            database,
            entries: RwLock::new(HashMap::new()),
            status: Status::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl Service for Cache {
    async fn start(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        if !self.database.is_running() {
            return Err(SampleError::Unavailable {
                service: "cache",
                upstream: "database",
            }
            .into());
        }
        let rows = self.database.load()?;
        let mut entries = self.entries.write().await;
        entries.extend(rows);
        self.status.set(true);
        info!(entries = entries.len(), "Cache warmed");
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        self.status.set(false);
        let mut entries = self.entries.write().await;
        info!(entries = entries.len(), "Cache flushed");
        entries.clear();
        Ok(())
    }
}
