//! # Error Aggregator
//!
//! A single shared channel of [`ServiceError`]s. Every task that runs a service operation
//! holds a sender; the orchestrator drains the receiver after each join point.
//!
//! The channel is unbounded so a failing service never blocks on publishing, even when
//! nobody is draining at that moment. Drained errors are kept in a history so that every
//! failure stays inspectable, not just the first one returned to the caller.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::ServiceError;

/// Cheap-to-clone handle for publishing service failures.
#[derive(Debug, Clone)]
pub struct ErrorSender {
    tx: mpsc::UnboundedSender<ServiceError>,
}

impl ErrorSender {
    /// Logs `err` at `warn` and queues it for the aggregator. Never blocks.
    pub fn publish(&self, err: ServiceError) {
        warn!(service = %err.service, phase = %err.phase, error = %err.source, "Service failed");
        // The receiver lives as long as the aggregator; a send error means it was dropped
        // and there is nobody left to report to.
        let _ = self.tx.send(err);
    }
}

/// Collects failures from all service tasks.
#[derive(Debug, Clone)]
pub struct ErrorAggregator {
    sender: ErrorSender,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<ServiceError>>>,
    history: Arc<Mutex<Vec<ServiceError>>>,
}

impl ErrorAggregator {
    /// Creates an aggregator with an empty queue and history.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sender: ErrorSender { tx },
            rx: Arc::new(Mutex::new(rx)),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A producer handle for one service task.
    pub fn sender(&self) -> ErrorSender {
        self.sender.clone()
    }

    pub fn publish(&self, err: ServiceError) {
        self.sender.publish(err);
    }

    /// Moves every pending error into the history and returns the ones drained by this call,
    /// in publication order.
    pub fn drain(&self) -> Vec<ServiceError> {
        let mut drained = Vec::new();
        {
            let mut rx = self.rx.lock();
            while let Ok(err) = rx.try_recv() {
                drained.push(err);
            }
        }
        self.history.lock().extend(drained.iter().cloned());
        drained
    }

    /// Drains pending errors and returns the first of them, if any.
    pub fn first(&self) -> Option<ServiceError> {
        self.drain().into_iter().next()
    }

    /// Every error drained so far.
    pub fn history(&self) -> Vec<ServiceError> {
        self.history.lock().clone()
    }
}

impl Default for ErrorAggregator {
    fn default() -> Self {
        Self::new()
    }
}
