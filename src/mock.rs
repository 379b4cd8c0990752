//! # Mock Services & Testing Guide
//!
//! `MockService` is a [`Service`] that does nothing but record what happened to it in a shared
//! [`Journal`]. Several mocks share one journal, so a test can assert on the global order of
//! start and stop calls across the whole run.
//!
//! | Builder               | Effect                                          |
//! |-----------------------|-------------------------------------------------|
//! | `fail_start(msg)`     | `start` returns `Err(msg)`                      |
//! | `fail_stop(msg)`      | `stop` returns `Err(msg)`                       |
//! | `start_delay(d)`      | `start` sleeps `d` before recording completion  |
//!
//! A start is recorded twice: [`Event::Starting`] when the call begins and
//! [`Event::Started`] once it succeeded. That makes "A finished starting before B began" a
//! plain index comparison.
//!
//! ```
//! use graceful::mock::{Event, Journal, MockService};
//! use graceful::Graceful;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let journal = Journal::new();
//!     let mut mgr = Graceful::new();
//!     mgr.add("db", MockService::new("db", journal.clone()), &[]);
//!     mgr.add("api", MockService::new("api", journal.clone()), &["db"]);
//!
//!     mgr.start(CancellationToken::new()).await.unwrap();
//!     mgr.wait_started().await.unwrap();
//!
//!     assert!(journal.position(&Event::Started("db".into()))
//!         < journal.position(&Event::Starting("api".into())));
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::service::Service;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Starting(String),
    Started(String),
    Stopped(String),
}

/// Shared, ordered record of mock service events.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: Event) {
        self.events.lock().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Index of the first occurrence of `event`.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events.lock().iter().position(|e| e == event)
    }

    /// Names of stopped services, in stop-call order.
    pub fn stops(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Stopped(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// How many times `name` began starting.
    pub fn start_count(&self, name: &str) -> usize {
        self.count(|e| matches!(e, Event::Starting(n) if n == name))
    }

    /// How many times `name` was stopped.
    pub fn stop_count(&self, name: &str) -> usize {
        self.count(|e| matches!(e, Event::Stopped(n) if n == name))
    }

    fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(*e)).count()
    }
}

/// A [`Service`] that records its calls into a [`Journal`].
#[derive(Debug, Clone)]
pub struct MockService {
    name: String,
    journal: Journal,
    start_error: Option<String>,
    stop_error: Option<String>,
    start_delay: Option<Duration>,
}

impl MockService {
    /// A mock that succeeds at once, recording into `journal` under `name`.
    pub fn new(name: impl Into<String>, journal: Journal) -> Self {
        Self {
            name: name.into(),
            journal,
            start_error: None,
            stop_error: None,
            start_delay: None,
        }
    }

    pub fn fail_start(mut self, msg: impl Into<String>) -> Self {
        self.start_error = Some(msg.into());
        self
    }

    pub fn fail_stop(mut self, msg: impl Into<String>) -> Self {
        self.stop_error = Some(msg.into());
        self
    }

    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }
}

#[async_trait]
impl Service for MockService {
    async fn start(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        self.journal.record(Event::Starting(self.name.clone()));
        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = &self.start_error {
            return Err(msg.clone().into());
        }
        self.journal.record(Event::Started(self.name.clone()));
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        self.journal.record(Event::Stopped(self.name.clone()));
        match &self.stop_error {
            Some(msg) => Err(msg.clone().into()),
            None => Ok(()),
        }
    }
}
