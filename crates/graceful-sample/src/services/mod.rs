//! # Sample Services
//!
//! Four in-process stand-ins for the kind of components a backend wires together:
//!
//! | Service      | Depends on          | Does                                     |
//! |--------------|---------------------|------------------------------------------|
//! | [`Database`] | -                   | "connects" after a configurable latency  |
//! | [`Cache`]    | [`Database`]        | warms a key/value map from the database  |
//! | [`Queue`]    | -                   | runs a background worker until stopped   |
//! | [`HttpApi`]  | [`Cache`], [`Queue`]| refuses to come up without its upstreams |
//!
//! None of them touch the network. They exist to show dependency-ordered startup and
//! reverse-order shutdown end to end, and each one checks at `start` that the services it
//! relies on are already running.

mod cache;
mod database;
mod http_api;
mod queue;

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

pub use cache::Cache;
pub use database::Database;
pub use http_api::HttpApi;
pub use queue::Queue;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("{service} requires {upstream}, which is not running")]
    Unavailable {
        service: &'static str,
        upstream: &'static str,
    },

    #[error("{0} interrupted while starting")]
    Interrupted(&'static str),

    #[error("{0} is not running")]
    NotRunning(&'static str),
}

/// Running flag shared between a service and whoever inspects it.
#[derive(Debug, Default)]
pub struct Status(AtomicBool);

impl Status {
    pub fn set(&self, running: bool) {
        self.0.store(running, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
