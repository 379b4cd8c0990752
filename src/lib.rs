//! # Graceful
//!
//! > **Dependency-ordered, concurrent startup and shutdown for a set of services.**
//!
//! Register services together with the names of the services they depend on. `graceful`
//! computes a valid order, starts independent services in parallel while every dependent
//! waits for its dependencies, and on shutdown stops them in the reverse of the order in
//! which they actually started. Failures from any service are collected into one place.
//!
//! ## 🏗️ Design
//!
//! ### 1. Structural vs. operational errors
//! A cycle or a dependency on an unknown service is a *configuration* error. It is detected
//! before any service runs and returned directly from [`Graceful::start`]. A service whose own
//! `start` or `stop` fails is an *operational* error: it is tagged with the service name and
//! phase, published to the [`ErrorAggregator`], and never aborts its siblings.
//!
//! ### 2. Completion markers, not polling
//! Each service gets a single-fire `watch` channel. Dependents await it; nothing spins on
//! shared state. The started order is appended behind one lock.
//!
//! ### 3. `start` returns early
//! `start` returns as soon as the launch plan is validated and every service task is spawned.
//! Join the run with [`Graceful::wait_started`] when you need to know the outcome.
//!
//! ### 4. Observability
//! `tracing` everywhere, one `service` span per service task. See [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! - [`service`]: the [`Service`] trait and the closure-backed [`ServiceFn`].
//! - [`registry`]: name-keyed [`ServiceDef`]s, last write wins.
//! - [`graph`]: [`DependencyGraph`], Kahn sort and cycle reporting.
//! - [`lifecycle`]: the [`Graceful`] orchestrator (start, stop, wait).
//! - [`aggregator`]: the shared error channel.
//! - [`config`]: [`Config`] and [`FailurePolicy`].
//! - [`task`] and [`shutdown`]: background launch and deadline-bounded cleanup helpers.
//! - [`mock`]: [`MockService`](mock::MockService) and a shared [`Journal`](mock::Journal)
//!   for tests.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run -p graceful-sample
//! cargo test --workspace
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod mock;
pub mod registry;
pub mod service;
pub mod shutdown;
pub mod task;

pub use aggregator::{ErrorAggregator, ErrorSender};
pub use config::{Config, FailurePolicy};
pub use error::{BoxError, Error, Phase, Result, ServiceError};
pub use graph::DependencyGraph;
pub use lifecycle::{setup_tracing, Graceful};
pub use registry::{Registry, ServiceDef};
pub use service::{Service, ServiceFn, ServiceRef};
pub use shutdown::{release_and_cleanup, run_cleanups, Cleanup, ShutdownError};
