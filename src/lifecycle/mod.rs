//! # Service Lifecycle & Orchestration
//!
//! [`Graceful`] owns a set of registered services and drives them through one run:
//!
//! ```text
//! new ──► add(..)* ──► start ──► [wait_started] ──► stop
//! ```
//!
//! ## Start
//!
//! [`Graceful::start`] builds the dependency graph, sorts it and resolves every definition
//! before anything runs. A cycle or an unknown dependency is returned right there and no
//! service is touched. Otherwise one task per service is spawned in sorted order and `start`
//! returns **without waiting** for the services: `Ok(())` means "the launch plan is valid and
//! launched", not "every service is up". Use [`Graceful::wait_started`] to join the run.
//!
//! Each service has a completion marker (a `watch` channel). A service task waits on the
//! markers of its dependencies, runs its own `start`, then flips its marker so dependents
//! can proceed. Independent branches of the graph start in parallel.
//!
//! ## Stop
//!
//! [`Graceful::stop`] first closes the run: launches still waiting on a dependency are
//! abandoned and starts already under way are allowed to finish. It then walks the *started
//! order* back to front. The started order is the sequence in which services actually
//! started during this run, so the reverse never stops a dependency before one of its
//! dependents, and nothing starts once `stop` has returned.
//!
//! ## Lifecycle contract
//!
//! | Call                         | Result                    |
//! |------------------------------|---------------------------|
//! | `start` twice                | [`Error::AlreadyStarted`] |
//! | `stop` before `start`        | [`Error::NotStarted`]     |
//! | `stop` twice                 | [`Error::AlreadyStopped`] |
//! | `add` after `start`          | ignored, logged at `warn` |
//! | structural error in `start`  | instance stays idle       |
//! | `stop` while starting        | pending launches dropped  |
//!
//! ## Example
//!
//! ```
//! use graceful::{BoxError, Graceful, ServiceFn};
//! use tokio_util::sync::CancellationToken;
//!
//! fn noop() -> ServiceFn {
//!     ServiceFn::new(
//!         |_| async { Ok::<(), BoxError>(()) },
//!         |_| async { Ok::<(), BoxError>(()) },
//!     )
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), graceful::Error> {
//!     let mut mgr = Graceful::new();
//!     mgr.add("db", noop(), &[]);
//!     mgr.add("api", noop(), &["db"]);
//!
//!     let ctx = CancellationToken::new();
//!     mgr.start(ctx.clone()).await?;
//!     mgr.wait_started().await?;
//!     assert_eq!(mgr.started(), ["db", "api"]);
//!
//!     mgr.stop(ctx).await
//! }
//! ```

mod start;
mod stop;
pub mod tracing;

use std::future::Future;
use std::sync::Arc;

use ::tracing::warn;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::aggregator::ErrorAggregator;
use crate::config::Config;
use crate::error::{Aborted, BoxError, Panicked, Phase, ServiceError};
use crate::registry::Registry;
use crate::service::{Service, ServiceRef};

pub use self::tracing::setup_tracing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Started,
    Stopped,
}

/// Dependency-ordered, concurrent start and stop of a set of services.
pub struct Graceful {
    config: Config,
    registry: Registry,
    state: Mutex<State>,
    /// Names in the order their start was realized. Appended from service tasks, one lock.
    started: Arc<Mutex<Vec<String>>>,
    errors: ErrorAggregator,
    /// Service tasks of the current run that have not finished launching.
    in_flight: Arc<watch::Sender<usize>>,
    /// Cancelled by `stop`; launches still waiting on a dependency give up.
    halt: CancellationToken,
}

impl Graceful {
    /// Creates an empty orchestrator with [`Config::default`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty orchestrator with the given configuration.
    pub fn with_config(config: Config) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            config,
            registry: Registry::new(),
            state: Mutex::new(State::Idle),
            started: Arc::new(Mutex::new(Vec::new())),
            errors: ErrorAggregator::new(),
            in_flight: Arc::new(in_flight),
            halt: CancellationToken::new(),
        }
    }

    /// Registers `service` under `name`, depending on `deps`.
    ///
    /// Adding a name that is already registered replaces its definition, dependency list
    /// included. Dependencies are not checked here; unknown names fail the next `start`.
    pub fn add(&mut self, name: impl Into<String>, service: impl Service, deps: &[&str]) {
        self.add_arc(name, Arc::new(service), deps);
    }

    /// Same as [`add`](Self::add) for a service that is already shared.
    pub fn add_arc(&mut self, name: impl Into<String>, service: ServiceRef, deps: &[&str]) {
        let name = name.into();
        if *self.state.get_mut() != State::Idle {
            warn!(service = %name, "Ignoring registration after start");
            return;
        }
        self.registry.add(name, service, deps.iter().copied());
    }

    /// The configuration this orchestrator was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read-only view of the registered definitions.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Snapshot of the started order.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    /// Every service failure observed so far, in publication order.
    pub fn errors(&self) -> Vec<ServiceError> {
        self.errors.drain();
        self.errors.history()
    }

    /// Resolves once no service task of the current run is still launching.
    async fn launches_settled(&self) {
        let mut rx = self.in_flight.subscribe();
        // The sender lives as long as `self`, so this only ends on a zero count.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for Graceful {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight launch count when a service task ends, panicking or not.
struct InFlight(Arc<watch::Sender<usize>>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Runs one service operation on its own task so a panic surfaces as a [`ServiceError`]
/// instead of tearing down the caller.
async fn guarded<F>(name: &str, phase: Phase, op: F) -> Result<(), ServiceError>
where
    F: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    match tokio::spawn(op).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ServiceError::from_boxed(name, phase, e)),
        Err(join) => Err(join_failure(name, phase, join)),
    }
}

fn join_failure(name: &str, phase: Phase, join: JoinError) -> ServiceError {
    if join.is_panic() {
        ServiceError::new(name, phase, Panicked(join.to_string()))
    } else {
        ServiceError::new(name, phase, Aborted(join.to_string()))
    }
}
