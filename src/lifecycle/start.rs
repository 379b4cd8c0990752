//! Start orchestration: one task per service, gated on dependency completion markers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use super::{guarded, Graceful, InFlight, State};
use crate::aggregator::ErrorSender;
use crate::config::FailurePolicy;
use crate::error::{Cancelled, DependencyUnavailable, Error, Phase, Result, ServiceError};
use crate::graph::DependencyGraph;
use crate::registry::ServiceDef;

/// Completion marker value. Moves from `Pending` to a terminal value exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Pending,
    Started,
    Failed,
}

/// Everything one service task needs, moved into the task.
struct Launch {
    def: Arc<ServiceDef>,
    deps: Vec<(String, watch::Receiver<Readiness>)>,
    marker: watch::Sender<Readiness>,
    ctx: CancellationToken,
    halt: CancellationToken,
    started: Arc<Mutex<Vec<String>>>,
    errors: ErrorSender,
    policy: FailurePolicy,
    _in_flight: InFlight,
}

impl Graceful {
    /// Validates the registry, then launches every service in dependency order.
    ///
    /// Returns once all service tasks are spawned; it does not wait for any `start` to
    /// finish. Structural problems (cycle, unknown dependency) are returned before any
    /// service runs. Per-service failures are published to the error aggregator and
    /// surface from [`wait_started`](Self::wait_started), [`stop`](Self::stop) or
    /// [`errors`](Self::errors).
    pub async fn start(&self, ctx: CancellationToken) -> Result<()> {
        let defs = {
            let mut state = self.state.lock();
            if *state != State::Idle {
                return Err(Error::AlreadyStarted);
            }

            let order = DependencyGraph::from_registry(&self.registry)?.sort()?;
            let defs = order
                .iter()
                .map(|name| {
                    self.registry
                        .get(name)
                        .cloned()
                        .ok_or_else(|| Error::NotFound(name.clone()))
                })
                .collect::<Result<Vec<_>>>()?;

            *state = State::Started;
            defs
        };

        info!(count = defs.len(), policy = ?self.config.failure_policy, "Starting services");

        let mut senders = HashMap::with_capacity(defs.len());
        let mut receivers = HashMap::with_capacity(defs.len());
        for def in &defs {
            let (tx, rx) = watch::channel(Readiness::Pending);
            senders.insert(def.name.clone(), tx);
            receivers.insert(def.name.clone(), rx);
        }

        for def in defs {
            if !def.claim_launch() {
                debug!(service = %def.name, "Already launched");
                continue;
            }
            let Some(marker) = senders.remove(&def.name) else {
                continue;
            };
            let deps = def
                .deps
                .iter()
                .filter_map(|dep| receivers.get(dep).map(|rx| (dep.clone(), rx.clone())))
                .collect();

            self.in_flight.send_modify(|n| *n += 1);
            let span = info_span!("service", name = %def.name);
            let launch = Launch {
                def,
                deps,
                marker,
                ctx: ctx.clone(),
                halt: self.halt.clone(),
                started: self.started.clone(),
                errors: self.errors.sender(),
                policy: self.config.failure_policy,
                _in_flight: InFlight(Arc::clone(&self.in_flight)),
            };
            tokio::spawn(launch.run().instrument(span));
        }

        Ok(())
    }

    /// Waits for every service task of the current run to finish starting (or failing),
    /// then returns the first start failure drained from the aggregator.
    pub async fn wait_started(&self) -> Result<()> {
        if *self.state.lock() == State::Idle {
            return Err(Error::NotStarted);
        }

        self.launches_settled().await;

        match self.errors.first() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

impl Launch {
    async fn run(mut self) {
        let name = self.def.name.clone();

        for (dep, mut rx) in std::mem::take(&mut self.deps) {
            debug!(dependency = %dep, "Waiting for dependency");
            let readiness = tokio::select! {
                res = rx.wait_for(|r| *r != Readiness::Pending) => {
                    // A dropped sender means the dependency's task is gone.
                    res.map(|r| *r).unwrap_or(Readiness::Failed)
                }
                _ = self.halt.cancelled() => return self.abandon(),
                _ = self.ctx.cancelled() => {
                    self.errors.publish(ServiceError::new(&name, Phase::Start, Cancelled));
                    self.marker.send_replace(Readiness::Failed);
                    return;
                }
            };

            // A dependency given up by `stop` is not a failure of this service.
            if self.halt.is_cancelled() {
                return self.abandon();
            }
            if readiness == Readiness::Failed && self.policy == FailurePolicy::Exclude {
                self.errors.publish(ServiceError::new(
                    &name,
                    Phase::Start,
                    DependencyUnavailable(dep),
                ));
                self.marker.send_replace(Readiness::Failed);
                return;
            }
        }

        if self.halt.is_cancelled() {
            return self.abandon();
        }
        if self.policy == FailurePolicy::Include {
            self.started.lock().push(name.clone());
        }

        debug!("Starting");
        let service = self.def.service.clone();
        let ctx = self.ctx.clone();
        match guarded(&name, Phase::Start, async move { service.start(ctx).await }).await {
            Ok(()) => {
                if self.policy == FailurePolicy::Exclude {
                    self.started.lock().push(name.clone());
                }
                info!("Started");
                self.marker.send_replace(Readiness::Started);
            }
            Err(err) => {
                self.errors.publish(err);
                let readiness = match self.policy {
                    FailurePolicy::Exclude => Readiness::Failed,
                    FailurePolicy::Include => Readiness::Started,
                };
                self.marker.send_replace(readiness);
            }
        }
    }

    /// Gives up a launch that had not begun when `stop` was called.
    fn abandon(&self) {
        debug!("Stop requested before launch; not starting");
        self.marker.send_replace(Readiness::Failed);
    }
}
