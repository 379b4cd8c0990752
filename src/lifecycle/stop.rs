//! Stop orchestration: reverse of the started order, all stops in flight at once.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use super::{guarded, Graceful, State};
use crate::error::{BoxError, Error, Phase, Result};
use crate::shutdown::{cleanup, Cleanup};

impl Graceful {
    /// Stops every started service, in the reverse of the started order.
    ///
    /// Launches still waiting on a dependency are abandoned, and starts already under way are
    /// allowed to finish first, so no service comes up after this returns and no dependency
    /// goes down under a dependent that is still starting. Stops run concurrently and this
    /// waits for all of them; there is no timeout at this layer, the caller bounds it
    /// through `ctx` or [`run_cleanups`](crate::shutdown::run_cleanups). A failing stop never
    /// prevents the others.
    /// Returns the first error drained from the aggregator after the join, which may be a
    /// start failure nobody collected yet. All failures stay available via
    /// [`errors`](Self::errors).
    pub async fn stop(&self, ctx: CancellationToken) -> Result<()> {
        {
            let mut state = self.state.lock();
            match *state {
                State::Idle => return Err(Error::NotStarted),
                State::Stopped => return Err(Error::AlreadyStopped),
                State::Started => *state = State::Stopped,
            }
        }

        self.halt.cancel();
        self.launches_settled().await;

        let order = self.started();
        info!(count = order.len(), "Stopping services");

        let mut set = JoinSet::new();
        for name in order.into_iter().rev() {
            let Some(def) = self.registry.get(&name) else {
                warn!(service = %name, "Started service missing from registry");
                continue;
            };
            let service = def.service.clone();
            let errors = self.errors.sender();
            let ctx = ctx.clone();
            let span = info_span!("service", name = %name);

            set.spawn(
                async move {
                    match guarded(&name, Phase::Stop, async move { service.stop(ctx).await }).await
                    {
                        Ok(()) => info!("Stopped"),
                        Err(err) => errors.publish(err),
                    }
                }
                .instrument(span),
            );
        }

        while let Some(res) = set.join_next().await {
            if let Err(e) = res {
                warn!(error = %e, "Stop task aborted");
            }
        }

        match self.errors.first() {
            Some(err) => Err(err.into()),
            None => {
                info!("All services stopped");
                Ok(())
            }
        }
    }

    /// Wraps [`stop`](Self::stop) as a [`Cleanup`], so the whole orchestrator can run under
    /// the deadline of [`run_cleanups`](crate::shutdown::run_cleanups) next to other cleanups.
    pub fn stop_cleanup(self: &Arc<Self>) -> Cleanup {
        let mgr = Arc::clone(self);
        cleanup(move |ctx| async move { mgr.stop(ctx).await.map_err(BoxError::from) })
    }
}
