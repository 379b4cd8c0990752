//! # Cleanup Runner
//!
//! Runs a batch of independent cleanup callbacks concurrently under one deadline. Unlike
//! [`Graceful::stop`](crate::Graceful::stop) there is no ordering here: every cleanup starts
//! at once. It is the place to put a timeout around shutdown, including around the
//! orchestrator itself via [`Graceful::stop_cleanup`](crate::Graceful::stop_cleanup).
//!
//! Background workers launched with [`with_release`](crate::task::with_release) are told to
//! let go by [`release_and_cleanup`], which cancels their release token before the cleanups
//! run. Turning the outcome into a process exit code is left to the caller.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::BoxError;

pub type CleanupFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;

/// A one-shot cleanup callback.
pub type Cleanup = Box<dyn FnOnce(CancellationToken) -> CleanupFuture + Send>;

/// Boxes an async closure into a [`Cleanup`].
pub fn cleanup<F, Fut>(f: F) -> Cleanup
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Box::new(move |ctx| Box::pin(f(ctx)))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShutdownError {
    #[error("{failed} of {total} cleanups failed")]
    Failed { failed: usize, total: usize },

    /// The deadline passed; unfinished cleanups were aborted.
    #[error("shutdown timeout {timeout:?} exceeded; {pending} cleanups still running")]
    TimedOut { timeout: Duration, pending: usize },
}

/// Runs all `cleanups` concurrently and waits at most `timeout` for them.
///
/// Every cleanup gets a clone of `ctx`. A timeout takes precedence over individual failures.
pub async fn run_cleanups(
    ctx: CancellationToken,
    cleanups: Vec<Cleanup>,
    timeout: Duration,
) -> Result<(), ShutdownError> {
    let total = cleanups.len();
    let mut set = JoinSet::new();
    for cleanup in cleanups {
        set.spawn(cleanup(ctx.clone()));
    }

    let mut failed = 0;
    let joined = tokio::time::timeout(timeout, async {
        while let Some(res) = set.join_next().await {
            match res {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "Cleanup failed");
                    failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Cleanup panicked");
                    failed += 1;
                }
            }
        }
    })
    .await;

    if joined.is_err() {
        let pending = set.len();
        warn!(?timeout, pending, "Shutdown timeout reached");
        set.abort_all();
        return Err(ShutdownError::TimedOut { timeout, pending });
    }

    if failed > 0 {
        return Err(ShutdownError::Failed { failed, total });
    }

    info!(total, "Cleanups complete");
    Ok(())
}

/// Signals `release`, then runs `cleanups` as [`run_cleanups`] does.
pub async fn release_and_cleanup(
    release: &CancellationToken,
    ctx: CancellationToken,
    cleanups: Vec<Cleanup>,
    timeout: Duration,
) -> Result<(), ShutdownError> {
    info!("Releasing background workers");
    release.cancel();
    run_cleanups(ctx, cleanups, timeout).await
}
