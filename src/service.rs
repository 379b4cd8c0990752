//! # Service Trait
//!
//! The `Service` trait is the only contract the orchestrator requires: something that can be
//! asked to start and to stop. Construction, configuration and wiring of the service itself
//! happen elsewhere; by the time a service is handed to [`Graceful::add`](crate::Graceful::add)
//! it is ready to run.
//!
//! # Cancellation
//! Both operations receive a [`CancellationToken`]. The orchestrator never cancels it on its
//! own: the caller owns the token and decides when (or whether) a slow start or stop should be
//! abandoned. Implementations should watch `ctx.cancelled()` in long-running setup work.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;

/// A named unit with a start and a stop operation.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use graceful::{BoxError, Service};
/// use tokio_util::sync::CancellationToken;
///
/// struct Database;
///
/// #[async_trait]
/// impl Service for Database {
///     async fn start(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
///         // open the pool...
///         Ok(())
///     }
///
///     async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
///         // drain and close the pool...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Starts the service. Dependents are released once this returns `Ok`.
    async fn start(&self, ctx: CancellationToken) -> Result<(), BoxError>;

    /// Stops the service. Only called for services that appear in the started order.
    async fn stop(&self, ctx: CancellationToken) -> Result<(), BoxError>;
}

/// Shared handle to a service, as stored in the registry.
pub type ServiceRef = Arc<dyn Service>;

type BoxFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;
type Hook = Box<dyn Fn(CancellationToken) -> BoxFuture + Send + Sync>;

/// Closure-backed [`Service`].
///
/// Handy when a service is nothing more than a pair of async functions.
///
/// ```
/// use graceful::{BoxError, ServiceFn};
///
/// let svc = ServiceFn::new(
///     |_ctx| async { Ok::<(), BoxError>(()) },
///     |_ctx| async { Ok::<(), BoxError>(()) },
/// );
/// # let _ = svc;
/// ```
pub struct ServiceFn {
    start: Hook,
    stop: Hook,
}

impl ServiceFn {
    /// Builds a service from a start closure and a stop closure. Each call of an operation
    /// invokes its closure once with the context it was given.
    pub fn new<S, SF, T, TF>(start: S, stop: T) -> Self
    where
        S: Fn(CancellationToken) -> SF + Send + Sync + 'static,
        SF: Future<Output = Result<(), BoxError>> + Send + 'static,
        T: Fn(CancellationToken) -> TF + Send + Sync + 'static,
        TF: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self {
            start: Box::new(move |ctx| Box::pin(start(ctx))),
            stop: Box::new(move |ctx| Box::pin(stop(ctx))),
        }
    }
}

#[async_trait]
impl Service for ServiceFn {
    async fn start(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        (self.start)(ctx).await
    }

    async fn stop(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        (self.stop)(ctx).await
    }
}
