//! # Background Launch
//!
//! Small helpers for long-running work that is not a [`Service`](crate::Service): spawn a
//! fallible future and forward its error, if any, to a shared channel. The usual pattern is
//! to `select!` on that channel next to a shutdown trigger.
//!
//! Workers that run until told to let go take a release token instead of an argument; bind
//! it with [`with_release`] and cancel it when shutting down, or let
//! [`release_and_cleanup`](crate::shutdown::release_and_cleanup) do it.
//!
//! ```
//! use graceful::task::{spawn_forwarding, with_arg};
//! use graceful::BoxError;
//! use tokio::sync::mpsc;
//!
//! async fn serve(addr: &'static str) -> Result<(), BoxError> {
//!     Err(format!("bind {addr}: address in use").into())
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!     spawn_forwarding(with_arg(serve, "0.0.0.0:8080"), tx);
//!
//!     let err = rx.recv().await.unwrap();
//!     assert_eq!(err.to_string(), "bind 0.0.0.0:8080: address in use");
//! }
//! ```

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;

/// Runs `fut` on its own task; an `Err` result is sent to `errors`.
pub fn spawn_forwarding<F>(fut: F, errors: mpsc::UnboundedSender<BoxError>) -> JoinHandle<()>
where
    F: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            let _ = errors.send(e);
        }
    })
}

/// Binds `arg` to a one-argument async function, yielding a future for
/// [`spawn_forwarding`].
pub fn with_arg<T, F, Fut>(f: F, arg: T) -> Fut
where
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = Result<(), BoxError>>,
{
    f(arg)
}

/// Binds a release token to a worker that runs until the token is cancelled.
pub fn with_release<F, Fut>(f: F, release: CancellationToken) -> Fut
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<(), BoxError>>,
{
    f(release)
}
