//! # Observability & Tracing
//!
//! The orchestrator logs through the `tracing` crate. Every service task runs inside a
//! `service` span carrying the service name, so per-service lines read like:
//!
//! ```text
//! INFO Starting services count=3 policy=Exclude
//! INFO service{name=db}: Started
//! INFO service{name=cache}: Started
//! WARN service{name=api}: Service failed service="api" phase=start failed error=port in use
//! INFO Stopping services count=2
//! INFO service{name=cache}: Stopped
//! INFO service{name=db}: Stopped
//! ```
//!
//! ## Levels
//!
//! - `info`: run milestones and each service reaching started / stopped
//! - `debug`: registration, dependency waits, replaced definitions
//! - `warn`: service failures and ignored calls
//!
//! ```bash
//! RUST_LOG=info cargo run -p graceful-sample
//! RUST_LOG=graceful=debug cargo run -p graceful-sample
//! ```
//!
//! Installing a subscriber is the application's business; [`setup_tracing`] is a
//! convenience for binaries and demos.

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
