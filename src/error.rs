//! # Lifecycle Errors
//!
//! This module defines the error types surfaced by the orchestrator. They fall into
//! two families:
//!
//! - **Structural** errors ([`Error::Cycle`], [`Error::UnknownDependency`], ...) describe a
//!   broken registration or a misuse of the lifecycle. They are returned synchronously from
//!   [`Graceful::start`](crate::Graceful::start) before any service is touched.
//! - **Operational** errors ([`ServiceError`]) describe a single service whose `start` or
//!   `stop` failed. They are collected by the [`ErrorAggregator`](crate::ErrorAggregator)
//!   and never abort sibling services.

use std::fmt;
use std::sync::Arc;

use crate::shutdown::ShutdownError;

/// Boxed error returned by [`Service`](crate::Service) implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared, clonable form of a service failure cause.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Lifecycle phase in which a service failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    Stop,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Start => f.write_str("start failed"),
            Phase::Stop => f.write_str("stop failed"),
        }
    }
}

/// A single service failed to start or stop.
///
/// The cause is kept behind an `Arc` so the same failure can sit in the aggregator's
/// history and be handed back to the caller at the same time.
#[derive(Debug, Clone, thiserror::Error)]
#[error("service {service}: {phase}: {source}")]
pub struct ServiceError {
    pub service: String,
    pub phase: Phase,
    #[source]
    pub source: SharedError,
}

impl ServiceError {
    pub fn new<E>(service: impl Into<String>, phase: Phase, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            service: service.into(),
            phase,
            source: Arc::new(source),
        }
    }

    /// Wraps a [`BoxError`] returned by a service.
    pub fn from_boxed(service: impl Into<String>, phase: Phase, source: BoxError) -> Self {
        Self {
            service: service.into(),
            phase,
            source: SharedError::from(source),
        }
    }
}

/// A service was skipped because one of its dependencies never reached the started state.
#[derive(Debug, Clone, thiserror::Error)]
#[error("dependency {0} did not start")]
pub struct DependencyUnavailable(pub String);

/// A service's `start` or `stop` panicked.
#[derive(Debug, Clone, thiserror::Error)]
#[error("panicked: {0}")]
pub struct Panicked(pub String);

/// A service's `start` or `stop` task was cancelled before it finished, typically because
/// the runtime is shutting down.
#[derive(Debug, Clone, thiserror::Error)]
#[error("aborted: {0}")]
pub struct Aborted(pub String);

/// The caller's cancellation token fired before the service was launched.
#[derive(Debug, Clone, thiserror::Error)]
#[error("cancelled before launch")]
pub struct Cancelled;

/// Errors returned by the orchestrator.
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The dependency graph contains a cycle. The path lists one concrete cycle,
    /// its first element repeated at the end.
    #[error("dependency cycle detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("service {service} depends on unknown service {dependency}")]
    UnknownDependency { service: String, dependency: String },

    /// The sorted order references a name the registry does not hold.
    #[error("service {0} not found")]
    NotFound(String),

    #[error("services already started")]
    AlreadyStarted,

    #[error("services not started")]
    NotStarted,

    #[error("services already stopped")]
    AlreadyStopped,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

impl Error {
    /// Returns `true` for configuration and lifecycle-misuse errors, i.e. those detected
    /// before any service operation runs.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Error::Service(_) | Error::Shutdown(_))
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::Cycle(_) => "dependency_cycle",
            Error::UnknownDependency { .. } => "unknown_dependency",
            Error::NotFound(_) => "service_not_found",
            Error::AlreadyStarted => "already_started",
            Error::NotStarted => "not_started",
            Error::AlreadyStopped => "already_stopped",
            Error::Service(e) => match e.phase {
                Phase::Start => "service_start_failed",
                Phase::Stop => "service_stop_failed",
            },
            Error::Shutdown(_) => "shutdown_failed",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_names_service_and_phase() {
        let err = ServiceError::from_boxed("db", Phase::Start, "connection refused".into());
        assert_eq!(
            err.to_string(),
            "service db: start failed: connection refused"
        );

        let err = ServiceError::new("cache", Phase::Stop, DependencyUnavailable("db".into()));
        assert_eq!(
            err.to_string(),
            "service cache: stop failed: dependency db did not start"
        );
    }

    #[test]
    fn cycle_renders_path() {
        let err = Error::Cycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> a");
        assert!(err.is_structural());
        assert_eq!(err.as_label(), "dependency_cycle");
    }

    #[test]
    fn service_errors_are_operational() {
        let err: Error = ServiceError::from_boxed("db", Phase::Stop, "boom".into()).into();
        assert!(!err.is_structural());
        assert_eq!(err.as_label(), "service_stop_failed");
    }
}
