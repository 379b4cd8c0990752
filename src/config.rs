//! # Configuration
//!
//! Knobs for the orchestrator. `Config` deserializes with serde, so it can be embedded in an
//! application's own config file; missing fields fall back to [`Config::default`].
//!
//! ```yaml
//! failure_policy: exclude
//! cleanup_timeout: 10s
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens to a service whose `start` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Only services whose start succeeded join the started order. A failed service is never
    /// stopped and its dependents are skipped.
    #[default]
    Exclude,
    /// Every service joins the started order when its start is initiated, and dependents
    /// proceed whatever the outcome. Failed services are still stopped.
    Include,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub failure_policy: FailurePolicy,
    /// Upper bound for [`run_cleanups`](crate::shutdown::run_cleanups).
    #[serde(with = "humantime_serde")]
    pub cleanup_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Exclude,
            cleanup_timeout: Duration::from_secs(10),
        }
    }
}
