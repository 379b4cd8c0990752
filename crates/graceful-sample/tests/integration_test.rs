use std::time::Duration;

use graceful::{Error, FailurePolicy, ShutdownError};
use graceful_sample::lifecycle::{AppConfig, AppSystem, CACHE, DATABASE, HTTP, QUEUE};
use tokio_util::sync::CancellationToken;

fn fast_config() -> AppConfig {
    AppConfig {
        connect_latency_ms: 5,
        queue_poll_ms: 1,
        ..AppConfig::default()
    }
}

fn position(order: &[String], name: &str) -> usize {
    order
        .iter()
        .position(|n| n == name)
        .unwrap_or_else(|| panic!("{name} missing from {order:?}"))
}

/// Full end-to-end run: every sample service comes up after its upstreams, serves, and goes
/// down again.
#[tokio::test]
async fn test_full_system_lifecycle() {
    let system = AppSystem::new(&fast_config());
    let ctx = CancellationToken::new();

    system.start(ctx.clone()).await.expect("system starts");

    let order = system.manager().started();
    assert_eq!(order.len(), 4);
    assert!(position(&order, DATABASE) < position(&order, CACHE));
    assert!(position(&order, CACHE) < position(&order, HTTP));
    assert!(position(&order, QUEUE) < position(&order, HTTP));

    assert!(system.database.is_running());
    assert!(system.cache.is_running());
    assert!(system.queue.is_running().await);
    assert_eq!(
        system.http.handle("user:1").await.unwrap(),
        Some("user-1".to_string())
    );
    assert_eq!(system.http.handle("user:42").await.unwrap(), None);

    tokio::time::sleep(Duration::from_millis(20)).await;
    system.shutdown(ctx).await.expect("system shuts down");

    assert!(!system.http.is_running());
    assert!(!system.cache.is_running());
    assert!(!system.database.is_running());
    assert!(!system.queue.is_running().await);
    assert_eq!(system.cache.entry_count().await, 0);
    assert!(system.queue.processed() > 0);
    assert!(system.http.handle("user:1").await.is_err());
}

/// Cancelling while the database is still connecting leaves only the independent queue up;
/// shutdown still stops it.
#[tokio::test]
async fn test_cancelled_start_stops_what_came_up() {
    let config = AppConfig {
        connect_latency_ms: 10_000,
        ..fast_config()
    };
    let system = AppSystem::new(&config);
    let ctx = CancellationToken::new();

    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = system.start(ctx.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Service(_)), "got {err:?}");
    assert_eq!(system.manager().started(), [QUEUE]);
    assert!(!system.database.is_running());
    assert!(!system.http.is_running());

    system.shutdown(ctx).await.unwrap();
    assert!(!system.queue.is_running().await);
}

/// Shutting down twice is reported as a failed cleanup.
#[tokio::test]
async fn test_second_shutdown_fails() {
    let system = AppSystem::new(&fast_config());
    let ctx = CancellationToken::new();
    system.start(ctx.clone()).await.unwrap();
    system.shutdown(ctx.clone()).await.unwrap();

    let err = system.shutdown(ctx).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Shutdown(ShutdownError::Failed { failed: 1, total: 1 })
    ));
}

/// Configuration fields are optional; the lifecycle knobs sit at the top level.
#[test]
fn test_config_parsing() {
    let config: AppConfig = serde_json::from_str(
        r#"{"database_url":"postgres://db/app","http_port":9000,
            "failure_policy":"include","cleanup_timeout":"2s"}"#,
    )
    .unwrap();

    assert_eq!(config.database_url, "postgres://db/app");
    assert_eq!(config.http_port, 9000);
    assert_eq!(config.connect_latency_ms, AppConfig::default().connect_latency_ms);
    assert_eq!(config.lifecycle.failure_policy, FailurePolicy::Include);
    assert_eq!(config.lifecycle.cleanup_timeout, Duration::from_secs(2));

    let empty: AppConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(empty.lifecycle, graceful::Config::default());
}
