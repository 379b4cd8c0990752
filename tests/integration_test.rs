use graceful::mock::{Event, Journal, MockService};
use graceful::{Error, Graceful};
use tokio_util::sync::CancellationToken;

use std::time::Duration;

/// Builds a manager over mock services sharing one journal.
fn manager(journal: &Journal, defs: &[(&str, &[&str])]) -> Graceful {
    let mut mgr = Graceful::new();
    for (name, deps) in defs {
        mgr.add(*name, MockService::new(*name, journal.clone()), deps);
    }
    mgr
}

fn started_at(journal: &Journal, name: &str) -> usize {
    journal
        .position(&Event::Started(name.to_string()))
        .unwrap_or_else(|| panic!("{name} never finished starting"))
}

fn starting_at(journal: &Journal, name: &str) -> usize {
    journal
        .position(&Event::Starting(name.to_string()))
        .unwrap_or_else(|| panic!("{name} never began starting"))
}

/// Chain: service1 <- service2 <- service3. Start then stop the whole run.
#[tokio::test]
async fn test_start_and_stop_chain() {
    let journal = Journal::new();
    let mgr = manager(
        &journal,
        &[
            ("service1", &[]),
            ("service2", &["service1"]),
            ("service3", &["service2"]),
        ],
    );
    let ctx = CancellationToken::new();

    mgr.start(ctx.clone()).await.expect("no structural error");
    mgr.wait_started().await.expect("all services start");
    assert_eq!(mgr.started(), ["service1", "service2", "service3"]);

    mgr.stop(ctx).await.expect("all services stop");
    assert_eq!(journal.stops(), ["service3", "service2", "service1"]);

    for name in ["service1", "service2", "service3"] {
        assert_eq!(journal.start_count(name), 1);
        assert_eq!(journal.stop_count(name), 1);
    }
}

/// Every service of a wide acyclic graph starts exactly once, and no service begins
/// starting before all of its dependencies finished.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_complex_graph_starts_each_service_once() {
    let journal = Journal::new();
    let names: Vec<String> = (0..100).map(|i| format!("service{i}")).collect();
    // Deterministic DAG: service i depends on up to three lower-numbered services.
    let deps: Vec<Vec<&str>> = (0..100usize)
        .map(|i| {
            [i / 2, i / 3, i.saturating_sub(7)]
                .into_iter()
                .filter(|&d| d < i)
                .map(|d| names[d].as_str())
                .collect()
        })
        .collect();

    let mut mgr = Graceful::new();
    for (i, name) in names.iter().enumerate() {
        let svc = MockService::new(name.as_str(), journal.clone())
            .start_delay(Duration::from_millis((i % 5) as u64));
        mgr.add(name.as_str(), svc, &deps[i]);
    }

    let ctx = CancellationToken::new();
    mgr.start(ctx.clone()).await.unwrap();
    mgr.wait_started().await.unwrap();

    assert_eq!(mgr.started().len(), 100);
    for (i, name) in names.iter().enumerate() {
        assert_eq!(journal.start_count(name), 1, "{name} started once");
        for dep in &deps[i] {
            assert!(
                started_at(&journal, dep) < starting_at(&journal, name),
                "{dep} finished before {name} began"
            );
        }
    }

    mgr.stop(ctx).await.unwrap();
    assert_eq!(journal.stops().len(), 100);
}

/// A slow dependency holds back its dependent, not unrelated services.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dependency_completes_before_dependent_begins() {
    let journal = Journal::new();
    let mut mgr = Graceful::new();
    mgr.add(
        "db",
        MockService::new("db", journal.clone()).start_delay(Duration::from_millis(100)),
        &[],
    );
    mgr.add("api", MockService::new("api", journal.clone()), &["db"]);
    mgr.add("metrics", MockService::new("metrics", journal.clone()), &[]);

    mgr.start(CancellationToken::new()).await.unwrap();
    mgr.wait_started().await.unwrap();

    assert!(started_at(&journal, "db") < starting_at(&journal, "api"));
    assert!(started_at(&journal, "metrics") < started_at(&journal, "db"));
}

/// A cycle fails the whole start before any service runs.
#[tokio::test]
async fn test_cycle_starts_nothing() {
    let journal = Journal::new();
    let mgr = manager(
        &journal,
        &[("free", &[]), ("a", &["b"]), ("b", &["a"])],
    );

    let err = mgr.start(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::Cycle(_)), "got {err:?}");
    assert!(err.is_structural());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(journal.events().is_empty());
    assert!(mgr.started().is_empty());
}

/// After a structural error the manager stays idle and can be fixed and started.
#[tokio::test]
async fn test_structural_error_leaves_manager_idle() {
    let journal = Journal::new();
    let mut mgr = manager(&journal, &[("api", &["db"])]);

    let err = mgr.start(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::UnknownDependency { .. }));
    assert!(matches!(
        mgr.stop(CancellationToken::new()).await,
        Err(Error::NotStarted)
    ));

    mgr.add("db", MockService::new("db", journal.clone()), &[]);
    mgr.start(CancellationToken::new()).await.unwrap();
    mgr.wait_started().await.unwrap();
    assert_eq!(mgr.started(), ["db", "api"]);
}

/// Listing the same dependency twice behaves like listing it once.
#[tokio::test]
async fn test_duplicate_dependencies() {
    let journal = Journal::new();
    let mgr = manager(
        &journal,
        &[
            ("service1", &[]),
            ("service2", &["service1"]),
            ("service3", &["service1", "service2", "service1"]),
        ],
    );

    mgr.start(CancellationToken::new()).await.unwrap();
    mgr.wait_started().await.unwrap();

    assert_eq!(mgr.started(), ["service1", "service2", "service3"]);
    assert_eq!(journal.start_count("service1"), 1);
}

/// Re-adding a name replaces the earlier definition, dependency list included.
#[tokio::test]
async fn test_readd_replaces_definition() {
    let journal = Journal::new();
    let mut mgr = Graceful::new();
    mgr.add("cache", MockService::new("cache", journal.clone()), &[]);
    mgr.add("db", MockService::new("db-v1", journal.clone()), &["cache"]);
    mgr.add("db", MockService::new("db-v2", journal.clone()), &[]);
    mgr.add("api", MockService::new("api", journal.clone()), &["db"]);

    assert_eq!(mgr.registry().len(), 3);
    assert!(mgr.registry().dependencies("db").unwrap().is_empty());

    let ctx = CancellationToken::new();
    mgr.start(ctx.clone()).await.unwrap();
    mgr.wait_started().await.unwrap();
    mgr.stop(ctx).await.unwrap();

    assert_eq!(journal.start_count("db-v1"), 0);
    assert_eq!(journal.start_count("db-v2"), 1);
    assert_eq!(journal.stop_count("db-v2"), 1);
}

/// Lifecycle misuse is reported, not silently ignored.
#[tokio::test]
async fn test_lifecycle_contract() {
    let journal = Journal::new();
    let mut mgr = manager(&journal, &[("db", &[])]);
    let ctx = CancellationToken::new();

    assert!(matches!(mgr.stop(ctx.clone()).await, Err(Error::NotStarted)));
    assert!(matches!(mgr.wait_started().await, Err(Error::NotStarted)));

    mgr.start(ctx.clone()).await.unwrap();
    assert!(matches!(
        mgr.start(ctx.clone()).await,
        Err(Error::AlreadyStarted)
    ));
    mgr.wait_started().await.unwrap();

    // Registration is closed once the run began.
    mgr.add("late", MockService::new("late", journal.clone()), &[]);
    assert!(!mgr.registry().contains("late"));

    mgr.stop(ctx.clone()).await.unwrap();
    assert!(matches!(mgr.stop(ctx.clone()).await, Err(Error::AlreadyStopped)));
    assert!(matches!(mgr.start(ctx).await, Err(Error::AlreadyStarted)));

    assert_eq!(journal.start_count("db"), 1);
    assert_eq!(journal.stop_count("db"), 1);
}

/// An empty manager starts and stops cleanly.
#[tokio::test]
async fn test_empty_manager() {
    let mgr = Graceful::new();
    let ctx = CancellationToken::new();
    mgr.start(ctx.clone()).await.unwrap();
    mgr.wait_started().await.unwrap();
    mgr.stop(ctx).await.unwrap();
    assert!(mgr.errors().is_empty());
}
