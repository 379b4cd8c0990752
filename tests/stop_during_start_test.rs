use std::time::Duration;

use graceful::mock::{Event, Journal, MockService};
use graceful::{Config, FailurePolicy, Graceful};
use tokio_util::sync::CancellationToken;

/// db <- api (slow) <- web
fn chain(journal: &Journal, config: Config) -> Graceful {
    let mut mgr = Graceful::with_config(config);
    mgr.add("db", MockService::new("db", journal.clone()), &[]);
    mgr.add(
        "api",
        MockService::new("api", journal.clone()).start_delay(Duration::from_millis(50)),
        &["db"],
    );
    mgr.add("web", MockService::new("web", journal.clone()), &["api"]);
    mgr
}

fn at(journal: &Journal, event: Event) -> usize {
    journal
        .position(&event)
        .unwrap_or_else(|| panic!("{event:?} never happened"))
}

/// Stopping while a dependent is mid-start waits for that start, stops it before its
/// dependency, and abandons services that had not begun.
#[tokio::test]
async fn test_stop_while_starting() {
    let journal = Journal::new();
    let mgr = chain(&journal, Config::default());
    let ctx = CancellationToken::new();

    mgr.start(ctx.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    mgr.stop(ctx).await.expect("stop during start is clean");

    let at_stop = journal.events();
    assert!(
        at(&journal, Event::Started("api".into())) < at(&journal, Event::Stopped("db".into())),
        "db stopped under a starting api: {at_stop:?}"
    );
    assert_eq!(journal.stops(), ["api", "db"]);
    assert_eq!(mgr.started(), ["db", "api"]);

    // Nothing comes up once stop returned.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(journal.events(), at_stop);
    assert_eq!(journal.start_count("web"), 0);
    assert!(mgr.errors().is_empty());
}

/// The permissive policy abandons pending launches the same way.
#[tokio::test]
async fn test_stop_while_starting_include_policy() {
    let journal = Journal::new();
    let mgr = chain(
        &journal,
        Config {
            failure_policy: FailurePolicy::Include,
            ..Config::default()
        },
    );
    let ctx = CancellationToken::new();

    mgr.start(ctx.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    mgr.stop(ctx).await.unwrap();

    let at_stop = journal.events();
    assert_eq!(journal.stops(), ["api", "db"]);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(journal.events(), at_stop);
    assert_eq!(journal.start_count("web"), 0);
    assert_eq!(mgr.started(), ["db", "api"]);
}

/// `wait_started` after a stop returns at once instead of waiting on abandoned launches.
#[tokio::test]
async fn test_wait_started_after_stop() {
    let journal = Journal::new();
    let mgr = chain(&journal, Config::default());
    let ctx = CancellationToken::new();

    mgr.start(ctx.clone()).await.unwrap();
    mgr.stop(ctx).await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), mgr.wait_started())
        .await
        .expect("no launch left running")
        .unwrap();
}
