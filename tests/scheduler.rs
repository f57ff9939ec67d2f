//! The async scheduler loop: cycles on a cadence, clean shutdown.

mod common;

use common::{base_config, Fixture, TestSession};
use std::time::Duration;
use tokio::sync::watch;
use turnstile::Session;

#[tokio::test(start_paused = true)]
async fn scheduler_promotes_on_its_cadence_and_stops_on_shutdown() {
    let fixture = Fixture::new(base_config());
    let session = TestSession::new("alice");
    fixture.parked(&session);
    fixture
        .runtime
        .tiers()
        .find("default")
        .unwrap()
        .enqueue(session.id(), "main".into());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runtime = fixture.runtime;
    let handle = tokio::spawn(async move { runtime.run(shutdown_rx).await });

    // Default cadence is two seconds; paused time advances past several ticks.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(session.last_connect().as_deref(), Some("main"));

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn scheduler_stops_when_the_shutdown_sender_is_dropped() {
    let fixture = Fixture::new(base_config());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runtime = fixture.runtime;
    let handle = tokio::spawn(async move { runtime.run(shutdown_rx).await });

    tokio::time::sleep(Duration::from_secs(3)).await;
    drop(shutdown_tx);
    handle.await.unwrap();
}
