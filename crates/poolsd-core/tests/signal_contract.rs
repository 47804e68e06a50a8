//! Contract Test: Process Signals
//!
//! Constraints verified:
//! - SIGTERM delivered to the process stops `Poller::run` cleanly
//! - The signal name is reported as the stop reason
//!
//! Kept in its own test binary: the signal is sent to the whole process.

#![cfg(unix)]

mod common;

use common::*;
use poolsd_core::sink::MemoryTargetSink;
use poolsd_core::{Poller, PollerEvent};
use std::time::Duration;

#[tokio::test]
async fn sigterm_stops_run_cleanly() {
    let source = ScriptedPoolSource::steady(&["10.0.0.1"]);
    let sink = MemoryTargetSink::new();

    let (poller, mut event_rx) =
        Poller::new(Box::new(source), Box::new(sink.clone()), &minimal_config())
            .expect("poller construction succeeds");

    let handle = tokio::spawn(async move { poller.run().await });

    // Handlers are installed before the first cycle publishes
    wait_for_publishes(&sink, 1).await;

    let rc = unsafe { libc::kill(libc::getpid(), libc::SIGTERM) };
    assert_eq!(rc, 0, "SIGTERM delivered");

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("poller stops within 5 seconds")
        .expect("poller task does not panic");
    assert!(result.is_ok(), "SIGTERM is a clean exit: {:?}", result);

    let mut events = Vec::new();
    while let Ok(event) = event_rx.try_recv() {
        events.push(event);
    }
    assert_eq!(
        events.last(),
        Some(&PollerEvent::Stopped {
            reason: "SIGTERM".to_string()
        })
    );
    assert_eq!(sink.publish_count().await, 1);
}
