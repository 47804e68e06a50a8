//! Test doubles and common utilities for poller contract tests
//!
//! This module provides minimal test doubles that record how the poller
//! drives its collaborators.

#![allow(dead_code)]

use poolsd_core::config::{InstancePoolConfig, PollerConfig, ProviderConfig};
use poolsd_core::discovery::StaticSdConfig;
use poolsd_core::error::{Error, Result};
use poolsd_core::sink::MemoryTargetSink;
use poolsd_core::traits::{InstancePoolSource, TargetSink};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const ZONE_ID: Uuid = Uuid::from_u128(0x4da1b188_dcd6_4ff5_b7fd_bde984055548);
pub const POOL_ID: Uuid = Uuid::from_u128(0xe3c5d2a4_9b1c_4f3e_8a7d_2b6f0c1d9e8f);

/// An InstancePoolSource that replays scripted responses
///
/// Once the script is exhausted every call returns `steady` members.
/// Clones share the script and the counters.
#[derive(Clone)]
pub struct ScriptedPoolSource {
    script: Arc<Mutex<VecDeque<Result<Vec<String>>>>>,
    steady: Vec<String>,
    call_count: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl ScriptedPoolSource {
    /// A source that always returns the same members
    pub fn steady(ips: &[&str]) -> Self {
        Self::scripted(Vec::new(), ips)
    }

    /// A source that replays `script` first, then returns `steady`
    pub fn scripted(script: Vec<Result<Vec<String>>>, steady: &[&str]) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            steady: ips(steady),
            call_count: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Make every lookup take `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times instance_ips() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InstancePoolSource for ScriptedPoolSource {
    async fn instance_ips(&self, zone_id: &Uuid, pool_id: &Uuid) -> Result<Vec<String>> {
        assert_eq!(*zone_id, ZONE_ID, "poller passes the configured zone");
        assert_eq!(*pool_id, POOL_ID, "poller passes the configured pool");

        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => Ok(self.steady.clone()),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A TargetSink that always fails
pub struct FailingSink;

#[async_trait::async_trait]
impl TargetSink for FailingSink {
    async fn publish(&self, _document: &StaticSdConfig) -> Result<()> {
        Err(Error::output("disk full"))
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}

pub fn ips(ips: &[&str]) -> Vec<String> {
    ips.iter().map(|ip| ip.to_string()).collect()
}

/// A transient lookup failure
pub fn transient() -> Error {
    Error::provider_transient("scripted", "503 Service Unavailable")
}

/// Helper to create a minimal PollerConfig for testing
pub fn minimal_config() -> PollerConfig {
    PollerConfig {
        pool: InstancePoolConfig::new(ZONE_ID, POOL_ID),
        provider: ProviderConfig::exoscale("EXO-test-key", "test-secret"),
        output: Default::default(),
        poll_interval_secs: 3600,
        max_consecutive_failures: 0,
        event_channel_capacity: 100,
    }
}

/// Wait until the sink holds at least `count` documents
pub async fn wait_for_publishes(sink: &MemoryTargetSink, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while sink.publish_count().await < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("sink did not reach {} publishes in time", count));
}
