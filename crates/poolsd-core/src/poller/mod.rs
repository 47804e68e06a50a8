//! Instance pool poller
//!
//! The Poller is responsible for:
//! - Looking up the pool members via InstancePoolSource
//! - Publishing the discovery document via TargetSink
//! - Repeating both on a fixed interval until shutdown
//!
//! ## Cycle
//!
//! ```text
//!   tick ──► InstancePoolSource::instance_ips()
//!                       │
//!                       ▼
//!            StaticSdConfig::from_targets()
//!                       │
//!                       ▼
//!              TargetSink::publish()
//! ```
//!
//! The first cycle runs immediately. Shutdown is only observed between
//! cycles: a cycle in progress always finishes, so the file is never left
//! behind half-replaced.
//!
//! ## Error Policy
//!
//! Errors are fatal and returned from [`Poller::run`]. The only exception
//! is a transient lookup failure while fewer than
//! `max_consecutive_failures` cycles in a row have failed: that cycle is
//! skipped and the previous file stays in place. There is no backoff, the
//! next attempt happens on the next regular tick.

mod signal;

pub use signal::ShutdownSignal;

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{InstancePoolConfig, PollerConfig};
use crate::discovery::StaticSdConfig;
use crate::error::{Error, Result};
use crate::traits::{InstancePoolSource, TargetSink};

/// Events emitted by the Poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerEvent {
    /// Poller started
    Started { zone_id: Uuid, pool_id: Uuid },

    /// A discovery document was published
    CyclePublished { targets: usize },

    /// A cycle failed
    CycleFailed {
        error: String,
        consecutive_failures: u32,
        fatal: bool,
    },

    /// Poller stopped
    Stopped { reason: String },
}

/// Instance pool poller
///
/// ## Lifecycle
///
/// 1. Create with [`Poller::new()`]
/// 2. Start with [`Poller::run()`]
/// 3. Runs until SIGINT/SIGTERM or a fatal error
pub struct Poller {
    /// Pool member lookup
    source: Box<dyn InstancePoolSource>,

    /// Discovery document output
    sink: Box<dyn TargetSink>,

    /// Watched pool
    pool: InstancePoolConfig,

    /// Time between two cycles
    poll_interval: Duration,

    /// Transient failures tolerated in a row
    max_consecutive_failures: u32,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<PollerEvent>,
}

impl Poller {
    /// Create a new poller
    ///
    /// # Returns
    ///
    /// A tuple of (poller, event_receiver) where event_receiver yields poller events
    pub fn new(
        source: Box<dyn InstancePoolSource>,
        sink: Box<dyn TargetSink>,
        config: &PollerConfig,
    ) -> Result<(Self, mpsc::Receiver<PollerEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let poller = Self {
            source,
            sink,
            pool: config.pool,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_consecutive_failures: config.max_consecutive_failures,
            event_tx: tx,
        };

        Ok((poller, rx))
    }

    /// Override the poll interval with sub-second precision
    ///
    /// # Errors
    ///
    /// Rejects a zero interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Result<Self> {
        if poll_interval.is_zero() {
            return Err(Error::config("Poll interval must be > 0"));
        }
        self.poll_interval = poll_interval;
        Ok(self)
    }

    /// Time between two cycles
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run until SIGINT or SIGTERM
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error
    pub async fn run(&self) -> Result<()> {
        let signals = ShutdownSignal::install()?;
        self.run_until(signals.recv()).await
    }

    /// Run until the oneshot fires or its sender is dropped
    pub async fn run_with_shutdown(&self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_until(async move {
            let _ = shutdown_rx.await;
            "shutdown requested"
        })
        .await
    }

    /// Run until `shutdown` resolves, the output naming the reason
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = &'static str>,
    {
        tokio::pin!(shutdown);

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(ticker);

        info!(
            "Polling instance pool {} in zone {} every {:?} via {}, publishing to {}",
            self.pool.pool_id,
            self.pool.zone_id,
            self.poll_interval,
            self.source.source_name(),
            self.sink.describe()
        );
        self.emit_event(PollerEvent::Started {
            zone_id: self.pool.zone_id,
            pool_id: self.pool.pool_id,
        });

        let mut consecutive_failures: u32 = 0;
        let mut last_targets: Option<Vec<String>> = None;

        loop {
            tokio::select! {
                biased;

                reason = &mut shutdown => {
                    info!("Shutdown signal received ({}), stopping poller", reason);
                    self.emit_event(PollerEvent::Stopped {
                        reason: reason.to_string(),
                    });
                    return Ok(());
                }

                _ = ticks.next() => {}
            }

            match self.poll_once().await {
                Ok(document) => {
                    if consecutive_failures > 0 {
                        info!("Recovered after {} failed cycle(s)", consecutive_failures);
                    }
                    consecutive_failures = 0;

                    let targets = document.groups().first().map(|g| g.targets.clone());
                    if targets != last_targets {
                        info!(
                            "Instance pool membership changed: {} target(s) {:?}",
                            document.target_count(),
                            targets.as_deref().unwrap_or_default()
                        );
                    } else {
                        debug!("Instance pool unchanged: {} target(s)", document.target_count());
                    }
                    last_targets = targets;

                    self.emit_event(PollerEvent::CyclePublished {
                        targets: document.target_count(),
                    });
                }
                Err(e) if e.is_transient() && consecutive_failures < self.max_consecutive_failures => {
                    consecutive_failures += 1;
                    warn!(
                        "Poll cycle failed ({}/{} tolerated), keeping previous targets: {}",
                        consecutive_failures, self.max_consecutive_failures, e
                    );
                    self.emit_event(PollerEvent::CycleFailed {
                        error: e.to_string(),
                        consecutive_failures,
                        fatal: false,
                    });
                }
                Err(e) => {
                    error!("Failed to refresh instance pool targets, giving up: {}", e);
                    self.emit_event(PollerEvent::CycleFailed {
                        error: e.to_string(),
                        consecutive_failures: consecutive_failures + 1,
                        fatal: true,
                    });
                    self.emit_event(PollerEvent::Stopped {
                        reason: "fatal error".to_string(),
                    });
                    return Err(e);
                }
            }
        }
    }

    /// Run a single lookup and publish cycle
    pub async fn poll_once(&self) -> Result<StaticSdConfig> {
        let ips = self
            .source
            .instance_ips(&self.pool.zone_id, &self.pool.pool_id)
            .await?;

        let document = StaticSdConfig::from_targets(ips);
        self.sink.publish(&document).await?;

        Ok(document)
    }

    /// Emit a poller event, dropping it when the channel is full
    fn emit_event(&self, event: PollerEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
