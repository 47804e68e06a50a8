// # Memory Target Sink
//
// In-memory implementation of TargetSink.
//
// Keeps every published document in order. Useful for embedding the poller
// in another process and for tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::discovery::StaticSdConfig;
use crate::traits::TargetSink;

/// In-memory target sink
///
/// Clones share the same history, so a clone kept by the caller observes
/// what the poller published.
///
/// # Example
///
/// ```rust,no_run
/// use poolsd_core::discovery::StaticSdConfig;
/// use poolsd_core::sink::MemoryTargetSink;
/// use poolsd_core::traits::TargetSink;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = MemoryTargetSink::new();
///
///     sink.publish(&StaticSdConfig::from_targets(vec!["10.0.0.1".into()])).await?;
///
///     let latest = sink.latest().await.expect("published");
///     assert_eq!(latest.target_count(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTargetSink {
    published: Arc<RwLock<Vec<StaticSdConfig>>>,
}

impl MemoryTargetSink {
    /// Create a new empty memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently published document
    pub async fn latest(&self) -> Option<StaticSdConfig> {
        self.published.read().await.last().cloned()
    }

    /// Every published document, oldest first
    pub async fn history(&self) -> Vec<StaticSdConfig> {
        self.published.read().await.clone()
    }

    /// Number of documents published so far
    pub async fn publish_count(&self) -> usize {
        self.published.read().await.len()
    }
}

#[async_trait]
impl TargetSink for MemoryTargetSink {
    async fn publish(&self, document: &StaticSdConfig) -> Result<(), Error> {
        self.published.write().await.push(document.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
