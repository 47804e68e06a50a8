// # Target Sink Trait
//
// Defines where the discovery document goes after each successful cycle.
//
// ## Implementations
//
// - `FileTargetSink`: atomic write to the file Prometheus watches
// - `MemoryTargetSink`: in-process capture for embedding and tests

use async_trait::async_trait;

use crate::discovery::StaticSdConfig;

/// Trait for discovery document outputs
///
/// `publish` replaces the previous document as a whole. A reader must
/// observe either the previous or the new document, never a mix.
#[async_trait]
pub trait TargetSink: Send + Sync {
    /// Replace the published document
    async fn publish(&self, document: &StaticSdConfig) -> crate::Result<()>;

    /// Short description of the destination, used in logs
    fn describe(&self) -> String;
}
