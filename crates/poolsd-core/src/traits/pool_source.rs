// # Instance Pool Source Trait
//
// Defines the interface for looking up the members of an instance pool.
//
// ## Implementations
//
// - Exoscale: `poolsd-provider-exoscale` crate
//
// ## Usage
//
// ```rust,ignore
// use poolsd_core::InstancePoolSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* InstancePoolSource implementation */;
//
//     let ips = source.instance_ips(&zone_id, &pool_id).await?;
//     println!("{} members", ips.len());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use uuid::Uuid;

/// Trait for instance pool lookups
///
/// One call maps to one request against the provider API. Implementations
/// must not retry, cache or spawn background tasks; scheduling is owned by
/// the [`Poller`](crate::Poller).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so the poller can hold them behind
/// a `Box<dyn InstancePoolSource>`.
#[async_trait]
pub trait InstancePoolSource: Send + Sync {
    /// Return the IP address of every member of the pool
    ///
    /// # Errors
    ///
    /// - [`Error::PoolNotFound`](crate::Error::PoolNotFound) when the API
    ///   returns no pool
    /// - [`Error::AmbiguousPool`](crate::Error::AmbiguousPool) when it
    ///   returns more than one
    /// - transport, authentication and provider errors otherwise
    async fn instance_ips(&self, zone_id: &Uuid, pool_id: &Uuid) -> crate::Result<Vec<String>>;

    /// Short name of the provider, used in logs and errors
    fn source_name(&self) -> &'static str;
}
