// # poolsd-core
//
// Core library for publishing the members of a cloud instance pool as a
// Prometheus static service discovery file.
//
// ## Architecture Overview
//
// - **InstancePoolSource**: Trait for looking up the current pool members
// - **TargetSink**: Trait for publishing the discovery document
// - **StaticSdConfig**: The `[{"targets": [...], "labels": {}}]` document
// - **Poller**: Fixed-interval loop tying the two together, with signal handling
//
// Provider crates implement `InstancePoolSource`; the daemon only wires
// configuration, logging and the runtime around a `Poller`.

pub mod config;
pub mod discovery;
pub mod error;
pub mod poller;
pub mod sink;
pub mod traits;

// Re-export core types for convenience
pub use config::{InstancePoolConfig, OutputConfig, PollerConfig, ProviderConfig};
pub use discovery::{StaticSdConfig, TargetGroup};
pub use error::{Error, Result};
pub use poller::{Poller, PollerEvent, ShutdownSignal};
pub use sink::{FileTargetSink, MemoryTargetSink};
pub use traits::{InstancePoolSource, TargetSink};
