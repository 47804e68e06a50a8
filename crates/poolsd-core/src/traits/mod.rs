//! Core traits for poolsd
//!
//! - [`InstancePoolSource`]: Look up the current members of an instance pool
//! - [`TargetSink`]: Publish the discovery document

pub mod pool_source;
pub mod target_sink;

pub use pool_source::InstancePoolSource;
pub use target_sink::TargetSink;
