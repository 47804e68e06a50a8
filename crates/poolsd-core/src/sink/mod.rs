// # Target Sink Implementations
//
// This module provides implementations of the TargetSink trait for
// different destinations.

pub mod file;
pub mod memory;

pub use file::FileTargetSink;
pub use memory::MemoryTargetSink;
