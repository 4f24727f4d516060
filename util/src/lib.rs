//! Test support for the streaming encoder
//!
//! Destination doubles that count, split, share or reject writes, and
//! generators for synthetic PCM input.

pub mod pcm;
pub mod writers;

// Re-export commonly used functions and types
pub use pcm::*;
pub use writers::*;
