//! # lame-stream
//!
//! A streaming `std::io::Write` adapter that turns raw PCM, delivered in
//! chunks of any size, into an MP3 bitstream produced by an external
//! encoding engine.
//!
//! The crate does not compress audio itself. It splits input on sample
//! boundaries, carries leftover bytes between writes, sizes the engine's
//! output buffers, forwards partially accepted output without loss and
//! runs the engine's initialize, flush and close steps exactly once.
//!
//! Engines:
//! - [`RecordingEngine`]: deterministic in-process engine, always available
//! - `LameEngine`: the system `libmp3lame`, behind the `lame` feature

pub mod aligner;
pub mod config;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod pcm_utils;
pub mod sink;
pub mod stats;
#[cfg(feature = "lame")]
pub mod tag;

pub use config::{Channels, EncoderOption, EncoderSettings, MpegMode, MpegVersion, VbrMode};
pub use encoder::{Lifecycle, StreamEncoder};
pub use engine::recording::RecordingEngine;
pub use engine::Engine;
pub use error::{ConfigError, EncoderError, EncoderResult, EngineError};
pub use stats::StreamStats;

#[cfg(feature = "lame")]
pub use engine::lame::LameEngine;
#[cfg(feature = "lame")]
pub use error::TagError;
