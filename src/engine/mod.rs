//! Encoding engine capability
//!
//! The stream encoder never encodes audio itself. It drives an [`Engine`],
//! the per-stream state of an external encoder such as LAME, through a
//! small set of operations: configure, initialize once, encode, flush,
//! close.
//!
//! Two engines ship with the crate:
//! - [`recording::RecordingEngine`], a deterministic in-process stand-in
//!   that packs samples into MPEG-sized frames and journals every call
//! - `lame::LameEngine` (feature `lame`), bound to the system `libmp3lame`

use crate::config::EncoderOption;
use crate::error::EngineResult;

#[cfg(feature = "lame")]
pub mod lame;
pub mod recording;

/// Per-stream state of an external encoding engine
///
/// Implementations map the engine's status codes onto
/// [`EngineError`](crate::error::EngineError). Every method is synchronous
/// and runs to completion.
pub trait Engine {
    /// Set an integer option. Most options only take effect before
    /// [`init_params`](Engine::init_params).
    fn configure(&mut self, option: EncoderOption, value: i64) -> EngineResult<()>;

    /// Current value of an integer option
    fn option(&self, option: EncoderOption) -> i64;

    /// Set the VBR quality, 0.0 = highest, values approaching 10.0 = lowest
    fn configure_vbr_quality(&mut self, quality: f32) -> EngineResult<()>;

    fn vbr_quality(&self) -> f32;

    /// Finalize configuration. Called exactly once, before any encode call.
    fn init_params(&mut self) -> EngineResult<()>;

    /// Encode single-channel samples into `output`, returning the number of
    /// bytes produced. The engine may buffer input and produce nothing.
    fn encode_mono(&mut self, pcm: &[i16], output: &mut [u8]) -> EngineResult<usize>;

    /// Encode interleaved multi-channel samples (L, R, L, R, ...) into
    /// `output`, returning the number of bytes produced.
    fn encode_interleaved(&mut self, pcm: &[i16], output: &mut [u8]) -> EngineResult<usize>;

    /// Emit the trailing frames still held by the engine
    fn flush(&mut self, output: &mut [u8]) -> EngineResult<usize>;

    /// Release engine resources. Further calls other than getters fail.
    fn close(&mut self);
}

/// Worst-case encoded size for `sample_count` samples per channel:
/// `ceil(1.25 * sample_count) + 7200` bytes, as published by LAME.
pub fn worst_case_output_size(sample_count: usize) -> usize {
    (5 * sample_count).div_ceil(4) + FLUSH_BUFFER_SIZE
}

/// Largest trailing output a flush can produce
pub const FLUSH_BUFFER_SIZE: usize = 7200;
