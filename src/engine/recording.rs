//! Deterministic in-process engine
//!
//! [`RecordingEngine`] behaves like a constant-bitrate layer III encoder
//! from the outside: it accepts samples in any batch size, emits whole
//! frames (sync word, header, body) once a frame's worth of samples per
//! channel has arrived, and pads the last partial frame on flush. The frame
//! body is a digest of the samples, not compressed audio, so output depends
//! only on the sample sequence and never on how it was chunked.
//!
//! Every call is appended to a shared [`Journal`], and failures can be
//! queued per operation, which makes the engine suitable for testing code
//! that drives an [`Engine`].

use crate::config::{EncoderOption, MpegVersion};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::pcm_utils::deinterleave_pcm;
use log::trace;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

const HEADER_BYTES: usize = 4;

/// One operation observed by a [`RecordingEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Configure(EncoderOption, i64),
    ConfigureVbrQuality(f32),
    InitParams,
    EncodeMono { samples: usize },
    EncodeInterleaved { samples: usize },
    Flush,
    Close,
}

/// Shared call log, still readable after the engine has been dropped
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

impl Journal {
    fn record(&self, call: EngineCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    /// Snapshot of every call so far, oldest first
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|call| predicate(call)).count())
            .unwrap_or(0)
    }

    /// Number of encode calls of either kind
    pub fn encode_calls(&self) -> usize {
        self.count(|call| {
            matches!(call, EngineCall::EncodeMono { .. } | EngineCall::EncodeInterleaved { .. })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().map(|calls| calls.is_empty()).unwrap_or(true)
    }
}

/// Frame geometry fixed at `init_params`
#[derive(Debug, Clone, Copy)]
struct FrameLayout {
    channels: usize,
    samples_per_frame: usize,
    frame_bytes: usize,
    header: [u8; HEADER_BYTES],
}

impl FrameLayout {
    fn new(
        channels: usize,
        sample_rate: u32,
        version: MpegVersion,
        bitrate_kbps: u32,
        mode: i64,
    ) -> Self {
        let samples_per_frame = version.samples_per_frame();
        let frame_bytes =
            samples_per_frame / 8 * bitrate_kbps as usize * 1000 / sample_rate as usize;

        let version_bits: u8 = match version {
            MpegVersion::Mpeg1 => 0b11,
            MpegVersion::Mpeg2 => 0b10,
            MpegVersion::Mpeg25 => 0b00,
        };
        let bitrate_index = version
            .bitrates()
            .iter()
            .position(|&rate| rate == bitrate_kbps)
            .map_or(0, |i| i + 1) as u8;
        let samplerate_index: u8 = match sample_rate {
            44100 | 22050 | 11025 => 0,
            48000 | 24000 | 12000 => 1,
            _ => 2,
        };
        let mode_bits: u8 = if channels == 1 { 3 } else { mode.clamp(0, 2) as u8 };

        // sync(11) version(2) layer III(2) no-crc(1) | bitrate(4) rate(2) pad priv | mode(2) ...
        let header = [
            0xFF,
            0xE0 | version_bits << 3 | 0b010 | 1,
            bitrate_index << 4 | samplerate_index << 2,
            mode_bits << 6,
        ];

        Self {
            channels,
            samples_per_frame,
            frame_bytes: frame_bytes.max(HEADER_BYTES),
            header,
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    init: VecDeque<EngineError>,
    encode: VecDeque<EngineError>,
    flush: VecDeque<EngineError>,
}

/// Deterministic stand-in for an MP3 encoding engine
#[derive(Debug)]
pub struct RecordingEngine {
    options: HashMap<EncoderOption, i64>,
    vbr_quality: f32,
    layout: Option<FrameLayout>,
    channel_buffers: Vec<Vec<i16>>,
    frames_emitted: u64,
    closed: bool,
    faults: Faults,
    journal: Journal,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingEngine {
    /// Create an engine with LAME's defaults: stereo, 44100 Hz, 128 kbps
    pub fn new() -> Self {
        let options = HashMap::from([
            (EncoderOption::NumChannels, 2),
            (EncoderOption::InSampleRate, 44100),
            (EncoderOption::Brate, 128),
            (EncoderOption::Quality, 5),
            (EncoderOption::Mode, 4),
            (EncoderOption::Vbr, 0),
            (EncoderOption::VbrMeanBitrateKbps, 128),
            (EncoderOption::VbrMinBitrateKbps, 0),
            (EncoderOption::VbrMaxBitrateKbps, 0),
            (EncoderOption::VbrHardMin, 0),
            (EncoderOption::LowPassFrequency, 0),
            (EncoderOption::LowPassWidth, -1),
            (EncoderOption::HighPassFrequency, 0),
            (EncoderOption::HighPassWidth, -1),
            (EncoderOption::NumSamples, u32::MAX as i64),
            (EncoderOption::WriteId3TagAutomatic, 1),
        ]);

        Self {
            options,
            vbr_quality: 4.0,
            layout: None,
            channel_buffers: Vec::new(),
            frames_emitted: 0,
            closed: false,
            faults: Faults::default(),
            journal: Journal::default(),
        }
    }

    /// Handle to this engine's call log
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Make the next `init_params` fail with `error`. Queued failures are
    /// consumed in order.
    pub fn fail_init(&mut self, error: EngineError) -> &mut Self {
        self.faults.init.push_back(error);
        self
    }

    /// Make the next encode call fail with `error`
    pub fn fail_encode(&mut self, error: EngineError) -> &mut Self {
        self.faults.encode.push_back(error);
        self
    }

    /// Make the next flush fail with `error`
    pub fn fail_flush(&mut self, error: EngineError) -> &mut Self {
        self.faults.flush.push_back(error);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.layout.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Samples per channel waiting for a complete frame
    pub fn buffered_samples(&self) -> usize {
        self.channel_buffers.first().map_or(0, Vec::len)
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    /// Size of every emitted frame, known after initialization
    pub fn frame_bytes(&self) -> Option<usize> {
        self.layout.map(|layout| layout.frame_bytes)
    }

    fn active_layout(&self) -> EngineResult<FrameLayout> {
        match self.layout {
            Some(layout) if !self.closed => Ok(layout),
            _ => Err(EngineError::ParametersNotInitialized),
        }
    }

    /// Check `output_len` has room for every frame the new samples would
    /// complete, before anything is buffered.
    fn accept(
        &self,
        layout: FrameLayout,
        samples_per_channel: usize,
        output_len: usize,
    ) -> EngineResult<()> {
        let complete = (self.buffered_samples() + samples_per_channel) / layout.samples_per_frame;
        if complete * layout.frame_bytes > output_len {
            return Err(EngineError::BufferTooSmall);
        }
        Ok(())
    }

    fn drain_frames(&mut self, layout: FrameLayout, output: &mut [u8]) -> usize {
        let mut written = 0;
        while self.buffered_samples() >= layout.samples_per_frame {
            let frame: Vec<Vec<i16>> = self
                .channel_buffers
                .iter_mut()
                .map(|buffer| buffer.drain(..layout.samples_per_frame).collect())
                .collect();
            self.write_frame(layout, &frame, &mut output[written..written + layout.frame_bytes]);
            written += layout.frame_bytes;
        }
        written
    }

    fn write_frame(&mut self, layout: FrameLayout, channels: &[Vec<i16>], out: &mut [u8]) {
        out[..HEADER_BYTES].copy_from_slice(&layout.header);

        // FNV-1a over the frame's samples seeds the body bytes
        let mut digest: u64 = 0xcbf2_9ce4_8422_2325;
        for sample in channels.iter().flatten() {
            for byte in sample.to_le_bytes() {
                digest ^= byte as u64;
                digest = digest.wrapping_mul(0x0100_0000_01b3);
            }
        }

        let mut state = digest | 1;
        for byte in out[HEADER_BYTES..].iter_mut() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *byte = state as u8;
        }

        self.frames_emitted += 1;
    }
}

impl Engine for RecordingEngine {
    fn configure(&mut self, option: EncoderOption, value: i64) -> EngineResult<()> {
        self.journal.record(EngineCall::Configure(option, value));
        if self.closed {
            return Err(EngineError::ParametersNotInitialized);
        }
        if option == EncoderOption::NumChannels && !(1..=2).contains(&value) {
            return Err(EngineError::BufferTooSmall);
        }
        self.options.insert(option, value);
        Ok(())
    }

    fn option(&self, option: EncoderOption) -> i64 {
        self.options.get(&option).copied().unwrap_or(0)
    }

    fn configure_vbr_quality(&mut self, quality: f32) -> EngineResult<()> {
        self.journal.record(EngineCall::ConfigureVbrQuality(quality));
        if self.closed {
            return Err(EngineError::ParametersNotInitialized);
        }
        self.vbr_quality = quality;
        Ok(())
    }

    fn vbr_quality(&self) -> f32 {
        self.vbr_quality
    }

    fn init_params(&mut self) -> EngineResult<()> {
        self.journal.record(EngineCall::InitParams);
        if let Some(err) = self.faults.init.pop_front() {
            return Err(err);
        }
        if self.closed {
            return Err(EngineError::ParametersNotInitialized);
        }

        let channels = self.option(EncoderOption::NumChannels);
        let sample_rate = self.option(EncoderOption::InSampleRate);
        let version = u32::try_from(sample_rate)
            .ok()
            .and_then(MpegVersion::for_sample_rate)
            .ok_or(EngineError::BufferTooSmall)?;
        if !(1..=2).contains(&channels) {
            return Err(EngineError::BufferTooSmall);
        }

        let bitrate = version.nearest_bitrate(self.option(EncoderOption::Brate));
        let layout = FrameLayout::new(
            channels as usize,
            sample_rate as u32,
            version,
            bitrate,
            self.option(EncoderOption::Mode),
        );
        trace!(
            "recording engine initialized: {} ch, {} Hz, {} kbps, {} bytes per frame",
            channels,
            sample_rate,
            bitrate,
            layout.frame_bytes
        );

        self.channel_buffers = vec![Vec::new(); layout.channels];
        self.layout = Some(layout);
        Ok(())
    }

    fn encode_mono(&mut self, pcm: &[i16], output: &mut [u8]) -> EngineResult<usize> {
        self.journal.record(EngineCall::EncodeMono { samples: pcm.len() });
        if let Some(err) = self.faults.encode.pop_front() {
            return Err(err);
        }
        let layout = self.active_layout()?;
        self.accept(layout, pcm.len(), output.len())?;

        for buffer in self.channel_buffers.iter_mut() {
            buffer.extend_from_slice(pcm);
        }
        Ok(self.drain_frames(layout, output))
    }

    fn encode_interleaved(&mut self, pcm: &[i16], output: &mut [u8]) -> EngineResult<usize> {
        self.journal.record(EngineCall::EncodeInterleaved { samples: pcm.len() });
        if let Some(err) = self.faults.encode.pop_front() {
            return Err(err);
        }
        let layout = self.active_layout()?;
        self.accept(layout, pcm.len() / layout.channels, output.len())?;

        deinterleave_pcm(pcm, &mut self.channel_buffers);
        Ok(self.drain_frames(layout, output))
    }

    fn flush(&mut self, output: &mut [u8]) -> EngineResult<usize> {
        self.journal.record(EngineCall::Flush);
        if let Some(err) = self.faults.flush.pop_front() {
            return Err(err);
        }
        let layout = self.active_layout()?;

        let pending = self.buffered_samples();
        if pending == 0 {
            return Ok(0);
        }
        if output.len() < layout.frame_bytes {
            return Err(EngineError::BufferTooSmall);
        }

        for buffer in self.channel_buffers.iter_mut() {
            buffer.resize(layout.samples_per_frame, 0);
        }
        Ok(self.drain_frames(layout, output))
    }

    fn close(&mut self) {
        self.journal.record(EngineCall::Close);
        self.closed = true;
        self.channel_buffers.clear();
    }
}
