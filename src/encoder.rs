//! Streaming encoder
//!
//! [`StreamEncoder`] accepts raw 16-bit little-endian PCM in chunks of any
//! size and writes the encoded bitstream to a destination. It owns the
//! engine's lifecycle: parameters are initialized on the first non-empty
//! write, trailing frames are flushed once, and the engine is closed once.
//!
//! ```
//! use lame_stream::{RecordingEngine, StreamEncoder};
//!
//! let mut mp3 = Vec::new();
//! StreamEncoder::scoped(RecordingEngine::new(), &mut mp3, |encoder| {
//!     encoder.set_num_channels(1)?;
//!     encoder.write(&[0u8; 4096])?;
//!     Ok(())
//! })
//! .unwrap();
//! assert!(!mp3.is_empty());
//! ```

use crate::aligner::BlockAligner;
use crate::config::{Channels, EncoderOption, MpegMode, VbrMode};
use crate::engine::{worst_case_output_size, Engine, FLUSH_BUFFER_SIZE};
use crate::error::{ConfigError, EncoderError, EncoderResult, EngineError};
use crate::pcm_utils::samples_from_le_bytes;
use crate::sink::OutputSink;
use crate::stats::StreamStats;
use log::{debug, trace, warn};
use std::io::{self, Write};

/// Lifecycle of a [`StreamEncoder`], only ever moving forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Engine parameters not finalized yet, options may change freely
    Uninitialized,
    /// Engine parameters finalized, block alignment fixed
    Initialized,
    /// Engine released, every further write or flush fails
    Closed,
}

#[derive(Debug)]
enum State {
    Uninitialized,
    Initialized {
        channels: Channels,
        aligner: BlockAligner,
    },
    Closed,
}

/// `std::io::Write` adapter from raw PCM to an encoded bitstream
///
/// The encoder is meant for a single writer. All methods take `&mut self`
/// and block until the engine and the destination return; callers sharing
/// an encoder between threads must wrap it in their own lock. It is `Send`
/// whenever the engine and destination are.
///
/// Call [`close`](Self::close) or [`finish`](Self::finish) when the stream
/// ends. Dropping an open encoder closes it as a fallback and logs a
/// warning.
#[derive(Debug)]
pub struct StreamEncoder<E: Engine, W: Write> {
    engine: E,
    sink: OutputSink<W>,
    state: State,
    stats: StreamStats,
    deferred: Option<io::Error>,
}

impl<E: Engine, W: Write> StreamEncoder<E, W> {
    /// Wrap `destination` with a default-sized output buffer
    pub fn new(engine: E, destination: W) -> Self {
        Self::from_sink(engine, OutputSink::new(destination))
    }

    /// Wrap `destination` with an output buffer of `capacity` bytes.
    /// Zero sends every encoded chunk straight to the destination.
    pub fn with_capacity(engine: E, capacity: usize, destination: W) -> Self {
        Self::from_sink(engine, OutputSink::with_capacity(capacity, destination))
    }

    fn from_sink(engine: E, sink: OutputSink<W>) -> Self {
        debug!("stream encoder created, output buffer {} bytes", sink.buffer_capacity());
        Self {
            engine,
            sink,
            state: State::Uninitialized,
            stats: StreamStats::default(),
            deferred: None,
        }
    }

    /// Run `body` against a fresh encoder, then close it on every exit path.
    ///
    /// Errors from `body` are returned after the encoder has been closed.
    pub fn scoped<T, F>(engine: E, destination: W, body: F) -> EncoderResult<T>
    where
        F: FnOnce(&mut Self) -> EncoderResult<T>,
    {
        let mut encoder = Self::new(engine, destination);
        let result = body(&mut encoder);
        encoder.close();
        result
    }

    /// Encode a chunk of interleaved PCM bytes.
    ///
    /// Returns `bytes.len()` on success. Bytes that do not complete a sample
    /// block are held back and prefixed to the next chunk. On an engine
    /// error the held-back bytes are left as they were and nothing reaches
    /// the destination.
    ///
    /// Once a chunk is encoded it counts as consumed. If the destination
    /// then fails, the encoded bytes stay pending and the error is returned
    /// by the next `write`, `flush` or `finish` instead, before any new
    /// input is taken.
    pub fn write(&mut self, bytes: &[u8]) -> EncoderResult<usize> {
        if matches!(self.state, State::Closed) {
            return Err(EncoderError::Closed);
        }
        if bytes.is_empty() {
            return Ok(0);
        }
        self.take_deferred()?;
        self.ensure_initialized()?;

        let (channels, aligner) = match &mut self.state {
            State::Initialized { channels, aligner } => (*channels, aligner),
            _ => return Err(EngineError::ParametersNotInitialized.into()),
        };

        let chunk = aligner.split(bytes);
        if chunk.is_empty() {
            trace!("buffered {} bytes short of a sample block", chunk.remainder().len());
            aligner.commit(chunk);
            self.stats.bytes_accepted += bytes.len() as u64;
            return Ok(bytes.len());
        }

        let samples = samples_from_le_bytes(chunk.aligned());
        let sample_count = chunk.aligned().len() / aligner.alignment();
        let mut scratch = vec![0u8; worst_case_output_size(sample_count)];

        let produced = match channels {
            Channels::Mono => self.engine.encode_mono(&samples, &mut scratch),
            Channels::Stereo => self.engine.encode_interleaved(&samples, &mut scratch),
        }
        .map_err(|err| {
            debug!("encode of {} samples failed: {}", sample_count, err);
            err
        })?;

        trace!(
            "encoded {} samples per channel into {} bytes, {} bytes held back",
            sample_count,
            produced,
            chunk.remainder().len()
        );
        self.stats.bytes_submitted += chunk.aligned().len() as u64;
        aligner.commit(chunk);

        self.stats.encode_calls += 1;
        self.stats.bytes_encoded += produced as u64;
        self.stats.bytes_accepted += bytes.len() as u64;

        if let Err(err) = self.sink.write(&scratch[..produced]) {
            warn!(
                "destination write failed, {} encoded byte(s) pending: {}",
                self.sink.pending().len(),
                err
            );
            self.deferred = Some(err);
        }
        self.record_delivery();
        Ok(bytes.len())
    }

    fn take_deferred(&mut self) -> EncoderResult<()> {
        match self.deferred.take() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn record_delivery(&mut self) {
        self.stats.bytes_written = self.sink.bytes_accepted();
    }

    fn ensure_initialized(&mut self) -> EncoderResult<()> {
        if !matches!(self.state, State::Uninitialized) {
            return Ok(());
        }

        let channels = Channels::try_from(self.engine.option(EncoderOption::NumChannels))?;
        self.engine.init_params()?;

        debug!(
            "engine initialized: {} channel(s), {} Hz, block alignment {} bytes",
            channels.count(),
            self.engine.option(EncoderOption::InSampleRate),
            channels.block_alignment()
        );
        self.state = State::Initialized {
            channels,
            aligner: BlockAligner::new(channels.block_alignment()),
        };
        Ok(())
    }

    /// Drain the engine's trailing frames to the destination.
    ///
    /// Returns how many bytes the destination accepted. Held-back input is
    /// not touched and the encoder stays usable, although the engine
    /// treats a flush as the end of the stream.
    pub fn flush(&mut self) -> EncoderResult<usize> {
        match self.state {
            State::Closed => return Err(EncoderError::Closed),
            State::Uninitialized => return Err(EngineError::ParametersNotInitialized.into()),
            State::Initialized { .. } => {}
        }
        self.take_deferred()?;

        let mut scratch = vec![0u8; FLUSH_BUFFER_SIZE];
        let produced = self.engine.flush(&mut scratch)?;
        if produced == 0 {
            trace!("engine flush produced no output");
            return Ok(0);
        }

        debug!("engine flush produced {} bytes", produced);
        self.stats.flushes += 1;
        self.stats.bytes_encoded += produced as u64;

        let written = self.sink.write(&scratch[..produced]);
        self.record_delivery();
        let written = written?;
        self.sink.flush_to_destination()?;
        Ok(written)
    }

    /// Flush and release the engine. Safe to call any number of times.
    ///
    /// Failures along the way are logged rather than returned; use
    /// [`finish`](Self::finish) to observe them. Input bytes short of a
    /// whole sample block are dropped and counted in
    /// [`StreamStats::dropped_bytes`].
    pub fn close(&mut self) {
        if matches!(self.state, State::Closed) {
            return;
        }
        if let Some(err) = self.deferred.take() {
            warn!("destination write failed earlier: {}", err);
        }

        if matches!(self.state, State::Initialized { .. }) {
            if let Err(err) = self.flush() {
                warn!("flush during close failed: {}", err);
            }
        }
        let drained = self.sink.drain_pending();
        self.record_delivery();
        if let Err(err) = drained {
            warn!("{} encoded byte(s) left undelivered: {}", self.sink.pending().len(), err);
        }
        if let Err(err) = self.sink.flush_to_destination() {
            warn!("destination flush during close failed: {}", err);
        }
        self.shutdown();
    }

    /// Flush, close and return the stream statistics, surfacing the first
    /// flush or destination error. The engine is released either way.
    pub fn finish(mut self) -> EncoderResult<StreamStats> {
        let result = self.finish_in_place();
        self.shutdown();
        result.map(|()| self.stats.clone())
    }

    fn finish_in_place(&mut self) -> EncoderResult<()> {
        match self.state {
            State::Closed => return Err(EncoderError::Closed),
            State::Initialized { .. } => {
                self.flush()?;
            }
            State::Uninitialized => self.take_deferred()?,
        }
        let drained = self.sink.drain_pending();
        self.record_delivery();
        drained?;
        self.sink.flush_to_destination()?;
        Ok(())
    }

    fn shutdown(&mut self) {
        if matches!(self.state, State::Closed) {
            return;
        }

        if let State::Initialized { aligner, .. } = &mut self.state {
            let dropped = aligner.discard();
            if dropped > 0 {
                warn!(
                    "dropping {} trailing input byte(s) that do not form a whole sample block",
                    dropped
                );
                self.stats.dropped_bytes += dropped as u64;
            }
        }

        self.engine.close();
        self.state = State::Closed;
        debug!(
            "stream encoder closed: {} bytes in, {} bytes out",
            self.stats.bytes_accepted, self.stats.bytes_encoded
        );
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.state {
            State::Uninitialized => Lifecycle::Uninitialized,
            State::Initialized { .. } => Lifecycle::Initialized,
            State::Closed => Lifecycle::Closed,
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, State::Initialized { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Input bytes held back until they complete a sample block
    pub fn remainder(&self) -> &[u8] {
        match &self.state {
            State::Initialized { aligner, .. } => aligner.remainder(),
            _ => &[],
        }
    }

    /// Encoded bytes the destination has not accepted yet
    pub fn pending_output(&self) -> &[u8] {
        self.sink.pending()
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// The engine, for operations layered on top such as metadata tags
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The destination. Bytes still in the output buffer have not reached it.
    pub fn get_ref(&self) -> &W {
        self.sink.get_ref()
    }

    pub fn get_mut(&mut self) -> &mut W {
        self.sink.get_mut()
    }

    // Options

    fn ensure_open(&self) -> EncoderResult<()> {
        if matches!(self.state, State::Closed) {
            return Err(EncoderError::Closed);
        }
        Ok(())
    }

    /// Forward an integer option to the engine.
    ///
    /// The channel count is validated and refused once the encoder is
    /// initialized. Every other option is passed through and the engine's
    /// status returned.
    pub fn configure(&mut self, option: EncoderOption, value: i64) -> EncoderResult<()> {
        self.ensure_open()?;
        if option == EncoderOption::NumChannels {
            if self.is_initialized() {
                return Err(ConfigError::ChannelsLocked.into());
            }
            Channels::try_from(value)?;
        }
        trace!("configure {:?} = {}", option, value);
        self.engine.configure(option, value)?;
        Ok(())
    }

    /// Current engine value of an integer option
    pub fn option(&self, option: EncoderOption) -> i64 {
        self.engine.option(option)
    }

    /// Number of interleaved input channels, 1 or 2. Default 2.
    pub fn set_num_channels(&mut self, channels: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::NumChannels, channels)
    }

    pub fn num_channels(&self) -> i64 {
        self.option(EncoderOption::NumChannels)
    }

    /// Input sample rate in Hz. Default 44100.
    pub fn set_in_sample_rate(&mut self, sample_rate: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::InSampleRate, sample_rate)
    }

    pub fn in_sample_rate(&self) -> i64 {
        self.option(EncoderOption::InSampleRate)
    }

    /// Constant bitrate in kbps
    pub fn set_bitrate(&mut self, kbps: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::Brate, kbps)
    }

    pub fn bitrate(&self) -> i64 {
        self.option(EncoderOption::Brate)
    }

    /// Algorithm selection, 0 = best and slowest, 9 = worst and fastest.
    /// 2 is near-best, 5 good and fast, 7 acceptable and very fast.
    pub fn set_quality(&mut self, quality: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::Quality, quality)
    }

    pub fn quality(&self) -> i64 {
        self.option(EncoderOption::Quality)
    }

    pub fn set_mode(&mut self, mode: MpegMode) -> EncoderResult<()> {
        self.configure(EncoderOption::Mode, mode as i64)
    }

    /// `None` if the engine reports a value outside [`MpegMode`]
    pub fn mode(&self) -> Option<MpegMode> {
        MpegMode::from_value(self.option(EncoderOption::Mode))
    }

    pub fn set_vbr(&mut self, mode: VbrMode) -> EncoderResult<()> {
        self.configure(EncoderOption::Vbr, mode as i64)
    }

    pub fn vbr(&self) -> Option<VbrMode> {
        VbrMode::from_value(self.option(EncoderOption::Vbr))
    }

    /// VBR quality, 0.0 = highest, approaching 10.0 = lowest
    pub fn set_vbr_quality(&mut self, quality: f32) -> EncoderResult<()> {
        self.ensure_open()?;
        self.engine.configure_vbr_quality(quality)?;
        Ok(())
    }

    pub fn vbr_quality(&self) -> f32 {
        self.engine.vbr_quality()
    }

    /// Mean bitrate, ignored unless the VBR mode is [`VbrMode::Abr`]
    pub fn set_vbr_mean_bitrate_kbps(&mut self, kbps: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::VbrMeanBitrateKbps, kbps)
    }

    pub fn vbr_mean_bitrate_kbps(&self) -> i64 {
        self.option(EncoderOption::VbrMeanBitrateKbps)
    }

    pub fn set_vbr_min_bitrate_kbps(&mut self, kbps: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::VbrMinBitrateKbps, kbps)
    }

    pub fn vbr_min_bitrate_kbps(&self) -> i64 {
        self.option(EncoderOption::VbrMinBitrateKbps)
    }

    pub fn set_vbr_max_bitrate_kbps(&mut self, kbps: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::VbrMaxBitrateKbps, kbps)
    }

    pub fn vbr_max_bitrate_kbps(&self) -> i64 {
        self.option(EncoderOption::VbrMaxBitrateKbps)
    }

    /// Enforce the minimum bitrate strictly, even for digital silence
    pub fn set_vbr_hard_min(&mut self, enforce: bool) -> EncoderResult<()> {
        self.configure(EncoderOption::VbrHardMin, enforce as i64)
    }

    pub fn vbr_hard_min(&self) -> bool {
        self.option(EncoderOption::VbrHardMin) == 1
    }

    /// Lowpass frequency in Hz. 0 lets the engine choose, -1 disables it.
    pub fn set_lowpass_frequency(&mut self, frequency: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::LowPassFrequency, frequency)
    }

    pub fn lowpass_frequency(&self) -> i64 {
        self.option(EncoderOption::LowPassFrequency)
    }

    pub fn set_lowpass_width(&mut self, width: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::LowPassWidth, width)
    }

    pub fn lowpass_width(&self) -> i64 {
        self.option(EncoderOption::LowPassWidth)
    }

    /// Highpass frequency in Hz. 0 lets the engine choose, -1 disables it.
    pub fn set_highpass_frequency(&mut self, frequency: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::HighPassFrequency, frequency)
    }

    pub fn highpass_frequency(&self) -> i64 {
        self.option(EncoderOption::HighPassFrequency)
    }

    pub fn set_highpass_width(&mut self, width: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::HighPassWidth, width)
    }

    pub fn highpass_width(&self) -> i64 {
        self.option(EncoderOption::HighPassWidth)
    }

    /// Total samples per channel hint. Default 2^32-1.
    pub fn set_num_samples(&mut self, samples: i64) -> EncoderResult<()> {
        self.configure(EncoderOption::NumSamples, samples)
    }

    pub fn num_samples(&self) -> i64 {
        self.option(EncoderOption::NumSamples)
    }
}

impl<E: Engine, W: Write> Write for StreamEncoder<E, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(StreamEncoder::write(self, buf)?)
    }

    /// Pushes buffered output to the destination. The engine is not
    /// flushed, since that ends the stream.
    fn flush(&mut self) -> io::Result<()> {
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }
        self.sink.flush_to_destination()
    }
}

impl<E: Engine, W: Write> Drop for StreamEncoder<E, W> {
    fn drop(&mut self) {
        if !matches!(self.state, State::Closed) {
            warn!("stream encoder dropped without close, closing now");
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::{EngineCall, RecordingEngine};
    use util::{ramp_bytes, ChunkedWriter, FailingWriter, SharedBuffer};

    fn mono_encoder() -> (StreamEncoder<RecordingEngine, SharedBuffer>, SharedBuffer) {
        let output = SharedBuffer::new();
        let mut encoder = StreamEncoder::new(RecordingEngine::new(), output.clone());
        encoder.set_num_channels(1).unwrap();
        (encoder, output)
    }

    #[test]
    fn test_lazy_initialization_on_first_write() {
        let (mut encoder, _output) = mono_encoder();
        let journal = encoder.engine().journal();
        assert_eq!(encoder.lifecycle(), Lifecycle::Uninitialized);

        assert_eq!(encoder.write(&[]).unwrap(), 0);
        assert_eq!(encoder.lifecycle(), Lifecycle::Uninitialized);

        encoder.write(&[0, 0]).unwrap();
        encoder.write(&[0, 0]).unwrap();
        assert_eq!(encoder.lifecycle(), Lifecycle::Initialized);
        assert_eq!(journal.count(|call| *call == EngineCall::InitParams), 1);
    }

    #[test]
    fn test_dispatch_follows_channel_count() {
        let (mut mono, _) = mono_encoder();
        mono.write(&[0; 8]).unwrap();
        assert_eq!(
            mono.engine().journal().calls().last(),
            Some(&EngineCall::EncodeMono { samples: 4 })
        );

        let mut stereo = StreamEncoder::new(RecordingEngine::new(), Vec::new());
        stereo.write(&[0; 8]).unwrap();
        assert_eq!(
            stereo.engine().journal().calls().last(),
            Some(&EngineCall::EncodeInterleaved { samples: 4 })
        );
    }

    #[test]
    fn test_remainder_is_held_between_writes() {
        let mut encoder = StreamEncoder::new(RecordingEngine::new(), Vec::new());

        assert_eq!(encoder.write(&[1, 2, 3, 4, 5]).unwrap(), 5);
        assert_eq!(encoder.remainder(), &[5]);

        assert_eq!(encoder.write(&[6, 7, 8]).unwrap(), 3);
        assert!(encoder.remainder().is_empty());
        assert_eq!(encoder.stats().bytes_submitted, 8);
    }

    #[test]
    fn test_flush_before_init_fails_without_engine_call() {
        let (mut encoder, _) = mono_encoder();
        let journal = encoder.engine().journal();

        let err = encoder.flush().unwrap_err();
        assert!(matches!(err, EncoderError::Engine(EngineError::ParametersNotInitialized)));
        assert_eq!(journal.count(|call| *call == EngineCall::Flush), 0);
    }

    #[test]
    fn test_channels_locked_after_init() {
        let (mut encoder, _) = mono_encoder();
        encoder.write(&[0; 4]).unwrap();

        let err = encoder.set_num_channels(2).unwrap_err();
        assert!(matches!(err, EncoderError::Config(ConfigError::ChannelsLocked)));
        assert_eq!(encoder.num_channels(), 1);

        encoder.set_quality(7).unwrap();
        assert_eq!(encoder.quality(), 7);
    }

    #[test]
    fn test_invalid_channel_count_is_rejected_before_engine() {
        let (mut encoder, _) = mono_encoder();
        let journal = encoder.engine().journal();
        let before = journal.calls().len();

        let err = encoder.set_num_channels(3).unwrap_err();
        assert!(matches!(err, EncoderError::Config(ConfigError::InvalidChannels(3))));
        assert_eq!(journal.calls().len(), before);
    }

    #[test]
    fn test_typed_options_round_trip() {
        let mut encoder = StreamEncoder::new(RecordingEngine::new(), Vec::new());

        encoder.set_mode(MpegMode::JointStereo).unwrap();
        encoder.set_vbr(VbrMode::Abr).unwrap();
        encoder.set_vbr_quality(2.5).unwrap();
        encoder.set_vbr_hard_min(true).unwrap();
        encoder.set_lowpass_width(500).unwrap();

        assert_eq!(encoder.mode(), Some(MpegMode::JointStereo));
        assert_eq!(encoder.vbr(), Some(VbrMode::Abr));
        assert_eq!(encoder.vbr_quality(), 2.5);
        assert!(encoder.vbr_hard_min());
        assert_eq!(encoder.lowpass_width(), 500);
    }

    #[test]
    fn test_setters_fail_after_close() {
        let (mut encoder, _) = mono_encoder();
        encoder.close();

        assert!(matches!(encoder.set_bitrate(64), Err(EncoderError::Closed)));
        assert!(matches!(encoder.set_vbr_quality(1.0), Err(EncoderError::Closed)));
    }

    #[test]
    fn test_close_drops_and_counts_remainder() {
        let (mut encoder, _) = mono_encoder();
        encoder.write(&[1, 2, 3]).unwrap();

        encoder.close();
        assert_eq!(encoder.stats().dropped_bytes, 1);
        assert!(encoder.remainder().is_empty());
    }

    #[test]
    fn test_finish_surfaces_destination_error() {
        let mut encoder = StreamEncoder::with_capacity(
            RecordingEngine::new(),
            0,
            FailingWriter::new(io::ErrorKind::BrokenPipe),
        );
        encoder.set_num_channels(1).unwrap();
        let journal = encoder.engine().journal();

        // nothing reaches the destination until a frame completes
        encoder.write(&[0; 64]).unwrap();

        let err = encoder.finish().unwrap_err();
        assert!(matches!(err, EncoderError::DestinationWriteFailure(_)));
        assert_eq!(journal.count(|call| *call == EngineCall::Close), 1);
    }

    #[test]
    fn test_finish_returns_stats() {
        let (mut encoder, output) = mono_encoder();
        encoder.write(&ramp_bytes(4096)).unwrap();

        let stats = encoder.finish().unwrap();
        assert_eq!(stats.bytes_accepted, 4096);
        assert_eq!(stats.bytes_encoded as usize, output.len());
        assert_eq!(stats.flushes, 1);
    }

    #[test]
    fn test_io_write_flush_never_flushes_engine() {
        let mut encoder =
            StreamEncoder::with_capacity(RecordingEngine::new(), 0, ChunkedWriter::new(usize::MAX));
        let journal = encoder.engine().journal();

        encoder.write_all(&ramp_bytes(64)).unwrap();
        Write::flush(&mut encoder).unwrap();

        assert_eq!(journal.count(|call| *call == EngineCall::Flush), 0);
        assert_eq!(encoder.get_ref().flushes(), 1);
    }

    #[test]
    fn test_io_write_reports_closed_as_broken_pipe() {
        let (mut encoder, _) = mono_encoder();
        encoder.close();

        let err = Write::write(&mut encoder, &[0; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_scoped_closes_after_body_error() {
        let engine = RecordingEngine::new();
        let journal = engine.journal();

        let result: EncoderResult<()> = StreamEncoder::scoped(engine, Vec::new(), |encoder| {
            encoder.set_num_channels(5)?;
            Ok(())
        });

        assert!(matches!(result, Err(EncoderError::Config(ConfigError::InvalidChannels(5)))));
        assert_eq!(journal.count(|call| *call == EngineCall::Close), 1);
    }
}
