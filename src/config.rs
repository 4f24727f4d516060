//! Configuration management for the streaming encoder
//!
//! This module names every engine option the encoder can forward, the
//! enumerated option values (MPEG mode, VBR mode), the MPEG version tables
//! used to size frames, and a builder-style [`EncoderSettings`] bundle that
//! validates values before they reach the engine.

use crate::encoder::StreamEncoder;
use crate::engine::Engine;
use crate::error::{ConfigError, ConfigResult, EncoderResult};
use std::io::Write;

#[cfg(feature = "diagnostics")]
use serde::{Deserialize, Serialize};

/// Bytes per PCM sample. Input is always signed 16-bit little-endian.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Sample rates an MPEG layer III stream can carry. Input at any other rate
/// is left to the engine, which may resample it or refuse it at initialization.
pub const SUPPORTED_SAMPLE_RATES: &[u32] = &[
    8000, 11025, 12000,    // MPEG 2.5
    16000, 22050, 24000,   // MPEG 2
    32000, 44100, 48000,   // MPEG 1
];

/// Named engine options with integer values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "diagnostics", derive(Serialize, Deserialize))]
pub enum EncoderOption {
    /// Number of channels in the input stream, default 2
    NumChannels,
    /// Input sample rate in Hz, default 44100
    InSampleRate,
    /// Constant bitrate in kbps
    Brate,
    /// Algorithm selection, 0 = best (very slow), 9 = worst
    Quality,
    /// Output MPEG mode, see [`MpegMode`]
    Mode,
    /// VBR mode, see [`VbrMode`]
    Vbr,
    /// Mean bitrate, only used in ABR mode
    VbrMeanBitrateKbps,
    /// Minimum bitrate, only used in ABR mode
    VbrMinBitrateKbps,
    /// Maximum bitrate, only used in ABR mode
    VbrMaxBitrateKbps,
    /// 1 = strictly enforce the minimum bitrate, even for digital silence
    VbrHardMin,
    /// Lowpass frequency in Hz, 0 = engine chooses, -1 = disabled
    LowPassFrequency,
    /// Width of the lowpass transition band in Hz
    LowPassWidth,
    /// Highpass frequency in Hz, 0 = engine chooses, -1 = disabled
    HighPassFrequency,
    /// Width of the highpass transition band in Hz
    HighPassWidth,
    /// Total sample count hint, default 2^32-1
    NumSamples,
    /// 1 = engine writes the ID3v2 tag into the stream at initialization
    WriteId3TagAutomatic,
}

impl EncoderOption {
    /// Every integer option, in declaration order
    pub const ALL: [EncoderOption; 16] = [
        EncoderOption::NumChannels,
        EncoderOption::InSampleRate,
        EncoderOption::Brate,
        EncoderOption::Quality,
        EncoderOption::Mode,
        EncoderOption::Vbr,
        EncoderOption::VbrMeanBitrateKbps,
        EncoderOption::VbrMinBitrateKbps,
        EncoderOption::VbrMaxBitrateKbps,
        EncoderOption::VbrHardMin,
        EncoderOption::LowPassFrequency,
        EncoderOption::LowPassWidth,
        EncoderOption::HighPassFrequency,
        EncoderOption::HighPassWidth,
        EncoderOption::NumSamples,
        EncoderOption::WriteId3TagAutomatic,
    ];
}

/// Number of audio channels accepted by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(Serialize, Deserialize))]
pub enum Channels {
    /// Mono audio (1 channel)
    Mono = 1,
    /// Stereo audio (2 channels, interleaved L/R)
    Stereo = 2,
}

impl Channels {
    /// Channel count as a plain number
    pub fn count(self) -> usize {
        self as usize
    }

    /// Bytes in one sample instant across all channels
    pub fn block_alignment(self) -> usize {
        BYTES_PER_SAMPLE * self.count()
    }
}

impl TryFrom<i64> for Channels {
    type Error = ConfigError;

    fn try_from(value: i64) -> ConfigResult<Self> {
        match value {
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            other => Err(ConfigError::InvalidChannels(other)),
        }
    }
}

impl From<Channels> for i64 {
    fn from(channels: Channels) -> Self {
        channels as i64
    }
}

/// Output MPEG mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(Serialize, Deserialize))]
pub enum MpegMode {
    /// Standard stereo
    Stereo = 0,
    /// Joint stereo (mid/side)
    JointStereo = 1,
    /// Dual channel, not supported by LAME
    DualChannel = 2,
    /// Mono
    Mono = 3,
    /// Engine picks based on bitrate and input channels
    NotSet = 4,
}

impl MpegMode {
    /// Decode the engine's integer value
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(MpegMode::Stereo),
            1 => Some(MpegMode::JointStereo),
            2 => Some(MpegMode::DualChannel),
            3 => Some(MpegMode::Mono),
            4 => Some(MpegMode::NotSet),
            _ => None,
        }
    }
}

/// Variable bitrate mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(Serialize, Deserialize))]
pub enum VbrMode {
    /// Constant bitrate
    Off = 0,
    /// Obsolete, same as `Mtrh`
    Mt = 1,
    Rh = 2,
    /// Average bitrate
    Abr = 3,
    Mtrh = 4,
}

impl VbrMode {
    /// The engine's default VBR algorithm
    pub const DEFAULT: VbrMode = VbrMode::Mtrh;

    /// Decode the engine's integer value
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(VbrMode::Off),
            1 => Some(VbrMode::Mt),
            2 => Some(VbrMode::Rh),
            3 => Some(VbrMode::Abr),
            4 => Some(VbrMode::Mtrh),
            _ => None,
        }
    }
}

/// MPEG version enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    /// MPEG-1
    Mpeg1,
    /// MPEG-2
    Mpeg2,
    /// MPEG-2.5
    Mpeg25,
}

impl MpegVersion {
    /// MPEG version that carries the given sample rate
    pub fn for_sample_rate(sample_rate: u32) -> Option<Self> {
        match sample_rate {
            44100 | 48000 | 32000 => Some(MpegVersion::Mpeg1),
            22050 | 24000 | 16000 => Some(MpegVersion::Mpeg2),
            11025 | 12000 | 8000 => Some(MpegVersion::Mpeg25),
            _ => None,
        }
    }

    /// Samples per channel in one layer III frame
    pub fn samples_per_frame(self) -> usize {
        match self {
            MpegVersion::Mpeg1 => 1152,
            MpegVersion::Mpeg2 | MpegVersion::Mpeg25 => 576,
        }
    }

    /// Legal frame bitrates in kbps, ascending
    pub fn bitrates(self) -> &'static [u32] {
        match self {
            MpegVersion::Mpeg1 => &[32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
            MpegVersion::Mpeg2 => &[8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
            MpegVersion::Mpeg25 => &[8, 16, 24, 32, 40, 48, 56, 64],
        }
    }

    /// Closest legal bitrate for this version, ties resolved downwards
    pub fn nearest_bitrate(self, kbps: i64) -> u32 {
        let mut best = self.bitrates()[0];
        for &rate in self.bitrates() {
            if (rate as i64 - kbps).abs() < (best as i64 - kbps).abs() {
                best = rate;
            }
        }
        best
    }
}

/// A bundle of optional settings applied to an encoder before its first write
///
/// Unset fields keep the engine's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "diagnostics", derive(Serialize, Deserialize))]
pub struct EncoderSettings {
    pub channels: Option<Channels>,
    pub sample_rate: Option<u32>,
    pub bitrate: Option<u32>,
    pub quality: Option<u8>,
    pub mode: Option<MpegMode>,
    pub vbr: Option<VbrMode>,
    pub vbr_quality: Option<f32>,
    pub vbr_mean_bitrate_kbps: Option<u32>,
    pub vbr_min_bitrate_kbps: Option<u32>,
    pub vbr_max_bitrate_kbps: Option<u32>,
    pub lowpass_frequency: Option<i32>,
    pub highpass_frequency: Option<i32>,
    pub num_samples: Option<u32>,
}

impl EncoderSettings {
    /// Create an empty settings bundle
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channels(mut self, channels: Channels) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn bitrate(mut self, kbps: u32) -> Self {
        self.bitrate = Some(kbps);
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn mode(mut self, mode: MpegMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Select a VBR mode together with its quality (0.0 best, <10.0 worst)
    pub fn vbr(mut self, mode: VbrMode, quality: f32) -> Self {
        self.vbr = Some(mode);
        self.vbr_quality = Some(quality);
        self
    }

    /// ABR bounds in kbps
    pub fn abr(mut self, mean: u32, min: u32, max: u32) -> Self {
        self.vbr = Some(VbrMode::Abr);
        self.vbr_mean_bitrate_kbps = Some(mean);
        self.vbr_min_bitrate_kbps = Some(min);
        self.vbr_max_bitrate_kbps = Some(max);
        self
    }

    pub fn lowpass(mut self, frequency: i32) -> Self {
        self.lowpass_frequency = Some(frequency);
        self
    }

    pub fn highpass(mut self, frequency: i32) -> Self {
        self.highpass_frequency = Some(frequency);
        self
    }

    pub fn num_samples(mut self, samples: u32) -> Self {
        self.num_samples = Some(samples);
        self
    }

    /// Check values that the engine would otherwise accept silently
    pub fn validate(&self) -> ConfigResult<()> {
        // any positive input rate is resampled by the engine
        if self.sample_rate == Some(0) {
            return Err(ConfigError::InvalidSampleRate(0));
        }

        if let Some(quality) = self.quality {
            if quality > 9 {
                return Err(ConfigError::InvalidQuality(quality as i64));
            }
        }

        if let Some(quality) = self.vbr_quality {
            if !(0.0..10.0).contains(&quality) {
                return Err(ConfigError::InvalidVbrQuality(quality));
            }
        }

        Ok(())
    }

    /// Validate and forward every set field to the encoder's engine.
    ///
    /// Must run before the first write for the channel count to take effect.
    pub fn apply_to<E: Engine, W: Write>(
        &self,
        encoder: &mut StreamEncoder<E, W>,
    ) -> EncoderResult<()> {
        self.validate()?;

        if let Some(channels) = self.channels {
            encoder.set_num_channels(channels.count() as i64)?;
        }
        if let Some(rate) = self.sample_rate {
            encoder.set_in_sample_rate(rate as i64)?;
        }
        if let Some(kbps) = self.bitrate {
            encoder.set_bitrate(kbps as i64)?;
        }
        if let Some(quality) = self.quality {
            encoder.set_quality(quality as i64)?;
        }
        if let Some(mode) = self.mode {
            encoder.set_mode(mode)?;
        }
        if let Some(vbr) = self.vbr {
            encoder.set_vbr(vbr)?;
        }
        if let Some(quality) = self.vbr_quality {
            encoder.set_vbr_quality(quality)?;
        }
        if let Some(kbps) = self.vbr_mean_bitrate_kbps {
            encoder.set_vbr_mean_bitrate_kbps(kbps as i64)?;
        }
        if let Some(kbps) = self.vbr_min_bitrate_kbps {
            encoder.set_vbr_min_bitrate_kbps(kbps as i64)?;
        }
        if let Some(kbps) = self.vbr_max_bitrate_kbps {
            encoder.set_vbr_max_bitrate_kbps(kbps as i64)?;
        }
        if let Some(frequency) = self.lowpass_frequency {
            encoder.set_lowpass_frequency(frequency as i64)?;
        }
        if let Some(frequency) = self.highpass_frequency {
            encoder.set_highpass_frequency(frequency as i64)?;
        }
        if let Some(samples) = self.num_samples {
            encoder.set_num_samples(samples as i64)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn valid_sample_rate()(rate in prop::sample::select(SUPPORTED_SAMPLE_RATES)) -> u32 {
            rate
        }
    }

    proptest! {
        #[test]
        fn test_valid_sample_rates_pass_validation(
            rate in valid_sample_rate(),
            quality in 0u8..=9,
        ) {
            let settings = EncoderSettings::new().sample_rate(rate).quality(quality);
            prop_assert!(settings.validate().is_ok());
            prop_assert!(MpegVersion::for_sample_rate(rate).is_some());
        }

        #[test]
        fn test_any_positive_input_rate_passes_validation(rate in 1u32..=u32::MAX) {
            let settings = EncoderSettings::new().sample_rate(rate);
            prop_assert!(settings.validate().is_ok());
        }

        #[test]
        fn test_nearest_bitrate_is_always_legal(rate in valid_sample_rate(), kbps in -10i64..1000) {
            let version = MpegVersion::for_sample_rate(rate).unwrap();
            let chosen = version.nearest_bitrate(kbps);
            prop_assert!(version.bitrates().contains(&chosen));
        }
    }

    #[test]
    fn test_channels_conversion() {
        assert_eq!(Channels::try_from(1), Ok(Channels::Mono));
        assert_eq!(Channels::try_from(2), Ok(Channels::Stereo));
        assert_eq!(Channels::try_from(0), Err(ConfigError::InvalidChannels(0)));
        assert_eq!(Channels::try_from(-1), Err(ConfigError::InvalidChannels(-1)));
        assert_eq!(Channels::try_from(3), Err(ConfigError::InvalidChannels(3)));

        assert_eq!(Channels::Mono.block_alignment(), 2);
        assert_eq!(Channels::Stereo.block_alignment(), 4);
    }

    #[test]
    fn test_samples_per_frame() {
        assert_eq!(MpegVersion::Mpeg1.samples_per_frame(), 1152);
        assert_eq!(MpegVersion::Mpeg2.samples_per_frame(), 576);
        assert_eq!(MpegVersion::Mpeg25.samples_per_frame(), 576);
    }

    #[test]
    fn test_nearest_bitrate_clamps_to_table() {
        assert_eq!(MpegVersion::Mpeg1.nearest_bitrate(1), 32);
        assert_eq!(MpegVersion::Mpeg1.nearest_bitrate(999), 320);
        assert_eq!(MpegVersion::Mpeg1.nearest_bitrate(130), 128);
        assert_eq!(MpegVersion::Mpeg25.nearest_bitrate(128), 64);
    }

    #[test]
    fn test_enum_values_decode() {
        let modes = [
            MpegMode::Stereo,
            MpegMode::JointStereo,
            MpegMode::DualChannel,
            MpegMode::Mono,
            MpegMode::NotSet,
        ];
        for mode in modes {
            assert_eq!(MpegMode::from_value(mode as i64), Some(mode));
        }
        assert_eq!(MpegMode::from_value(5), None);
        assert_eq!(VbrMode::from_value(VbrMode::DEFAULT as i64), Some(VbrMode::Mtrh));
        assert_eq!(VbrMode::from_value(-1), None);
    }

    #[test]
    fn test_high_input_rates_are_left_to_the_engine() {
        assert!(EncoderSettings::new().sample_rate(88200).validate().is_ok());
        assert!(EncoderSettings::new().sample_rate(96000).validate().is_ok());
        assert_eq!(
            EncoderSettings::new().sample_rate(0).validate(),
            Err(ConfigError::InvalidSampleRate(0))
        );
    }

    #[test]
    fn test_quality_bounds() {
        assert!(EncoderSettings::new().quality(9).validate().is_ok());
        assert_eq!(
            EncoderSettings::new().quality(10).validate(),
            Err(ConfigError::InvalidQuality(10))
        );
        assert_eq!(
            EncoderSettings::new().vbr(VbrMode::Mtrh, 10.0).validate(),
            Err(ConfigError::InvalidVbrQuality(10.0))
        );
    }
}
