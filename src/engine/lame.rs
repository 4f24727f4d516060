//! `libmp3lame` engine
//!
//! Links the system LAME library and drives one `lame_global_flags`
//! handle per stream. ID3 tag operations on the same handle live in
//! [`crate::tag`].

use crate::config::EncoderOption;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use log::debug;
use std::os::raw::{c_float, c_int, c_short, c_uchar, c_ulong};
use std::ptr;

#[allow(non_snake_case)]
pub(crate) mod ffi {
    use std::os::raw::{c_char, c_float, c_int, c_short, c_uchar, c_ulong};

    /// Opaque LAME encoder state
    #[repr(C)]
    pub struct LameGlobalFlags {
        _private: [u8; 0],
    }

    #[link(name = "mp3lame")]
    extern "C" {
        pub fn lame_init() -> *mut LameGlobalFlags;
        pub fn lame_init_params(gfp: *mut LameGlobalFlags) -> c_int;
        pub fn lame_close(gfp: *mut LameGlobalFlags) -> c_int;

        pub fn lame_set_num_channels(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_num_channels(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_in_samplerate(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_in_samplerate(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_brate(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_brate(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_quality(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_quality(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_mode(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_mode(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_VBR(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_VBR(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_VBR_quality(gfp: *mut LameGlobalFlags, value: c_float) -> c_int;
        pub fn lame_get_VBR_quality(gfp: *const LameGlobalFlags) -> c_float;
        pub fn lame_set_VBR_mean_bitrate_kbps(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_VBR_mean_bitrate_kbps(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_VBR_min_bitrate_kbps(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_VBR_min_bitrate_kbps(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_VBR_max_bitrate_kbps(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_VBR_max_bitrate_kbps(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_VBR_hard_min(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_VBR_hard_min(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_lowpassfreq(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_lowpassfreq(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_lowpasswidth(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_lowpasswidth(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_highpassfreq(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_highpassfreq(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_highpasswidth(gfp: *mut LameGlobalFlags, value: c_int) -> c_int;
        pub fn lame_get_highpasswidth(gfp: *const LameGlobalFlags) -> c_int;
        pub fn lame_set_num_samples(gfp: *mut LameGlobalFlags, value: c_ulong) -> c_int;
        pub fn lame_get_num_samples(gfp: *const LameGlobalFlags) -> c_ulong;
        pub fn lame_set_write_id3tag_automatic(gfp: *mut LameGlobalFlags, value: c_int);
        pub fn lame_get_write_id3tag_automatic(gfp: *const LameGlobalFlags) -> c_int;

        pub fn lame_encode_buffer(
            gfp: *mut LameGlobalFlags,
            buffer_l: *const c_short,
            buffer_r: *const c_short,
            nsamples: c_int,
            mp3buf: *mut c_uchar,
            mp3buf_size: c_int,
        ) -> c_int;
        pub fn lame_encode_buffer_interleaved(
            gfp: *mut LameGlobalFlags,
            pcm: *mut c_short,
            num_samples: c_int,
            mp3buf: *mut c_uchar,
            mp3buf_size: c_int,
        ) -> c_int;
        pub fn lame_encode_flush(
            gfp: *mut LameGlobalFlags,
            mp3buf: *mut c_uchar,
            size: c_int,
        ) -> c_int;

        pub fn id3tag_init(gfp: *mut LameGlobalFlags);
        pub fn id3tag_add_v2(gfp: *mut LameGlobalFlags);
        pub fn id3tag_v1_only(gfp: *mut LameGlobalFlags);
        pub fn id3tag_v2_only(gfp: *mut LameGlobalFlags);
        pub fn id3tag_space_v1(gfp: *mut LameGlobalFlags);
        pub fn id3tag_pad_v2(gfp: *mut LameGlobalFlags);
        pub fn id3tag_set_pad(gfp: *mut LameGlobalFlags, n: usize);
        pub fn id3tag_set_title(gfp: *mut LameGlobalFlags, title: *const c_char);
        pub fn id3tag_set_artist(gfp: *mut LameGlobalFlags, artist: *const c_char);
        pub fn id3tag_set_album(gfp: *mut LameGlobalFlags, album: *const c_char);
        pub fn id3tag_set_year(gfp: *mut LameGlobalFlags, year: *const c_char);
        pub fn id3tag_set_comment(gfp: *mut LameGlobalFlags, comment: *const c_char);
        pub fn id3tag_set_track(gfp: *mut LameGlobalFlags, track: *const c_char) -> c_int;
        pub fn id3tag_set_genre(gfp: *mut LameGlobalFlags, genre: *const c_char) -> c_int;
        pub fn lame_get_id3v1_tag(
            gfp: *mut LameGlobalFlags,
            buffer: *mut c_uchar,
            size: usize,
        ) -> usize;
        pub fn lame_get_id3v2_tag(
            gfp: *mut LameGlobalFlags,
            buffer: *mut c_uchar,
            size: usize,
        ) -> usize;
        pub fn lame_get_lametag_frame(
            gfp: *const LameGlobalFlags,
            buffer: *mut c_uchar,
            size: usize,
        ) -> usize;
    }
}

use ffi::LameGlobalFlags;

/// One LAME encoder handle
///
/// The handle is owned exclusively, so the engine can move between threads
/// but must not be shared. After [`close`](Engine::close) every getter
/// returns zero and every other call fails with
/// [`EngineError::ParametersNotInitialized`].
pub struct LameEngine {
    raw: *mut LameGlobalFlags,
}

// LAME handles have no thread affinity
unsafe impl Send for LameEngine {}

impl LameEngine {
    /// Allocate a LAME handle with the library defaults
    pub fn new() -> EngineResult<Self> {
        let raw = unsafe { ffi::lame_init() };
        if raw.is_null() {
            return Err(EngineError::AllocationFailure);
        }
        debug!("lame handle allocated");
        Ok(Self { raw })
    }

    pub fn is_closed(&self) -> bool {
        self.raw.is_null()
    }

    /// Live handle, or `None` once closed
    pub(crate) fn handle(&self) -> Option<*mut LameGlobalFlags> {
        if self.raw.is_null() {
            None
        } else {
            Some(self.raw)
        }
    }

    fn live(&self) -> EngineResult<*mut LameGlobalFlags> {
        self.handle().ok_or(EngineError::ParametersNotInitialized)
    }
}

impl std::fmt::Debug for LameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LameEngine").field("closed", &self.is_closed()).finish()
    }
}

// LAME rejects bad arguments with -1
fn to_c_int(value: i64) -> EngineResult<c_int> {
    c_int::try_from(value).map_err(|_| EngineError::BufferTooSmall)
}

fn status(code: c_int) -> EngineResult<()> {
    EngineError::check(code).map(|_| ())
}

impl Engine for LameEngine {
    fn configure(&mut self, option: EncoderOption, value: i64) -> EngineResult<()> {
        let gfp = self.live()?;
        let code = unsafe {
            match option {
                EncoderOption::NumChannels => ffi::lame_set_num_channels(gfp, to_c_int(value)?),
                EncoderOption::InSampleRate => ffi::lame_set_in_samplerate(gfp, to_c_int(value)?),
                EncoderOption::Brate => ffi::lame_set_brate(gfp, to_c_int(value)?),
                EncoderOption::Quality => ffi::lame_set_quality(gfp, to_c_int(value)?),
                EncoderOption::Mode => ffi::lame_set_mode(gfp, to_c_int(value)?),
                EncoderOption::Vbr => ffi::lame_set_VBR(gfp, to_c_int(value)?),
                EncoderOption::VbrMeanBitrateKbps => {
                    ffi::lame_set_VBR_mean_bitrate_kbps(gfp, to_c_int(value)?)
                }
                EncoderOption::VbrMinBitrateKbps => {
                    ffi::lame_set_VBR_min_bitrate_kbps(gfp, to_c_int(value)?)
                }
                EncoderOption::VbrMaxBitrateKbps => {
                    ffi::lame_set_VBR_max_bitrate_kbps(gfp, to_c_int(value)?)
                }
                EncoderOption::VbrHardMin => ffi::lame_set_VBR_hard_min(gfp, to_c_int(value)?),
                EncoderOption::LowPassFrequency => ffi::lame_set_lowpassfreq(gfp, to_c_int(value)?),
                EncoderOption::LowPassWidth => ffi::lame_set_lowpasswidth(gfp, to_c_int(value)?),
                EncoderOption::HighPassFrequency => {
                    ffi::lame_set_highpassfreq(gfp, to_c_int(value)?)
                }
                EncoderOption::HighPassWidth => ffi::lame_set_highpasswidth(gfp, to_c_int(value)?),
                EncoderOption::NumSamples => {
                    let samples =
                        c_ulong::try_from(value).map_err(|_| EngineError::BufferTooSmall)?;
                    ffi::lame_set_num_samples(gfp, samples)
                }
                EncoderOption::WriteId3TagAutomatic => {
                    ffi::lame_set_write_id3tag_automatic(gfp, to_c_int(value)?);
                    0
                }
            }
        };
        status(code)
    }

    fn option(&self, option: EncoderOption) -> i64 {
        let Some(gfp) = self.handle() else {
            return 0;
        };
        let gfp = gfp as *const LameGlobalFlags;
        unsafe {
            match option {
                EncoderOption::NumChannels => ffi::lame_get_num_channels(gfp) as i64,
                EncoderOption::InSampleRate => ffi::lame_get_in_samplerate(gfp) as i64,
                EncoderOption::Brate => ffi::lame_get_brate(gfp) as i64,
                EncoderOption::Quality => ffi::lame_get_quality(gfp) as i64,
                EncoderOption::Mode => ffi::lame_get_mode(gfp) as i64,
                EncoderOption::Vbr => ffi::lame_get_VBR(gfp) as i64,
                EncoderOption::VbrMeanBitrateKbps => {
                    ffi::lame_get_VBR_mean_bitrate_kbps(gfp) as i64
                }
                EncoderOption::VbrMinBitrateKbps => ffi::lame_get_VBR_min_bitrate_kbps(gfp) as i64,
                EncoderOption::VbrMaxBitrateKbps => ffi::lame_get_VBR_max_bitrate_kbps(gfp) as i64,
                EncoderOption::VbrHardMin => ffi::lame_get_VBR_hard_min(gfp) as i64,
                EncoderOption::LowPassFrequency => ffi::lame_get_lowpassfreq(gfp) as i64,
                EncoderOption::LowPassWidth => ffi::lame_get_lowpasswidth(gfp) as i64,
                EncoderOption::HighPassFrequency => ffi::lame_get_highpassfreq(gfp) as i64,
                EncoderOption::HighPassWidth => ffi::lame_get_highpasswidth(gfp) as i64,
                EncoderOption::NumSamples => ffi::lame_get_num_samples(gfp) as i64,
                EncoderOption::WriteId3TagAutomatic => {
                    ffi::lame_get_write_id3tag_automatic(gfp) as i64
                }
            }
        }
    }

    fn configure_vbr_quality(&mut self, quality: f32) -> EngineResult<()> {
        let gfp = self.live()?;
        status(unsafe { ffi::lame_set_VBR_quality(gfp, quality as c_float) })
    }

    fn vbr_quality(&self) -> f32 {
        match self.handle() {
            Some(gfp) => unsafe { ffi::lame_get_VBR_quality(gfp) },
            None => 0.0,
        }
    }

    fn init_params(&mut self) -> EngineResult<()> {
        let gfp = self.live()?;
        status(unsafe { ffi::lame_init_params(gfp) })
    }

    fn encode_mono(&mut self, pcm: &[i16], output: &mut [u8]) -> EngineResult<usize> {
        let gfp = self.live()?;
        let samples = to_c_int(pcm.len() as i64)?;
        let size = to_c_int(output.len() as i64)?;
        let code = unsafe {
            ffi::lame_encode_buffer(
                gfp,
                pcm.as_ptr() as *const c_short,
                ptr::null(),
                samples,
                output.as_mut_ptr() as *mut c_uchar,
                size,
            )
        };
        EngineError::check(code)
    }

    fn encode_interleaved(&mut self, pcm: &[i16], output: &mut [u8]) -> EngineResult<usize> {
        let gfp = self.live()?;
        let channels = unsafe { ffi::lame_get_num_channels(gfp) }.max(1) as usize;
        let samples = to_c_int((pcm.len() / channels) as i64)?;
        let size = to_c_int(output.len() as i64)?;
        // LAME reads the interleaved buffer without writing to it
        let code = unsafe {
            ffi::lame_encode_buffer_interleaved(
                gfp,
                pcm.as_ptr() as *mut c_short,
                samples,
                output.as_mut_ptr() as *mut c_uchar,
                size,
            )
        };
        EngineError::check(code)
    }

    fn flush(&mut self, output: &mut [u8]) -> EngineResult<usize> {
        let gfp = self.live()?;
        let size = to_c_int(output.len() as i64)?;
        let code =
            unsafe { ffi::lame_encode_flush(gfp, output.as_mut_ptr() as *mut c_uchar, size) };
        EngineError::check(code)
    }

    fn close(&mut self) {
        if self.raw.is_null() {
            return;
        }
        unsafe {
            ffi::lame_close(self.raw);
        }
        self.raw = ptr::null_mut();
        debug!("lame handle released");
    }
}

impl Drop for LameEngine {
    fn drop(&mut self) {
        self.close();
    }
}
