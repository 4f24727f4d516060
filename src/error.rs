//! Error types for the streaming encoder
//!
//! Engine status codes, configuration problems and destination failures
//! are kept in separate enums so callers can tell an encoding failure
//! apart from a sink failure.

use std::io;
use thiserror::Error;

/// Main error type for the streaming encoder
#[derive(Debug, Error)]
pub enum EncoderError {
    /// The encoding engine reported a negative status
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// The destination rejected a write that could not be deferred
    #[error("Destination write failed: {0}")]
    DestinationWriteFailure(#[from] io::Error),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Write or flush attempted after `close`
    #[error("Encoder is closed")]
    Closed,
}

/// Status codes returned by the encoding engine
///
/// The numeric values match the engine's C API, where every negative
/// return value is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Output buffer handed to the engine was too small
    #[error("buffer too small")]
    BufferTooSmall,

    /// Engine could not allocate internal memory
    #[error("error allocating memory")]
    AllocationFailure,

    /// Encode or flush called before parameter initialization
    #[error("engine parameters not initialized")]
    ParametersNotInitialized,

    /// Psychoacoustic analysis failed for the given input
    #[error("psycho acoustic problems")]
    PsychoacousticModelFailure,

    /// Negative status outside the documented set
    #[error("unknown engine error code {0}")]
    Unknown(i32),
}

impl EngineError {
    /// Map a negative engine status to an error. Non-negative codes are
    /// not errors and return `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            c if c >= 0 => None,
            -1 => Some(EngineError::BufferTooSmall),
            -2 => Some(EngineError::AllocationFailure),
            -3 => Some(EngineError::ParametersNotInitialized),
            -4 => Some(EngineError::PsychoacousticModelFailure),
            other => Some(EngineError::Unknown(other)),
        }
    }

    /// Turn a raw engine return value into a byte count or an error.
    pub fn check(code: i32) -> EngineResult<usize> {
        match Self::from_code(code) {
            Some(err) => Err(err),
            None => Ok(code as usize),
        }
    }

    /// The engine status code for this error
    pub fn code(&self) -> i32 {
        match self {
            EngineError::BufferTooSmall => -1,
            EngineError::AllocationFailure => -2,
            EngineError::ParametersNotInitialized => -3,
            EngineError::PsychoacousticModelFailure => -4,
            EngineError::Unknown(code) => *code,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Channel count outside 1..=2
    #[error("Invalid channel count: {0} (expected 1 or 2)")]
    InvalidChannels(i64),

    /// Channel count changed after the engine was initialized
    #[error("Channel count cannot change after the encoder is initialized")]
    ChannelsLocked,

    /// Algorithm quality outside 0..=9
    #[error("Invalid quality: {0} (expected 0..=9)")]
    InvalidQuality(i64),

    /// VBR quality outside 0.0..10.0
    #[error("Invalid VBR quality: {0} (expected 0.0..10.0)")]
    InvalidVbrQuality(f32),

    /// Non-positive or unsupported input sample rate
    #[error("Unsupported sample rate: {0} Hz")]
    InvalidSampleRate(i64),
}

/// Metadata tag errors reported by the engine
#[cfg(feature = "lame")]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// Tag text contained a NUL byte and cannot cross the C boundary
    #[error("tag value contains an interior NUL byte")]
    InteriorNul,

    /// Track number rejected by the engine
    #[error("id3 track value out of range")]
    TrackOutOfRange,

    /// Genre number rejected by the engine
    #[error("id3 genre number out of range")]
    GenreOutOfRange,

    /// Genre text unknown to ID3v1, stored as 'other'
    #[error("id3 v1 tag set to 'other'")]
    GenreOther,
}

impl From<EncoderError> for io::Error {
    fn from(err: EncoderError) -> Self {
        match err {
            EncoderError::DestinationWriteFailure(inner) => inner,
            EncoderError::Closed => io::Error::new(io::ErrorKind::BrokenPipe, err),
            EncoderError::Config(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            EncoderError::Engine(_) => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}

/// Specialized result types for different modules
pub type EncoderResult<T> = std::result::Result<T, EncoderError>;
pub type EngineResult<T> = std::result::Result<T, EngineError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_taxonomy() {
        assert_eq!(EngineError::from_code(0), None);
        assert_eq!(EngineError::from_code(417), None);
        assert_eq!(EngineError::from_code(-1), Some(EngineError::BufferTooSmall));
        assert_eq!(EngineError::from_code(-2), Some(EngineError::AllocationFailure));
        assert_eq!(EngineError::from_code(-3), Some(EngineError::ParametersNotInitialized));
        assert_eq!(EngineError::from_code(-4), Some(EngineError::PsychoacousticModelFailure));
        assert_eq!(EngineError::from_code(-42), Some(EngineError::Unknown(-42)));
    }

    #[test]
    fn test_code_round_trips_through_from_code() {
        for code in -6..0 {
            let err = EngineError::from_code(code).unwrap();
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_check_returns_byte_count() {
        assert_eq!(EngineError::check(1044), Ok(1044));
        assert_eq!(EngineError::check(-3), Err(EngineError::ParametersNotInitialized));
    }

    #[test]
    fn test_messages_are_human_readable() {
        let err = EncoderError::from(EngineError::AllocationFailure);
        assert_eq!(err.to_string(), "Engine error: error allocating memory");

        let err = EncoderError::from(ConfigError::InvalidChannels(0));
        assert!(err.to_string().contains("Invalid channel count: 0"));
    }

    #[test]
    fn test_io_conversion_keeps_destination_error() {
        let inner = io::Error::new(io::ErrorKind::WriteZero, "disk full");
        let err: io::Error = EncoderError::DestinationWriteFailure(inner).into();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);

        let err: io::Error = EncoderError::Closed.into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
