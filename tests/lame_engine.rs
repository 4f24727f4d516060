//! Tests against the system LAME library
//!
//! Run with: `cargo test --features lame --test lame_engine`

#![cfg(feature = "lame")]

use lame_stream::{EncoderOption, Engine, LameEngine, StreamEncoder, TagError};
use util::{ramp_bytes, CountingWriter};

fn encoder() -> StreamEncoder<LameEngine, CountingWriter> {
    StreamEncoder::new(LameEngine::new().unwrap(), CountingWriter::new())
}

#[test]
fn test_set_get_configuration_values() {
    let mut encoder = encoder();
    let cases = [
        (EncoderOption::NumChannels, 1),
        (EncoderOption::InSampleRate, 22050),
        (EncoderOption::VbrMeanBitrateKbps, 18293),
        (EncoderOption::VbrMinBitrateKbps, 11024),
        (EncoderOption::VbrMaxBitrateKbps, 42100),
        (EncoderOption::LowPassFrequency, 44200),
        (EncoderOption::LowPassWidth, 10),
        (EncoderOption::HighPassFrequency, 44200),
        (EncoderOption::HighPassWidth, 10),
        (EncoderOption::Brate, 4),
        (EncoderOption::Quality, 8),
        (EncoderOption::NumSamples, 197382),
    ];

    for (option, value) in cases {
        encoder.configure(option, value).unwrap();
        assert_eq!(encoder.option(option), value, "{:?}", option);
    }

    encoder.set_vbr_hard_min(true).unwrap();
    assert!(encoder.vbr_hard_min());

    encoder.set_vbr_quality(3.5).unwrap();
    assert_eq!(encoder.vbr_quality(), 3.5);
}

// `unsigned long` is 64 bits wide here
#[cfg(all(target_pointer_width = "64", not(windows)))]
#[test]
fn test_num_samples_keeps_values_above_32_bits() {
    let mut encoder = encoder();
    let samples = (1i64 << 33) + 5;

    encoder.set_num_samples(samples).unwrap();
    assert_eq!(encoder.num_samples(), samples);
}

#[test]
fn test_encoder_low_bitrate_output_is_small() {
    let mut encoder = encoder();
    encoder.set_num_channels(1).unwrap();
    encoder.set_quality(9).unwrap();
    encoder.set_bitrate(1).unwrap();

    encoder.write(&ramp_bytes(8192)).unwrap();
    let stats = encoder.finish().unwrap();

    assert!(stats.bytes_written > 0, "encoder produced no output");
    assert!(stats.bytes_written < 1500, "output too large: {}", stats.bytes_written);
}

#[test]
fn test_closed_engine_reports_zero() {
    let mut engine = LameEngine::new().unwrap();
    engine.close();

    assert!(engine.is_closed());
    assert_eq!(engine.option(EncoderOption::NumChannels), 0);
    assert!(engine.configure(EncoderOption::Quality, 2).is_err());
    assert!(engine.id3v1_tag().is_empty());
}

#[test]
fn test_id3v1_title() {
    let mut engine = LameEngine::new().unwrap();
    engine.set_title("Super Song").unwrap();

    let tag = engine.id3v1_tag();
    assert_eq!(&tag[..13], b"TAGSuper Song");
}

#[test]
fn test_id3v2_title() {
    let mut engine = LameEngine::new().unwrap();
    engine.add_id3v2();
    engine.set_title("Super Song").unwrap();

    let tag = engine.id3v2_tag();
    assert_eq!(&tag[..3], b"ID3");
    assert_eq!(&tag[10..14], b"TIT2");
    assert_eq!(&tag[tag.len() - 10..], b"Super Song");
}

#[test]
fn test_tag_errors() {
    let mut engine = LameEngine::new().unwrap();

    assert_eq!(engine.set_artist("a\0b"), Err(TagError::InteriorNul));
    assert_eq!(engine.set_track("999"), Err(TagError::TrackOutOfRange));
    assert_eq!(engine.set_genre("200"), Err(TagError::GenreOutOfRange));
    assert_eq!(engine.set_genre("Zzzxqj"), Err(TagError::GenreOther));
    assert_eq!(engine.set_genre("Rock"), Ok(()));
}

#[test]
fn test_write_id3tag_automatic_flag() {
    let mut engine = LameEngine::new().unwrap();
    engine.set_write_id3tag_automatic(false);
    assert!(!engine.write_id3tag_automatic());
    engine.set_write_id3tag_automatic(true);
    assert!(engine.write_id3tag_automatic());
}
