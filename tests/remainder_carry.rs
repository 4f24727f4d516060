//! Chunking independence
//!
//! However the input is cut into writes, the destination must receive the
//! same bytes as for one write of the whole input, and every write must
//! report its full length.

use lame_stream::{EncoderOption, Engine, RecordingEngine, StreamEncoder};
use sha2::{Digest, Sha256};
use util::{split_by_sizes, SharedBuffer};

fn engine_with_channels(channels: i64) -> RecordingEngine {
    let mut engine = RecordingEngine::new();
    engine.configure(EncoderOption::NumChannels, channels).unwrap();
    engine
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Encode each piece with its own write, returning the stream digest
fn encode_pieces(channels: i64, capacity: usize, pieces: &[&[u8]]) -> (String, Vec<u8>) {
    let output = SharedBuffer::new();
    let engine = engine_with_channels(channels);
    let mut encoder = StreamEncoder::with_capacity(engine, capacity, output.clone());
    for piece in pieces {
        assert_eq!(encoder.write(piece).unwrap(), piece.len());
    }
    let remainder = encoder.remainder().to_vec();
    encoder.close();
    (digest(&output.contents()), remainder)
}

#[test]
fn test_byte_at_a_time_matches_single_write() {
    let data: Vec<u8> = (0..6000u32).map(|i| (i * 7 % 251) as u8).collect();
    let single = encode_pieces(2, 8192, &[data.as_slice()]);
    let bytewise: Vec<&[u8]> = data.chunks(1).collect();

    assert_eq!(encode_pieces(2, 8192, &bytewise), single);
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            failure_persistence: None,
            ..ProptestConfig::default()
        })]

        #[test]
        fn test_split_writes_match_single_write(
            channels in 1i64..=2,
            data in prop::collection::vec(any::<u8>(), 0..6000),
            sizes in prop::collection::vec(0usize..1500, 1..8),
            capacity in prop::sample::select(&[0usize, 64, 8192]),
        ) {
            let pieces = split_by_sizes(&data, &sizes);
            let (split_digest, split_remainder) = encode_pieces(channels, capacity, &pieces);
            let (single_digest, single_remainder) =
                encode_pieces(channels, capacity, &[data.as_slice()]);

            prop_assert_eq!(split_digest, single_digest);
            prop_assert_eq!(&split_remainder, &single_remainder);
            prop_assert_eq!(split_remainder.len(), data.len() % (2 * channels as usize));
        }

        #[test]
        fn test_write_reports_full_length(
            channels in 1i64..=2,
            pieces in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 1..20),
        ) {
            let mut encoder = StreamEncoder::new(engine_with_channels(channels), Vec::new());
            for piece in &pieces {
                prop_assert_eq!(encoder.write(piece).unwrap(), piece.len());
                prop_assert!(encoder.remainder().len() < 2 * channels as usize);
            }
            let stats = encoder.finish().unwrap();
            let total: usize = pieces.iter().map(Vec::len).sum();
            prop_assert_eq!(stats.bytes_accepted as usize, total);
            prop_assert_eq!((stats.bytes_submitted + stats.dropped_bytes) as usize, total);
        }
    }
}
