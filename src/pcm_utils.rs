//! PCM audio data processing utilities
//!
//! Conversions between the byte stream the encoder accepts and the 16-bit
//! samples engines consume, plus channel deinterleaving.

use crate::config::BYTES_PER_SAMPLE;

/// Decode signed 16-bit little-endian PCM bytes into samples.
///
/// A trailing odd byte is ignored; callers hand in block-aligned buffers.
pub fn samples_from_le_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Encode samples as signed 16-bit little-endian bytes
pub fn samples_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// De-interleave interleaved PCM data into separate channel buffers
///
/// Takes PCM data in format [L0, R0, L1, R1, ..., LN, RN] and appends each
/// sample to its channel's buffer. Trailing samples that do not complete a
/// sample instant are ignored.
pub fn deinterleave_pcm(pcm_data: &[i16], channel_buffers: &mut [Vec<i16>]) {
    let channels = channel_buffers.len();
    if channels == 0 {
        return;
    }

    let frames = pcm_data.len() / channels;
    for buffer in channel_buffers.iter_mut() {
        buffer.reserve(frames);
    }

    for frame in pcm_data.chunks_exact(channels) {
        for (buffer, &sample) in channel_buffers.iter_mut().zip(frame) {
            buffer.push(sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_from_le_bytes() {
        let bytes = [0x01, 0x00, 0xFF, 0xFF, 0x00, 0x80];
        assert_eq!(samples_from_le_bytes(&bytes), vec![1, -1, i16::MIN]);
    }

    #[test]
    fn test_samples_from_le_bytes_ignores_odd_tail() {
        let bytes = [0x02, 0x00, 0x7F];
        assert_eq!(samples_from_le_bytes(&bytes), vec![2]);
    }

    #[test]
    fn test_le_bytes_round_trip() {
        let samples = vec![0, 1, -1, 12345, i16::MAX, i16::MIN];
        assert_eq!(samples_from_le_bytes(&samples_to_le_bytes(&samples)), samples);
    }

    #[test]
    fn test_deinterleave_interleaved_stereo() {
        let pcm_data = vec![1, 4, 2, 5, 3, 6]; // Interleaved: L1,R1,L2,R2,L3,R3
        let mut buffers = vec![Vec::new(), Vec::new()];

        deinterleave_pcm(&pcm_data, &mut buffers);

        assert_eq!(buffers[0], vec![1, 2, 3]);
        assert_eq!(buffers[1], vec![4, 5, 6]);
    }

    #[test]
    fn test_deinterleave_appends() {
        let mut buffers = vec![vec![9], vec![8]];

        deinterleave_pcm(&[1, 2], &mut buffers);

        assert_eq!(buffers[0], vec![9, 1]);
        assert_eq!(buffers[1], vec![8, 2]);
    }

    #[test]
    fn test_deinterleave_mono() {
        let mut buffers = vec![Vec::new()];

        deinterleave_pcm(&[1, 2, 3, 4], &mut buffers);

        assert_eq!(buffers[0], vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_deinterleave_partial_frame() {
        let mut buffers = vec![Vec::new(), Vec::new()];

        deinterleave_pcm(&[1, 2, 3], &mut buffers);

        assert_eq!(buffers[0], vec![1]);
        assert_eq!(buffers[1], vec![2]);
    }
}
