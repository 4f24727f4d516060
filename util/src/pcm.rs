//! Synthetic PCM input

/// Bytes counting up from zero and wrapping, `input[i] = i as u8`
pub fn ramp_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}

/// Interleaved 16-bit sine tone, the same tone on every channel
pub fn sine_wave(
    frequency: f64,
    sample_rate: u32,
    frames: usize,
    channels: usize,
    amplitude: f64,
) -> Vec<i16> {
    let mut samples = Vec::with_capacity(frames * channels);
    for i in 0..frames {
        let t = i as f64 / sample_rate as f64;
        let value = (amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin()) as i16;
        for _ in 0..channels {
            samples.push(value);
        }
    }
    samples
}

/// Signed 16-bit little-endian encoding of `samples`
pub fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Split `data` into consecutive pieces of the given sizes, cycling through
/// `sizes` until the input is exhausted. Zero sizes produce empty pieces.
pub fn split_by_sizes<'a>(data: &'a [u8], sizes: &[usize]) -> Vec<&'a [u8]> {
    let mut pieces = Vec::new();
    if sizes.iter().all(|&s| s == 0) {
        pieces.push(data);
        return pieces;
    }

    let mut offset = 0;
    for &size in sizes.iter().cycle() {
        if offset >= data.len() {
            break;
        }
        let end = (offset + size).min(data.len());
        pieces.push(&data[offset..end]);
        offset = end;
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_wraps() {
        let ramp = ramp_bytes(258);
        assert_eq!(ramp[255], 255);
        assert_eq!(ramp[256], 0);
    }

    #[test]
    fn test_sine_wave_is_interleaved() {
        let samples = sine_wave(440.0, 44100, 10, 2, 1000.0);
        assert_eq!(samples.len(), 20);
        assert_eq!(samples[2], samples[3]);
    }

    #[test]
    fn test_split_by_sizes_covers_input() {
        let data = ramp_bytes(10);
        let pieces = split_by_sizes(&data, &[3, 0, 4]);
        assert_eq!(pieces.concat(), data);
        assert_eq!(pieces[0].len(), 3);
        assert!(pieces[1].is_empty());
    }
}
