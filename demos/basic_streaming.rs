//! Basic streaming example
//!
//! Feeds one second of a stereo sine tone through a `StreamEncoder` in
//! network-sized chunks and writes the result to a file. Built with
//! `--features lame` the system LAME library produces a real MP3; without
//! it the recording engine stands in.
//!
//! Usage: cargo run --example basic_streaming [output.mp3]

use lame_stream::{Channels, EncoderSettings, Engine, StreamEncoder};
use std::env;
use std::fs::File;
use std::io::BufWriter;

#[cfg(feature = "lame")]
fn make_engine() -> Result<impl Engine, Box<dyn std::error::Error>> {
    Ok(lame_stream::LameEngine::new()?)
}

#[cfg(not(feature = "lame"))]
fn make_engine() -> Result<impl Engine, Box<dyn std::error::Error>> {
    Ok(lame_stream::RecordingEngine::new())
}

fn sine_chunk(start_frame: usize, frames: usize, sample_rate: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frames * 4);
    for i in start_frame..start_frame + frames {
        let t = i as f64 / sample_rate as f64;
        let value = (12000.0 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let output_path = args.get(1).map(String::as_str).unwrap_or("basic_streaming.mp3");

    println!("Basic Streaming Example");
    println!("=======================");
    println!("Output: {}", output_path);

    let sample_rate = 44100;
    let output = BufWriter::new(File::create(output_path)?);
    let mut encoder = StreamEncoder::new(make_engine()?, output);

    EncoderSettings::new()
        .channels(Channels::Stereo)
        .sample_rate(sample_rate)
        .bitrate(128)
        .quality(5)
        .apply_to(&mut encoder)?;

    // 1411-byte chunks never line up with the 4-byte stereo sample block
    let pcm: Vec<u8> = sine_chunk(0, sample_rate as usize, sample_rate);
    for chunk in pcm.chunks(1411) {
        encoder.write(chunk)?;
    }

    let stats = encoder.finish()?;
    println!("PCM in:   {} bytes", stats.bytes_accepted);
    println!("MP3 out:  {} bytes", stats.bytes_encoded);
    if let Some(ratio) = stats.compression_ratio() {
        println!("Ratio:    {:.1}:1", ratio);
    }
    Ok(())
}
