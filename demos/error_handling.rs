//! Error handling example
//!
//! Walks through the failures a stream encoder can report and what state
//! it is left in afterwards, using the recording engine's fault injection.
//!
//! Usage: cargo run --example error_handling

use lame_stream::{EncoderError, EngineError, RecordingEngine, StreamEncoder};
use std::io::{self, ErrorKind, Write};

/// Destination that refuses everything
struct Unplugged;

impl Write for Unplugged {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(ErrorKind::BrokenPipe, "peer went away"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn main() {
    env_logger::init();

    println!("Error Handling Example");
    println!("======================");

    // Invalid configuration is rejected before it reaches the engine
    let mut encoder = StreamEncoder::new(RecordingEngine::new(), Vec::new());
    match encoder.set_num_channels(6) {
        Err(EncoderError::Config(err)) => println!("1. configuration: {}", err),
        other => println!("1. unexpected: {:?}", other),
    }

    // A failed initialization leaves the encoder ready to try again
    let mut engine = RecordingEngine::new();
    engine.fail_init(EngineError::AllocationFailure);
    let mut encoder = StreamEncoder::new(engine, Vec::new());
    if let Err(err) = encoder.write(&[0; 8]) {
        println!("2. first write: {} (state {:?})", err, encoder.lifecycle());
    }
    match encoder.write(&[0; 8]) {
        Ok(n) => println!("   retry accepted {} bytes (state {:?})", n, encoder.lifecycle()),
        Err(err) => println!("   retry failed: {}", err),
    }

    // An engine error keeps the held-back bytes
    encoder.write(&[1, 2, 3]).ok();
    encoder.engine_mut().fail_encode(EngineError::PsychoacousticModelFailure);
    if let Err(err) = encoder.write(&[4, 5, 6, 7, 8]) {
        println!("3. encode: {}, {} byte(s) still held", err, encoder.remainder().len());
    }
    encoder.close();

    // A destination failure keeps the encoded bytes pending; the input was
    // consumed, so the error arrives with the next call
    let mut encoder = StreamEncoder::with_capacity(RecordingEngine::new(), 0, Unplugged);
    if let Ok(n) = encoder.write(&[0u8; 1152 * 4]) {
        println!(
            "4. destination: {} bytes consumed, {} encoded byte(s) pending",
            n,
            encoder.pending_output().len()
        );
    }
    match encoder.write(&[0u8; 4]) {
        Err(EncoderError::DestinationWriteFailure(err)) => println!("   next write: {}", err),
        other => println!("   unexpected: {:?}", other),
    }

    // Through io::Write the same errors arrive as io::Error
    encoder.close();
    let err = Write::write(&mut encoder, &[0; 4]).unwrap_err();
    println!("5. io::Write after close: {:?}: {}", err.kind(), err);
}
