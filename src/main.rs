//! PCM to MP3 command line encoder
//!
//! Streams a WAV file or raw 16-bit little-endian PCM through a
//! `StreamEncoder` backed by the system LAME library. Input is fed in
//! fixed-size chunks the way a network or pipe reader would deliver it.

use lame_stream::pcm_utils::samples_to_le_bytes;
use lame_stream::{Channels, EncoderSettings, LameEngine, MpegMode, StreamEncoder, VbrMode};
use log::{debug, info};
use std::env;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process;
use std::time::Instant;

const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Command line arguments structure
struct Args {
    input_file: String,
    output_file: String,
    bitrate: Option<u32>,
    quality: Option<u8>,
    vbr_quality: Option<f32>,
    force_mono: bool,
    raw: bool,
    raw_sample_rate: u32,
    raw_channels: u16,
    chunk_size: usize,
    title: Option<String>,
    artist: Option<String>,
    quiet: bool,
    verbose: bool,
}

fn option_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("Option {} requires a value", flag))
}

impl Args {
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = env::args().collect();

        if args.len() < 3 {
            return Err(String::new()); // Empty error triggers usage display
        }

        let mut parsed = Args {
            input_file: String::new(),
            output_file: String::new(),
            bitrate: None,
            quality: None,
            vbr_quality: None,
            force_mono: false,
            raw: false,
            raw_sample_rate: 44100,
            raw_channels: 2,
            chunk_size: DEFAULT_CHUNK_SIZE,
            title: None,
            artist: None,
            quiet: false,
            verbose: false,
        };

        let mut i = 1;
        while i < args.len() && args[i].starts_with('-') && args[i] != "-" {
            let flag = args[i].clone();
            match flag.as_str() {
                "-b" => {
                    i += 1;
                    let value = option_value(&args, i, &flag)?;
                    let kbps = value.parse().map_err(|_| format!("Invalid bitrate: {}", value))?;
                    parsed.bitrate = Some(kbps);
                }
                "-Q" => {
                    i += 1;
                    let value = option_value(&args, i, &flag)?;
                    let quality = value.parse().map_err(|_| format!("Invalid quality: {}", value))?;
                    parsed.quality = Some(quality);
                }
                "-V" => {
                    i += 1;
                    let value = option_value(&args, i, &flag)?;
                    let quality =
                        value.parse().map_err(|_| format!("Invalid VBR quality: {}", value))?;
                    parsed.vbr_quality = Some(quality);
                }
                "-m" => parsed.force_mono = true,
                "-r" => parsed.raw = true,
                "-s" => {
                    i += 1;
                    let value = option_value(&args, i, &flag)?;
                    parsed.raw_sample_rate =
                        value.parse().map_err(|_| format!("Invalid sample rate: {}", value))?;
                }
                "-c" => {
                    i += 1;
                    let value = option_value(&args, i, &flag)?;
                    parsed.raw_channels =
                        value.parse().map_err(|_| format!("Invalid channel count: {}", value))?;
                }
                "-k" => {
                    i += 1;
                    let value = option_value(&args, i, &flag)?;
                    parsed.chunk_size = match value.parse() {
                        Ok(size) if size > 0 => size,
                        _ => return Err(format!("Invalid chunk size: {}", value)),
                    };
                }
                "-T" => {
                    i += 1;
                    parsed.title = Some(option_value(&args, i, &flag)?.to_string());
                }
                "-A" => {
                    i += 1;
                    parsed.artist = Some(option_value(&args, i, &flag)?.to_string());
                }
                "-q" => {
                    parsed.quiet = true;
                    parsed.verbose = false;
                }
                "-v" => {
                    parsed.verbose = true;
                    parsed.quiet = false;
                }
                "-h" => return Err(String::new()),
                _ => return Err(format!("Unknown option: {}", flag)),
            }
            i += 1;
        }

        if i + 1 >= args.len() {
            return Err(String::new());
        }
        parsed.input_file = args[i].clone();
        parsed.output_file = args[i + 1].clone();
        Ok(parsed)
    }
}

fn print_usage() {
    println!("Usage: lamestream [options] <infile> <outfile>");
    println!();
    println!("Use \"-\" for standard input or output.");
    println!();
    println!("Options:");
    println!(" -h              this help message");
    println!(" -b <kbps>       constant bitrate, default chosen by LAME");
    println!(" -Q <0-9>        algorithm quality, 0 = best, 9 = fastest");
    println!(" -V <0-9.99>     variable bitrate with the given quality");
    println!(" -m              encode a mono stream");
    println!(" -r              input is raw 16-bit little-endian PCM");
    println!(" -s <hz>         raw input sample rate, default 44100");
    println!(" -c <1|2>        raw input channels, default 2");
    println!(" -k <bytes>      input chunk size, default {}", DEFAULT_CHUNK_SIZE);
    println!(" -T <title>      ID3 title");
    println!(" -A <artist>     ID3 artist");
    println!(" -q              quiet mode");
    println!(" -v              verbose mode");
}

/// Input stream plus the format it carries
struct Input {
    reader: Box<dyn Read>,
    sample_rate: u32,
    channels: u16,
}

fn open_input(args: &Args) -> Result<Input, Box<dyn std::error::Error>> {
    let source: Box<dyn Read> = if args.input_file == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(&args.input_file)?)
    };

    if args.raw {
        return Ok(Input {
            reader: source,
            sample_rate: args.raw_sample_rate,
            channels: args.raw_channels,
        });
    }

    let reader = hound::WavReader::new(io::BufReader::new(source))
        .map_err(|e| format!("Could not open WAVE file: {}", e))?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err("Only 16-bit integer PCM WAVE files are supported".into());
    }

    Ok(Input {
        reader: Box::new(WavBytes::new(reader)),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Adapts a WAV sample iterator back into little-endian PCM bytes
struct WavBytes<R: Read> {
    reader: hound::WavReader<R>,
    pending: Vec<u8>,
}

impl<R: Read> WavBytes<R> {
    fn new(reader: hound::WavReader<R>) -> Self {
        Self { reader, pending: Vec::new() }
    }
}

impl<R: Read> Read for WavBytes<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            let samples = self
                .reader
                .samples::<i16>()
                .take(buf.len().div_ceil(2).max(1))
                .collect::<Result<Vec<i16>, _>>()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            self.pending = samples_to_le_bytes(&samples);
        }
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

fn encode(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let quiet = args.quiet || args.output_file == "-";
    let input = open_input(&args)?;

    let output: Box<dyn Write> = if args.output_file == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(File::create(&args.output_file)?)
    };

    let mut settings = EncoderSettings::new()
        .channels(Channels::try_from(input.channels as i64)?)
        .sample_rate(input.sample_rate);
    if let Some(kbps) = args.bitrate {
        settings = settings.bitrate(kbps);
    }
    if let Some(quality) = args.quality {
        settings = settings.quality(quality);
    }
    if let Some(quality) = args.vbr_quality {
        settings = settings.vbr(VbrMode::DEFAULT, quality);
    }
    if args.force_mono {
        settings = settings.mode(MpegMode::Mono);
    }
    settings.validate()?;

    let mut engine = LameEngine::new()?;
    if args.title.is_some() || args.artist.is_some() {
        engine.init_id3_tag();
        if let Some(title) = &args.title {
            engine.set_title(title)?;
        }
        if let Some(artist) = &args.artist {
            engine.set_artist(artist)?;
        }
    }

    let mut encoder = StreamEncoder::new(engine, output);
    settings.apply_to(&mut encoder)?;

    if !quiet {
        println!("lamestream {}", env!("CARGO_PKG_VERSION"));
        println!(
            "Encoding \"{}\" to \"{}\": {} Hz, {} channel(s), {} byte chunks",
            args.input_file, args.output_file, input.sample_rate, input.channels, args.chunk_size
        );
    }

    let start_time = Instant::now();
    let mut reader = input.reader;
    let mut chunk = vec![0u8; args.chunk_size];
    let mut chunks = 0u64;
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        encoder.write(&chunk[..n])?;
        chunks += 1;
        debug!("chunk {}: {} bytes", chunks, n);
    }

    let stats = encoder.finish()?;
    let elapsed = start_time.elapsed();
    info!("encoded {} chunks in {:.3}s", chunks, elapsed.as_secs_f64());

    if !quiet {
        println!(
            "Finished in {:.2}s: {} bytes PCM -> {} bytes MP3",
            elapsed.as_secs_f64(),
            stats.bytes_accepted,
            stats.bytes_encoded
        );
        if stats.dropped_bytes > 0 {
            println!("Dropped {} trailing byte(s) short of a sample", stats.dropped_bytes);
        }
    }
    Ok(())
}

fn main() {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("Error: {}", msg);
                eprintln!();
            }
            print_usage();
            process::exit(1);
        }
    };

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = encode(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
