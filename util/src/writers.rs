//! `std::io::Write` doubles used as encoder destinations

use std::io::{self, ErrorKind, Write};
use std::sync::{Arc, Mutex};

/// Counts accepted bytes and discards them
#[derive(Debug, Default)]
pub struct CountingWriter {
    pub count: usize,
}

impl CountingWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Write for CountingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.count += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Accepts at most `max_per_write` bytes per call and records everything
#[derive(Debug)]
pub struct ChunkedWriter {
    max_per_write: usize,
    data: Vec<u8>,
    write_calls: usize,
    flushes: usize,
}

impl ChunkedWriter {
    pub fn new(max_per_write: usize) -> Self {
        Self {
            max_per_write,
            data: Vec::new(),
            write_calls: 0,
            flushes: 0,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of `write` calls that offered at least one byte
    pub fn write_calls(&self) -> usize {
        self.write_calls
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Write for ChunkedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.write_calls += 1;
        let n = buf.len().min(self.max_per_write);
        self.data.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// Fails every write with the configured error kind
#[derive(Debug)]
pub struct FailingWriter {
    kind: ErrorKind,
    attempts: usize,
}

impl FailingWriter {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, attempts: 0 }
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        self.attempts += 1;
        Err(io::Error::new(self.kind, "destination rejected write"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(self.kind, "destination rejected flush"))
    }
}

/// Fails the first `failures` writes with the configured error kind, then
/// accepts everything
#[derive(Debug)]
pub struct FlakyWriter {
    kind: ErrorKind,
    failures: usize,
    data: Vec<u8>,
}

impl FlakyWriter {
    pub fn new(kind: ErrorKind, failures: usize) -> Self {
        Self {
            kind,
            failures,
            data: Vec::new(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Write for FlakyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(io::Error::new(self.kind, "destination not ready"));
        }
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Cloneable in-memory destination whose contents outlive the encoder
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<SharedState>>,
}

#[derive(Debug, Default)]
struct SharedState {
    data: Vec<u8>,
    write_calls: usize,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().unwrap().data.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn write_calls(&self) -> usize {
        self.inner.lock().unwrap().write_calls
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.inner.lock().unwrap();
        if !buf.is_empty() {
            state.write_calls += 1;
        }
        state.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
