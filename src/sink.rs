//! Buffered destination with partial-write bookkeeping
//!
//! [`OutputSink`] wraps the caller's writer in a `BufWriter`. When the
//! destination takes fewer bytes than offered, the unwritten tail is kept
//! and sent ahead of the next buffer instead of being dropped.

use log::trace;
use std::io::{self, BufWriter, ErrorKind, Write};

/// Best-effort buffered byte sink over a destination that may write partially
#[derive(Debug)]
pub struct OutputSink<W: Write> {
    inner: BufWriter<W>,
    pending: Vec<u8>,
    accepted: u64,
}

impl<W: Write> OutputSink<W> {
    /// Wrap `destination` with the default buffer capacity
    pub fn new(destination: W) -> Self {
        Self {
            inner: BufWriter::new(destination),
            pending: Vec::new(),
            accepted: 0,
        }
    }

    /// Wrap `destination` with a buffer of `capacity` bytes.
    ///
    /// A capacity of zero hands every write straight to the destination.
    pub fn with_capacity(capacity: usize, destination: W) -> Self {
        Self {
            inner: BufWriter::with_capacity(capacity, destination),
            pending: Vec::new(),
            accepted: 0,
        }
    }

    /// Offer `bytes`, prefixed by any pending tail, to the destination.
    ///
    /// Returns how many bytes the destination accepted in this call. The
    /// unaccepted tail replaces the pending remainder. On error the whole
    /// outgoing buffer stays pending and the error is returned unchanged.
    pub fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let outgoing = if self.pending.is_empty() {
            bytes.to_vec()
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(bytes);
            joined
        };

        if outgoing.is_empty() {
            return Ok(0);
        }

        loop {
            match self.inner.write(&outgoing) {
                Ok(written) => {
                    self.accepted += written as u64;
                    if written < outgoing.len() {
                        trace!(
                            "destination accepted {} of {} bytes, deferring the rest",
                            written,
                            outgoing.len()
                        );
                        self.pending = outgoing[written..].to_vec();
                    }
                    return Ok(written);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.pending = outgoing;
                    return Err(err);
                }
            }
        }
    }

    /// Keep offering the pending tail until the destination has taken all
    /// of it, returning how many bytes went out. A destination that accepts
    /// nothing fails with `WriteZero`.
    pub fn drain_pending(&mut self) -> io::Result<usize> {
        let mut delivered = 0;
        while !self.pending.is_empty() {
            match self.write(&[])? {
                0 => {
                    return Err(io::Error::new(
                        ErrorKind::WriteZero,
                        "destination accepted none of the pending bytes",
                    ))
                }
                written => delivered += written,
            }
        }
        Ok(delivered)
    }

    /// Push internally buffered bytes to the destination.
    ///
    /// The pending remainder is not part of this; it goes out with the next
    /// [`write`](Self::write) or [`drain_pending`](Self::drain_pending).
    pub fn flush_to_destination(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Bytes the destination has not accepted yet
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Total bytes the destination (or its buffer) has accepted so far
    pub fn bytes_accepted(&self) -> u64 {
        self.accepted
    }

    pub fn buffer_capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    pub fn get_mut(&mut self) -> &mut W {
        self.inner.get_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use util::{ChunkedWriter, FailingWriter};

    #[test]
    fn test_full_write_leaves_nothing_pending() {
        let mut sink = OutputSink::new(Vec::new());

        assert_eq!(sink.write(b"frame").unwrap(), 5);
        assert!(sink.pending().is_empty());

        sink.flush_to_destination().unwrap();
        assert_eq!(sink.get_ref(), b"frame");
    }

    #[test]
    fn test_partial_write_is_prefixed_to_next_buffer() {
        let mut sink = OutputSink::with_capacity(0, ChunkedWriter::new(3));

        assert_eq!(sink.write(b"abcdef").unwrap(), 3);
        assert_eq!(sink.pending(), b"def");

        assert_eq!(sink.write(b"gh").unwrap(), 3);
        assert_eq!(sink.pending(), b"gh");

        assert_eq!(sink.write(&[]).unwrap(), 2);
        assert!(sink.pending().is_empty());
        assert_eq!(sink.get_ref().data(), b"abcdefgh");
    }

    #[test]
    fn test_empty_write_without_pending_is_noop() {
        let mut sink = OutputSink::with_capacity(0, ChunkedWriter::new(3));

        assert_eq!(sink.write(&[]).unwrap(), 0);
        assert_eq!(sink.get_ref().write_calls(), 0);
    }

    #[test]
    fn test_destination_error_keeps_bytes_pending() {
        let mut sink = OutputSink::with_capacity(0, FailingWriter::new(ErrorKind::BrokenPipe));

        let err = sink.write(b"lost?").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
        assert_eq!(sink.pending(), b"lost?");
    }

    #[test]
    fn test_drain_pending_empties_tail() {
        let mut sink = OutputSink::with_capacity(0, ChunkedWriter::new(2));
        sink.write(b"abcdefg").unwrap();

        assert_eq!(sink.drain_pending().unwrap(), 5);
        assert!(sink.pending().is_empty());
        assert_eq!(sink.bytes_accepted(), 7);
        assert_eq!(sink.get_ref().data(), b"abcdefg");
        assert_eq!(sink.get_ref().write_calls(), 4);
    }

    #[test]
    fn test_drain_pending_stops_on_write_zero() {
        let mut sink = OutputSink::with_capacity(0, ChunkedWriter::new(0));
        assert_eq!(sink.write(b"ab").unwrap(), 0);

        let err = sink.drain_pending().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteZero);
        assert_eq!(sink.pending(), b"ab");
    }

    #[test]
    fn test_buffered_bytes_reach_destination_on_flush() {
        let mut sink = OutputSink::with_capacity(64, ChunkedWriter::new(usize::MAX));

        sink.write(b"abc").unwrap();
        assert_eq!(sink.get_ref().write_calls(), 0);

        sink.flush_to_destination().unwrap();
        assert_eq!(sink.get_ref().data(), b"abc");
    }
}
