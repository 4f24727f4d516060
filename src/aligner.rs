//! Sample-block alignment of arbitrarily sized input chunks
//!
//! Engines only accept whole sample instants (one sample for every
//! channel). [`BlockAligner`] prepends the bytes left over from the previous
//! chunk, cuts the result on a block boundary and keeps the unaligned tail
//! for the next call.

use std::borrow::Cow;

/// Input split produced by [`BlockAligner::split`]
///
/// Nothing changes in the aligner until the chunk is handed back to
/// [`BlockAligner::commit`].
#[derive(Debug)]
pub struct AlignedChunk<'a> {
    aligned: Cow<'a, [u8]>,
    remainder: Vec<u8>,
}

impl<'a> AlignedChunk<'a> {
    /// Whole sample blocks ready for the engine
    pub fn aligned(&self) -> &[u8] {
        &self.aligned
    }

    /// Tail that becomes the stored remainder once committed
    pub fn remainder(&self) -> &[u8] {
        &self.remainder
    }

    pub fn is_empty(&self) -> bool {
        self.aligned.is_empty()
    }
}

/// Carries unaligned input bytes between writes
#[derive(Debug, Clone)]
pub struct BlockAligner {
    alignment: usize,
    remainder: Vec<u8>,
}

impl BlockAligner {
    /// Create an aligner for blocks of `alignment` bytes.
    ///
    /// # Panics
    /// Panics if `alignment` is zero. The encoder derives it from a
    /// validated channel count.
    pub fn new(alignment: usize) -> Self {
        assert!(alignment > 0, "block alignment must be positive");
        Self {
            alignment,
            remainder: Vec::with_capacity(alignment),
        }
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Bytes currently held back from the engine
    pub fn remainder(&self) -> &[u8] {
        &self.remainder
    }

    /// Split the stored remainder followed by `input` on a block boundary.
    ///
    /// Borrows `input` when no remainder is pending.
    pub fn split<'a>(&self, input: &'a [u8]) -> AlignedChunk<'a> {
        if self.remainder.is_empty() {
            let cut = input.len() - input.len() % self.alignment;
            return AlignedChunk {
                aligned: Cow::Borrowed(&input[..cut]),
                remainder: input[cut..].to_vec(),
            };
        }

        let mut joined = Vec::with_capacity(self.remainder.len() + input.len());
        joined.extend_from_slice(&self.remainder);
        joined.extend_from_slice(input);

        let cut = joined.len() - joined.len() % self.alignment;
        let remainder = joined.split_off(cut);
        AlignedChunk {
            aligned: Cow::Owned(joined),
            remainder,
        }
    }

    /// Install the chunk's tail as the new remainder, replacing the old one.
    pub fn commit(&mut self, chunk: AlignedChunk<'_>) {
        debug_assert!(chunk.remainder.len() < self.alignment);
        self.remainder = chunk.remainder;
    }

    /// Discard the remainder, returning how many bytes were dropped
    pub fn discard(&mut self) -> usize {
        let dropped = self.remainder.len();
        self.remainder.clear();
        dropped
    }
}
