//! The handle a chunk callback receives. See [`ChunkRange`].

use core::iter::FusedIterator;
use core::ops::Range;

// -----------------------------------------------------------------------------
// Chunk range

/// A contiguous run of item indices `[from, to)` assigned to exactly one
/// thread for one dispatch.
///
/// Chunk ranges are plain values. Iterating one does not consume it, so a
/// callback can walk its chunk several times (say, once to gather and once to
/// write back), and every dispatch hands out fresh bounds rather than a cursor
/// carried over from the previous tick.
///
/// ```
/// use tickpool::ChunkRange;
///
/// let chunk = ChunkRange::new(10, 15);
/// assert_eq!(chunk.iter().collect::<Vec<_>>(), [10, 11, 12, 13, 14]);
/// // Iterating again starts over from the beginning.
/// assert_eq!(chunk.iter().sum::<usize>(), 60);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkRange {
    from: usize,
    to: usize,
}

impl ChunkRange {
    /// Creates a new chunk covering `[from, to)`.
    ///
    /// `from` must not be greater than `to`. This is checked in debug builds.
    #[inline]
    pub const fn new(from: usize, to: usize) -> ChunkRange {
        debug_assert!(from <= to, "chunk range start must not exceed its end");
        ChunkRange { from, to }
    }

    /// The first index in the chunk.
    #[inline(always)]
    pub const fn from(&self) -> usize {
        self.from
    }

    /// One past the last index in the chunk.
    #[inline(always)]
    pub const fn to(&self) -> usize {
        self.to
    }

    /// The number of indices in the chunk.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.to - self.from
    }

    /// Returns true if the chunk holds no indices.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.from == self.to
    }

    /// Returns true if `index` falls inside the chunk.
    #[inline]
    pub const fn contains(&self, index: usize) -> bool {
        self.from <= index && index < self.to
    }

    /// Starts a new traversal of the chunk.
    #[inline(always)]
    pub const fn iter(&self) -> ChunkIter {
        ChunkIter {
            next: self.from,
            end: self.to,
        }
    }
}

impl From<ChunkRange> for Range<usize> {
    #[inline]
    fn from(chunk: ChunkRange) -> Range<usize> {
        chunk.from..chunk.to
    }
}

impl IntoIterator for ChunkRange {
    type Item = usize;
    type IntoIter = ChunkIter;

    #[inline(always)]
    fn into_iter(self) -> ChunkIter {
        self.iter()
    }
}

impl IntoIterator for &ChunkRange {
    type Item = usize;
    type IntoIter = ChunkIter;

    #[inline(always)]
    fn into_iter(self) -> ChunkIter {
        self.iter()
    }
}

// -----------------------------------------------------------------------------
// Chunk iterator

/// A single traversal over the indices of a [`ChunkRange`].
#[derive(Clone, Debug)]
pub struct ChunkIter {
    next: usize,
    end: usize,
}

impl Iterator for ChunkIter {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<usize> {
        if self.next < self.end {
            let index = self.next;
            self.next += 1;
            Some(index)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<usize> {
        self.next = self.next.saturating_add(n).min(self.end);
        self.next()
    }
}

impl DoubleEndedIterator for ChunkIter {
    #[inline]
    fn next_back(&mut self) -> Option<usize> {
        if self.next < self.end {
            self.end -= 1;
            Some(self.end)
        } else {
            None
        }
    }
}

impl ExactSizeIterator for ChunkIter {}

impl FusedIterator for ChunkIter {}
