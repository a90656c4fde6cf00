//! Splitting an item count into chunks.
//!
//! The calling thread always takes part in a dispatch, so with `n` worker
//! threads there are `n + 1` candidate chunks. The split follows two rules:
//!
//! 1. If an even split over all `n + 1` threads gives each one more than
//!    `min_job_size` items, use all of them. The calling thread's chunk comes
//!    last and absorbs the remainder of the division.
//!
//! 2. Otherwise prefer fewer, larger chunks: cut `count / min_job_size` chunks
//!    of exactly `min_job_size` items, but never more than `n + 1`. All but the
//!    last go to workers, and the calling thread takes the last one plus
//!    whatever is left over. When that quotient is zero or one, no worker is
//!    used at all.
//!
//! Either way the chunks tile `[0, count)` in increasing order with no gaps and
//! no overlap.

use core::iter::FusedIterator;

use crate::range::ChunkRange;

// -----------------------------------------------------------------------------
// Partition

/// The chunk layout for one dispatch.
///
/// ```
/// use tickpool::{ChunkRange, Partition};
///
/// // Plenty of work: all three workers plus the calling thread.
/// let partition = Partition::new(100, 3, 10);
/// assert_eq!(partition.workers_used(), 4);
/// assert_eq!(partition.chunks().collect::<Vec<_>>(), [
///     ChunkRange::new(0, 25),
///     ChunkRange::new(25, 50),
///     ChunkRange::new(50, 75),
/// ]);
/// assert_eq!(partition.local(), ChunkRange::new(75, 100));
///
/// // Too little work to be worth waking anyone.
/// let partition = Partition::new(5, 3, 10);
/// assert_eq!(partition.worker_chunks(), 0);
/// assert_eq!(partition.local(), ChunkRange::new(0, 5));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    count: usize,
    job_size: usize,
    workers_used: usize,
}

impl Partition {
    /// Computes the partition of `count` items over `thread_count` worker
    /// threads plus the calling thread.
    ///
    /// `min_job_size` must be at least one. This is checked in debug builds;
    /// [`Config`](crate::Config) guarantees it for dispatchers.
    #[inline]
    pub const fn new(count: usize, thread_count: usize, min_job_size: usize) -> Partition {
        debug_assert!(min_job_size >= 1, "minimum job size must be at least one");

        if count == 0 {
            return Partition {
                count: 0,
                job_size: 0,
                workers_used: 0,
            };
        }

        let even_share = count / (thread_count + 1);
        if even_share > min_job_size {
            Partition {
                count,
                job_size: even_share,
                workers_used: thread_count + 1,
            }
        } else {
            // With a small minimum the quotient can exceed the number of
            // threads (3 threads, minimum 1, 7 items), so clamp it.
            let wanted = count / min_job_size;
            Partition {
                count,
                job_size: min_job_size,
                workers_used: if wanted > thread_count + 1 {
                    thread_count + 1
                } else {
                    wanted
                },
            }
        }
    }

    /// The total number of items covered.
    #[inline(always)]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Returns true if there is nothing to do.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The size of every worker chunk. The local chunk may be larger.
    #[inline(always)]
    pub const fn job_size(&self) -> usize {
        self.job_size
    }

    /// The number of chunks the split called for, counting the calling thread.
    ///
    /// This can be zero when `count` is below the minimum job size. The
    /// calling thread still runs the (short) local chunk in that case.
    #[inline(always)]
    pub const fn workers_used(&self) -> usize {
        self.workers_used
    }

    /// The number of chunks handed to background workers.
    #[inline(always)]
    pub const fn worker_chunks(&self) -> usize {
        self.workers_used.saturating_sub(1)
    }

    /// The chunks handed to background workers, in slot order.
    #[inline]
    pub fn chunks(&self) -> Chunks {
        Chunks {
            next: 0,
            remaining: self.worker_chunks(),
            job_size: self.job_size,
        }
    }

    /// The chunk run on the calling thread: everything after the last worker
    /// chunk.
    #[inline]
    pub const fn local(&self) -> ChunkRange {
        ChunkRange::new(self.worker_chunks() * self.job_size, self.count)
    }

    /// Every chunk of the dispatch, workers first and the local chunk last.
    /// Yields nothing when the partition is empty.
    pub fn all_chunks(&self) -> impl Iterator<Item = ChunkRange> + use<> {
        let local = (!self.is_empty()).then(|| self.local());
        self.chunks().chain(local)
    }
}

// -----------------------------------------------------------------------------
// Worker chunk iterator

/// Iterator over the worker chunks of a [`Partition`].
#[derive(Clone, Debug)]
pub struct Chunks {
    next: usize,
    remaining: usize,
    job_size: usize,
}

impl Iterator for Chunks {
    type Item = ChunkRange;

    #[inline]
    fn next(&mut self) -> Option<ChunkRange> {
        if self.remaining == 0 {
            return None;
        }
        let from = self.next;
        self.next += self.job_size;
        self.remaining -= 1;
        Some(ChunkRange::new(from, self.next))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Chunks {}

impl FusedIterator for Chunks {}
