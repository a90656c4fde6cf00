//! Per-worker state shared between the dispatcher and one worker thread.

use std::sync::PoisonError;

use crate::error::ChunkFailure;
use crate::gate::Gate;
use crate::platform::*;
use crate::range::ChunkRange;

// -----------------------------------------------------------------------------
// Slot

/// The fixed record behind each worker thread. Slots are created once, when
/// the dispatcher starts, and reused for every dispatch.
///
/// At rest, `has_work` is closed and `work_done` is open. The dispatcher arms a
/// slot by writing the range, closing `work_done` and then opening `has_work`.
/// The worker consumes `has_work`, runs the chunk, and opens `work_done` again.
///
/// The range is only written by the dispatcher while the slot is at rest, and
/// only read by the worker after it has seen `has_work` open. The gates carry
/// the happens-before edges, so the range fields themselves can be relaxed.
pub struct Slot {
    index: usize,
    has_work: Gate,
    work_done: Gate,
    from: AtomicUsize,
    to: AtomicUsize,
    halt: AtomicBool,
    failure: Mutex<Option<ChunkFailure>>,
}

impl Slot {
    /// Creates a slot at rest.
    pub fn new(index: usize) -> Slot {
        Slot {
            index,
            has_work: Gate::closed(),
            work_done: Gate::open(),
            from: AtomicUsize::new(0),
            to: AtomicUsize::new(0),
            halt: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    /// The position of this slot in the dispatcher.
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns true if the slot is neither armed nor running.
    pub fn is_at_rest(&self) -> bool {
        !self.has_work.is_open() && self.work_done.is_open()
    }

    // -------------------------------------------------------------------------
    // Dispatcher side

    /// Hands a chunk to the worker thread.
    ///
    /// Must only be called on a slot at rest.
    #[inline]
    pub fn arm(&self, chunk: ChunkRange) {
        debug_assert!(self.work_done.is_open(), "armed a slot that was still running");
        self.from.store(chunk.from(), Ordering::Relaxed);
        self.to.store(chunk.to(), Ordering::Relaxed);
        self.work_done.reset();
        // Publishes the range written above.
        self.has_work.set();
    }

    /// Blocks until the worker has finished the chunk it was armed with.
    #[inline]
    pub fn wait_done(&self) {
        self.work_done.wait();
    }

    /// Takes the failure recorded by the last chunk, if it panicked.
    ///
    /// Must only be called after `wait_done`.
    pub fn take_failure(&self) -> Option<ChunkFailure> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Tells the worker thread to exit, waking it if it is idle.
    ///
    /// Must only be called on a slot at rest.
    pub fn halt(&self) {
        self.halt.store(true, Ordering::Relaxed);
        // Publishes the halt flag.
        self.has_work.set();
    }

    // -------------------------------------------------------------------------
    // Worker side

    /// Waits for the next chunk. Returns `None` once the slot has been halted.
    #[inline]
    pub fn receive(&self) -> Option<ChunkRange> {
        self.has_work.wait();
        // Consume the signal, so the next wait blocks until the next dispatch.
        self.has_work.reset();

        if self.halt.load(Ordering::Relaxed) {
            return None;
        }

        let from = self.from.load(Ordering::Relaxed);
        let to = self.to.load(Ordering::Relaxed);
        Some(ChunkRange::new(from, to))
    }

    /// Records that the current chunk panicked. Must be followed by `complete`.
    #[cold]
    pub fn record_failure(&self, failure: ChunkFailure) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(failure);
    }

    /// Signals the dispatcher that the current chunk is finished.
    #[inline]
    pub fn complete(&self) {
        self.work_done.set();
    }
}
