//! This module defines the binary gate used to hand chunks to worker threads
//! and to hand completion back. It is a close cousin of a latch, except that
//! it can be closed again and reused indefinitely.

use crate::platform::*;

// -----------------------------------------------------------------------------
// States

/// The default state of a closed gate, with no waiting thread.
const CLOSED: u32 = 0b00;

/// A bit set when the gate is open. While it is set, `wait` does not block.
const OPEN: u32 = 0b01;

/// A bit set by the waiting thread when it is about to sleep, and needs the
/// opening thread to wake it up.
const WAIT: u32 = 0b10;

// -----------------------------------------------------------------------------
// Gate

/// A [`Gate`] is a reusable binary signal. It is either *open* or *closed*.
/// Any thread may open or close it, but only one thread at a time may wait on
/// it.
///
/// Opening the gate is a release operation and returning from `wait` is an
/// acquire operation, so everything written before `open` is visible to the
/// waiter once `wait` returns.
pub struct Gate {
    state: AtomicU32,
}

impl Gate {
    /// Creates a new closed gate.
    pub fn closed() -> Gate {
        Gate {
            state: AtomicU32::new(CLOSED),
        }
    }

    /// Creates a new open gate.
    pub fn open() -> Gate {
        Gate {
            state: AtomicU32::new(OPEN),
        }
    }

    /// Checks to see if the gate is open, without blocking.
    #[inline(always)]
    pub fn is_open(&self) -> bool {
        self.state.load(Ordering::Acquire) & OPEN != 0
    }

    /// Opens the gate, waking the waiting thread if there is one.
    #[inline]
    pub fn set(&self) {
        let state = self.state.fetch_or(OPEN, Ordering::Release);
        if state & WAIT != 0 {
            // The waiter is asleep or about to be.
            wake_one(&self.state);
        }
    }

    /// Closes the gate. Subsequent calls to `wait` block until it is opened
    /// again.
    #[inline]
    pub fn reset(&self) {
        self.state.fetch_and(!OPEN, Ordering::Relaxed);
    }

    /// Blocks until the gate is open. Does not close it.
    ///
    /// Must only be called from one thread at a time.
    #[inline]
    pub fn wait(&self) {
        // Loop to mitigate spurious wake-ups.
        loop {
            // Announce that we may sleep, and load the current state.
            let state = self.state.fetch_or(WAIT, Ordering::Acquire);

            if state & OPEN != 0 {
                // Nobody else waits on this gate, so the bit is ours to clear.
                self.state.fetch_and(!WAIT, Ordering::Relaxed);
                return;
            }

            // Sleep only if nothing has changed since we set the bit.
            wait(&self.state, state | WAIT);
        }
    }
}
