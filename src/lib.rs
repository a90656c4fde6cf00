//! A fixed-size fork-join pool for running one range of work per tick.
//!
//! Tickpool is built for simulation loops that, once per frame, need to touch
//! every item of some collection (every entity matched by an ECS filter, every
//! particle, every cell) and want to spread that work over a few cores. A
//! [`Dispatcher`] owns a handful of persistent worker threads. Each call to
//! [`Dispatcher::dispatch`] asks an [`ItemSource`] how many items there are,
//! splits `[0, count)` into contiguous chunks, hands one chunk to each worker,
//! runs the last chunk on the calling thread, and then blocks until every
//! worker is done.
//!
//! There is no work-stealing and no task queue. Each worker slot carries two
//! binary gates ("has work" and "work done") and a range, and the calling
//! thread is always one of the workers. When the item count is too small to be
//! worth the handoff, fewer chunks are used, down to running everything on the
//! calling thread. No threads are created and nothing is allocated per tick.
//!
//! ```
//! # #![cfg(not(any(loom, feature = "shuttle")))]
//! use core::sync::atomic::{AtomicU64, Ordering};
//! use tickpool::{ChunkRange, Config, Dispatcher};
//!
//! let positions: Vec<AtomicU64> = (0..1000).map(AtomicU64::new).collect();
//! let config = Config::new(3, 64).unwrap();
//!
//! let mut dispatcher = Dispatcher::new(config, positions, |items: &Vec<AtomicU64>, chunk: ChunkRange| {
//!     for index in chunk {
//!         items[index].fetch_add(1, Ordering::Relaxed);
//!     }
//! })
//! .unwrap();
//!
//! let partition = dispatcher.dispatch().unwrap();
//! assert_eq!(partition.count(), 1000);
//! assert!(dispatcher.source().iter().enumerate().all(|(i, p)| p.load(Ordering::Relaxed) == i as u64 + 1));
//!
//! dispatcher.teardown();
//! assert!(dispatcher.dispatch().is_err());
//! ```
//!
//! Hosts that want the "create at startup, run every tick, destroy at
//! shutdown" shape of an ECS system can implement [`MultiThreadSystem`] and
//! drive it with a [`SystemRunner`].

#![no_std]
#![cfg_attr(any(loom, feature = "shuttle"), allow(dead_code))]
#![cfg_attr(any(loom, feature = "shuttle"), allow(unused_imports))]

// -----------------------------------------------------------------------------
// Boilerplate for building without the standard library

extern crate alloc;
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod compile_fail;
mod config;
mod dispatcher;
mod error;
mod gate;
mod partition;
mod range;
mod slot;
mod system;
mod unwind;

// -----------------------------------------------------------------------------
// Top-level exports

pub use config::Config;
pub use config::ConfigBuilder;
pub use config::ExecutionMode;
pub use config::ThreadCount;
pub use dispatcher::Dispatcher;
pub use dispatcher::ItemSource;
pub use error::ChunkFailure;
pub use error::ConfigError;
pub use error::DispatchError;
pub use error::InitError;
pub use partition::Chunks;
pub use partition::Partition;
pub use range::ChunkIter;
pub use range::ChunkRange;
pub use system::MultiThreadSystem;
pub use system::SystemRunner;
pub use system::SystemState;

// -----------------------------------------------------------------------------
// Platform Support

// This crate is model-checked with both `loom` and `shuttle`, which requires
// mocking all of the core threading primitives (`Mutex` and the like).
//
// To make things a bit simpler, we re-export all the important types in the
// `platform` module. The futex calls get their own shims, because neither
// checker can see through a raw `futex` syscall; there, waiting is modelled as
// a yielding spin.

#[cfg(not(any(loom, feature = "shuttle")))]
mod platform {

    // Core exports

    pub use alloc::sync::Arc;
    pub use core::sync::atomic::AtomicBool;
    pub use core::sync::atomic::AtomicU32;
    pub use core::sync::atomic::AtomicUsize;
    pub use core::sync::atomic::Ordering;
    pub use std::sync::Mutex;
    pub use std::thread::Builder as ThreadBuilder;
    pub use std::thread::JoinHandle;

    // Futex

    pub use atomic_wait::wait;
    pub use atomic_wait::wake_one;

    // Bounded joins

    use core::time::Duration;
    use std::thread;
    use std::time::Instant;

    /// Joins the thread if it finishes within `timeout`. Returns false if the
    /// deadline passed first, in which case the thread is left detached.
    pub fn join_within(handle: JoinHandle<()>, timeout: Duration) -> bool {
        const POLL_INTERVAL: Duration = Duration::from_micros(100);

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
        // Worker loops catch panics from user code, so this only fails if the
        // loop itself is broken. The thread is gone either way.
        let _ = handle.join();
        true
    }
}

#[cfg(all(feature = "shuttle", not(loom)))]
mod platform {

    // Core exports

    pub use shuttle::sync::Arc;
    pub use shuttle::sync::Mutex;
    pub use shuttle::sync::atomic::AtomicBool;
    pub use shuttle::sync::atomic::AtomicU32;
    pub use shuttle::sync::atomic::AtomicUsize;
    pub use shuttle::sync::atomic::Ordering;
    pub use shuttle::thread::Builder as ThreadBuilder;
    pub use shuttle::thread::JoinHandle;

    // Futex

    pub fn wait(atomic: &AtomicU32, value: u32) {
        while atomic.load(Ordering::Acquire) == value {
            shuttle::thread::yield_now();
        }
    }

    pub fn wake_one(_atomic: &AtomicU32) {}

    // Bounded joins

    /// Shuttle has no notion of wall-clock time, so this always joins.
    pub fn join_within(handle: JoinHandle<()>, _timeout: core::time::Duration) -> bool {
        let _ = handle.join();
        true
    }
}

#[cfg(loom)]
mod platform {

    // Core exports

    pub use loom::sync::Arc;
    pub use loom::sync::Mutex;
    pub use loom::sync::atomic::AtomicBool;
    pub use loom::sync::atomic::AtomicU32;
    pub use loom::sync::atomic::AtomicUsize;
    pub use loom::sync::atomic::Ordering;
    pub use loom::thread::Builder as ThreadBuilder;
    pub use loom::thread::JoinHandle;

    // Futex

    pub fn wait(atomic: &AtomicU32, value: u32) {
        while atomic.load(Ordering::Acquire) == value {
            loom::thread::yield_now();
        }
    }

    pub fn wake_one(_atomic: &AtomicU32) {}

    // Bounded joins

    /// Loom has no notion of wall-clock time, so this always joins.
    pub fn join_within(handle: JoinHandle<()>, _timeout: core::time::Duration) -> bool {
        let _ = handle.join();
        true
    }
}
