//! This module contains the dispatcher and the worker thread loop.

use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc as StdArc;
use alloc::vec::Vec;
use core::sync::atomic::AtomicUsize as StdAtomicUsize;
use core::sync::atomic::Ordering as StdOrdering;

use tracing::debug;
use tracing::error;
use tracing::trace;
use tracing::trace_span;
use tracing::warn;

use crate::config::Config;
use crate::error::ChunkFailure;
use crate::error::DispatchError;
use crate::error::InitError;
use crate::partition::Partition;
use crate::platform::*;
use crate::range::ChunkRange;
use crate::slot::Slot;
use crate::unwind;

// -----------------------------------------------------------------------------
// Item sources

/// The collection a dispatcher works over. All it needs to say is how many
/// items there are; the chunk callback receives a reference to the source and
/// decides what an index means.
///
/// The source is read by every worker at once during a dispatch, so it must be
/// `Sync`. Callbacks that update items need interior mutability (atomics, or
/// cells that are only touched through the index a chunk owns).
pub trait ItemSource {
    /// The number of items to process. Queried once at the start of each
    /// dispatch.
    fn item_count(&self) -> usize;
}

impl<T> ItemSource for [T] {
    #[inline(always)]
    fn item_count(&self) -> usize {
        self.len()
    }
}

impl<T> ItemSource for Vec<T> {
    #[inline(always)]
    fn item_count(&self) -> usize {
        self.len()
    }
}

impl<T> ItemSource for Box<[T]> {
    #[inline(always)]
    fn item_count(&self) -> usize {
        self.len()
    }
}

impl<T, const N: usize> ItemSource for [T; N] {
    #[inline(always)]
    fn item_count(&self) -> usize {
        N
    }
}

impl<S: ItemSource + ?Sized> ItemSource for StdArc<S> {
    #[inline(always)]
    fn item_count(&self) -> usize {
        (**self).item_count()
    }
}

/// A bare counter, for hosts that keep their items somewhere else entirely.
impl ItemSource for StdAtomicUsize {
    #[inline(always)]
    fn item_count(&self) -> usize {
        self.load(StdOrdering::Acquire)
    }
}

// -----------------------------------------------------------------------------
// Dispatcher

/// State shared between the dispatcher and its worker threads.
struct Shared<S, F> {
    source: S,
    callback: F,
    slots: Box<[Slot]>,
}

/// A fixed-size pool of worker threads that runs a chunk callback over the
/// items of an [`ItemSource`].
///
/// # Lifecycle
///
/// [`Dispatcher::new`] validates nothing further (a [`Config`] is already
/// valid) and spawns all worker threads up front. Each call to
/// [`Dispatcher::dispatch`] is one fork-join: it partitions the current item
/// count (see [`Partition`]), hands out chunks, runs the local chunk, and waits
/// for every worker it used. [`Dispatcher::teardown`] stops the threads; it also
/// runs on drop. After teardown every dispatch fails with
/// [`DispatchError::TornDown`].
///
/// Dispatching takes `&mut self`, so a dispatch can never overlap another one
/// on the same dispatcher.
///
/// # Panics
///
/// A panic in a worker chunk is caught on the worker, and the dispatch returns
/// [`DispatchError::WorkerPanicked`] once every chunk has finished. A panic in
/// the local chunk is re-raised on the calling thread, also only after every
/// worker has finished. Either way the dispatcher remains usable.
pub struct Dispatcher<S, F>
where
    S: ItemSource + Send + Sync + 'static,
    F: Fn(&S, ChunkRange) + Send + Sync + 'static,
{
    shared: Arc<Shared<S, F>>,
    threads: Vec<JoinHandle<()>>,
    config: Config,
    torn_down: bool,
}

impl<S, F> Dispatcher<S, F>
where
    S: ItemSource + Send + Sync + 'static,
    F: Fn(&S, ChunkRange) + Send + Sync + 'static,
{
    /// Creates a dispatcher and starts its worker threads.
    ///
    /// The source and callback are captured here and never replaced. If a
    /// thread fails to start, the ones already running are stopped before the
    /// error is returned.
    #[cold]
    pub fn new(config: Config, source: S, callback: F) -> Result<Dispatcher<S, F>, InitError> {
        let thread_count = config.spawned_threads();
        debug!(
            "starting dispatcher with {} worker thread(s), min job size {}",
            thread_count,
            config.min_job_size()
        );

        let slots = (0..thread_count).map(Slot::new).collect::<Box<[_]>>();
        let shared = Arc::new(Shared {
            source,
            callback,
            slots,
        });

        let mut threads = Vec::with_capacity(thread_count);
        for index in 0..thread_count {
            let worker_shared = shared.clone();
            let spawned = ThreadBuilder::new()
                .name(format!("{}-{index}", config.thread_name_prefix()))
                .spawn(move || worker_loop(worker_shared, index));

            match spawned {
                Ok(handle) => threads.push(handle),
                Err(source) => {
                    error!("failed to spawn worker thread {}: {}", index, source);
                    let mut partial = Dispatcher {
                        shared,
                        threads,
                        config,
                        torn_down: false,
                    };
                    partial.teardown();
                    return Err(InitError::Spawn {
                        slot: index,
                        source,
                    });
                }
            }
        }

        Ok(Dispatcher {
            shared,
            threads,
            config,
            torn_down: false,
        })
    }

    /// The configuration this dispatcher was created with.
    #[inline(always)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The item source captured at creation.
    #[inline(always)]
    pub fn source(&self) -> &S {
        &self.shared.source
    }

    /// The number of worker threads this dispatcher runs. Zero in
    /// [`Inline`](crate::ExecutionMode::Inline) mode.
    #[inline(always)]
    pub fn thread_count(&self) -> usize {
        self.shared.slots.len()
    }

    /// Returns true once [`Dispatcher::teardown`] has run.
    #[inline(always)]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Runs the callback over every item the source currently reports, and
    /// returns the partition that was used.
    ///
    /// See [`Dispatcher::dispatch_count`].
    #[inline]
    pub fn dispatch(&mut self) -> Result<Partition, DispatchError> {
        if self.torn_down {
            return Err(DispatchError::TornDown);
        }
        let count = self.shared.source.item_count();
        self.dispatch_count(count)
    }

    /// Runs the callback over `[0, count)`, ignoring what the source reports,
    /// and returns the partition that was used.
    ///
    /// When `count` is zero this returns immediately without waking anything.
    /// Otherwise the first [`Partition::worker_chunks`] slots are armed, the
    /// local chunk runs on this thread, and this blocks until every armed slot
    /// has finished.
    pub fn dispatch_count(&mut self, count: usize) -> Result<Partition, DispatchError> {
        if self.torn_down {
            return Err(DispatchError::TornDown);
        }

        let shared = &*self.shared;
        let partition = Partition::new(count, shared.slots.len(), self.config.min_job_size());
        if partition.is_empty() {
            return Ok(partition);
        }

        let span = trace_span!("dispatch", count, workers = partition.workers_used());
        let _enter = span.enter();

        let armed = &shared.slots[..partition.worker_chunks()];

        // Fork.
        for (slot, chunk) in armed.iter().zip(partition.chunks()) {
            trace!("arming slot {} with [{}, {})", slot.index(), chunk.from(), chunk.to());
            slot.arm(chunk);
        }

        // The calling thread always works, instead of only coordinating.
        let local = partition.local();
        trace!("running local chunk [{}, {})", local.from(), local.to());
        let local_result = unwind::halt_unwinding(|| (shared.callback)(&shared.source, local));

        // Join. Every armed slot must be back at rest before anything else
        // happens, including re-raising a local panic, so that the next
        // dispatch never re-arms a slot that is still running.
        for slot in armed {
            slot.wait_done();
        }

        // Drain every slot, even if the local chunk panicked, so no failure
        // outlives the tick that produced it.
        let mut failures = Vec::new();
        for slot in armed {
            if let Some(failure) = slot.take_failure() {
                failures.push(failure);
            }
        }

        if let Err(payload) = local_result {
            for failure in &failures {
                error!("discarding worker failure while resuming local panic: {}", failure);
            }
            unwind::resume_unwinding(payload);
        }

        if failures.is_empty() {
            Ok(partition)
        } else {
            Err(DispatchError::WorkerPanicked(failures))
        }
    }

    /// Stops and joins every worker thread. Further dispatches fail with
    /// [`DispatchError::TornDown`]. Calling this again does nothing.
    ///
    /// Each thread is given [`Config::join_timeout`] to exit. Threads that miss
    /// the deadline are detached; they exit on their own as soon as they are
    /// scheduled again.
    #[cold]
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        debug!("tearing down dispatcher with {} worker thread(s)", self.threads.len());

        // Tell every worker to halt first, so they all wind down in parallel.
        for slot in self.shared.slots.iter() {
            debug_assert!(slot.is_at_rest(), "teardown while a slot was still running");
            slot.halt();
        }

        // Then wait for them to finish.
        let timeout = self.config.join_timeout();
        for (index, handle) in self.threads.drain(..).enumerate() {
            if !join_within(handle, timeout) {
                warn!("worker thread {} did not exit within {:?}; detaching", index, timeout);
            }
        }

        debug!("dispatcher torn down");
    }
}

impl<S, F> Drop for Dispatcher<S, F>
where
    S: ItemSource + Send + Sync + 'static,
    F: Fn(&S, ChunkRange) + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.teardown();
    }
}

// -----------------------------------------------------------------------------
// Main worker loop

/// This is the main loop for a worker thread. It sleeps until its slot is
/// armed, runs the chunk, reports back, and repeats until the slot is halted.
///
/// A panicking chunk is recorded on the slot rather than unwinding the thread,
/// and the slot is reported done on every path.
fn worker_loop<S, F>(shared: Arc<Shared<S, F>>, index: usize)
where
    S: ItemSource + Send + Sync + 'static,
    F: Fn(&S, ChunkRange) + Send + Sync + 'static,
{
    trace!("starting worker {}", index);

    let slot = &shared.slots[index];
    while let Some(chunk) = slot.receive() {
        let result = unwind::halt_unwinding(|| (shared.callback)(&shared.source, chunk));

        if let Err(payload) = result {
            let failure = ChunkFailure {
                slot: index,
                chunk,
                message: unwind::payload_message(&*payload),
            };
            error!("worker chunk panicked: {}", failure);
            slot.record_failure(failure);
        }

        slot.complete();
    }

    trace!("exiting worker {}", index);
}
