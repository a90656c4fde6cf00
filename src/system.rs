//! A lifecycle wrapper shaped like an ECS system: configure once, run every
//! tick, tear down at shutdown.

use core::mem;

use tracing::debug;

use crate::config::Config;
use crate::config::ConfigBuilder;
use crate::config::ThreadCount;
use crate::dispatcher::Dispatcher;
use crate::dispatcher::ItemSource;
use crate::error::DispatchError;
use crate::error::InitError;
use crate::partition::Partition;
use crate::range::ChunkRange;

// -----------------------------------------------------------------------------
// System trait

/// A system whose per-tick work is split across a [`Dispatcher`].
///
/// Every hook is called exactly once, from [`SystemRunner::initialize`], and
/// the answers are fixed for the lifetime of the runner.
///
/// ```
/// # #![cfg(not(any(loom, feature = "shuttle")))]
/// use core::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use tickpool::{ChunkRange, MultiThreadSystem, SystemRunner, ThreadCount};
///
/// struct Ages {
///     ages: Arc<Vec<AtomicU32>>,
/// }
///
/// impl MultiThreadSystem for Ages {
///     type Source = Arc<Vec<AtomicU32>>;
///     type Callback = fn(&Arc<Vec<AtomicU32>>, ChunkRange);
///
///     fn source(&mut self) -> Self::Source {
///         self.ages.clone()
///     }
///
///     fn callback(&mut self) -> Self::Callback {
///         |ages, chunk| {
///             for index in chunk {
///                 ages[index].fetch_add(1, Ordering::Relaxed);
///             }
///         }
///     }
///
///     fn min_job_size(&self) -> usize {
///         100
///     }
///
///     fn thread_count(&self) -> ThreadCount {
///         ThreadCount::Fixed(2)
///     }
/// }
///
/// let ages = Arc::new((0..1000).map(|_| AtomicU32::new(0)).collect::<Vec<_>>());
/// let mut runner = SystemRunner::new(Ages { ages: ages.clone() });
/// runner.initialize().unwrap();
/// for _ in 0..3 {
///     runner.run().unwrap();
/// }
/// runner.teardown();
/// assert!(ages.iter().all(|age| age.load(Ordering::Relaxed) == 3));
/// ```
pub trait MultiThreadSystem {
    /// The collection processed each tick.
    type Source: ItemSource + Send + Sync + 'static;

    /// The per-chunk callback.
    type Callback: Fn(&Self::Source, ChunkRange) + Send + Sync + 'static;

    /// Provides the item source.
    fn source(&mut self) -> Self::Source;

    /// Provides the chunk callback.
    fn callback(&mut self) -> Self::Callback;

    /// The smallest number of items worth handing to one worker.
    fn min_job_size(&self) -> usize;

    /// How many worker threads this system should use.
    fn thread_count(&self) -> ThreadCount;

    /// Adjusts any remaining settings (thread names, teardown timeout,
    /// execution mode). The thread count and minimum job size have already
    /// been applied.
    fn configure(&self, builder: ConfigBuilder) -> ConfigBuilder {
        builder
    }
}

// -----------------------------------------------------------------------------
// Runner

/// Where a [`SystemRunner`] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemState {
    /// Created, but [`SystemRunner::initialize`] has not run yet.
    Uninitialized,
    /// Threads are running and the system can be run.
    Running,
    /// Torn down. The runner can no longer be used.
    TornDown,
}

enum Stage<T: MultiThreadSystem> {
    Uninitialized,
    Running(Dispatcher<T::Source, T::Callback>),
    TornDown,
}

/// Drives a [`MultiThreadSystem`] through its lifecycle.
///
/// Hooks must be called in order: [`initialize`](SystemRunner::initialize)
/// once, [`run`](SystemRunner::run) any number of times, and
/// [`teardown`](SystemRunner::teardown) once. Out of order calls return errors
/// rather than misbehaving.
pub struct SystemRunner<T: MultiThreadSystem> {
    system: T,
    stage: Stage<T>,
}

impl<T: MultiThreadSystem> SystemRunner<T> {
    /// Wraps a system. No threads are started until `initialize`.
    pub fn new(system: T) -> SystemRunner<T> {
        SystemRunner {
            system,
            stage: Stage::Uninitialized,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SystemState {
        match self.stage {
            Stage::Uninitialized => SystemState::Uninitialized,
            Stage::Running(_) => SystemState::Running,
            Stage::TornDown => SystemState::TornDown,
        }
    }

    /// The wrapped system.
    pub fn system(&self) -> &T {
        &self.system
    }

    /// The wrapped system, mutably.
    pub fn system_mut(&mut self) -> &mut T {
        &mut self.system
    }

    /// The dispatcher, while the system is running.
    pub fn dispatcher(&self) -> Option<&Dispatcher<T::Source, T::Callback>> {
        match &self.stage {
            Stage::Running(dispatcher) => Some(dispatcher),
            _ => None,
        }
    }

    /// Queries the system's hooks, validates the configuration, and starts the
    /// worker threads.
    pub fn initialize(&mut self) -> Result<(), InitError> {
        if !matches!(self.stage, Stage::Uninitialized) {
            return Err(InitError::AlreadyInitialized);
        }

        let builder = Config::builder()
            .thread_count(self.system.thread_count())
            .min_job_size(self.system.min_job_size());
        let config = self.system.configure(builder).build()?;

        let source = self.system.source();
        let callback = self.system.callback();
        let dispatcher = Dispatcher::new(config, source, callback)?;

        debug!("system initialized");
        self.stage = Stage::Running(dispatcher);
        Ok(())
    }

    /// Runs one tick.
    pub fn run(&mut self) -> Result<Partition, DispatchError> {
        match &mut self.stage {
            Stage::Running(dispatcher) => dispatcher.dispatch(),
            Stage::Uninitialized => Err(DispatchError::NotInitialized),
            Stage::TornDown => Err(DispatchError::TornDown),
        }
    }

    /// Stops the worker threads. The runner is unusable afterwards.
    pub fn teardown(&mut self) {
        if let Stage::Running(mut dispatcher) = mem::replace(&mut self.stage, Stage::TornDown) {
            dispatcher.teardown();
            debug!("system torn down");
        }
    }
}
