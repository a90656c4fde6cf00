//! Dispatcher configuration.

use alloc::borrow::Cow;
use core::num::NonZero;
use core::time::Duration;
use std::thread::available_parallelism;

use crate::error::ConfigError;

/// How long teardown waits for each worker thread to exit by default.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_millis(10);

/// The prefix used to name worker threads by default.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "tickpool";

// -----------------------------------------------------------------------------
// Thread count

/// How many background worker threads a dispatcher should own. The calling
/// thread always works as well, so the effective parallelism is one more than
/// this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadCount {
    /// Exactly this many threads.
    Fixed(usize),
    /// One fewer than the available parallelism of the machine, leaving a core
    /// for the calling thread. Never less than one.
    Available,
}

impl ThreadCount {
    /// Resolves this into a concrete number of threads.
    pub fn resolve(self) -> usize {
        match self {
            ThreadCount::Fixed(count) => count,
            ThreadCount::Available => {
                let available = available_parallelism().map(NonZero::get).unwrap_or(1);
                available.saturating_sub(1).max(1)
            }
        }
    }
}

impl From<usize> for ThreadCount {
    fn from(count: usize) -> ThreadCount {
        ThreadCount::Fixed(count)
    }
}

// -----------------------------------------------------------------------------
// Execution mode

/// Whether a dispatcher actually uses threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Spawn the configured number of worker threads.
    Threaded,
    /// Spawn nothing and run every dispatch on the calling thread as a single
    /// chunk. This is the default on targets without threads.
    Inline,
}

impl Default for ExecutionMode {
    fn default() -> ExecutionMode {
        if cfg!(target_family = "wasm") {
            ExecutionMode::Inline
        } else {
            ExecutionMode::Threaded
        }
    }
}

// -----------------------------------------------------------------------------
// Config

/// The immutable settings of a [`Dispatcher`](crate::Dispatcher).
///
/// A `Config` can only be obtained through validation, so holding one means
/// the thread count and minimum job size are both at least one.
///
/// ```
/// use core::time::Duration;
/// use tickpool::{Config, ConfigError, ExecutionMode, ThreadCount};
///
/// let config = Config::builder()
///     .thread_count(ThreadCount::Available)
///     .min_job_size(256)
///     .thread_name_prefix("physics")
///     .join_timeout(Duration::from_millis(50))
///     .build()
///     .unwrap();
/// assert!(config.thread_count() >= 1);
/// assert_eq!(config.execution_mode(), ExecutionMode::default());
///
/// assert_eq!(Config::new(0, 10).unwrap_err(), ConfigError::ZeroThreadCount);
/// assert_eq!(Config::new(4, 0).unwrap_err(), ConfigError::ZeroMinJobSize);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    thread_count: usize,
    min_job_size: usize,
    execution_mode: ExecutionMode,
    thread_name_prefix: Cow<'static, str>,
    join_timeout: Duration,
}

impl Config {
    /// Creates a config with the given thread count and minimum job size, and
    /// defaults for everything else.
    pub fn new(thread_count: usize, min_job_size: usize) -> Result<Config, ConfigError> {
        Config::builder()
            .thread_count(thread_count)
            .min_job_size(min_job_size)
            .build()
    }

    /// Starts building a config.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The number of background worker threads.
    #[inline(always)]
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// The smallest number of items worth handing to a worker.
    #[inline(always)]
    pub fn min_job_size(&self) -> usize {
        self.min_job_size
    }

    /// Whether worker threads are used at all.
    #[inline(always)]
    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }

    /// The prefix worker thread names are built from.
    pub fn thread_name_prefix(&self) -> &str {
        &self.thread_name_prefix
    }

    /// How long teardown waits for each worker thread.
    pub fn join_timeout(&self) -> Duration {
        self.join_timeout
    }

    /// The number of threads the dispatcher will actually spawn.
    pub(crate) fn spawned_threads(&self) -> usize {
        match self.execution_mode {
            ExecutionMode::Threaded => self.thread_count,
            ExecutionMode::Inline => 0,
        }
    }
}

// -----------------------------------------------------------------------------
// Builder

/// Builder for [`Config`]. Nothing is checked until [`ConfigBuilder::build`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    thread_count: ThreadCount,
    min_job_size: usize,
    execution_mode: ExecutionMode,
    thread_name_prefix: Cow<'static, str>,
    join_timeout: Duration,
}

impl Default for ConfigBuilder {
    fn default() -> ConfigBuilder {
        ConfigBuilder {
            thread_count: ThreadCount::Available,
            min_job_size: 1,
            execution_mode: ExecutionMode::default(),
            thread_name_prefix: Cow::Borrowed(DEFAULT_THREAD_NAME_PREFIX),
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }
}

impl ConfigBuilder {
    /// Sets the number of background worker threads.
    pub fn thread_count(mut self, thread_count: impl Into<ThreadCount>) -> ConfigBuilder {
        self.thread_count = thread_count.into();
        self
    }

    /// Sets the smallest number of items worth handing to a worker.
    pub fn min_job_size(mut self, min_job_size: usize) -> ConfigBuilder {
        self.min_job_size = min_job_size;
        self
    }

    /// Chooses between threaded and inline execution.
    pub fn execution_mode(mut self, execution_mode: ExecutionMode) -> ConfigBuilder {
        self.execution_mode = execution_mode;
        self
    }

    /// Sets the prefix of worker thread names. Thread `i` is named
    /// `"{prefix}-{i}"`.
    pub fn thread_name_prefix(mut self, prefix: impl Into<Cow<'static, str>>) -> ConfigBuilder {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Sets how long teardown waits for each worker thread to exit before
    /// giving up on it.
    pub fn join_timeout(mut self, join_timeout: Duration) -> ConfigBuilder {
        self.join_timeout = join_timeout;
        self
    }

    /// Validates the settings.
    pub fn build(self) -> Result<Config, ConfigError> {
        let thread_count = self.thread_count.resolve();
        if thread_count == 0 {
            return Err(ConfigError::ZeroThreadCount);
        }
        if self.min_job_size == 0 {
            return Err(ConfigError::ZeroMinJobSize);
        }
        if self.thread_name_prefix.is_empty() {
            return Err(ConfigError::EmptyThreadNamePrefix);
        }

        Ok(Config {
            thread_count,
            min_job_size: self.min_job_size,
            execution_mode: self.execution_mode,
            thread_name_prefix: self.thread_name_prefix,
            join_timeout: self.join_timeout,
        })
    }
}
