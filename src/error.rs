//! Error types for building and running dispatchers.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;

use crate::range::ChunkRange;

/// A [`Config`](crate::Config) value that can never describe a working pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The pool was asked for zero worker threads.
    #[error("thread count must be at least 1")]
    ZeroThreadCount,

    /// Chunks were allowed to be empty.
    #[error("minimum job size must be at least 1")]
    ZeroMinJobSize,

    /// Worker threads need a non-empty name prefix.
    #[error("thread name prefix must not be empty")]
    EmptyThreadNamePrefix,
}

/// Failure to bring up a [`Dispatcher`](crate::Dispatcher).
#[derive(Error, Debug)]
pub enum InitError {
    /// The configuration was rejected.
    #[error("invalid dispatcher configuration: {0}")]
    Config(#[from] ConfigError),

    /// The operating system refused to start a worker thread. Any threads that
    /// were already started have been shut down again.
    #[error("failed to spawn worker thread for slot {slot}: {source}")]
    Spawn {
        /// The slot whose thread could not be started.
        slot: usize,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The system has already been initialized once. Systems cannot be
    /// re-initialized, even after teardown.
    #[error("system was already initialized")]
    AlreadyInitialized,
}

/// Failure of a single dispatch.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The dispatcher has been torn down and can no longer run work.
    #[error("dispatch called after teardown")]
    TornDown,

    /// A system was run before being initialized.
    #[error("dispatch called before initialization")]
    NotInitialized,

    /// One or more worker chunks panicked. Every other chunk ran to
    /// completion, and the pool is still usable.
    #[error("{} worker chunk(s) panicked, first: {}", .0.len(), FirstFailure(.0))]
    WorkerPanicked(Vec<ChunkFailure>),
}

/// Describes a chunk whose callback panicked on a worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// The index of the worker slot that ran the chunk.
    pub slot: usize,
    /// The chunk that was being processed.
    pub chunk: ChunkRange,
    /// The panic message, if the payload was a string.
    pub message: String,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slot {} panicked on [{}, {}): {}",
            self.slot,
            self.chunk.from(),
            self.chunk.to(),
            self.message
        )
    }
}

struct FirstFailure<'a>(&'a [ChunkFailure]);

impl fmt::Display for FirstFailure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.first() {
            Some(failure) => failure.fmt(f),
            None => f.write_str("none"),
        }
    }
}
