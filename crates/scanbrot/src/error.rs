//! # Pipeline Error Types
//!
//! The pipeline itself has no recoverable runtime errors: stale completions,
//! stalls and clamped caps are policy, and invariant violations are counted
//! in the stats. What remains is the edge of the model: bad configs, bounded
//! run helpers that time out, store addressing, and frame dump IO.

use scanbrot_shared::ConfigError;
use thiserror::Error;

/// Errors from the backing store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Address beyond the store's capacity.
    #[error("address {addr} out of range (capacity {capacity})")]
    OutOfRange {
        /// Requested address.
        addr: usize,
        /// Store capacity.
        capacity: usize,
    },
}

/// Result type for backing store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from building or driving the render loop.
#[derive(Error, Debug)]
pub enum SimError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backing store cannot hold one frame.
    #[error("backing store holds {capacity} bytes, frame needs {required}")]
    StoreTooSmall {
        /// Store capacity.
        capacity: usize,
        /// Bytes per frame.
        required: usize,
    },

    /// A bounded run did not reach its goal.
    #[error("gave up after {ticks} ticks")]
    Timeout {
        /// Ticks spent.
        ticks: u64,
    },

    /// Frame dump IO failed.
    #[error("frame dump io: {0}")]
    Io(#[from] std::io::Error),

    /// A frame dump did not start with a valid header.
    #[error("not a frame dump: {0}")]
    BadDump(&'static str),
}

/// Result type for render loop operations.
pub type SimResult<T> = Result<T, SimError>;
