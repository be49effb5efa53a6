//! Errors reported by the arena.
//!
//! Running out of memory is not one of them: `allocate` reports exhaustion
//! with `None` so callers can free something and try again.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The arena has to be larger than a single block header.
    #[error("arena size must be between 9 and i64::MAX bytes, got {size}")]
    InvalidSize { size: usize },

    /// Unknown placement strategy. The arena cannot run without one.
    #[error("invalid fit type: {0}")]
    InvalidStrategy(String),

    /// A configuration value could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    /// The platform refused to hand out the backing buffer.
    #[error("platform refused a {size} byte memory request")]
    MemoryRequestFailed { size: usize },

    /// The pointer was never returned by `allocate`, or it was already
    /// deallocated.
    #[error("pointer {addr:#x} is not an outstanding allocation")]
    UnknownPointer { addr: usize },

    #[error("arena is already initialized")]
    AlreadyInitialized,

    #[error("arena is not initialized")]
    Uninitialized,

    /// Block headers and registries disagree.
    #[error("arena corrupted at offset {offset}: {reason}")]
    Corrupted { offset: usize, reason: &'static str },
}
