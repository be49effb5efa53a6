//! A user space allocator that manages one fixed size arena.
//!
//! The arena is a single backing buffer requested from the operating system.
//! It is carved into blocks, each preceded by an 8 byte header that records
//! the block's gross size (header included):
//!
//! ```text
//! +-----+----------+-----+----------------+-----+-------+
//! | hdr |  Alloc   | hdr |      Free      | hdr | Alloc |
//! +-----+----------+-----+----------------+-----+-------+
//! ```
//!
//! Allocation asks a [`FitStrategy`] for a free block, splits off whatever is
//! left when the remainder can still host a block, and hands out a pointer to
//! the payload. Deallocation zeroes the payload and merges address adjacent
//! free blocks back together.
//!
//! ```
//! use fitalloc::{Arena, ArenaConfig, FitStrategy};
//!
//! let arena = Arena::new(ArenaConfig::new(1000).with_strategy(FitStrategy::FirstFit)).unwrap();
//!
//! let ptr = arena.allocate(100).unwrap();
//! assert_eq!(arena.available_memory(), 1000 - 8 - 100 - 8);
//!
//! arena.deallocate(ptr.as_ptr()).unwrap();
//! assert_eq!(arena.get_statistics().free_chunks, 1);
//! ```
//!
//! [`global`] wraps one process wide arena behind free functions for callers
//! that prefer an initialize / destroy lifecycle over a handle.

mod arena;
mod block;
mod config;
mod error;
mod freelist;
mod kernel;
mod list;
mod strategy;
mod utils;

pub mod global;

pub use arena::{Arena, Compaction, Stats};
pub use block::HEADER_SIZE;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use strategy::FitStrategy;
