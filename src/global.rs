//! Process wide arena with an explicit initialize / destroy lifecycle.
//!
//! Handy for hosts that want a single heap without threading an [`Arena`]
//! handle through every call. Each function locks the process wide slot for
//! its whole duration, so they can be called from any thread.
//!
//! ```no_run
//! use fitalloc::{global, FitStrategy};
//!
//! global::initialize(4096, FitStrategy::BestFit).unwrap();
//!
//! let ptr = global::allocate(128).unwrap();
//! global::deallocate(ptr.as_ptr()).unwrap();
//!
//! global::destroy().unwrap();
//! ```

use std::ptr::NonNull;

use log::warn;
use parking_lot::{Mutex, const_mutex};

use crate::{
    arena::{Arena, Compaction, Stats},
    config::ArenaConfig,
    error::ArenaError,
    strategy::FitStrategy,
};

static ARENA: Mutex<Option<Arena>> = const_mutex(None);

/// Creates the process wide arena. Fails with
/// [`ArenaError::AlreadyInitialized`] until the current one is destroyed.
pub fn initialize(total_size: usize, strategy: FitStrategy) -> Result<(), ArenaError> {
    initialize_with(ArenaConfig::new(total_size).with_strategy(strategy))
}

pub fn initialize_with(config: ArenaConfig) -> Result<(), ArenaError> {
    let mut slot = ARENA.lock();

    if slot.is_some() {
        return Err(ArenaError::AlreadyInitialized);
    }

    *slot = Some(Arena::new(config)?);

    Ok(())
}

pub fn is_initialized() -> bool {
    ARENA.lock().is_some()
}

/// See [`Arena::allocate`]. Returns `None` when there is no arena.
pub fn allocate(size: usize) -> Option<NonNull<u8>> {
    match ARENA.lock().as_ref() {
        Some(arena) => arena.allocate(size),
        None => {
            warn!("allocate({size}) without an initialized arena");
            None
        }
    }
}

/// See [`Arena::deallocate`]. A null `ptr` is accepted even without an arena.
pub fn deallocate(ptr: *mut u8) -> Result<(), ArenaError> {
    if ptr.is_null() {
        return Ok(());
    }

    with_arena(|arena| arena.deallocate(ptr))?
}

pub fn available_memory() -> Result<usize, ArenaError> {
    with_arena(Arena::available_memory)
}

pub fn get_statistics() -> Result<Stats, ArenaError> {
    with_arena(Arena::get_statistics)
}

pub fn compact_allocation() -> Result<Compaction, ArenaError> {
    with_arena(Arena::compact_allocation)
}

/// Releases the process wide arena. Every pointer it handed out becomes
/// dangling.
pub fn destroy() -> Result<(), ArenaError> {
    ARENA
        .lock()
        .take()
        .map(Arena::destroy)
        .ok_or(ArenaError::Uninitialized)
}

fn with_arena<T>(f: impl FnOnce(&Arena) -> T) -> Result<T, ArenaError> {
    ARENA.lock().as_ref().map(f).ok_or(ArenaError::Uninitialized)
}
