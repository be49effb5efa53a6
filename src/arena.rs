use std::ptr::NonNull;

use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::{
    block::{Block, HEADER_SIZE, MIN_BLOCK_SIZE},
    config::ArenaConfig,
    error::ArenaError,
    freelist::Registry,
    kernel::Mapping,
    strategy::FitStrategy,
};

/// Snapshot of the arena's bookkeeping. All sizes are in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Stats {
    /// Arena size minus free usable bytes, minus every block header, minus the
    /// header of the initial block. Saturates at zero.
    pub allocated_size: usize,
    /// Number of outstanding allocations.
    pub allocated_chunks: usize,
    /// Usable bytes of all free blocks, same as [`Arena::available_memory`].
    pub free_size: usize,
    /// Number of free blocks.
    pub free_chunks: usize,
    /// Usable size of the smallest free block, `0` when nothing is free.
    pub smallest_free_chunk_size: usize,
    /// Usable size of the largest free block, `0` when nothing is free.
    pub largest_free_chunk_size: usize,
}

/// Result of [`Arena::compact_allocation`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compaction {
    /// `(before, after)` address of every block that was moved.
    pub relocations: Vec<(NonNull<u8>, NonNull<u8>)>,
    /// Bytes of external fragmentation that were reclaimed.
    pub bytes_compacted: usize,
}

/// Everything the arena lock protects.
///
/// Block offsets are relative to the start of `memory`. The first block
/// header sits at offset `0`, so the first payload ever handed out is at
/// offset [`HEADER_SIZE`].
struct Heap {
    memory: Mapping,
    total_size: usize,
    strategy: FitStrategy,
    /// Blocks available to satisfy requests.
    free: Registry,
    /// Outstanding allocations.
    allocated: Registry,
}

impl Heap {
    fn new(config: &ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;

        let mut memory = Mapping::new(config.total_size)?;

        // A single free block spanning the whole arena.
        let block = Block::new(HEADER_SIZE);
        block.set_size(&mut memory, config.total_size);

        let mut free = Registry::new();
        free.insert_tail(block);

        Ok(Self {
            memory,
            total_size: config.total_size,
            strategy: config.strategy,
            free,
            allocated: Registry::new(),
        })
    }

    /// Carves `size` usable bytes out of a free block and returns the payload
    /// offset of the new allocation.
    ///
    /// ```text
    /// Before:  | hdr |              free (gross G)                 |
    ///
    /// Split:   | hdr | allocated (size) | hdr | free (G - size - 8) |
    ///
    /// Whole:   | hdr |         allocated (gross G)                 |
    /// ```
    ///
    /// The remainder only becomes a block of its own when it is larger than a
    /// header, otherwise the allocation absorbs it.
    fn allocate(&mut self, size: usize) -> Option<usize> {
        if size == 0 {
            warn!("allocate(0) rejected");
            return None;
        }

        let needed = size.checked_add(HEADER_SIZE)?;

        let Some(node) = self.strategy.select(&self.free, needed, &self.memory) else {
            warn!(
                "allocate({size}) -> out of memory ({} bytes free, {} free chunks)",
                self.available_memory(),
                self.free.count()
            );
            return None;
        };

        let candidate = self.free.get(node)?;
        let remaining = candidate.size(&self.memory) - needed;

        if remaining > HEADER_SIZE {
            candidate.set_size(&mut self.memory, needed);

            let rest = Block::new(candidate.payload + needed);
            rest.set_size(&mut self.memory, remaining);

            // The remainder takes over the candidate's place in the free list.
            self.free.replace(node, rest);
        } else {
            self.free.delete(node);
        }

        self.allocated.insert_tail(candidate);

        trace!(
            "allocate({size}) -> offset {} ({} strategy, {} bytes left over)",
            candidate.payload,
            self.strategy,
            remaining
        );

        Some(candidate.payload)
    }

    /// Returns the allocation at `payload` to the free list and merges it
    /// with its free neighbours.
    fn deallocate(&mut self, payload: usize, addr: usize) -> Result<(), ArenaError> {
        let block = self
            .allocated
            .find(payload)
            .and_then(|node| self.allocated.delete(node))
            .ok_or_else(|| {
                warn!("deallocate({addr:#x}) -> not an outstanding allocation");
                ArenaError::UnknownPointer { addr }
            })?;

        self.free.insert_tail(block);
        block.zero_payload(&mut self.memory);

        trace!(
            "deallocate({addr:#x}) -> {} bytes released",
            block.usable_size(&self.memory)
        );

        self.coalesce();

        Ok(())
    }

    /// Single left to right pass merging every run of address adjacent free
    /// blocks into the first block of the run.
    ///
    /// ```text
    /// | hdr | free A | hdr | free B | hdr | free C |
    ///
    /// | hdr |             free A + B + C           |
    /// ```
    ///
    /// The free list is sorted by address first, otherwise neighbours that
    /// were freed out of order would never meet. After a merge we stay on the
    /// same block so runs of any length collapse in one pass.
    fn coalesce(&mut self) {
        self.free.sort_by_address();

        let mut merges = 0;
        let mut current = self.free.first();

        while let Some(node) = current {
            let Some(next) = self.free.next(node) else {
                break;
            };
            let (Some(block), Some(neighbour)) = (self.free.get(node), self.free.get(next)) else {
                break;
            };

            if block.next_payload(&self.memory) == neighbour.payload {
                let merged = block.size(&self.memory) + neighbour.size(&self.memory);
                block.set_size(&mut self.memory, merged);
                neighbour.clear_header(&mut self.memory);
                self.free.delete(next);
                merges += 1;
            } else {
                current = Some(next);
            }
        }

        if merges > 0 {
            debug!(
                "coalesced {merges} free blocks, {} free chunks remain",
                self.free.count()
            );
        }
    }

    fn available_memory(&self) -> usize {
        self.free.usable_sizes(&self.memory).sum()
    }

    fn statistics(&self) -> Stats {
        let allocated_chunks = self.allocated.count();
        let free_size = self.available_memory();

        Stats {
            allocated_size: self
                .total_size
                .saturating_sub(free_size)
                .saturating_sub(HEADER_SIZE * allocated_chunks)
                .saturating_sub(HEADER_SIZE),
            allocated_chunks,
            free_size,
            free_chunks: self.free.count(),
            smallest_free_chunk_size: self.free.usable_sizes(&self.memory).min().unwrap_or(0),
            largest_free_chunk_size: self.free.usable_sizes(&self.memory).max().unwrap_or(0),
        }
    }

    fn usable_size(&self, payload: usize, addr: usize) -> Result<usize, ArenaError> {
        self.allocated
            .find(payload)
            .and_then(|node| self.allocated.get(node))
            .map(|block| block.usable_size(&self.memory))
            .ok_or(ArenaError::UnknownPointer { addr })
    }

    /// Walks every block in address order and checks that together they tile
    /// the arena exactly, that each one is large enough to exist and that no
    /// two free blocks touch.
    fn check_invariants(&self) -> Result<(), ArenaError> {
        let mut blocks: Vec<(Block, bool)> = self
            .free
            .iter()
            .map(|(_, block)| (block, true))
            .chain(self.allocated.iter().map(|(_, block)| (block, false)))
            .collect();
        blocks.sort_by_key(|(block, _)| block.payload);

        let corrupted = |offset, reason| Err(ArenaError::Corrupted { offset, reason });

        let mut expected = HEADER_SIZE;
        let mut previous_free = false;

        for (block, is_free) in blocks {
            if block.payload < expected {
                return corrupted(block.payload, "block overlaps its predecessor");
            }
            if block.payload > expected {
                return corrupted(expected, "bytes not covered by any block");
            }
            if block.size(&self.memory) < MIN_BLOCK_SIZE {
                return corrupted(block.header(), "block smaller than header plus one byte");
            }
            if is_free && previous_free {
                return corrupted(block.header(), "adjacent free blocks were not coalesced");
            }

            expected = block.next_payload(&self.memory);
            previous_free = is_free;
        }

        if expected != self.total_size + HEADER_SIZE {
            return corrupted(expected - HEADER_SIZE, "blocks do not end at the arena boundary");
        }

        Ok(())
    }
}

/// A fixed size arena that hands out variable sized blocks.
///
/// The arena owns one backing buffer of `total_size` bytes. Every block in it
/// is preceded by an 8 byte header holding its gross size, and every block is
/// tracked by exactly one of two registries, free or allocated.
///
/// ```text
/// 0        8                                                  total_size
/// +--------+--------------+-----+--------------+-----+---------------+
/// |  hdr   |   Alloc      | hdr |    Free      | hdr |    Alloc      |
/// +--------+--------------+-----+--------------+-----+---------------+
///          ^ first payload
/// ```
///
/// All operations take the same lock, so the arena can be shared between
/// threads but only one operation makes progress at a time.
pub struct Arena {
    heap: Mutex<Heap>,
}

impl Arena {
    /// Creates an arena as described by `config`. The backing buffer is zeroed
    /// and holds a single free block spanning all of it.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        let heap = Heap::new(&config)?;

        debug!(
            "initialized {} byte arena ({} usable, {})",
            config.total_size,
            config.usable_size(),
            config.strategy
        );

        Ok(Self {
            heap: Mutex::new(heap),
        })
    }

    /// Shorthand for `Arena::new(ArenaConfig::new(total_size).with_strategy(strategy))`.
    pub fn with_strategy(total_size: usize, strategy: FitStrategy) -> Result<Self, ArenaError> {
        Self::new(ArenaConfig::new(total_size).with_strategy(strategy))
    }

    pub fn total_size(&self) -> usize {
        self.heap.lock().total_size
    }

    pub fn strategy(&self) -> FitStrategy {
        self.heap.lock().strategy
    }

    /// Allocates `size` usable bytes and returns a pointer to the first one.
    ///
    /// Returns `None` when `size` is zero or no free block is large enough.
    /// The returned memory is zeroed and carries no alignment guarantee.
    pub fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let mut heap = self.heap.lock();
        let payload = heap.allocate(size)?;

        Some(heap.memory.pointer_at(payload))
    }

    /// Gives an allocation back to the arena. Its bytes are zeroed and it is
    /// merged with any free neighbours.
    ///
    /// A null `ptr` is a no-op. Pointers that are not outstanding allocations
    /// of this arena, including ones that were already deallocated, are
    /// rejected with [`ArenaError::UnknownPointer`] and leave the arena as it was.
    pub fn deallocate(&self, ptr: *mut u8) -> Result<(), ArenaError> {
        if ptr.is_null() {
            return Ok(());
        }

        let addr = ptr.addr();
        let mut heap = self.heap.lock();

        let payload = heap.memory.offset_of(ptr).ok_or_else(|| {
            warn!("deallocate({addr:#x}) -> pointer outside of arena");
            ArenaError::UnknownPointer { addr }
        })?;

        heap.deallocate(payload, addr)
    }

    /// Usable bytes across all free blocks. Headers are not counted.
    pub fn available_memory(&self) -> usize {
        self.heap.lock().available_memory()
    }

    pub fn get_statistics(&self) -> Stats {
        self.heap.lock().statistics()
    }

    /// Usable size of the outstanding allocation at `ptr`. May be larger than
    /// what was requested when the allocation absorbed a too small remainder.
    pub fn usable_size(&self, ptr: *const u8) -> Result<usize, ArenaError> {
        let addr = ptr.addr();
        let heap = self.heap.lock();

        let payload = heap
            .memory
            .offset_of(ptr)
            .ok_or(ArenaError::UnknownPointer { addr })?;

        heap.usable_size(payload, addr)
    }

    /// Relocating live allocations is not supported: nothing is moved and the
    /// report is always empty.
    pub fn compact_allocation(&self) -> Compaction {
        let heap = self.heap.lock();
        trace!(
            "compact_allocation() -> nothing moved ({} allocated chunks)",
            heap.allocated.count()
        );

        Compaction::default()
    }

    /// Verifies the block layout, see [`ArenaError::Corrupted`] for what a
    /// failure looks like.
    pub fn check_invariants(&self) -> Result<(), ArenaError> {
        self.heap.lock().check_invariants()
    }

    /// Releases the backing buffer together with every block. Pointers handed
    /// out by this arena must not be used afterwards.
    pub fn destroy(self) {
        drop(self)
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        let heap = self.heap.get_mut();
        debug!(
            "destroying {} byte arena ({} allocated chunks outstanding)",
            heap.total_size,
            heap.allocated.count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{sync::Arc, thread};

    fn arena(total_size: usize, strategy: FitStrategy) -> Arena {
        Arena::with_strategy(total_size, strategy).unwrap()
    }

    #[test]
    fn fresh_arena_has_one_free_block() {
        let arena = arena(1000, FitStrategy::FirstFit);
        let stats = arena.get_statistics();

        assert_eq!(arena.available_memory(), 992);
        assert_eq!(stats.free_chunks, 1);
        assert_eq!(stats.allocated_chunks, 0);
        assert_eq!(stats.allocated_size, 0);
        assert_eq!(stats.smallest_free_chunk_size, 992);
        assert_eq!(stats.largest_free_chunk_size, 992);
        assert_eq!(arena.total_size(), 1000);
        assert_eq!(arena.strategy(), FitStrategy::FirstFit);
        arena.check_invariants().unwrap();
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        assert!(matches!(
            Arena::with_strategy(0, FitStrategy::FirstFit),
            Err(ArenaError::InvalidSize { size: 0 })
        ));
        assert!(Arena::with_strategy(8, FitStrategy::BestFit).is_err());
        assert!(Arena::with_strategy(9, FitStrategy::BestFit).is_ok());
    }

    #[test]
    fn allocation_splits_the_free_block() {
        let arena = arena(1000, FitStrategy::FirstFit);

        let ptr = arena.allocate(100).unwrap();
        let stats = arena.get_statistics();

        assert_eq!(stats.allocated_chunks, 1);
        assert_eq!(stats.free_chunks, 1);
        assert_eq!(stats.free_size, 1000 - 8 - 100 - 8);
        assert_eq!(stats.allocated_size, 100);
        assert_eq!(arena.usable_size(ptr.as_ptr()), Ok(100));
        arena.check_invariants().unwrap();
    }

    #[test]
    fn consecutive_allocations_are_adjacent() {
        let arena = arena(1000, FitStrategy::FirstFit);

        let a = arena.allocate(10).unwrap();
        let b = arena.allocate(10).unwrap();

        assert_eq!(b.addr().get() - a.addr().get(), 10 + HEADER_SIZE);
    }

    #[test]
    fn small_remainder_is_absorbed() {
        let arena = arena(1000, FitStrategy::FirstFit);

        // 984 + 8 leaves exactly 8 bytes, not enough for another block.
        let ptr = arena.allocate(984).unwrap();
        let stats = arena.get_statistics();

        assert_eq!(arena.usable_size(ptr.as_ptr()), Ok(992));
        assert_eq!(stats.free_chunks, 0);
        assert_eq!(stats.free_size, 0);
        assert_eq!(stats.smallest_free_chunk_size, 0);
        assert_eq!(stats.largest_free_chunk_size, 0);
        arena.check_invariants().unwrap();
    }

    #[test]
    fn nine_byte_remainder_is_split_off() {
        let arena = arena(1000, FitStrategy::FirstFit);

        let ptr = arena.allocate(983).unwrap();

        assert_eq!(arena.usable_size(ptr.as_ptr()), Ok(983));
        assert_eq!(arena.get_statistics().free_chunks, 1);
        assert_eq!(arena.available_memory(), 1);
        arena.check_invariants().unwrap();
    }

    #[test]
    fn exhaustion_returns_none() {
        let arena = arena(64, FitStrategy::FirstFit);

        assert!(arena.allocate(100).is_none());
        assert!(arena.allocate(57).is_none());

        let whole = arena.allocate(56);
        assert!(whole.is_some());
        assert!(arena.allocate(1).is_none());

        arena.deallocate(whole.unwrap().as_ptr()).unwrap();
        assert!(arena.allocate(1).is_some());
    }

    #[test]
    fn zero_and_huge_requests_return_none() {
        let arena = arena(64, FitStrategy::BestFit);

        assert!(arena.allocate(0).is_none());
        assert!(arena.allocate(usize::MAX).is_none());
        assert_eq!(arena.get_statistics().allocated_chunks, 0);
    }

    #[test]
    fn round_trip_restores_the_arena() {
        for strategy in FitStrategy::ALL {
            let arena = arena(1000, strategy);
            let before = arena.get_statistics();

            let ptr = arena.allocate(100).unwrap();
            arena.deallocate(ptr.as_ptr()).unwrap();

            assert_eq!(arena.get_statistics(), before);
            arena.check_invariants().unwrap();
        }
    }

    #[test]
    fn neighbours_coalesce_in_any_order() {
        let orders = [[0, 1, 2], [1, 0, 2], [2, 1, 0], [1, 2, 0], [0, 2, 1], [2, 0, 1]];

        for order in orders {
            let arena = arena(1000, FitStrategy::FirstFit);
            let blocks = [
                arena.allocate(100).unwrap(),
                arena.allocate(100).unwrap(),
                arena.allocate(100).unwrap(),
            ];

            for index in order {
                arena.deallocate(blocks[index].as_ptr()).unwrap();
                arena.check_invariants().unwrap();
            }

            let stats = arena.get_statistics();
            assert_eq!(stats.free_chunks, 1, "order {order:?}");
            assert_eq!(stats.free_size, 992, "order {order:?}");
        }
    }

    #[test]
    fn chains_merge_in_a_single_pass() {
        let arena = arena(1000, FitStrategy::FirstFit);
        let blocks: Vec<_> = (0..6).map(|_| arena.allocate(40).unwrap()).collect();
        // Keeps the tail free block away from the chain.
        let _guard = arena.allocate(40).unwrap();

        for index in [0, 2, 4] {
            arena.deallocate(blocks[index].as_ptr()).unwrap();
        }
        assert_eq!(arena.get_statistics().free_chunks, 4);

        // Each of these closes a gap next to a free block.
        arena.deallocate(blocks[3].as_ptr()).unwrap();
        arena.deallocate(blocks[1].as_ptr()).unwrap();
        assert_eq!(arena.get_statistics().smallest_free_chunk_size, 5 * 48 - 8);
        arena.deallocate(blocks[5].as_ptr()).unwrap();

        let stats = arena.get_statistics();
        assert_eq!(stats.free_chunks, 2);
        // The tail block past the guard is the larger of the two.
        assert_eq!(stats.smallest_free_chunk_size, 6 * 48 - 8);
        assert_eq!(stats.largest_free_chunk_size, 1000 - 8 - 7 * 48);
        arena.check_invariants().unwrap();
    }

    #[test]
    fn deallocated_bytes_are_zeroed() {
        let arena = arena(256, FitStrategy::FirstFit);

        let ptr = arena.allocate(32).unwrap();
        unsafe { ptr.as_ptr().write_bytes(0xAB, 32) };
        arena.deallocate(ptr.as_ptr()).unwrap();

        let again = arena.allocate(32).unwrap();
        assert_eq!(again, ptr);

        let bytes = unsafe { std::slice::from_raw_parts(again.as_ptr(), 32) };
        assert!(bytes.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn misuse_is_detected() {
        let arena = arena(256, FitStrategy::FirstFit);
        let ptr = arena.allocate(16).unwrap();
        let before = arena.get_statistics();

        // Pointer inside a block but not at its payload.
        let inner = unsafe { ptr.as_ptr().add(4) };
        assert_eq!(
            arena.deallocate(inner),
            Err(ArenaError::UnknownPointer { addr: inner.addr() })
        );

        let mut foreign = 0u8;
        assert!(arena.deallocate(&mut foreign).is_err());
        assert_eq!(arena.get_statistics(), before);

        arena.deallocate(ptr.as_ptr()).unwrap();
        assert!(matches!(
            arena.deallocate(ptr.as_ptr()),
            Err(ArenaError::UnknownPointer { .. })
        ));
        assert!(arena.usable_size(ptr.as_ptr()).is_err());

        assert_eq!(arena.deallocate(std::ptr::null_mut()), Ok(()));
        arena.check_invariants().unwrap();
    }

    /// Leaves free blocks with usable sizes 50, 200 and 30 (in that address
    /// order) and nothing else free.
    fn fragmented(strategy: FitStrategy) -> (Arena, [NonNull<u8>; 3]) {
        let arena = arena(1000, strategy);

        let a = arena.allocate(50).unwrap();
        arena.allocate(10).unwrap();
        let b = arena.allocate(200).unwrap();
        arena.allocate(10).unwrap();
        let c = arena.allocate(30).unwrap();
        arena.allocate(10).unwrap();

        let rest = arena.get_statistics().largest_free_chunk_size;
        arena.allocate(rest).unwrap();
        assert_eq!(arena.get_statistics().free_chunks, 0);

        for ptr in [a, b, c] {
            arena.deallocate(ptr.as_ptr()).unwrap();
        }

        (arena, [a, b, c])
    }

    #[test]
    fn strategies_pick_different_blocks() {
        let expected = [
            (FitStrategy::FirstFit, 0),
            (FitStrategy::BestFit, 2),
            (FitStrategy::WorstFit, 1),
        ];

        for (strategy, index) in expected {
            let (arena, blocks) = fragmented(strategy);
            let stats = arena.get_statistics();
            assert_eq!(stats.free_chunks, 3);
            assert_eq!(stats.smallest_free_chunk_size, 30);
            assert_eq!(stats.largest_free_chunk_size, 200);

            assert_eq!(arena.allocate(20), Some(blocks[index]), "{strategy}");
            arena.check_invariants().unwrap();
        }
    }

    #[test]
    fn split_remainder_keeps_first_fit_position() {
        let (arena, [a, b, _]) = fragmented(FitStrategy::FirstFit);

        // Both requests land in the 50 byte block: the remainder stays first.
        let first = arena.allocate(10).unwrap();
        let second = arena.allocate(10).unwrap();

        assert_eq!(first, a);
        assert_eq!(second.addr().get(), a.addr().get() + 10 + HEADER_SIZE);

        // 50 - 36 = 14 left there, too small for 20.
        assert_eq!(arena.allocate(20), Some(b));
    }

    #[test]
    fn statistics_are_idempotent() {
        let (arena, _) = fragmented(FitStrategy::BestFit);

        assert_eq!(arena.get_statistics(), arena.get_statistics());
        assert_eq!(arena.available_memory(), arena.get_statistics().free_size);
    }

    #[test]
    fn allocated_size_follows_header_accounting() {
        let arena = arena(1000, FitStrategy::WorstFit);
        arena.allocate(100).unwrap();
        arena.allocate(50).unwrap();

        let stats = arena.get_statistics();
        assert_eq!(stats.allocated_chunks, 2);
        assert_eq!(stats.free_size, 1000 - 8 - 108 - 58);
        assert_eq!(stats.allocated_size, 150);
    }

    #[test]
    fn compaction_moves_nothing() {
        let (arena, _) = fragmented(FitStrategy::FirstFit);
        let before = arena.get_statistics();

        let report = arena.compact_allocation();

        assert_eq!(report.bytes_compacted, 0);
        assert!(report.relocations.is_empty());
        assert_eq!(arena.get_statistics(), before);
    }

    #[test]
    fn threads_share_one_arena() {
        let arena = Arc::new(arena(64 * 1024, FitStrategy::BestFit));

        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let arena = Arc::clone(&arena);
                thread::spawn(move || {
                    for round in 0..200 {
                        let size = 1 + (worker * 31 + round * 17) % 120;
                        let ptrs: Vec<_> = (0..4).filter_map(|_| arena.allocate(size)).collect();
                        for ptr in ptrs {
                            unsafe { ptr.as_ptr().write_bytes(worker as u8, size) };
                            arena.deallocate(ptr.as_ptr()).unwrap();
                        }
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        let stats = arena.get_statistics();
        assert_eq!(stats.allocated_chunks, 0);
        assert_eq!(stats.free_chunks, 1);
        assert_eq!(stats.free_size, 64 * 1024 - 8);
        arena.check_invariants().unwrap();
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Allocate(usize),
            /// Frees the live allocation at this index (modulo live count).
            Deallocate(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1usize..300).prop_map(Op::Allocate),
                any::<usize>().prop_map(Op::Deallocate),
            ]
        }

        fn fit_strategy() -> impl Strategy<Value = FitStrategy> {
            prop_oneof![
                Just(FitStrategy::FirstFit),
                Just(FitStrategy::BestFit),
                Just(FitStrategy::WorstFit),
            ]
        }

        proptest! {
            #[test]
            fn blocks_always_tile_the_arena(
                strategy in fit_strategy(),
                total in 9usize..4096,
                ops in proptest::collection::vec(op(), 1..80),
            ) {
                let arena = Arena::with_strategy(total, strategy).unwrap();
                let mut live: Vec<NonNull<u8>> = Vec::new();

                for op in ops {
                    match op {
                        Op::Allocate(size) => {
                            if let Some(ptr) = arena.allocate(size) {
                                prop_assert!(!live.contains(&ptr));
                                prop_assert!(arena.usable_size(ptr.as_ptr()).unwrap() >= size);
                                live.push(ptr);
                            }
                        }
                        Op::Deallocate(index) if !live.is_empty() => {
                            let ptr = live.swap_remove(index % live.len());
                            prop_assert!(arena.deallocate(ptr.as_ptr()).is_ok());
                        }
                        Op::Deallocate(_) => {}
                    }

                    prop_assert_eq!(arena.check_invariants(), Ok(()));
                    prop_assert_eq!(arena.get_statistics().allocated_chunks, live.len());
                }

                for ptr in live.drain(..) {
                    prop_assert!(arena.deallocate(ptr.as_ptr()).is_ok());
                }

                let stats = arena.get_statistics();
                prop_assert_eq!(stats.free_chunks, 1);
                prop_assert_eq!(stats.free_size, total - HEADER_SIZE);
            }

            #[test]
            fn free_and_allocated_bytes_add_up(
                strategy in fit_strategy(),
                sizes in proptest::collection::vec(1usize..200, 1..30),
            ) {
                let arena = Arena::with_strategy(4096, strategy).unwrap();
                let live: Vec<_> = sizes.iter().filter_map(|size| arena.allocate(*size)).collect();

                let usable: usize = live
                    .iter()
                    .map(|ptr| arena.usable_size(ptr.as_ptr()).unwrap())
                    .sum();
                let stats = arena.get_statistics();
                let headers = HEADER_SIZE * (stats.allocated_chunks + stats.free_chunks);

                prop_assert_eq!(usable + stats.free_size + headers, 4096);
            }
        }
    }
}
