use fitalloc::{Arena, ArenaConfig, FitStrategy, Stats};

fn log_stats(stats: Stats) {
    println!(
        "  allocated: {} bytes in {} chunks, free: {} bytes in {} chunks (smallest {}, largest {})",
        stats.allocated_size,
        stats.allocated_chunks,
        stats.free_size,
        stats.free_chunks,
        stats.smallest_free_chunk_size,
        stats.largest_free_chunk_size,
    );
}

fn main() {
    // ARENA_SIZE / ARENA_STRATEGY override the defaults.
    let config = ArenaConfig::from_env()
        .unwrap_or_else(|_| ArenaConfig::new(1000).with_strategy(FitStrategy::BestFit));
    let arena = Arena::new(config).unwrap();

    println!("Arena of {} bytes using {}", arena.total_size(), arena.strategy());
    log_stats(arena.get_statistics());

    let sizes = [50, 10, 200, 10, 30];
    let blocks: Vec<_> = sizes.iter().map(|size| arena.allocate(*size).unwrap()).collect();
    for (size, ptr) in sizes.iter().zip(&blocks) {
        println!("Requested {size} bytes, received {ptr:?}");
    }
    log_stats(arena.get_statistics());

    for index in [0, 2, 4] {
        arena.deallocate(blocks[index].as_ptr()).unwrap();
    }
    println!("Freed the 50, 200 and 30 byte blocks");
    log_stats(arena.get_statistics());

    let ptr = arena.allocate(20).unwrap();
    println!("Requested 20 bytes, received {ptr:?}");
    log_stats(arena.get_statistics());

    arena.destroy();
}
