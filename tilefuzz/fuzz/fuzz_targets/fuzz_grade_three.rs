#![no_main]

use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tilefuzz::{Grade, MapGenerator, MapSize, Tile};

fuzz_target!(|input: (u64, u8, u8)| {
    let (seed, width, height) = input;
    let width = (width as usize % 16) + 1;
    let height = (height as usize % 16) + 1;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut generator = MapGenerator::new(Grade::Three, MapSize { width, height });
    let map = generator.generate_with_size(width, height, &mut rng);

    assert!(map.is_tile_map());
    assert!(map.is_rectangular());
    if map.cell_count() >= 2 {
        assert_eq!(map.count_tile(Tile::Player), 1);
        assert!(map.contains_tile(Tile::Food));
    }
});
