#![no_main]

use libfuzzer_sys::fuzz_target;
use tilefuzz::{Command, CommandSequence, MapString, Tile};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let map = MapString::new(s);
        let _ = map.width();
        let _ = map.height();
        let _ = map.is_rectangular();
        let _ = map.is_tile_map();

        for index in 0..map.len() {
            let mutated = map.with_symbol_at(index, Tile::Wall.symbol());
            assert_eq!(mutated.len(), map.len());
        }

        if let Ok(commands) = CommandSequence::parse(s) {
            assert!(!commands.is_empty());
            for index in 0..commands.len() {
                let mutated = commands.with_command_at(index, Command::Exit);
                assert_eq!(mutated.len(), commands.len());
            }
        }
    }
});
