//! Graded random input generation.
//!
//! A map is produced cell by cell from a [`CellSource`]. The grade decides
//! which source is used; grade 3 wraps the grade 2 source and adds a post-pass
//! that repairs the player and food counts.

use crate::alphabet::{Command, Tile, ROW_SEPARATOR};
use crate::config::{FuzzConfig, Grade, MapSize};
use crate::input::{CommandSequence, MapString};
use rand::{Rng, RngCore};
use tracing::{debug, warn};

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Fallback order for tiles rewritten by the grade 3 post-pass
const REWRITE_ORDER: [Tile; 3] = [Tile::Empty, Tile::Wall, Tile::Monster];

/// Capability shared by all grades: produce one cell at a time
pub trait CellSource {
    /// Reset per-map state before the first cell
    fn pre_generate(&mut self) {}

    fn generate_cell(&mut self, rng: &mut dyn RngCore) -> char;

    /// Repair the finished map
    fn post_generate(&mut self, _map: &mut MapString) {}
}

/// Grade 0: `0` or `1`
#[derive(Debug, Default)]
pub struct BinaryCells;

impl CellSource for BinaryCells {
    fn generate_cell(&mut self, rng: &mut dyn RngCore) -> char {
        if rng.gen_bool(0.5) {
            '1'
        } else {
            '0'
        }
    }
}

/// Grade 1: any ASCII letter
#[derive(Debug, Default)]
pub struct LetterCells;

impl CellSource for LetterCells {
    fn generate_cell(&mut self, rng: &mut dyn RngCore) -> char {
        LETTERS[rng.gen_range(0..LETTERS.len())] as char
    }
}

/// Grade 2: any tile, uniformly
#[derive(Debug, Default)]
pub struct TileCells;

impl CellSource for TileCells {
    fn generate_cell(&mut self, rng: &mut dyn RngCore) -> char {
        Tile::ALL[rng.gen_range(0..Tile::ALL.len())].symbol()
    }
}

/// Grade 3: tiles with at most one player while drawing, then a post-pass
/// guaranteeing one player and at least one food where the map allows it
#[derive(Debug, Default)]
pub struct SinglePlayerCells {
    tiles: TileCells,
    player_placed: bool,
}

impl SinglePlayerCells {
    const NON_PLAYER: [Tile; 4] = [Tile::Wall, Tile::Empty, Tile::Monster, Tile::Food];

    fn ensure_food(map: &mut MapString) {
        if map.contains_tile(Tile::Food) {
            return;
        }
        let placed = REWRITE_ORDER
            .iter()
            .any(|from| map.replace_first(*from, Tile::Food));
        if !placed {
            warn!(
                "Degenerate map: no cell can be rewritten to food ({} cells)",
                map.cell_count()
            );
        }
    }

    fn ensure_player(map: &mut MapString) {
        if map.contains_tile(Tile::Player) {
            return;
        }
        let placed = REWRITE_ORDER
            .iter()
            .any(|from| map.replace_first(*from, Tile::Player))
            || (map.count_tile(Tile::Food) > 1 && map.replace_first(Tile::Food, Tile::Player));
        if !placed {
            warn!(
                "Degenerate map: no cell can be rewritten to a player ({} cells)",
                map.cell_count()
            );
        }
    }
}

impl CellSource for SinglePlayerCells {
    fn pre_generate(&mut self) {
        self.player_placed = false;
    }

    fn generate_cell(&mut self, rng: &mut dyn RngCore) -> char {
        if self.player_placed {
            return Self::NON_PLAYER[rng.gen_range(0..Self::NON_PLAYER.len())].symbol();
        }
        let cell = self.tiles.generate_cell(rng);
        if cell == Tile::Player.symbol() {
            self.player_placed = true;
        }
        cell
    }

    fn post_generate(&mut self, map: &mut MapString) {
        Self::ensure_food(map);
        Self::ensure_player(map);
    }
}

/// Build the cell source for a grade
pub fn cell_source(grade: Grade) -> Box<dyn CellSource + Send> {
    match grade {
        Grade::Zero => Box::new(BinaryCells),
        Grade::One => Box::new(LetterCells),
        Grade::Two => Box::new(TileCells),
        Grade::Three => Box::new(SinglePlayerCells::default()),
    }
}

/// Produces random maps of a fixed grade
pub struct MapGenerator {
    source: Box<dyn CellSource + Send>,
    max_size: MapSize,
}

impl MapGenerator {
    pub fn new(grade: Grade, max_size: MapSize) -> Self {
        Self {
            source: cell_source(grade),
            max_size,
        }
    }

    /// Width and height are drawn fresh on every call
    pub fn generate(&mut self, rng: &mut dyn RngCore) -> MapString {
        let width = rng.gen_range(1..=self.max_size.width.max(1));
        let height = rng.gen_range(1..=self.max_size.height.max(1));
        self.generate_with_size(width, height, rng)
    }

    pub fn generate_with_size(
        &mut self,
        width: usize,
        height: usize,
        rng: &mut dyn RngCore,
    ) -> MapString {
        self.source.pre_generate();

        let mut text = String::with_capacity((width + 1) * height);
        for _ in 0..height {
            for _ in 0..width {
                text.push(self.source.generate_cell(rng));
            }
            text.push(ROW_SEPARATOR);
        }

        let mut map = MapString::new(text);
        self.source.post_generate(&mut map);
        debug!("Generated {}x{} map", width, height);
        map
    }
}

/// Generates complete (map, command sequence) inputs
pub struct InputGenerator {
    maps: MapGenerator,
    max_sequence_length: usize,
    force_exit_command: bool,
}

impl InputGenerator {
    pub fn new(grade: Grade, max_size: MapSize, max_sequence_length: usize) -> Self {
        Self {
            maps: MapGenerator::new(grade, max_size),
            max_sequence_length,
            force_exit_command: false,
        }
    }

    pub fn from_config(config: &FuzzConfig) -> Self {
        Self::new(
            config.grade,
            config.max_map_size,
            config.max_sequence_length,
        )
        .with_forced_exit(config.force_exit_command)
    }

    /// End every generated sequence with `exit`
    pub fn with_forced_exit(mut self, force_exit_command: bool) -> Self {
        self.force_exit_command = force_exit_command;
        self
    }

    pub fn generate(&mut self, rng: &mut dyn RngCore) -> (MapString, CommandSequence) {
        let map = self.maps.generate(rng);
        let commands = self.generate_commands(rng);
        (map, commands)
    }

    pub fn generate_map(&mut self, rng: &mut dyn RngCore) -> MapString {
        self.maps.generate(rng)
    }

    pub fn generate_map_with_size(
        &mut self,
        width: usize,
        height: usize,
        rng: &mut dyn RngCore,
    ) -> MapString {
        self.maps.generate_with_size(width, height, rng)
    }

    /// Length uniform in `[1, max_sequence_length]`, independent of the grade
    pub fn generate_commands(&mut self, rng: &mut dyn RngCore) -> CommandSequence {
        let length = rng.gen_range(1..=self.max_sequence_length.max(1));
        let mut commands: Vec<Command> = (0..length)
            .map(|_| Command::ALL[rng.gen_range(0..Command::ALL.len())])
            .collect();

        if self.force_exit_command {
            if let Some(last) = commands.last_mut() {
                *last = Command::Exit;
            }
        }

        let sequence = CommandSequence::from_generated(&commands);
        debug!("Generated command sequence {}", sequence);
        sequence
    }
}
