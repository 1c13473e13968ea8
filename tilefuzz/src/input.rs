use crate::alphabet::{Command, Tile, ROW_SEPARATOR};
use crate::{FuzzError, FuzzResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A serialized tile map, row-major with every row terminated by `\n`
///
/// The text is not required to contain valid tiles: low correctness grades and
/// mutated inputs deliberately produce malformed maps. Width and height are
/// derived from the text rather than stored.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapString(String);

impl MapString {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Number of characters, row separators included
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &str> {
        self.0.lines()
    }

    /// Length of the first row
    pub fn width(&self) -> usize {
        self.rows().next().map(|row| row.chars().count()).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows().count()
    }

    /// All cell characters in row-major order, separators skipped
    pub fn cells(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars().filter(|c| *c != ROW_SEPARATOR)
    }

    pub fn cell_count(&self) -> usize {
        self.cells().count()
    }

    pub fn count_tile(&self, tile: Tile) -> usize {
        let symbol = tile.symbol();
        self.cells().filter(|c| *c == symbol).count()
    }

    pub fn contains_tile(&self, tile: Tile) -> bool {
        self.count_tile(tile) > 0
    }

    /// True when every cell is a tile symbol
    pub fn is_tile_map(&self) -> bool {
        self.cells().all(|c| Tile::from_symbol(c).is_some())
    }

    /// True when all rows have the same width
    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        self.rows().all(|row| row.chars().count() == width)
    }

    /// Rewrite the first `from` cell to `to`. Returns false when no such cell exists.
    pub fn replace_first(&mut self, from: Tile, to: Tile) -> bool {
        match self.0.find(from.symbol()) {
            Some(byte_index) => {
                let end = byte_index + from.symbol().len_utf8();
                self.0.replace_range(byte_index..end, &to.symbol().to_string());
                true
            }
            None => false,
        }
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.0.chars().nth(index)
    }

    /// Copy of this map with the character at `index` replaced by `symbol`
    pub fn with_symbol_at(&self, index: usize, symbol: char) -> MapString {
        MapString(substitute(&self.0, index, symbol))
    }
}

impl fmt::Display for MapString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MapString {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for MapString {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// A non-empty sequence of commands serialized as one string of symbols
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommandSequence(String);

impl CommandSequence {
    /// Parse a serialized sequence, rejecting empty input and unknown symbols
    pub fn parse(text: &str) -> FuzzResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FuzzError::InvalidInput(
                "command sequence must contain at least one command".to_string(),
            ));
        }
        if let Some((index, symbol)) = text
            .chars()
            .enumerate()
            .find(|(_, c)| Command::from_symbol(*c).is_none())
        {
            return Err(FuzzError::InvalidInput(format!(
                "unknown command symbol '{}' at index {} (expected one of {})",
                symbol,
                index,
                Command::ALL.iter().map(|c| c.symbol()).collect::<String>()
            )));
        }
        Ok(Self(text.to_string()))
    }

    pub fn from_commands(commands: &[Command]) -> FuzzResult<Self> {
        if commands.is_empty() {
            return Err(FuzzError::InvalidInput(
                "command sequence must contain at least one command".to_string(),
            ));
        }
        Ok(Self(commands.iter().map(|c| c.symbol()).collect()))
    }

    /// Build from commands the caller guarantees to be non-empty
    pub(crate) fn from_generated(commands: &[Command]) -> Self {
        debug_assert!(!commands.is_empty());
        Self(commands.iter().map(|c| c.symbol()).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.0.chars().filter_map(Command::from_symbol)
    }

    pub fn command_at(&self, index: usize) -> Option<Command> {
        self.0.chars().nth(index).and_then(Command::from_symbol)
    }

    /// Copy of this sequence with the command at `index` replaced
    pub fn with_command_at(&self, index: usize, command: Command) -> CommandSequence {
        CommandSequence(substitute(&self.0, index, command.symbol()))
    }
}

impl TryFrom<String> for CommandSequence {
    type Error = FuzzError;

    fn try_from(text: String) -> FuzzResult<Self> {
        Self::parse(&text)
    }
}

impl From<CommandSequence> for String {
    fn from(sequence: CommandSequence) -> Self {
        sequence.0
    }
}

impl fmt::Display for CommandSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn substitute(text: &str, index: usize, symbol: char) -> String {
    text.chars()
        .enumerate()
        .map(|(i, c)| if i == index { symbol } else { c })
        .collect()
}
