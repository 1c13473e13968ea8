//! Closed symbol sets understood by the target: map tiles and commands.
//!
//! The order of `ALL` is part of the contract. The mutation search sweeps the
//! alphabets in this order, so changing it changes which inputs a budgeted
//! mutation run reaches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row separator used by the serialized map format
pub const ROW_SEPARATOR: char = '\n';

/// A single map cell
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Wall,
    Empty,
    Monster,
    Player,
    Food,
}

impl Tile {
    pub const ALL: [Tile; 5] = [
        Tile::Wall,
        Tile::Empty,
        Tile::Monster,
        Tile::Player,
        Tile::Food,
    ];

    pub fn symbol(self) -> char {
        match self {
            Tile::Wall => 'W',
            Tile::Empty => '0',
            Tile::Monster => 'M',
            Tile::Player => 'P',
            Tile::Food => 'F',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Tile> {
        Tile::ALL.into_iter().find(|tile| tile.symbol() == symbol)
    }

    pub fn name(self) -> &'static str {
        match self {
            Tile::Wall => "wall",
            Tile::Empty => "empty",
            Tile::Monster => "monster",
            Tile::Player => "player",
            Tile::Food => "food",
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single action the target accepts on its command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Exit,
    Start,
    Quit,
    Wait,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Exit,
        Command::Start,
        Command::Quit,
        Command::Wait,
        Command::MoveUp,
        Command::MoveDown,
        Command::MoveLeft,
        Command::MoveRight,
    ];

    pub fn symbol(self) -> char {
        match self {
            Command::Exit => 'E',
            Command::Start => 'S',
            Command::Quit => 'Q',
            Command::Wait => 'W',
            Command::MoveUp => 'U',
            Command::MoveDown => 'D',
            Command::MoveLeft => 'L',
            Command::MoveRight => 'R',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Command> {
        Command::ALL
            .into_iter()
            .find(|command| command.symbol() == symbol)
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Exit => "exit",
            Command::Start => "start",
            Command::Quit => "quit",
            Command::Wait => "wait",
            Command::MoveUp => "move-up",
            Command::MoveDown => "move-down",
            Command::MoveLeft => "move-left",
            Command::MoveRight => "move-right",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
