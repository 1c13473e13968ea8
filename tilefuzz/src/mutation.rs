//! Single-symbol neighborhood search around a known input.
//!
//! Every level of the walk sweeps one dimension: map levels try every tile at
//! every character of the map, command levels try every command at every
//! position of the sequence. Each new candidate is executed and then explored
//! depth-first with the other dimension, before the sweep moves on. The walk
//! alternates dimensions per level and never sweeps their product, which keeps
//! each level linear in the input size.
//!
//! Levels are kept on an explicit stack. The visiting order is the same as a
//! recursive walk, but a long chain of new candidates cannot exhaust the
//! thread stack.
//!
//! Every candidate of a level is a single substitution on that level's base
//! input, so its note cites the iteration that produced the base. Siblings
//! executed earlier in the same sweep are not its ancestors and are never
//! cited, even when one of them ran just before it.

use crate::alphabet::{Command, Tile};
use crate::input::{CommandSequence, MapString};
use crate::FuzzResult;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::Hasher;
use tracing::{debug, info};

/// Hash of the map text followed by the command text
pub fn fingerprint(map: &MapString, commands: &CommandSequence) -> u64 {
    let mut hasher = DefaultHasher::new();
    hasher.write(map.as_str().as_bytes());
    hasher.write(commands.as_str().as_bytes());
    hasher.finish()
}

/// Size of the full single-substitution product of a seed
///
/// The alternating walk reaches far fewer inputs; this is only a progress
/// denominator.
pub fn estimated_total(map: &MapString, commands: &CommandSequence) -> u64 {
    (map.len() as u64 * Tile::ALL.len() as u64)
        .saturating_mul(commands.len() as u64 * Command::ALL.len() as u64)
}

/// Where candidates go: the run controller executes and records them
pub trait MutationSink {
    /// Checked before every execution; `true` halts the whole search
    fn budget_exhausted(&self) -> bool;

    /// Execute one candidate and return the iteration number it was recorded under
    fn execute(
        &mut self,
        map: &MapString,
        commands: &CommandSequence,
        note: String,
    ) -> FuzzResult<u64>;

    /// Called after a fingerprint is added to the visited set
    fn visited(&mut self, _count: usize) {}
}

/// Why a search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchEnd {
    /// Every reachable candidate was tried
    Exhausted,
    /// The budget ran out first
    BudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub end: SearchEnd,
    pub executed: u64,
    /// Candidates dropped because their fingerprint was already visited
    pub skipped: u64,
    pub max_depth_reached: usize,
}

struct Candidate {
    map: MapString,
    commands: CommandSequence,
    note: String,
}

/// One level of the walk: a base input and a cursor over its neighbors
struct Frame {
    map: MapString,
    commands: CommandSequence,
    mutate_commands: bool,
    /// Iteration that produced `map` and `commands`
    origin: u64,
    depth: usize,
    length: usize,
    position: usize,
    symbol: usize,
}

impl Frame {
    fn new(
        map: MapString,
        commands: CommandSequence,
        mutate_commands: bool,
        origin: u64,
        depth: usize,
    ) -> Self {
        let length = if mutate_commands {
            commands.len()
        } else {
            map.len()
        };
        Self {
            map,
            commands,
            mutate_commands,
            origin,
            depth,
            length,
            position: 0,
            symbol: 0,
        }
    }

    fn alphabet_len(&self) -> usize {
        if self.mutate_commands {
            Command::ALL.len()
        } else {
            Tile::ALL.len()
        }
    }

    fn next_candidate(&mut self) -> Option<Candidate> {
        if self.position >= self.length {
            return None;
        }
        let position = self.position;
        let symbol = self.symbol;

        self.symbol += 1;
        if self.symbol == self.alphabet_len() {
            self.symbol = 0;
            self.position += 1;
        }

        let candidate = if self.mutate_commands {
            let command = Command::ALL[symbol];
            let old = self.commands.as_str().chars().nth(position).unwrap_or('?');
            Candidate {
                map: self.map.clone(),
                commands: self.commands.with_command_at(position, command),
                note: self.note(old, position, command.symbol(), command.name()),
            }
        } else {
            let tile = Tile::ALL[symbol];
            let old = self.map.char_at(position).unwrap_or('?');
            Candidate {
                map: self.map.with_symbol_at(position, tile.symbol()),
                commands: self.commands.clone(),
                note: self.note(old, position, tile.symbol(), tile.name()),
            }
        };
        Some(candidate)
    }

    fn note(&self, old: char, position: usize, new: char, name: &str) -> String {
        format!(
            "From iteration {}: mutated {:?} at index {} to {:?} ({}).",
            self.origin, old, position, new, name
        )
    }
}

/// Depth-first mutation search with fingerprint deduplication
///
/// One engine serves one mutation run; the visited set is dropped with it.
#[derive(Debug, Default)]
pub struct MutationEngine {
    visited: HashSet<u64>,
    max_depth: Option<usize>,
}

impl MutationEngine {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            visited: HashSet::new(),
            max_depth,
        }
    }

    /// Record an input executed outside the search, such as the seed.
    /// Returns false when it was already known.
    pub fn mark_visited(&mut self, map: &MapString, commands: &CommandSequence) -> bool {
        self.visited.insert(fingerprint(map, commands))
    }

    pub fn is_visited(&self, map: &MapString, commands: &CommandSequence) -> bool {
        self.visited.contains(&fingerprint(map, commands))
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Walk the neighborhood of `seed_map` and `seed_commands`, which were
    /// recorded under `seed_iteration`. The first level mutates the map.
    pub fn search<S: MutationSink>(
        &mut self,
        seed_map: &MapString,
        seed_commands: &CommandSequence,
        seed_iteration: u64,
        sink: &mut S,
    ) -> FuzzResult<SearchReport> {
        let mut report = SearchReport {
            end: SearchEnd::Exhausted,
            executed: 0,
            skipped: 0,
            max_depth_reached: 0,
        };

        let mut stack = vec![Frame::new(
            seed_map.clone(),
            seed_commands.clone(),
            false,
            seed_iteration,
            0,
        )];

        while let Some(frame) = stack.last_mut() {
            let Some(candidate) = frame.next_candidate() else {
                stack.pop();
                continue;
            };

            let hash = fingerprint(&candidate.map, &candidate.commands);
            if self.visited.contains(&hash) {
                report.skipped += 1;
                continue;
            }

            if sink.budget_exhausted() {
                report.end = SearchEnd::BudgetExhausted;
                break;
            }

            self.visited.insert(hash);
            sink.visited(self.visited.len());

            let depth = frame.depth + 1;
            let mutate_commands = !frame.mutate_commands;

            let iteration = sink.execute(&candidate.map, &candidate.commands, candidate.note)?;
            report.executed += 1;
            report.max_depth_reached = report.max_depth_reached.max(depth);

            if self.max_depth.map_or(true, |max| depth < max) {
                stack.push(Frame::new(
                    candidate.map,
                    candidate.commands,
                    mutate_commands,
                    iteration,
                    depth,
                ));
            }
        }

        match report.end {
            SearchEnd::Exhausted => info!(
                "Mutation tree exhausted after {} executions ({} duplicates skipped)",
                report.executed, report.skipped
            ),
            SearchEnd::BudgetExhausted => debug!(
                "Mutation search halted by budget after {} executions",
                report.executed
            ),
        }

        Ok(report)
    }
}
