use std::time::Duration;
use tilefuzz::{
    Budget, CommandSequence, Execution, Executor, FuzzConfig, FuzzResult, Fuzzer, MapString,
    Outcome, RunKind, SearchEnd, Tile, INITIAL_SETUP_NOTE,
};

/// Exits with 1 whenever the map holds a monster and the player can move
struct MonsterTarget;

impl Executor for MonsterTarget {
    fn execute(&mut self, map: &MapString, commands: &CommandSequence) -> FuzzResult<Execution> {
        let moves = commands.as_str().chars().any(|c| "UDLR".contains(c));
        let outcome = if map.contains_tile(Tile::Monster) && moves {
            Outcome::Exited(1)
        } else {
            Outcome::Exited(0)
        };
        Ok(Execution {
            outcome,
            output: format!("{} monsters", map.count_tile(Tile::Monster)),
            duration: Duration::from_micros(50),
        })
    }
}

fn fuzzer(budget: Budget, max_depth: Option<usize>) -> Fuzzer<MonsterTarget> {
    let mut config = FuzzConfig {
        seed: Some(3),
        budget,
        ..FuzzConfig::default()
    };
    config.mutation.max_depth = max_depth;
    Fuzzer::with_executor(config, MonsterTarget).unwrap()
}

#[test]
fn test_mutation_run_from_known_map() {
    let mut fuzzer = fuzzer(Budget::iterations(50), None);

    let summary = fuzzer
        .mutate_run(
            MapString::from("0F\nP0\n"),
            CommandSequence::parse("E").unwrap(),
        )
        .unwrap();

    assert_eq!(summary.kind, RunKind::Mutation);
    assert_eq!(summary.iterations(), 50);

    let records = fuzzer.history().records();
    assert_eq!(records[0].note.as_deref(), Some(INITIAL_SETUP_NOTE));
    assert!(records[1..]
        .iter()
        .all(|r| r.note.as_deref().is_some_and(|n| n.starts_with("From iteration "))));

    let mutation = summary.mutation.unwrap();
    assert_eq!(mutation.search.end, SearchEnd::BudgetExhausted);
    assert_eq!(mutation.visited, 50);
}

#[test]
fn test_mutation_run_finds_failures() {
    let mut fuzzer = fuzzer(Budget::iterations(200), Some(2));

    let summary = fuzzer
        .mutate_run(
            MapString::from("0F\nP0\n"),
            CommandSequence::parse("SE").unwrap(),
        )
        .unwrap();

    assert!(summary.statistics.count(Outcome::Exited(1)) > 0);
    assert_eq!(
        summary.statistics.count(Outcome::Exited(0)) + summary.statistics.count(Outcome::Exited(1)),
        summary.iterations()
    );
    assert!(summary
        .statistics
        .errors
        .iter()
        .all(|e| e.output.ends_with("monsters") && e.output != "0 monsters"));
}

#[test]
fn test_depth_limited_run_ends_early() {
    let mut fuzzer = fuzzer(Budget::seconds(60), Some(1));

    let summary = fuzzer
        .mutate_run(MapString::from("0F\n"), CommandSequence::parse("U").unwrap())
        .unwrap();

    // three characters, four other tiles each
    assert_eq!(summary.iterations(), 1 + 3 * 4);
    assert_eq!(
        summary.mutation.as_ref().unwrap().search.end,
        SearchEnd::Exhausted
    );
    assert!(summary.runtime() < Duration::from_secs(60));
}
