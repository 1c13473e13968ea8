mod formatter;
mod progress;
mod report;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use formatter::Formatter;
use progress::ProgressBar;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tilefuzz::{
    CommandSequence, FuzzConfig, FuzzContext, Fuzzer, Grade, InputGenerator, MapString,
    RunSummary,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "data/config/config.json";

#[derive(Parser)]
#[command(name = "tilefuzz")]
#[command(about = "Graded generation and mutation fuzzing for tile-map games.")]
#[command(
    long_about = "tilefuzz feeds a target program a tile map (written to a file) and a sequence of commands (passed as its last argument), records how every execution ends and writes a report.\nInputs are either generated at a chosen correctness grade or derived from a known input by single-symbol mutation."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate random inputs and run the target until the budget is spent
    Run {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Explore every single-symbol mutation of a known input
    ///
    /// The seed is executed first. The search then alternates between
    /// mutating the map and mutating the command sequence, depth first,
    /// and never runs the same input twice.
    Mutate {
        /// File holding the seed map
        #[arg(short = 'm', long)]
        map: PathBuf,
        /// Seed command sequence (e.g. SUUE)
        #[arg(short = 'a', long)]
        commands: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Print one generated input without running the target
    ///
    /// The map is printed first, followed by the command sequence on its own line.
    Generate {
        /// Map width (default: random up to the configured maximum)
        #[arg(long)]
        width: Option<usize>,
        /// Map height (default: random up to the configured maximum)
        #[arg(long)]
        height: Option<usize>,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// Configuration file (JSON)
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
    /// Seed for the random generator
    #[arg(short = 's', long)]
    seed: Option<u64>,
    /// Correctness grade of generated maps (0-3)
    #[arg(short = 'g', long)]
    grade: Option<u8>,
    /// Log level filter; RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log: String,
}

#[derive(Args)]
struct RunArgs {
    /// Stop after this many executions
    #[arg(short = 'n', long)]
    max_iterations: Option<u64>,
    /// Stop after this many seconds
    #[arg(short = 't', long)]
    max_time: Option<u64>,
    /// Directory for the input artifact and reports
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
    /// Do not draw the progress bar
    #[arg(long)]
    no_progress: bool,
    #[command(flatten)]
    config: ConfigArgs,
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run { run } => run_command(run),
        Commands::Mutate { map, commands, run } => mutate_command(map, commands, run),
        Commands::Generate {
            width,
            height,
            config,
        } => generate_command(*width, *height, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_command(args: &RunArgs) -> Result<()> {
    let config = run_config(args)?;
    init_logging(&args.config.log, config.log_file.as_deref())?;

    let mut fuzzer = Fuzzer::from_config(config)?;
    register_partial_reports(&mut fuzzer);
    let bar = ProgressBar::start(fuzzer.progress_tracker(), "Fuzzing", !args.no_progress);
    let result = fuzzer.run();
    bar.finish();

    match result {
        Ok(summary) => finish_run(&fuzzer, &summary),
        Err(e) => abort_run(&fuzzer, e.into()),
    }
}

fn mutate_command(map_path: &Path, commands: &str, args: &RunArgs) -> Result<()> {
    let config = run_config(args)?;
    init_logging(&args.config.log, config.log_file.as_deref())?;

    let text = fs::read_to_string(map_path)
        .with_context(|| format!("Failed to read seed map {}", map_path.display()))?;
    let seed_map = MapString::new(text);
    if seed_map.is_empty() {
        anyhow::bail!("Seed map {} is empty", map_path.display());
    }
    if !seed_map.is_tile_map() {
        warn!("Seed map contains symbols outside the tile alphabet");
    }
    let seed_commands = CommandSequence::parse(commands).context("Invalid seed commands")?;

    let mut fuzzer = Fuzzer::from_config(config)?;
    register_partial_reports(&mut fuzzer);
    let bar = ProgressBar::start(fuzzer.progress_tracker(), "Mutating", !args.no_progress);
    let result = fuzzer.mutate_run(seed_map, seed_commands);
    bar.finish();

    match result {
        Ok(summary) => finish_run(&fuzzer, &summary),
        Err(e) => abort_run(&fuzzer, e.into()),
    }
}

fn generate_command(width: Option<usize>, height: Option<usize>, args: &ConfigArgs) -> Result<()> {
    let config = load_config(args)?;
    init_logging(&args.log, config.log_file.as_deref())?;

    let mut context = FuzzContext::new(config.seed);
    let mut generator = InputGenerator::from_config(&config);

    let map = match (width, height) {
        (None, None) => generator.generate_map(context.rng()),
        (width, height) => {
            let width = width.unwrap_or(config.max_map_size.width);
            let height = height.unwrap_or(config.max_map_size.height);
            if width == 0 || height == 0 {
                anyhow::bail!("Map dimensions must be at least 1x1, got {}x{}", width, height);
            }
            generator.generate_map_with_size(width, height, context.rng())
        }
    };
    let commands = generator.generate_commands(context.rng());

    print!("{}", map);
    println!("{}", commands);
    Ok(())
}

/// Write both reports and print the summary
fn finish_run(fuzzer: &Fuzzer, summary: &RunSummary) -> Result<()> {
    let output_dir = &fuzzer.config().output_dir;
    let paths = report::write_reports(output_dir, fuzzer.config(), summary, fuzzer.history())?;

    let formatter = Formatter::default();
    print!("{}", formatter.format_summary(summary));
    println!(
        "Reports written to {} and {}",
        paths.markdown.display(),
        paths.json.display()
    );
    Ok(())
}

/// Keep the reports for everything executed before a fatal error
fn abort_run(fuzzer: &Fuzzer, error: anyhow::Error) -> Result<()> {
    let Some(summary) = fuzzer.last_summary().filter(|_| !fuzzer.history().is_empty()) else {
        return Err(error);
    };

    let output_dir = &fuzzer.config().output_dir;
    match report::write_reports(output_dir, fuzzer.config(), summary, fuzzer.history()) {
        Ok(paths) => eprintln!(
            "Run aborted after {} executions; reports written to {} and {}",
            summary.iterations(),
            paths.markdown.display(),
            paths.json.display()
        ),
        Err(report_error) => warn!("Failed to write reports: {:#}", report_error),
    }
    Err(error)
}

fn register_partial_reports(fuzzer: &mut Fuzzer) {
    let Some(interval) = fuzzer.config().partial_report_interval() else {
        return;
    };

    let config = fuzzer.config().clone();
    fuzzer.on_checkpoint(interval, move |summary, history| {
        match report::write_partial(&config.output_dir, &config, summary, history) {
            Ok(path) => debug!("Partial report written to {}", path.display()),
            Err(e) => warn!("Failed to write partial report: {:#}", e),
        }
    });
}

fn run_config(args: &RunArgs) -> Result<FuzzConfig> {
    let mut config = load_config(&args.config)?;
    if let Some(max_iterations) = args.max_iterations {
        config.budget.max_iterations = Some(max_iterations);
    }
    if let Some(max_time) = args.max_time {
        config.budget.max_time_secs = Some(max_time);
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Load the configuration file and apply the shared overrides.
/// A missing file at the default location means built-in defaults.
fn load_config(args: &ConfigArgs) -> Result<FuzzConfig> {
    let mut config = if args.config == Path::new(DEFAULT_CONFIG) && !args.config.exists() {
        FuzzConfig::default()
    } else {
        FuzzConfig::load(&args.config)
            .with_context(|| format!("Failed to load config {}", args.config.display()))?
    };

    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(grade) = args.grade {
        config.grade = Grade::try_from(grade)?;
    }
    config.validate()?;
    Ok(config)
}

fn init_logging(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
            debug!("Logging to {}", path.display());
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    info!("tilefuzz v{}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
