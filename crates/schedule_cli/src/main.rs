use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use schedule_core::udq::UdqFunctionTable;
use schedule_core::{run_step, InputError, ScheduleRestart, Simulation};
use schedule_deck::{load_deck, load_summaries, LoadedDeck, SummaryFrame};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "schedule_cli", about = "Reservoir schedule ACTIONX/UDQ runner")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a deck and report every collected input error.
    Check {
        #[arg(long)]
        deck: PathBuf,
    },
    /// Replay the schedule against per-step summary values, printing events
    /// as JSON lines.
    Run {
        #[arg(long)]
        deck: PathBuf,
        /// JSON array of summary frames, one per report step.
        #[arg(long)]
        summary: PathBuf,
        /// Override the UDQPARAM random seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Resume from restart data written by an earlier run.
        #[arg(long)]
        restart_in: Option<PathBuf>,
        /// Write restart data for the last step run.
        #[arg(long)]
        restart_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { deck } => check(&deck),
        Commands::Run {
            deck,
            summary,
            seed,
            restart_in,
            restart_out,
        } => run(&RunArgs {
            deck,
            summary,
            seed,
            restart_in,
            restart_out,
        }),
    }
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn check(path: &Path) -> Result<()> {
    let deck = load_deck(path)?;
    print_input_errors(&deck);
    if deck.has_errors() {
        bail!("{} input error(s) in {}", deck.errors.len(), path.display());
    }
    println!(
        "{}: {} report steps, {} warning(s)",
        path.display(),
        deck.schedule.len(),
        deck.warnings.len()
    );
    Ok(())
}

fn print_input_errors(deck: &LoadedDeck) {
    let line = |level: &str, err: &InputError| {
        eprintln!("{level} [{}] {}: {}", err.category, err.location, err.message);
    };
    for err in &deck.warnings {
        line("warning", err);
    }
    for err in &deck.errors {
        line("error", err);
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

struct RunArgs {
    deck: PathBuf,
    summary: PathBuf,
    seed: Option<u64>,
    restart_in: Option<PathBuf>,
    restart_out: Option<PathBuf>,
}

fn run(args: &RunArgs) -> Result<()> {
    let mut deck = load_deck(&args.deck)?;
    print_input_errors(&deck);
    if deck.has_errors() {
        bail!("refusing to run: {} input error(s) in {}", deck.errors.len(), args.deck.display());
    }
    let frames = load_summaries(&args.summary)?;

    let mut params = deck.params.clone();
    if let Some(seed) = args.seed {
        params.rand_seed = seed;
    }
    let mut table = UdqFunctionTable::new(params.clone());
    let mut sim = Simulation::new(params.undefined_value);

    let mut first_step = 0;
    if let Some(path) = &args.restart_in {
        let rst = read_restart(path)?;
        sim = Simulation::restart(&mut deck.schedule, &rst, sim.summary)
            .with_context(|| format!("loading restart from {}", path.display()))?;
        first_step = rst.report_step + 1;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut last_step = None;
    for step in first_step..deck.schedule.len() {
        frame_for(&frames, step).apply(&mut sim.summary);
        let events = run_step(&mut deck.schedule, &mut sim, step, &mut table)
            .with_context(|| format!("running report step {step}"))?;
        for event in &events {
            serde_json::to_writer(&mut out, event).context("writing event")?;
            writeln!(out).context("writing event")?;
        }
        tracing::debug!(step, events = events.len(), "report step done");
        last_step = Some(step);
    }

    match (&args.restart_out, last_step) {
        (Some(path), Some(step)) => {
            let rst = deck
                .schedule
                .restart_data(step, &sim.action_state, &sim.udq_state)?;
            write_restart(path, &rst)?;
            tracing::info!(step, path = %path.display(), "restart written");
        }
        (Some(_), None) => tracing::warn!("no report step ran; restart not written"),
        _ => {}
    }
    Ok(())
}

/// A run longer than the summary file keeps using the last frame.
fn frame_for(frames: &[SummaryFrame], step: usize) -> &SummaryFrame {
    &frames[step.min(frames.len() - 1)]
}

fn read_restart(path: &Path) -> Result<ScheduleRestart> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading restart file: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing restart file: {}", path.display()))
}

fn write_restart(path: &Path, rst: &ScheduleRestart) -> Result<()> {
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, rst).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
