use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{Logging, load_config};
use core_types::Parameter;
use experiment::{ExperimentRunner, LocalTracker, TrialSummary};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod demo;

use demo::SineTracking;

/// The main entry point for the Empirist experiment reporter.
fn main() -> Result<()> {
    // Load EMPIRIST__* overrides from a .env file if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Run(args) => handle_run(args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Runs experiments and reports their observations as per-stream CSV files.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in sine-tracking experiment as a new trial.
    Run(RunArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// Path to the configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of runs (overrides `experiment.runs`).
    #[arg(long)]
    runs: Option<usize>,

    /// Folder for stream files and trial metadata (overrides `output.directory`).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Sliding error window size (overrides `reporting.window_capacity`).
    #[arg(long)]
    window: Option<usize>,

    /// Observations per run.
    #[arg(long, default_value_t = 200)]
    steps: usize,

    /// Smoothing factor of the predictor, in (0, 1].
    #[arg(long, default_value_t = 0.3)]
    alpha: f64,
}

// ==============================================================================
// Run Command Logic
// ==============================================================================

/// Loads the configuration, runs the trial and prints its summary.
fn handle_run(args: RunArgs) -> Result<()> {
    let mut settings = load_config(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    if let Some(runs) = args.runs {
        settings.experiment.runs = runs;
    }
    if let Some(dir) = args.output_dir {
        settings.output.directory = dir;
    }
    if let Some(window) = args.window {
        settings.reporting.window_capacity = window;
    }
    settings.validate()?;
    if !(args.alpha > 0.0 && args.alpha <= 1.0) {
        anyhow::bail!("--alpha must be in (0, 1], got {}", args.alpha);
    }

    // Keep the guard alive until the end so buffered log lines reach the file.
    let _log_guard = init_logging(&settings.logging)?;

    tracing::info!(
        runs = settings.experiment.runs,
        output = %settings.output.directory.display(),
        "Starting trial"
    );

    let mut tracker = LocalTracker::new(&settings.output.directory)
        .context("Failed to prepare the output directory")?;
    let mut experiment = SineTracking::new(args.steps, args.alpha, settings.reporting.window_capacity);

    let summary = ExperimentRunner::new(settings.experiment.runs, settings.experiment.project.clone())
        .with_separator(settings.output.delimiter())
        .with_parameters(
            settings
                .experiment
                .parameters
                .iter()
                .map(|(name, value)| Parameter::new(name.clone(), value.clone())),
        )
        .with_progress(true)
        .run(&mut experiment, &mut tracker)
        .context("Trial failed")?;

    print_summary(&summary);
    Ok(())
}

/// Installs the global tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level. With a log file configured, output goes there instead of
/// stderr and the returned guard must be held until exit.
fn init_logging(logging: &Logging) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Log file path {} has no file name", path.display()))?;
            std::fs::create_dir_all(&directory)?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(Some(guard))
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(None)
        }
    }
}

/// Prints the trial id, the produced files and the last observation of each stream.
fn print_summary(summary: &TrialSummary) {
    println!("Trial {} finished after {} run(s).", summary.trial_id, summary.runs);
    for file in &summary.files {
        println!("  {}", file.display());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Stream", "Last observation"]);
    for (stream, record) in &summary.last_observations {
        let fields = record
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![stream.clone(), fields]);
    }
    println!("{table}");
}
