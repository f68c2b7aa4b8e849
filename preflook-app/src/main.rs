//! Preferential-looking trial runner
//!
//! Shows each trial's prompt, records which region the participant looks at
//! (reported with the arrow keys) and writes one CSV log per trial.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use preflook_experiment::{RunnerOptions, default_trials, load_trials, validate_trials};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod logging;
mod report;
mod terminal;
mod window;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Frontend {
    /// Full-screen text interface
    Terminal,
    /// Graphical window
    Window,
}

/// Run preferential-looking trials and log where the participant looked
#[derive(Parser, Debug)]
#[command(name = "preflook")]
#[command(version, about, long_about = None)]
struct Args {
    /// Trial definitions (.toml or .json); the built-in trial when omitted
    #[arg(short, long, value_name = "FILE")]
    trials: Option<PathBuf>,

    /// User interface to run the trials in
    #[arg(short, long, value_enum, default_value_t = Frontend::Terminal)]
    frontend: Frontend,

    /// Directory the CSV logs are written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// How often focus is sampled, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 50,
          value_parser = clap::value_parser!(u64).range(1..=1000))]
    poll_interval_ms: u64,

    /// Write the partial log of an aborted trial
    #[arg(long)]
    flush_on_abort: bool,

    /// TrueType font for the window front-end
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Also write a JSON summary of the session here
    #[arg(long, value_name = "FILE")]
    summary_json: Option<PathBuf>,

    /// Validate the trial definitions and exit
    #[arg(long)]
    check: bool,

    /// Write log messages to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            output_dir: self.output_dir.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            flush_on_abort: self.flush_on_abort,
            ..RunnerOptions::default()
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet, args.log_file.as_deref(), args.frontend)?;
    log::info!("preflook v{}", env!("CARGO_PKG_VERSION"));

    let trials = match &args.trials {
        Some(path) => load_trials(path).with_context(|| format!("loading trials from {:?}", path))?,
        None => default_trials()?,
    };
    validate_trials(&trials)?;

    if args.check {
        report::print_trials(&trials);
        return Ok(ExitCode::SUCCESS);
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating output directory {:?}", args.output_dir))?;

    let options = args.runner_options();
    let result = match args.frontend {
        Frontend::Terminal => terminal::run(trials, options)?,
        Frontend::Window => window::run(trials, options, args.font.as_deref())?,
    };
    let session = result?;

    report::print_summary(&session);
    if let Some(path) = &args.summary_json {
        report::write_summary_json(path, &session)?;
        log::info!("Summary written to {:?}", path);
    }
    for unsaved in &session.unsaved {
        report::print_unsaved(unsaved);
    }

    if session.all_saved() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
