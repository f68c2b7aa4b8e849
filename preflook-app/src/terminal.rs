use anyhow::{Context, Result};
use log::warn;
use preflook_core::TrialConfig;
use preflook_experiment::{RunnerError, RunnerOptions, SessionReport, SignalSlot, TrialRunner};
use preflook_render::{TerminalInput, TerminalPresenter};
use preflook_timing::HighPrecisionClock;
use std::sync::Arc;

/// Runs the session on the main thread with a key listener beside it.
///
/// The outer error covers terminal setup; the inner one is the session's.
pub fn run(
    trials: Vec<TrialConfig>,
    options: RunnerOptions,
) -> Result<Result<SessionReport, RunnerError>> {
    let signals = Arc::new(SignalSlot::new());
    let presenter = TerminalPresenter::enter().context("switching to full-screen terminal")?;
    let mut runner = TrialRunner::new(
        trials,
        HighPrecisionClock::new(),
        presenter,
        Arc::clone(&signals),
        options,
    )?;
    let input = TerminalInput::spawn(signals).context("starting key listener")?;

    let result = runner.run();

    if let Err(e) = input.stop() {
        warn!("Key listener ended with an error: {}", e);
    }
    runner
        .into_presenter()
        .shutdown()
        .context("restoring terminal")?;
    Ok(result)
}
