use crate::config::validate_trials;
use crate::signal::{SignalSlot, Wait};
use crate::tracker::{FocusTracker, Snapshot};
use crate::transitions::TransitionLog;
use chrono::Local;
use log::{debug, error, info, warn};
use preflook_core::{ConfigError, Dwell, TrialConfig, Verdict, serialize_secs};
use preflook_timing::Clock;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Rendering side of a front-end. Only ever reads tracker state.
pub trait Presenter {
    fn show_prompt(&mut self, trial: &TrialConfig) -> anyhow::Result<()>;
    fn show_status(&mut self, trial: &TrialConfig, snapshot: &Snapshot) -> anyhow::Result<()>;

    fn show_outcome(&mut self, _outcome: &TrialOutcome) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn show_prompt(&mut self, trial: &TrialConfig) -> anyhow::Result<()> {
        (**self).show_prompt(trial)
    }

    fn show_status(&mut self, trial: &TrialConfig, snapshot: &Snapshot) -> anyhow::Result<()> {
        (**self).show_status(trial, snapshot)
    }

    fn show_outcome(&mut self, outcome: &TrialOutcome) -> anyhow::Result<()> {
        (**self).show_outcome(outcome)
    }
}

#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Directory the CSV logs are written to
    pub output_dir: PathBuf,
    /// Cadence of the tracking loop
    pub poll_interval: Duration,
    /// Upper bound of a single wait while a prompt is shown
    pub continue_wait: Duration,
    /// Write the partial log of an aborted trial instead of discarding it
    pub flush_on_abort: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            poll_interval: Duration::from_millis(50),
            continue_wait: Duration::from_millis(100),
            flush_on_abort: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialOutcome {
    pub trial: String,
    pub verdict: Verdict,
    pub dwell: Dwell,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Where the log went; `None` if it was not written
    pub path: Option<PathBuf>,
}

/// A trial log that could not be written, kept in memory for a manual dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsavedLog {
    pub trial: String,
    pub path: PathBuf,
    pub error: String,
    #[serde(skip)]
    pub log: Box<TransitionLog>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub outcomes: Vec<TrialOutcome>,
    pub aborted: bool,
    /// Write failures; each one only affects its own trial
    pub unsaved: Vec<UnsavedLog>,
}

impl SessionReport {
    pub fn all_saved(&self) -> bool {
        self.unsaved.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("presenter failed")]
    Presenter(#[source] anyhow::Error),
}

enum TrialEnd {
    Finished(TrialOutcome),
    Aborted,
}

/// Runs the configured trials one after another: prompt, track, persist.
pub struct TrialRunner<C: Clock, P: Presenter> {
    trials: Vec<TrialConfig>,
    clock: C,
    presenter: P,
    signals: Arc<SignalSlot>,
    options: RunnerOptions,
}

impl<C: Clock, P: Presenter> TrialRunner<C, P> {
    /// Validates the whole trial list before anything is shown.
    pub fn new(
        trials: Vec<TrialConfig>,
        clock: C,
        presenter: P,
        signals: Arc<SignalSlot>,
        options: RunnerOptions,
    ) -> Result<Self, ConfigError> {
        validate_trials(&trials)?;
        Ok(Self {
            trials,
            clock,
            presenter,
            signals,
            options,
        })
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }

    /// Runs every trial in order.
    ///
    /// A log that cannot be written is kept in [`SessionReport::unsaved`] and
    /// the session moves on to the next trial; only a presenter failure ends
    /// the session early.
    pub fn run(&mut self) -> Result<SessionReport, RunnerError> {
        let mut report = SessionReport::default();

        for index in 0..self.trials.len() {
            if self.signals.is_aborted() {
                report.aborted = true;
                break;
            }

            let trial = self.trials[index].clone();
            info!("Trial {}/{}: {}", index + 1, self.trials.len(), trial.name());
            match self.run_trial(&trial, &mut report)? {
                TrialEnd::Finished(outcome) => {
                    self.presenter
                        .show_outcome(&outcome)
                        .map_err(RunnerError::Presenter)?;
                    report.outcomes.push(outcome);
                }
                TrialEnd::Aborted => {
                    report.aborted = true;
                    break;
                }
            }
        }

        if report.aborted {
            warn!("Session aborted after {} completed trials", report.outcomes.len());
        } else {
            info!("Session complete: {} trials", report.outcomes.len());
        }
        if !report.all_saved() {
            warn!("{} trial log(s) could not be written", report.unsaved.len());
        }
        Ok(report)
    }

    fn run_trial(
        &mut self,
        trial: &TrialConfig,
        report: &mut SessionReport,
    ) -> Result<TrialEnd, RunnerError> {
        self.signals.discard_pending();
        self.presenter
            .show_prompt(trial)
            .map_err(RunnerError::Presenter)?;

        if !self.await_continue() {
            info!("Aborted at prompt of {}", trial.name());
            return Ok(TrialEnd::Aborted);
        }

        // Keys pressed while the prompt was up do not count.
        self.signals.discard_pending();
        let mut tracker = FocusTracker::start(trial.rule().clone(), self.clock.now());
        debug!("{} started", trial.name());

        loop {
            if self.signals.is_aborted() {
                self.abandon(trial, tracker, report);
                return Ok(TrialEnd::Aborted);
            }

            let requested = self.signals.take_focus();
            let verdict = tracker.report_focus(requested, self.clock.now());
            let snapshot = tracker.snapshot();
            self.presenter
                .show_status(trial, &snapshot)
                .map_err(RunnerError::Presenter)?;

            if verdict.is_terminal() {
                let file_name = match verdict {
                    Verdict::Failed => format!("{}_failed_{}.csv", trial.file_stem(), timestamp()),
                    _ => format!("{}.csv", trial.file_stem()),
                };
                let path = self.persist(trial, tracker.into_log(), &file_name, report);
                return Ok(TrialEnd::Finished(TrialOutcome {
                    trial: trial.name().to_string(),
                    verdict,
                    dwell: snapshot.dwell,
                    elapsed: snapshot.elapsed,
                    path,
                }));
            }

            self.clock.sleep(self.options.poll_interval);
        }
    }

    /// True on continue, false on abort.
    fn await_continue(&self) -> bool {
        loop {
            match self.signals.wait_for_continue(self.options.continue_wait) {
                Wait::Continue => return true,
                Wait::Abort => return false,
                Wait::TimedOut => continue,
            }
        }
    }

    fn abandon(
        &mut self,
        trial: &TrialConfig,
        mut tracker: FocusTracker,
        report: &mut SessionReport,
    ) {
        info!("Aborted during {}", trial.name());
        if !self.options.flush_on_abort {
            debug!("discarding {} log entries", tracker.log().entries().len());
            return;
        }
        tracker.abort(self.clock.now());
        let file_name = format!("{}_aborted_{}.csv", trial.file_stem(), timestamp());
        self.persist(trial, tracker.into_log(), &file_name, report);
    }

    /// Writes the log once; on failure it is moved into `report.unsaved`.
    fn persist(
        &self,
        trial: &TrialConfig,
        log: TransitionLog,
        file_name: &str,
        report: &mut SessionReport,
    ) -> Option<PathBuf> {
        match log.persist(&self.options.output_dir, file_name) {
            Ok(path) => {
                info!("Log for {} written to {:?}", trial.name(), path);
                Some(path)
            }
            Err(source) => {
                let path = self.options.output_dir.join(file_name);
                error!("Failed to write {:?}: {}", path, source);
                report.unsaved.push(UnsavedLog {
                    trial: trial.name().to_string(),
                    path,
                    error: source.to_string(),
                    log: Box::new(log),
                });
                None
            }
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H-%M-%S").to_string()
}
