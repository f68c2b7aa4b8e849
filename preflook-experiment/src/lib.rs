pub mod config;
pub mod runner;
pub mod signal;
pub mod tracker;
pub mod transitions;

pub use config::{default_trials, load_trials, validate_trials};
pub use runner::{
    Presenter, RunnerError, RunnerOptions, SessionReport, TrialOutcome, TrialRunner, UnsavedLog,
};
pub use signal::{SignalSlot, Wait};
pub use tracker::{FocusTracker, Snapshot};
pub use transitions::{LogEntry, Marker, TransitionLog};
