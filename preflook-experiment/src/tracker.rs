use crate::transitions::{Marker, TransitionLog};
use log::{debug, info, warn};
use preflook_core::{Dwell, Region, StoppingRule, Verdict};
use std::time::Duration;

/// Read-only view of a running (or finished) trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub focus: Region,
    pub dwell: Dwell,
    /// Time accounted so far, equal to `dwell.total()`
    pub elapsed: Duration,
    pub verdict: Verdict,
}

/// Dwell-time accounting and transition logging for a single trial run.
///
/// All timestamps are clock readings (time since the clock origin). The
/// tracker never reads a clock itself, so the caller decides what "now" is.
#[derive(Debug, Clone)]
pub struct FocusTracker {
    rule: StoppingRule,
    focus: Region,
    dwell: Dwell,
    started: Duration,
    last_change: Duration,
    first_look: Option<Duration>,
    log: TransitionLog,
    verdict: Verdict,
}

impl FocusTracker {
    /// Begins a trial looking away, with empty accumulators and one log entry.
    pub fn start(rule: StoppingRule, now: Duration) -> Self {
        let focus = Region::default();
        Self {
            rule,
            focus,
            dwell: Dwell::default(),
            started: now,
            last_change: now,
            first_look: None,
            log: TransitionLog::new(now, focus),
            verdict: Verdict::Running,
        }
    }

    /// Accrues time to the current region, applies an optional focus change,
    /// and evaluates the stopping rule.
    ///
    /// Once a terminal verdict has been returned the tracker is frozen and
    /// every later call returns that verdict without touching any state.
    pub fn report_focus(&mut self, requested: Option<Region>, now: Duration) -> Verdict {
        if self.verdict.is_terminal() {
            warn!("focus report after trial ended ({:?}), ignored", self.verdict);
            return self.verdict;
        }

        let now = self.accrue(now);

        if let Some(region) = requested.filter(|r| *r != self.focus) {
            self.log.append(Marker::Focus(region), now, self.dwell);
            debug!("focus {} -> {} at {:?}", self.focus, region, now - self.started);
            self.focus = region;

            if region.is_image() && self.first_look.is_none() {
                self.first_look = Some(now);
                debug!("first look at {:?}", now - self.started);
            }
        }

        let since_first_look = self.first_look.map(|t| now - t);
        self.verdict = self.rule.evaluate(&self.dwell, since_first_look);

        if self.verdict.is_terminal() {
            self.log.append(Marker::Finish, now, self.dwell);
            info!(
                "trial ended {:?} after {:?}, image time {:?}",
                self.verdict,
                now - self.started,
                self.dwell.image_time()
            );
        }

        self.verdict
    }

    /// Closes a running trial's log with an abort marker.
    ///
    /// Returns false if the trial had already ended.
    pub fn abort(&mut self, now: Duration) -> bool {
        if self.verdict.is_terminal() || self.log.is_closed() {
            return false;
        }
        let now = self.accrue(now);
        self.log.append(Marker::Abort, now, self.dwell);
        true
    }

    fn accrue(&mut self, now: Duration) -> Duration {
        // A reading older than the last change adds nothing.
        let now = now.max(self.last_change);
        self.dwell[self.focus] += now - self.last_change;
        self.last_change = now;
        now
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            focus: self.focus,
            dwell: self.dwell,
            elapsed: self.last_change - self.started,
            verdict: self.verdict,
        }
    }

    pub fn focus(&self) -> Region {
        self.focus
    }

    pub fn dwell(&self) -> &Dwell {
        &self.dwell
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Clock reading of the first move into an image region
    pub fn first_look(&self) -> Option<Duration> {
        self.first_look
    }

    pub fn log(&self) -> &TransitionLog {
        &self.log
    }

    pub fn into_log(self) -> TransitionLog {
        self.log
    }
}
