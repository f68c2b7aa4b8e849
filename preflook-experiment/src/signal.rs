use log::trace;
use preflook_core::{Command, Region};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Result of waiting for the observer to continue
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum Wait {
    Continue,
    Abort,
    TimedOut,
}

#[derive(Debug, Default)]
struct Pending {
    focus: Option<Region>,
    continue_requested: bool,
    aborted: bool,
}

/// Single-slot hand-off from the input task to the sequencing loop.
///
/// Holds at most one pending focus change (last write wins), a continue flag
/// and a sticky abort flag. The tracker itself is never shared.
#[derive(Debug, Default)]
pub struct SignalSlot {
    pending: Mutex<Pending>,
    changed: Condvar,
}

impl SignalSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn send(&self, command: Command) {
        let mut pending = self.lock();
        match command {
            Command::Focus(region) => pending.focus = Some(region),
            Command::Continue => pending.continue_requested = true,
            Command::Abort => pending.aborted = true,
        }
        trace!("signal {:?}", command);
        drop(pending);
        self.changed.notify_all();
    }

    /// Removes and returns the queued focus change, if any.
    pub fn take_focus(&self) -> Option<Region> {
        self.lock().focus.take()
    }

    pub fn is_aborted(&self) -> bool {
        self.lock().aborted
    }

    /// Drops a stale continue or focus change; abort stays set.
    pub fn discard_pending(&self) {
        let mut pending = self.lock();
        pending.focus = None;
        pending.continue_requested = false;
    }

    /// Blocks until continue or abort arrives, or `timeout` passes.
    ///
    /// Abort takes priority over a continue queued at the same time. A
    /// consumed continue is cleared.
    pub fn wait_for_continue(&self, timeout: Duration) -> Wait {
        let deadline = Instant::now() + timeout;
        let mut pending = self.lock();
        loop {
            if pending.aborted {
                return Wait::Abort;
            }
            if pending.continue_requested {
                pending.continue_requested = false;
                return Wait::Continue;
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Wait::TimedOut;
            }
            pending = self
                .changed
                .wait_timeout(pending, left)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn last_focus_wins() {
        let slot = SignalSlot::new();
        slot.send(Command::Focus(Region::Left));
        slot.send(Command::Focus(Region::Right));
        assert_eq!(slot.take_focus(), Some(Region::Right));
        assert_eq!(slot.take_focus(), None);
    }

    #[test]
    fn wait_times_out_without_signal() {
        let slot = SignalSlot::new();
        assert_eq!(slot.wait_for_continue(Duration::from_millis(5)), Wait::TimedOut);
    }

    #[test]
    fn continue_is_consumed() {
        let slot = SignalSlot::new();
        slot.send(Command::Continue);
        assert_eq!(slot.wait_for_continue(Duration::from_millis(5)), Wait::Continue);
        assert_eq!(slot.wait_for_continue(Duration::from_millis(5)), Wait::TimedOut);
    }

    #[test]
    fn abort_wins_and_sticks() {
        let slot = SignalSlot::new();
        slot.send(Command::Continue);
        slot.send(Command::Abort);
        slot.discard_pending();
        assert!(slot.is_aborted());
        assert_eq!(slot.wait_for_continue(Duration::from_millis(5)), Wait::Abort);
        assert_eq!(slot.wait_for_continue(Duration::from_millis(5)), Wait::Abort);
    }

    #[test]
    fn discard_drops_stale_input() {
        let slot = SignalSlot::new();
        slot.send(Command::Focus(Region::Left));
        slot.send(Command::Continue);
        slot.discard_pending();
        assert_eq!(slot.take_focus(), None);
        assert_eq!(slot.wait_for_continue(Duration::from_millis(5)), Wait::TimedOut);
    }

    #[test]
    fn wakes_waiter_from_another_thread() {
        let slot = Arc::new(SignalSlot::new());
        let sender = Arc::clone(&slot);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            sender.send(Command::Continue);
        });
        assert_eq!(slot.wait_for_continue(Duration::from_secs(10)), Wait::Continue);
        handle.join().unwrap();
    }
}
