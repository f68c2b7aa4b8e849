use crate::screen::Screen;
use preflook_core::TrialConfig;
use preflook_experiment::{Presenter, Snapshot};
use std::sync::{Arc, Mutex, PoisonError};

/// Presenter that publishes the latest screen for another thread to draw.
///
/// The runner thread writes, the window thread reads through a
/// [`ScreenHandle`]; `wake` tells the window a new screen is ready.
pub struct SharedScreen {
    screen: Arc<Mutex<Screen>>,
    wake: Box<dyn Fn() + Send>,
}

/// Read side of a [`SharedScreen`]
#[derive(Clone)]
pub struct ScreenHandle {
    screen: Arc<Mutex<Screen>>,
}

impl SharedScreen {
    pub fn new(wake: impl Fn() + Send + 'static) -> (Self, ScreenHandle) {
        let screen = Arc::new(Mutex::new(Screen::Idle));
        let handle = ScreenHandle {
            screen: Arc::clone(&screen),
        };
        (
            Self {
                screen,
                wake: Box::new(wake),
            },
            handle,
        )
    }

    fn publish(&self, next: Screen) {
        *self.screen.lock().unwrap_or_else(PoisonError::into_inner) = next;
        (self.wake)();
    }
}

impl ScreenHandle {
    pub fn current(&self) -> Screen {
        self.screen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Presenter for SharedScreen {
    fn show_prompt(&mut self, trial: &TrialConfig) -> anyhow::Result<()> {
        self.publish(Screen::prompt(trial));
        Ok(())
    }

    fn show_status(&mut self, trial: &TrialConfig, snapshot: &Snapshot) -> anyhow::Result<()> {
        self.publish(Screen::status(trial, snapshot));
        Ok(())
    }
}
