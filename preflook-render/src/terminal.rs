//! Full-screen terminal front-end built on crossterm
//!
//! - `TerminalPresenter`: draws prompt and status screens
//! - `TerminalInput`: key listener thread feeding a `SignalSlot`

use crate::screen::{LineStyle, Screen};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{
    cursor, execute, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, error};
use preflook_core::{Command, Region, TrialConfig};
use preflook_experiment::{Presenter, SignalSlot, Snapshot};
use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Draws screens on a terminal
pub struct TerminalPresenter<W: Write = Stdout> {
    out: W,
    /// Fixed size for non-tty writers; `None` asks the terminal
    size: Option<(u16, u16)>,
    /// Whether we own raw mode and the alternate screen
    owns_terminal: bool,
}

impl TerminalPresenter<Stdout> {
    /// Switches stdout to raw mode on the alternate screen.
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide)?;
        Ok(Self {
            out,
            size: None,
            owns_terminal: true,
        })
    }
}

impl<W: Write> TerminalPresenter<W> {
    /// Draws into any writer with a fixed screen size
    pub fn with_writer(out: W, width: u16, height: u16) -> Self {
        Self {
            out,
            size: Some((width, height)),
            owns_terminal: false,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        match self.size {
            Some(size) => Ok(size),
            None => terminal::size(),
        }
    }

    pub fn draw(&mut self, screen: &Screen) -> io::Result<()> {
        let (width, height) = self.size()?;
        let centre = i32::from(height / 2);

        queue!(self.out, terminal::Clear(ClearType::All))?;
        for line in screen.lines() {
            let row = centre + line.offset;
            if row < 0 || row >= i32::from(height) {
                continue;
            }
            let text: String = line.text.chars().take(usize::from(width)).collect();
            queue!(self.out, cursor::MoveTo(0, row as u16))?;
            match line.style {
                LineStyle::Title => queue!(
                    self.out,
                    SetAttribute(Attribute::Bold),
                    Print(text),
                    SetAttribute(Attribute::Reset)
                )?,
                LineStyle::Hint => queue!(
                    self.out,
                    SetAttribute(Attribute::Dim),
                    Print(text),
                    SetAttribute(Attribute::Reset)
                )?,
                LineStyle::Body => queue!(self.out, Print(text))?,
            }
        }
        self.out.flush()
    }

    /// Restores the terminal if we took it over
    pub fn shutdown(&mut self) -> io::Result<()> {
        if !self.owns_terminal {
            return Ok(());
        }
        self.owns_terminal = false;
        execute!(self.out, LeaveAlternateScreen, cursor::Show)?;
        terminal::disable_raw_mode()
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn show_prompt(&mut self, trial: &TrialConfig) -> anyhow::Result<()> {
        self.draw(&Screen::prompt(trial))?;
        Ok(())
    }

    fn show_status(&mut self, trial: &TrialConfig, snapshot: &Snapshot) -> anyhow::Result<()> {
        self.draw(&Screen::status(trial, snapshot))?;
        Ok(())
    }
}

impl<W: Write> Drop for TerminalPresenter<W> {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = self.shutdown();
    }
}

/// Arrow keys report focus, space continues, `q`/Esc/Ctrl+C abort.
pub fn map_key(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Left => Some(Command::Focus(Region::Left)),
        KeyCode::Right => Some(Command::Focus(Region::Right)),
        KeyCode::Up => Some(Command::Focus(Region::Away)),
        KeyCode::Char(' ') => Some(Command::Continue),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Command::Abort)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Abort),
        _ => None,
    }
}

/// Background key listener.
///
/// Blocks on terminal events (in short polls so it can be stopped) and
/// forwards mapped commands to the runner. An input error aborts the session.
pub struct TerminalInput {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<io::Result<()>>>,
}

impl TerminalInput {
    const POLL: Duration = Duration::from_millis(50);

    pub fn spawn(signals: Arc<SignalSlot>) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("terminal-input".into())
            .spawn(move || {
                let result = listen(&signals, &flag);
                if let Err(e) = &result {
                    error!("Terminal input failed: {}", e);
                    signals.send(Command::Abort);
                }
                result
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stops the listener and reports how it ended.
    pub fn stop(mut self) -> io::Result<()> {
        self.stop.store(true, Ordering::SeqCst);
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(result)) => result,
            Some(Err(_)) => Err(io::Error::other("terminal input thread panicked")),
            None => Ok(()),
        }
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn listen(signals: &SignalSlot, stop: &AtomicBool) -> io::Result<()> {
    while !stop.load(Ordering::SeqCst) {
        if !event::poll(TerminalInput::POLL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if let Some(command) = map_key(&key) {
                debug!("key {:?} -> {:?}", key.code, command);
                signals.send(command);
                if command == Command::Abort {
                    break;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflook_core::{Dwell, StoppingRule, Verdict};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn key_map() {
        assert_eq!(map_key(&press(KeyCode::Left)), Some(Command::Focus(Region::Left)));
        assert_eq!(map_key(&press(KeyCode::Right)), Some(Command::Focus(Region::Right)));
        assert_eq!(map_key(&press(KeyCode::Up)), Some(Command::Focus(Region::Away)));
        assert_eq!(map_key(&press(KeyCode::Char(' '))), Some(Command::Continue));
        assert_eq!(map_key(&press(KeyCode::Char('q'))), Some(Command::Abort));
        assert_eq!(map_key(&press(KeyCode::Esc)), Some(Command::Abort));
        assert_eq!(
            map_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Abort)
        );
        assert_eq!(map_key(&press(KeyCode::Char('c'))), None);
        assert_eq!(map_key(&press(KeyCode::Down)), None);
    }

    #[test]
    fn key_release_is_ignored() {
        let mut release = press(KeyCode::Left);
        release.kind = KeyEventKind::Release;
        assert_eq!(map_key(&release), None);
    }

    #[test]
    fn draws_status_into_writer() {
        let rule = StoppingRule::image_time(Duration::from_secs(1));
        let trial = TrialConfig::new("t", "", rule).unwrap();
        let snapshot = Snapshot {
            focus: Region::Away,
            dwell: Dwell::default(),
            elapsed: Duration::ZERO,
            verdict: Verdict::Running,
        };
        let mut presenter = TerminalPresenter::with_writer(Vec::new(), 80, 24);
        presenter.show_status(&trial, &snapshot).unwrap();

        let out = String::from_utf8_lossy(presenter.writer()).into_owned();
        assert!(out.contains("Current focus: away"));
        assert!(out.contains("Time spent right: 0.000000 seconds"));
    }

    #[test]
    fn clips_lines_outside_small_terminal() {
        let trial = TrialConfig::new(
            "a rather long trial name",
            "one\ntwo\nthree\nfour",
            StoppingRule::image_time(Duration::from_secs(1)),
        )
        .unwrap();
        let mut presenter = TerminalPresenter::with_writer(Vec::new(), 6, 6);
        presenter.show_prompt(&trial).unwrap();

        let out = String::from_utf8_lossy(presenter.writer()).into_owned();
        assert!(out.contains("a rath"));
        assert!(!out.contains("a rathe"));
        // centre row 3: prompt body starts at row 5, the last visible row
        assert!(out.contains("one"));
        assert!(!out.contains("two"));
    }
}
