use anyhow::{Context, Result, anyhow};
use log::{debug, error, info, warn};
use pixels::{Pixels, SurfaceTexture};
use preflook_core::{Command, Region, TrialConfig};
use preflook_experiment::{RunnerError, RunnerOptions, SessionReport, SignalSlot, TrialRunner};
use preflook_render::{
    FontVec, ScreenHandle, SharedScreen, SkiaRenderer, find_system_font, load_font,
};
use preflook_timing::HighPrecisionClock;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

/// Sent from the runner thread to the event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEvent {
    Redraw,
    SessionEnded,
}

/// Same commands as the terminal front-end.
pub fn map_physical_key(key: PhysicalKey) -> Option<Command> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::ArrowLeft => Some(Command::Focus(Region::Left)),
        KeyCode::ArrowRight => Some(Command::Focus(Region::Right)),
        KeyCode::ArrowUp => Some(Command::Focus(Region::Away)),
        KeyCode::Space => Some(Command::Continue),
        KeyCode::KeyQ | KeyCode::Escape => Some(Command::Abort),
        _ => None,
    }
}

struct WindowApp {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    font: Option<FontVec>,
    screen: ScreenHandle,
    signals: Arc<SignalSlot>,
    failure: Option<anyhow::Error>,
}

impl WindowApp {
    fn new(font: FontVec, screen: ScreenHandle, signals: Arc<SignalSlot>) -> Self {
        Self {
            window: None,
            pixels: None,
            renderer: None,
            font: Some(font),
            screen,
            signals,
            failure: None,
        }
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());

        let attributes = Window::default_attributes()
            .with_title("preflook")
            .with_fullscreen(monitor.map(|m| Fullscreen::Borderless(Some(m))));

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!("Window {}x{} at scale {:.2}", size.width, size.height, window.scale_factor());

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface)?);

        let font = self
            .font
            .take()
            .ok_or_else(|| anyhow!("window created twice"))?;
        self.renderer = Some(SkiaRenderer::new(size.width, size.height, font)?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        renderer.render_frame(&self.screen.current(), pixels.frame_mut())?;
        pixels.render()?;
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(size.width, size.height)?;
            pixels.resize_buffer(size.width, size.height)?;
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(size.width, size.height)?;
        }
        debug!("Resized to {}x{}", size.width, size.height);
        Ok(())
    }

    /// Stops the session and leaves the event loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("{:#}", e);
        self.signals.send(Command::Abort);
        self.failure.get_or_insert(e);
        event_loop.exit();
    }
}

impl ApplicationHandler<UserEvent> for WindowApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                self.fail(event_loop, e.context("creating window"));
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window closed, aborting session");
                self.signals.send(Command::Abort);
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    self.fail(event_loop, e.context("rendering frame"));
                }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && !event.repeat =>
            {
                if let Some(command) = map_physical_key(event.physical_key) {
                    debug!("key {:?} -> {:?}", event.physical_key, command);
                    self.signals.send(command);
                }
            }
            WindowEvent::Resized(size) => {
                if let Err(e) = self.resize(size) {
                    self.fail(event_loop, e.context("resizing surface"));
                }
            }
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Redraw => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            UserEvent::SessionEnded => event_loop.exit(),
        }
    }
}

/// Runs the event loop on this thread and the session on a worker.
///
/// The outer error covers window and font setup; the inner one is the
/// session's.
pub fn run(
    trials: Vec<TrialConfig>,
    options: RunnerOptions,
    font: Option<&Path>,
) -> Result<Result<SessionReport, RunnerError>> {
    let font_path = match font {
        Some(path) => path.to_path_buf(),
        None => find_system_font().context("no system font found, pass one with --font")?,
    };
    let font = load_font(&font_path)?;
    debug!("Using font {:?}", font_path);

    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    let proxy = event_loop.create_proxy();
    let wake = proxy.clone();
    let (presenter, screen) = SharedScreen::new(move || {
        // the loop may already be gone after a close
        let _ = wake.send_event(UserEvent::Redraw);
    });

    let signals = Arc::new(SignalSlot::new());
    let mut runner = TrialRunner::new(
        trials,
        HighPrecisionClock::new(),
        presenter,
        Arc::clone(&signals),
        options,
    )?;
    let session = thread::Builder::new()
        .name("trial-runner".into())
        .spawn(move || {
            let result = runner.run();
            let _ = proxy.send_event(UserEvent::SessionEnded);
            result
        })
        .context("starting trial runner")?;

    let mut app = WindowApp::new(font, screen, Arc::clone(&signals));
    let loop_result = event_loop.run_app(&mut app);

    // The loop can end first (window closed, render failure); never leave
    // the runner waiting for input that will not come.
    signals.send(Command::Abort);
    let result = session
        .join()
        .map_err(|_| anyhow!("trial runner thread panicked"))?;

    loop_result.context("window event loop")?;
    if let Some(e) = app.failure.take() {
        // a presenter error from the session says more, report that one
        if result.is_ok() {
            return Err(e);
        }
        warn!("Window failed as well: {:#}", e);
    }
    Ok(result)
}
