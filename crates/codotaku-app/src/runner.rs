//! Host loop: drives an [`App`] from winit's callbacks.
//!
//! `resumed` runs Init, every pass through `about_to_wait` runs Iterate, window
//! and user events go through Event, and `exiting` runs Quit exactly once. The
//! first terminal result ends the loop and becomes the run's result.

use codotaku_config::Config;
use tracing::{info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::WindowId as WinitWindowId;

use crate::lifecycle::{App, AppResult, LifecycleState};
use crate::platform::{AppEvent, AppWindow, GpuDevice, Platform};
use crate::winit_platform::{WgpuDevice, WinitPlatform, WinitWindow};

/// User event asking the application to quit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuitRequest;

impl From<QuitRequest> for AppEvent {
    fn from(_: QuitRequest) -> Self {
        AppEvent::Quit
    }
}

/// Errors from the event loop itself.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The event loop could not be created (no display, or created twice).
    #[error("failed to create event loop: {0}")]
    Create(#[source] winit::error::EventLoopError),

    /// The event loop exited abnormally.
    #[error("event loop failed: {0}")]
    Run(#[source] winit::error::EventLoopError),
}

/// Feeds host callbacks into an [`App`] and keeps the first terminal result.
///
/// Each callback returns whether the loop should stop.
pub(crate) struct Host<W: AppWindow, D: GpuDevice<Window = W>> {
    app: App<W, D>,
    args: Vec<String>,
    started: bool,
    finished: bool,
    result: Option<AppResult>,
}

impl<W: AppWindow, D: GpuDevice<Window = W>> Host<W, D> {
    pub(crate) fn new(app: App<W, D>, args: Vec<String>) -> Self {
        Self {
            app,
            args,
            started: false,
            finished: false,
            result: None,
        }
    }

    /// Run Init on the first call only.
    pub(crate) fn start<P>(&mut self, platform: &mut P) -> bool
    where
        P: Platform<Window = W, Device = D>,
    {
        if self.started {
            return self.result.is_some();
        }
        self.started = true;
        let result = self.app.init(platform, &self.args);
        self.settle(result)
    }

    pub(crate) fn handle_event(&mut self, event: &AppEvent) -> bool {
        if self.result.is_some() {
            return true;
        }
        let result = self.app.event(event);
        self.settle(result)
    }

    /// Run Iterate while the app is running and no terminal result is held.
    pub(crate) fn frame(&mut self) -> bool {
        if self.result.is_some() {
            return true;
        }
        if self.app.state() != LifecycleState::Running {
            return false;
        }
        let result = self.app.iterate();
        self.settle(result)
    }

    /// Run Quit with the stored result (success if none) the first time only.
    pub(crate) fn finish(&mut self) -> AppResult {
        let result = *self.result.get_or_insert(AppResult::Success);
        if !self.finished {
            self.finished = true;
            self.app.quit(result);
        }
        result
    }

    pub(crate) fn result(&self) -> Option<AppResult> {
        self.result
    }

    fn settle(&mut self, result: AppResult) -> bool {
        if result.is_terminal() && self.result.is_none() {
            info!(?result, "Run loop finished");
            self.result = Some(result);
        }
        self.result.is_some()
    }
}

impl ApplicationHandler<QuitRequest> for Host<WinitWindow, WgpuDevice> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if self.start(&mut WinitPlatform::new(event_loop)) {
            event_loop.exit();
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: QuitRequest) {
        if self.handle_event(&event.into()) {
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WinitWindowId,
        event: WindowEvent,
    ) {
        let event = match event {
            WindowEvent::CloseRequested => AppEvent::WindowCloseRequested(window_id.into()),
            other => AppEvent::Other(window_event_name(&other)),
        };
        if self.handle_event(&event) {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.frame() {
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.finish();
    }
}

fn window_event_name(event: &WindowEvent) -> &'static str {
    match event {
        WindowEvent::Resized(_) => "resized",
        WindowEvent::ScaleFactorChanged { .. } => "scale_factor_changed",
        WindowEvent::Moved(_) => "moved",
        WindowEvent::Focused(_) => "focused",
        WindowEvent::Occluded(_) => "occluded",
        WindowEvent::RedrawRequested => "redraw_requested",
        WindowEvent::KeyboardInput { .. } => "keyboard_input",
        WindowEvent::CursorMoved { .. } => "cursor_moved",
        WindowEvent::MouseInput { .. } => "mouse_input",
        WindowEvent::Destroyed => "destroyed",
        _ => "window_event",
    }
}

/// An event loop plus the controller it will drive.
pub struct Launcher {
    event_loop: EventLoop<QuitRequest>,
    host: Host<WinitWindow, WgpuDevice>,
}

impl Launcher {
    /// Build the event loop. `args` are handed to Init unchanged.
    pub fn new(config: Config, args: Vec<String>) -> Result<Self, RunError> {
        let event_loop = EventLoop::<QuitRequest>::with_user_event()
            .build()
            .map_err(RunError::Create)?;

        Ok(Self {
            event_loop,
            host: Host::new(App::new(config), args),
        })
    }

    /// A handle other code can use to post [`QuitRequest`].
    pub fn quit_handle(&self) -> EventLoopProxy<QuitRequest> {
        self.event_loop.create_proxy()
    }

    /// Post a [`QuitRequest`] when the process is interrupted (Ctrl-C,
    /// SIGTERM), so shutdown still drains the GPU and releases the window.
    pub fn quit_on_interrupt(&self) -> Result<(), ctrlc::Error> {
        let proxy = self.quit_handle();
        ctrlc::set_handler(move || {
            info!("Interrupt received");
            if proxy.send_event(QuitRequest).is_err() {
                warn!("Event loop already closed; interrupt ignored");
            }
        })
    }

    /// Run until the first terminal result and return it.
    ///
    /// This function blocks until the window is closed.
    #[instrument(skip_all)]
    pub fn run(self) -> Result<AppResult, RunError> {
        let Self {
            event_loop,
            mut host,
        } = self;
        event_loop.run_app(&mut host).map_err(RunError::Run)?;
        Ok(host.result().unwrap_or(AppResult::Success))
    }
}
