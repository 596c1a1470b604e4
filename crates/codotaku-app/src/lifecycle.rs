//! Application lifecycle controller.
//!
//! [`App`] owns the window and the GPU device and exposes the four entry
//! points the host loop calls: [`init`](App::init) once,
//! [`event`](App::event) and [`iterate`](App::iterate) interleaved while
//! running, and [`quit`](App::quit) once at the end.
//!
//! Teardown order is fixed: wait for the device to go idle, release the
//! window from the device, destroy the window, destroy the device.

use codotaku_config::Config;
use codotaku_gpu::{
    ClearPass, DeviceRequest, ShaderFormats, SwapchainComposition, negotiate_present_mode,
    select_preferred_driver,
};
use tracing::{error, info, trace, warn};

use crate::platform::{AppEvent, AppWindow, GpuDevice, Platform, PlatformError, WindowDescriptor};

/// Shader formats requested from every device.
pub const SHADER_FORMATS: ShaderFormats = ShaderFormats::SPIRV
    .union(ShaderFormats::DXIL)
    .union(ShaderFormats::MSL);

/// Signal returned by every lifecycle entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppResult {
    /// Keep running.
    Continue,
    /// Terminate, reporting success.
    Success,
    /// Terminate, reporting failure.
    Failure,
}

impl AppResult {
    /// Whether this result ends the run loop.
    pub fn is_terminal(self) -> bool {
        self != Self::Continue
    }
}

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Running,
    Terminating,
}

/// A failed Init step.
#[derive(Debug, thiserror::Error)]
#[error("failed to {step}: {source}")]
pub struct InitError {
    step: &'static str,
    #[source]
    source: PlatformError,
}

impl InitError {
    /// The Init step that failed, e.g. `"claim window for GPU device"`.
    pub fn step(&self) -> &'static str {
        self.step
    }
}

/// Per-frame update hook run before rendering.
pub type UpdateFn = Box<dyn FnMut() -> AppResult>;

/// Owns the window and GPU device for the lifetime of the process.
pub struct App<W: AppWindow, D: GpuDevice<Window = W>> {
    state: LifecycleState,
    config: Config,
    clear_pass: ClearPass,
    update_hook: Option<UpdateFn>,
    window: Option<W>,
    device: Option<D>,
    window_claimed: bool,
}

impl<W: AppWindow, D: GpuDevice<Window = W>> App<W, D> {
    pub fn new(config: Config) -> Self {
        let clear_pass = ClearPass::from(config.gpu.clear_color);
        Self {
            state: LifecycleState::Uninitialized,
            config,
            clear_pass,
            update_hook: None,
            window: None,
            device: None,
            window_claimed: false,
        }
    }

    /// Replace the update step. Without a hook the update step always
    /// continues.
    pub fn set_update_hook(&mut self, hook: impl FnMut() -> AppResult + 'static) {
        self.update_hook = Some(Box::new(hook));
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn window(&self) -> Option<&W> {
        self.window.as_ref()
    }

    pub fn device(&self) -> Option<&D> {
        self.device.as_ref()
    }

    /// Whether the window is currently claimed by the device.
    pub fn is_window_claimed(&self) -> bool {
        self.window_claimed
    }

    /// Create the window and device, claim the window, configure the
    /// swapchain, and show the window.
    ///
    /// `args` are accepted for the host contract and otherwise unused. Calling
    /// this outside [`LifecycleState::Uninitialized`] fails without touching
    /// the platform.
    pub fn init<P>(&mut self, platform: &mut P, args: &[String]) -> AppResult
    where
        P: Platform<Window = W, Device = D>,
    {
        if self.state != LifecycleState::Uninitialized {
            warn!(state = ?self.state, "Init called more than once");
            return AppResult::Failure;
        }
        trace!(argc = args.len(), "Init");

        match self.try_init(platform) {
            Ok(()) => {
                self.state = LifecycleState::Running;
                AppResult::Continue
            }
            Err(e) => {
                error!(step = e.step(), "{e}");
                AppResult::Failure
            }
        }
    }

    fn try_init<P>(&mut self, platform: &mut P) -> Result<(), InitError>
    where
        P: Platform<Window = W, Device = D>,
    {
        let meta = &self.config.app;
        info!(
            name = %meta.name,
            version = %meta.version,
            identifier = %meta.identifier,
            "Starting application"
        );

        at_step("initialize video subsystem", platform.init_video())?;

        let descriptor = WindowDescriptor::from_config(&self.config.window);
        let window = at_step("create window", platform.create_window(&descriptor))?;
        let window = &*self.window.insert(window);

        let drivers = platform.gpu_drivers(SHADER_FORMATS);
        info!("Supported GPU drivers:");
        for driver in &drivers {
            info!("    {driver}");
        }

        let preferred = select_preferred_driver(&drivers, &self.config.gpu.preferred_drivers);
        if let Some(driver) = preferred {
            info!("Using preferred GPU driver: {driver}");
        }

        let request = DeviceRequest {
            shader_formats: SHADER_FORMATS,
            debug_mode: self.config.gpu.debug_mode,
            driver: preferred.map(str::to_owned),
        };
        let device = at_step("create GPU device", platform.create_gpu_device(&request))?;
        let device = self.device.insert(device);
        info!("Selected GPU driver: {}", device.driver_name());

        at_step("claim window for GPU device", device.claim_window(window))?;
        self.window_claimed = true;

        let present_mode = negotiate_present_mode(self.config.gpu.prefer_low_latency, |mode| {
            device.supports_present_mode(window, mode)
        });
        info!(?present_mode, "Present mode selected");
        at_step(
            "set swapchain parameters",
            device.set_swapchain_parameters(window, SwapchainComposition::Sdr, present_mode),
        )?;

        at_step("show window", window.show())
    }

    /// Run one frame: the update step, then the render step. The first
    /// terminal result wins.
    ///
    /// Never renders outside [`LifecycleState::Running`].
    pub fn iterate(&mut self) -> AppResult {
        match self.state {
            LifecycleState::Uninitialized => {
                warn!("Iterate called before a successful Init");
                return AppResult::Failure;
            }
            LifecycleState::Terminating => return AppResult::Success,
            LifecycleState::Running => {}
        }

        let result = self.on_update();
        if result.is_terminal() {
            return result;
        }
        self.on_render()
    }

    /// React to one input event.
    pub fn event(&mut self, event: &AppEvent) -> AppResult {
        match event {
            AppEvent::Quit => self.on_quit(),
            AppEvent::WindowCloseRequested(id)
                if self.window.as_ref().is_some_and(|w| w.id() == *id) =>
            {
                self.on_quit()
            }
            other => {
                trace!(event = ?other, "Ignoring event");
                AppResult::Continue
            }
        }
    }

    /// Drain the GPU and release the window from the device.
    ///
    /// The window and device themselves are destroyed when the controller is
    /// dropped. Calling this more than once has no further effect.
    pub fn quit(&mut self, result: AppResult) {
        if self.state == LifecycleState::Terminating {
            return;
        }
        info!(?result, "Shutting down");
        self.teardown();
    }

    fn on_quit(&self) -> AppResult {
        info!("Quit requested");
        AppResult::Success
    }

    fn on_update(&mut self) -> AppResult {
        self.update_hook
            .as_mut()
            .map_or(AppResult::Continue, |hook| hook())
    }

    fn on_render(&mut self) -> AppResult {
        let (Some(window), Some(device)) = (self.window.as_ref(), self.device.as_mut()) else {
            error!("Render step without a window and device");
            return AppResult::Failure;
        };

        match render_frame(device, window, &self.clear_pass) {
            Ok(()) => AppResult::Continue,
            Err(e) => {
                error!("Failed to render frame: {e}");
                AppResult::Failure
            }
        }
    }

    fn teardown(&mut self) {
        self.state = LifecycleState::Terminating;

        let Some(device) = self.device.as_mut() else {
            return;
        };
        device.wait_idle();

        if self.window_claimed
            && let Some(window) = self.window.as_ref()
        {
            device.release_window(window);
            self.window_claimed = false;
        }
    }
}

impl<W: AppWindow, D: GpuDevice<Window = W>> Drop for App<W, D> {
    fn drop(&mut self) {
        if self.state != LifecycleState::Terminating {
            self.teardown();
        }
        drop(self.window.take());
        drop(self.device.take());
    }
}

/// Acquire, clear, submit.
fn render_frame<W, D>(device: &mut D, window: &W, pass: &ClearPass) -> Result<(), PlatformError>
where
    W: AppWindow,
    D: GpuDevice<Window = W>,
{
    let mut cmd = device.acquire_command_buffer()?;
    if device.wait_and_acquire_swapchain_texture(&mut cmd, window)? {
        device.clear_swapchain(&mut cmd, pass);
    }
    device.submit(cmd)
}

/// Name the Init step a platform error came from.
fn at_step<T>(step: &'static str, result: Result<T, PlatformError>) -> Result<T, InitError> {
    result.map_err(|source| InitError { step, source })
}
