//! The seam between the lifecycle controller and the windowing/GPU platform.
//!
//! [`Platform`] creates the two resources the controller owns: an
//! [`AppWindow`] and a [`GpuDevice`]. The winit + wgpu implementation lives in
//! [`crate::winit_platform`].

use codotaku_config::WindowConfig;
use codotaku_gpu::{
    ClearPass, DeviceRequest, GpuError, PresentMode, ShaderFormats, SwapchainComposition,
};

/// Errors raised by platform operations. Every one of them is fatal to the
/// application.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The windowing subsystem could not be initialized.
    #[error("video subsystem unavailable: {0}")]
    VideoUnavailable(String),

    /// The OS refused to create the window.
    #[error("failed to create window: {0}")]
    WindowCreation(String),

    /// The window could not be made visible.
    #[error("failed to show window: {0}")]
    ShowWindow(String),

    /// A GPU device operation failed.
    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// Opaque window identifier, comparable with the ids carried by events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<winit::window::WindowId> for WindowId {
    fn from(id: winit::window::WindowId) -> Self {
        Self(u64::from(id))
    }
}

/// Attributes of the window created during Init.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDescriptor {
    pub title: String,
    /// Width in logical pixels.
    pub width: u32,
    /// Height in logical pixels.
    pub height: u32,
    pub resizable: bool,
    /// Create the window hidden; it is shown once GPU setup succeeds.
    pub hidden: bool,
}

impl Default for WindowDescriptor {
    fn default() -> Self {
        Self::from_config(&WindowConfig::default())
    }
}

impl WindowDescriptor {
    pub fn from_config(config: &WindowConfig) -> Self {
        Self {
            title: config.title.clone(),
            width: config.width,
            height: config.height,
            resizable: config.resizable,
            hidden: true,
        }
    }
}

/// Input events the controller reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The application as a whole was asked to quit.
    Quit,
    /// The user asked to close a window.
    WindowCloseRequested(WindowId),
    /// Anything else; named for logging only.
    Other(&'static str),
}

/// A platform window owned by the controller.
pub trait AppWindow {
    fn id(&self) -> WindowId;

    /// Make the window visible.
    fn show(&self) -> Result<(), PlatformError>;
}

/// A GPU device bound to at most one window of type `Self::Window`.
pub trait GpuDevice {
    type Window: AppWindow;
    type CommandBuffer;

    /// Name of the backend driver in use.
    fn driver_name(&self) -> &str;

    /// Bind `window` so frames can be presented into it.
    fn claim_window(&mut self, window: &Self::Window) -> Result<(), PlatformError>;

    fn supports_present_mode(&self, window: &Self::Window, mode: PresentMode) -> bool;

    fn set_swapchain_parameters(
        &mut self,
        window: &Self::Window,
        composition: SwapchainComposition,
        mode: PresentMode,
    ) -> Result<(), PlatformError>;

    fn acquire_command_buffer(&mut self) -> Result<Self::CommandBuffer, PlatformError>;

    /// Block until the next swapchain texture of `window` is available.
    /// `Ok(false)` means no texture this frame.
    fn wait_and_acquire_swapchain_texture(
        &mut self,
        cmd: &mut Self::CommandBuffer,
        window: &Self::Window,
    ) -> Result<bool, PlatformError>;

    /// Record a pass that clears the acquired swapchain texture.
    fn clear_swapchain(&mut self, cmd: &mut Self::CommandBuffer, pass: &ClearPass);

    fn submit(&mut self, cmd: Self::CommandBuffer) -> Result<(), PlatformError>;

    /// Block until all in-flight GPU work has completed.
    fn wait_idle(&mut self);

    /// Unbind `window` from the device.
    fn release_window(&mut self, window: &Self::Window);
}

/// Creates the window and device during Init.
pub trait Platform {
    type Window: AppWindow;
    type Device: GpuDevice<Window = Self::Window>;

    fn init_video(&mut self) -> Result<(), PlatformError>;

    fn create_window(
        &mut self,
        descriptor: &WindowDescriptor,
    ) -> Result<Self::Window, PlatformError>;

    /// Names of the GPU drivers this build can use with shaders in `formats`.
    fn gpu_drivers(&self, formats: ShaderFormats) -> Vec<String>;

    fn create_gpu_device(
        &mut self,
        request: &DeviceRequest,
    ) -> Result<Self::Device, PlatformError>;
}
