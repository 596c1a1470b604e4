//! winit + wgpu implementation of the platform seam.

use std::sync::Arc;

use codotaku_gpu::{
    ClearPass, CommandBuffer, DeviceRequest, GpuContext, PresentMode, ShaderFormats,
    SwapchainComposition, available_drivers, init_gpu_context_blocking,
};
use tracing::{debug, info};
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

use crate::platform::{AppWindow, GpuDevice, Platform, PlatformError, WindowDescriptor, WindowId};

/// Returns [`WindowAttributes`] for `descriptor`.
pub fn window_attributes(descriptor: &WindowDescriptor) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(descriptor.title.clone())
        .with_inner_size(LogicalSize::new(
            f64::from(descriptor.width),
            f64::from(descriptor.height),
        ))
        .with_resizable(descriptor.resizable)
        .with_visible(!descriptor.hidden)
}

/// Platform backed by a running winit event loop. Only valid inside an event
/// loop callback.
pub struct WinitPlatform<'a> {
    event_loop: &'a ActiveEventLoop,
}

impl<'a> WinitPlatform<'a> {
    pub fn new(event_loop: &'a ActiveEventLoop) -> Self {
        Self { event_loop }
    }
}

impl Platform for WinitPlatform<'_> {
    type Window = WinitWindow;
    type Device = WgpuDevice;

    fn init_video(&mut self) -> Result<(), PlatformError> {
        // winit opens the display connection when the event loop is built;
        // an unreachable display already failed there.
        if self.event_loop.exiting() {
            return Err(PlatformError::VideoUnavailable(
                "event loop is shutting down".to_string(),
            ));
        }
        let monitors = self.event_loop.available_monitors().count();
        info!(monitors, "Video subsystem ready");
        Ok(())
    }

    fn create_window(&mut self, descriptor: &WindowDescriptor) -> Result<WinitWindow, PlatformError> {
        let window = self
            .event_loop
            .create_window(window_attributes(descriptor))
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;
        Ok(WinitWindow {
            window: Arc::new(window),
        })
    }

    fn gpu_drivers(&self, formats: ShaderFormats) -> Vec<String> {
        available_drivers(formats)
            .into_iter()
            .map(|driver| driver.name().to_string())
            .collect()
    }

    fn create_gpu_device(&mut self, request: &DeviceRequest) -> Result<WgpuDevice, PlatformError> {
        let context = init_gpu_context_blocking(request)?;
        Ok(WgpuDevice { context })
    }
}

/// A winit window, shared with the GPU surface while claimed.
pub struct WinitWindow {
    window: Arc<Window>,
}

impl AppWindow for WinitWindow {
    fn id(&self) -> WindowId {
        self.window.id().into()
    }

    fn show(&self) -> Result<(), PlatformError> {
        self.window.set_visible(true);
        // Some platforms (Wayland) never report visibility; only an explicit
        // `false` counts as a failure.
        if self.window.is_visible() == Some(false) {
            return Err(PlatformError::ShowWindow(
                "window is still hidden after set_visible".to_string(),
            ));
        }
        Ok(())
    }
}

/// A wgpu device; claims at most one [`WinitWindow`].
pub struct WgpuDevice {
    context: GpuContext,
}

impl GpuDevice for WgpuDevice {
    type Window = WinitWindow;
    type CommandBuffer = CommandBuffer;

    fn driver_name(&self) -> &str {
        self.context.driver_name()
    }

    fn claim_window(&mut self, window: &WinitWindow) -> Result<(), PlatformError> {
        Ok(self.context.claim_window(window.window.clone())?)
    }

    fn supports_present_mode(&self, _window: &WinitWindow, mode: PresentMode) -> bool {
        self.context.supports_present_mode(mode)
    }

    fn set_swapchain_parameters(
        &mut self,
        _window: &WinitWindow,
        composition: SwapchainComposition,
        mode: PresentMode,
    ) -> Result<(), PlatformError> {
        Ok(self.context.set_swapchain_parameters(composition, mode)?)
    }

    fn acquire_command_buffer(&mut self) -> Result<CommandBuffer, PlatformError> {
        Ok(self.context.acquire_command_buffer())
    }

    fn wait_and_acquire_swapchain_texture(
        &mut self,
        cmd: &mut CommandBuffer,
        _window: &WinitWindow,
    ) -> Result<bool, PlatformError> {
        Ok(self.context.wait_and_acquire_swapchain_texture(cmd)?)
    }

    fn clear_swapchain(&mut self, cmd: &mut CommandBuffer, pass: &ClearPass) {
        self.context.clear_swapchain(cmd, pass);
    }

    fn submit(&mut self, cmd: CommandBuffer) -> Result<(), PlatformError> {
        Ok(self.context.submit(cmd)?)
    }

    fn wait_idle(&mut self) {
        self.context.wait_idle();
    }

    fn release_window(&mut self, window: &WinitWindow) {
        if self.context.release_window() {
            debug!(window = ?window.id(), "Window released from GPU device");
        }
    }
}
