//! GPU device creation, window claiming, and per-frame command submission.
//!
//! [`GpuContext`] owns the wgpu instance, adapter, device and queue, plus the
//! surface of the window it has claimed. A window must be claimed before any
//! frame can be acquired, and released (dropping its surface) before the
//! window or the device is destroyed.

use std::sync::{Arc, Mutex, PoisonError};

use winit::window::Window;

use crate::driver::{GpuDriver, ShaderFormats};
use crate::pass::ClearPass;
use crate::present::{PresentMode, SwapchainComposition, select_surface_format};

/// Error type for device creation, window claiming, and frame acquisition.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    /// No backend is compatible with both the requested shader formats and the
    /// requested driver.
    #[error("no backend accepts the requested shader formats ({formats:?}) with driver {driver:?}")]
    NoCompatibleBackend {
        formats: ShaderFormats,
        driver: Option<String>,
    },

    /// The preferred driver name is not a known wgpu backend.
    #[error("unknown GPU driver `{0}`")]
    UnknownDriver(String),

    /// No adapter found on the allowed backends.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Failed to request GPU device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// Failed to create a surface for the window.
    #[error("failed to create surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// The adapter cannot present to the window's surface.
    #[error("adapter cannot present to this window")]
    UnsupportedSurface,

    /// A window is already claimed by this device.
    #[error("a window is already claimed by this device")]
    AlreadyClaimed,

    /// The operation needs a claimed window.
    #[error("no window is claimed by this device")]
    NotClaimed,

    /// The requested present mode is not supported by the surface.
    #[error("present mode {0:?} is not supported by this window")]
    UnsupportedPresentMode(PresentMode),

    /// Surface lost and could not be recovered.
    #[error("surface lost and could not be recovered")]
    SurfaceLost,

    /// GPU ran out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// Any other swapchain acquisition failure.
    #[error("failed to acquire swapchain texture: {0}")]
    Acquire(String),

    /// wgpu rejected a submitted or configured operation.
    #[error("GPU validation failed: {0}")]
    Validation(String),
}

/// Parameters for [`GpuContext::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequest {
    /// Shader formats the application will supply.
    pub shader_formats: ShaderFormats,
    /// Enable backend debug layers and validation.
    pub debug_mode: bool,
    /// Driver to use; `None` lets wgpu choose among the compatible backends.
    pub driver: Option<String>,
}

impl Default for DeviceRequest {
    fn default() -> Self {
        Self {
            shader_formats: ShaderFormats::SPIRV | ShaderFormats::DXIL | ShaderFormats::MSL,
            debug_mode: true,
            driver: None,
        }
    }
}

impl DeviceRequest {
    /// Backends the instance may use for this request.
    pub fn backends(&self) -> Result<wgpu::Backends, GpuError> {
        let mut backends = self.shader_formats.compatible_backends();

        if let Some(name) = &self.driver {
            let driver =
                GpuDriver::from_name(name).ok_or_else(|| GpuError::UnknownDriver(name.clone()))?;
            backends &= driver.backends();
        }

        if backends.is_empty() {
            return Err(GpuError::NoCompatibleBackend {
                formats: self.shader_formats,
                driver: self.driver.clone(),
            });
        }
        Ok(backends)
    }
}

/// The window surface bound to a device.
struct ClaimedSurface {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: Option<wgpu::SurfaceConfiguration>,
}

/// Per-frame command recording plus the swapchain texture it targets.
pub struct CommandBuffer {
    encoder: wgpu::CommandEncoder,
    target: Option<SwapchainTarget>,
}

struct SwapchainTarget {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Holds the first error wgpu raised outside an error scope until the next
/// check. wgpu's default handler panics instead.
#[derive(Clone, Default)]
struct ErrorSink(Arc<Mutex<Option<String>>>);

impl ErrorSink {
    fn install(&self, device: &wgpu::Device) {
        let sink = self.clone();
        device.on_uncaptured_error(Arc::new(move |err: wgpu::Error| sink.record(&err)));
    }

    fn record(&self, err: &wgpu::Error) {
        log::error!("Uncaptured wgpu error: {err}");
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(|| err.to_string());
    }

    /// Return the pending error, if any, and clear it.
    fn check(&self) -> Result<(), GpuError> {
        match self.0.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(message) => Err(GpuError::Validation(message)),
            None => Ok(()),
        }
    }
}

/// Owns all GPU state: instance, adapter, device, queue, and the claimed
/// window surface.
pub struct GpuContext {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    driver: GpuDriver,
    errors: ErrorSink,
    claimed: Option<ClaimedSurface>,
}

impl GpuContext {
    /// Create the device on a backend that accepts the requested shader
    /// formats (and the requested driver, if any).
    pub async fn new(request: &DeviceRequest) -> Result<Self, GpuError> {
        let backends = request.backends()?;

        let flags = if request.debug_mode {
            wgpu::InstanceFlags::debugging()
        } else {
            wgpu::InstanceFlags::empty()
        };

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            flags,
            ..Default::default()
        });

        // No surface exists yet: claiming checks presentation support later.
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!(
            "Selected GPU: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("codotaku-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let errors = ErrorSink::default();
        errors.install(&device);

        Ok(Self {
            instance,
            driver: GpuDriver::from(info.backend),
            adapter,
            device,
            queue,
            errors,
            claimed: None,
        })
    }

    /// Name of the backend driver the device runs on.
    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Bind `window` to this device so frames can be presented into it.
    ///
    /// The swapchain is not configured until
    /// [`set_swapchain_parameters`](Self::set_swapchain_parameters) runs.
    pub fn claim_window(&mut self, window: Arc<Window>) -> Result<(), GpuError> {
        if self.claimed.is_some() {
            return Err(GpuError::AlreadyClaimed);
        }

        let surface = self.instance.create_surface(window.clone())?;
        if !self.adapter.is_surface_supported(&surface) {
            return Err(GpuError::UnsupportedSurface);
        }

        log::debug!("Claimed window {:?} for {}", window.id(), self.driver_name());
        self.claimed = Some(ClaimedSurface {
            window,
            surface,
            config: None,
        });
        Ok(())
    }

    /// Whether the claimed window can present with `mode`. `false` if no
    /// window is claimed.
    pub fn supports_present_mode(&self, mode: PresentMode) -> bool {
        self.claimed.as_ref().is_some_and(|claimed| {
            claimed
                .surface
                .get_capabilities(&self.adapter)
                .present_modes
                .contains(&mode.to_wgpu())
        })
    }

    /// Configure the claimed window's swapchain.
    pub fn set_swapchain_parameters(
        &mut self,
        composition: SwapchainComposition,
        mode: PresentMode,
    ) -> Result<(), GpuError> {
        let claimed = self.claimed.as_mut().ok_or(GpuError::NotClaimed)?;
        let caps = claimed.surface.get_capabilities(&self.adapter);

        if !caps.present_modes.contains(&mode.to_wgpu()) {
            return Err(GpuError::UnsupportedPresentMode(mode));
        }
        let format =
            select_surface_format(&caps.formats, composition).ok_or(GpuError::UnsupportedSurface)?;

        let size = claimed.window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: mode.to_wgpu(),
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        claimed.surface.configure(&self.device, &config);
        self.errors.check()?;
        log::info!(
            "Swapchain configured: {:?} {:?} {}x{}",
            format,
            mode,
            config.width,
            config.height
        );
        claimed.config = Some(config);
        Ok(())
    }

    /// Start recording a frame.
    pub fn acquire_command_buffer(&self) -> CommandBuffer {
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-commands"),
            });
        CommandBuffer {
            encoder,
            target: None,
        }
    }

    /// Block until the next swapchain texture is available and attach it to
    /// `cmd`.
    ///
    /// Returns `Ok(false)` when no texture is available this frame (timeout or
    /// a zero-sized window); that is not an error.
    pub fn wait_and_acquire_swapchain_texture(
        &mut self,
        cmd: &mut CommandBuffer,
    ) -> Result<bool, GpuError> {
        let claimed = self.claimed.as_mut().ok_or(GpuError::NotClaimed)?;
        let Some(config) = claimed.config.as_mut() else {
            return Err(GpuError::NotClaimed);
        };

        let size = claimed.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Ok(false);
        }
        if size.width != config.width || size.height != config.height {
            config.width = size.width;
            config.height = size.height;
            claimed.surface.configure(&self.device, config);
            self.errors.check()?;
            log::debug!("Swapchain resized to {}x{}", size.width, size.height);
        }

        let texture = match claimed.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Timeout) => return Ok(false),
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                log::warn!("Swapchain outdated, reconfiguring");
                claimed.surface.configure(&self.device, config);
                self.errors.check()?;
                claimed
                    .surface
                    .get_current_texture()
                    .map_err(|_| GpuError::SurfaceLost)?
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(GpuError::OutOfMemory),
            Err(other) => return Err(GpuError::Acquire(other.to_string())),
        };

        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        cmd.target = Some(SwapchainTarget { texture, view });
        Ok(true)
    }

    /// Record `pass` against the swapchain texture in `cmd`. Does nothing if
    /// no texture was acquired.
    pub fn clear_swapchain(&self, cmd: &mut CommandBuffer, pass: &ClearPass) {
        if let Some(target) = &cmd.target {
            pass.record(&mut cmd.encoder, &target.view);
        }
    }

    /// Submit `cmd` to the queue and present its swapchain texture, if any.
    ///
    /// A frame wgpu rejects is not presented.
    pub fn submit(&self, cmd: CommandBuffer) -> Result<(), GpuError> {
        let CommandBuffer { encoder, target } = cmd;
        self.queue.submit([encoder.finish()]);
        self.errors.check()?;
        if let Some(target) = target {
            drop(target.view);
            target.texture.present();
        }
        Ok(())
    }

    /// Block until all submitted work has completed.
    pub fn wait_idle(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        }) {
            log::warn!("Waiting for GPU idle failed: {e}");
        }
    }

    /// Unbind the claimed window, dropping its surface. Returns whether a
    /// window was claimed.
    pub fn release_window(&mut self) -> bool {
        match self.claimed.take() {
            Some(claimed) => {
                log::debug!("Released window {:?}", claimed.window.id());
                true
            }
            None => false,
        }
    }
}

/// Create the device synchronously using `pollster`.
pub fn init_gpu_context_blocking(request: &DeviceRequest) -> Result<GpuContext, GpuError> {
    pollster::block_on(GpuContext::new(request))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_asks_for_all_three_formats() {
        let request = DeviceRequest::default();
        assert!(request.shader_formats.contains(ShaderFormats::SPIRV));
        assert!(request.shader_formats.contains(ShaderFormats::DXIL));
        assert!(request.shader_formats.contains(ShaderFormats::MSL));
        assert!(request.debug_mode);
        assert!(request.driver.is_none());
    }

    #[test]
    fn test_automatic_driver_allows_every_native_backend() {
        let backends = DeviceRequest::default().backends().unwrap();
        assert_eq!(
            backends,
            wgpu::Backends::VULKAN | wgpu::Backends::DX12 | wgpu::Backends::METAL
        );
    }

    #[test]
    fn test_preferred_driver_narrows_backends() {
        let request = DeviceRequest {
            driver: Some("vulkan".to_string()),
            ..Default::default()
        };
        assert_eq!(request.backends().unwrap(), wgpu::Backends::VULKAN);
    }

    #[test]
    fn test_driver_without_matching_format_is_rejected() {
        let request = DeviceRequest {
            driver: Some("gl".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            request.backends(),
            Err(GpuError::NoCompatibleBackend { .. })
        ));
    }

    #[test]
    fn test_unknown_driver_is_rejected() {
        let request = DeviceRequest {
            driver: Some("glide".to_string()),
            ..Default::default()
        };
        assert!(matches!(request.backends(), Err(GpuError::UnknownDriver(_))));
    }

    fn validation_error(description: &str) -> wgpu::Error {
        wgpu::Error::Validation {
            source: Box::new(std::io::Error::other(description.to_string())),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_error_sink_turns_uncaptured_error_into_gpu_error() {
        let sink = ErrorSink::default();
        assert!(sink.check().is_ok());

        sink.record(&validation_error("Queue::submit: encoder is invalid"));
        let err = sink.check().unwrap_err();
        assert!(matches!(err, GpuError::Validation(_)), "got {err:?}");
        assert!(err.to_string().starts_with("GPU validation failed"));

        assert!(sink.check().is_ok(), "error is reported once");
    }

    #[test]
    fn test_error_sink_keeps_first_error() {
        let sink = ErrorSink::default();
        sink.record(&validation_error("first"));
        sink.record(&validation_error("second"));

        let Err(GpuError::Validation(message)) = sink.check() else {
            panic!("expected a validation error");
        };
        assert!(!message.contains("second"), "got {message}");
    }

    #[test]
    fn test_error_sink_clones_share_state() {
        let sink = ErrorSink::default();
        let handler_side = sink.clone();
        handler_side.record(&validation_error("configure failed"));
        assert!(sink.check().is_err());
    }

    #[test]
    fn test_no_formats_means_no_device() {
        let request = DeviceRequest {
            shader_formats: ShaderFormats::empty(),
            ..Default::default()
        };
        let err = init_gpu_context_blocking(&request).err().unwrap();
        assert!(matches!(err, GpuError::NoCompatibleBackend { .. }));
    }
}
