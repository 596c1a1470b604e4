//! wgpu device layer for the Codotaku shell: backend driver enumeration,
//! device creation, window claiming, swapchain configuration, and the
//! per-frame clear pass.

pub mod device;
pub mod driver;
pub mod pass;
pub mod present;

pub use device::{CommandBuffer, DeviceRequest, GpuContext, GpuError, init_gpu_context_blocking};
pub use driver::{GpuDriver, ShaderFormats, available_drivers, select_preferred_driver};
pub use pass::{ClearPass, OPAQUE_RED};
pub use present::{PresentMode, SwapchainComposition, negotiate_present_mode, select_surface_format};
