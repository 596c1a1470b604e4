//! Backend driver enumeration and preference matching.
//!
//! A "driver" is a wgpu backend compiled into this binary. Drivers are named
//! by wgpu's lowercase backend names so they can be listed in `config.ron`.

use bitflags::bitflags;

bitflags! {
    /// Shader formats the application can supply to the device.
    ///
    /// Each format is consumed natively by one backend family, so the set of
    /// requested formats restricts which backends the device may run on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderFormats: u32 {
        /// SPIR-V, consumed by Vulkan.
        const SPIRV = 1 << 0;
        /// DXIL, consumed by Direct3D 12.
        const DXIL = 1 << 1;
        /// Metal shading language source.
        const MSL = 1 << 2;
    }
}

impl ShaderFormats {
    /// Backends that can run shaders in at least one of these formats.
    pub fn compatible_backends(self) -> wgpu::Backends {
        let mut backends = wgpu::Backends::empty();
        if self.contains(Self::SPIRV) {
            backends |= wgpu::Backends::VULKAN;
        }
        if self.contains(Self::DXIL) {
            backends |= wgpu::Backends::DX12;
        }
        if self.contains(Self::MSL) {
            backends |= wgpu::Backends::METAL;
        }
        backends
    }
}

/// Backends known to the shell, in the order they are reported.
const KNOWN_BACKENDS: [(wgpu::Backend, wgpu::Backends); 5] = [
    (wgpu::Backend::Vulkan, wgpu::Backends::VULKAN),
    (wgpu::Backend::Metal, wgpu::Backends::METAL),
    (wgpu::Backend::Dx12, wgpu::Backends::DX12),
    (wgpu::Backend::Gl, wgpu::Backends::GL),
    (wgpu::Backend::BrowserWebGpu, wgpu::Backends::BROWSER_WEBGPU),
];

/// A named GPU backend driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuDriver {
    backend: wgpu::Backend,
}

impl GpuDriver {
    /// Look up a driver by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        KNOWN_BACKENDS
            .iter()
            .map(|&(backend, _)| Self { backend })
            .find(|driver| driver.name().eq_ignore_ascii_case(name.trim()))
    }

    /// The driver's wgpu backend.
    pub fn backend(self) -> wgpu::Backend {
        self.backend
    }

    /// The single-backend mask for this driver.
    pub fn backends(self) -> wgpu::Backends {
        KNOWN_BACKENDS
            .iter()
            .find(|(backend, _)| *backend == self.backend)
            .map(|&(_, mask)| mask)
            .unwrap_or(wgpu::Backends::empty())
    }

    /// Whether this driver can run shaders in at least one of `formats`.
    pub fn accepts(self, formats: ShaderFormats) -> bool {
        let mask = self.backends();
        !mask.is_empty() && formats.compatible_backends().contains(mask)
    }

    /// Lowercase driver name, e.g. `"vulkan"`.
    pub fn name(self) -> &'static str {
        self.backend.to_str()
    }
}

impl From<wgpu::Backend> for GpuDriver {
    fn from(backend: wgpu::Backend) -> Self {
        Self { backend }
    }
}

/// Drivers compiled into this build that accept `formats`, whether or not
/// hardware for them exists.
pub fn available_drivers(formats: ShaderFormats) -> Vec<GpuDriver> {
    drivers_in(wgpu::Instance::enabled_backend_features())
        .into_iter()
        .filter(|driver| driver.accepts(formats))
        .collect()
}

fn drivers_in(enabled: wgpu::Backends) -> Vec<GpuDriver> {
    KNOWN_BACKENDS
        .iter()
        .filter(|(_, mask)| enabled.contains(*mask))
        .map(|&(backend, _)| GpuDriver { backend })
        .collect()
}

/// Pick the first entry of `preferred` that names an available driver.
///
/// Returns `None` when nothing matches, including when `preferred` is empty,
/// in which case the platform chooses the driver.
pub fn select_preferred_driver<'a>(available: &[String], preferred: &'a [String]) -> Option<&'a str> {
    preferred
        .iter()
        .map(|p| p.trim())
        .find(|p| available.iter().any(|a| a.eq_ignore_ascii_case(p)))
}
