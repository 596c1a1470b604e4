//! Presentation policy: present mode negotiation and swapchain composition.

/// How rendered frames are handed to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    /// Wait for vertical blank; always supported.
    Vsync,
    /// Low-latency triple buffering: the newest frame replaces any queued one.
    Mailbox,
}

impl PresentMode {
    pub fn to_wgpu(self) -> wgpu::PresentMode {
        match self {
            Self::Vsync => wgpu::PresentMode::Fifo,
            Self::Mailbox => wgpu::PresentMode::Mailbox,
        }
    }
}

/// Color space and bit depth of the swapchain textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwapchainComposition {
    /// 8-bit sRGB; what the display expects for standard dynamic range.
    #[default]
    Sdr,
}

/// Prefer mailbox when allowed and supported, otherwise vsync.
pub fn negotiate_present_mode(
    prefer_low_latency: bool,
    supports: impl Fn(PresentMode) -> bool,
) -> PresentMode {
    if prefer_low_latency && supports(PresentMode::Mailbox) {
        PresentMode::Mailbox
    } else {
        PresentMode::Vsync
    }
}

/// Select the surface format matching `composition`.
///
/// Returns `None` if the surface reports no formats at all.
pub fn select_surface_format(
    formats: &[wgpu::TextureFormat],
    composition: SwapchainComposition,
) -> Option<wgpu::TextureFormat> {
    let preferred: &[wgpu::TextureFormat] = match composition {
        SwapchainComposition::Sdr => &[
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ],
    };

    preferred
        .iter()
        .copied()
        .find(|f| formats.contains(f))
        .or_else(|| formats.iter().copied().find(|f| f.is_srgb()))
        .or_else(|| formats.first().copied())
}
