//! Clear-only render pass.

/// Opaque red, the shell's default clear color.
pub const OPAQUE_RED: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// A render pass with a single color attachment that is cleared and stored,
/// with no draw calls.
#[derive(Debug, Clone, Copy)]
pub struct ClearPass {
    color: wgpu::Color,
}

impl Default for ClearPass {
    fn default() -> Self {
        Self::new(OPAQUE_RED)
    }
}

impl ClearPass {
    pub fn new(color: wgpu::Color) -> Self {
        Self { color }
    }

    pub fn color(&self) -> wgpu::Color {
        self.color
    }

    fn color_attachment<'a>(
        &self,
        view: &'a wgpu::TextureView,
    ) -> wgpu::RenderPassColorAttachment<'a> {
        wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(self.color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        }
    }

    /// Begin the pass on `view` and end it immediately.
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let descriptor = wgpu::RenderPassDescriptor {
            label: Some("clear-pass"),
            color_attachments: &[Some(self.color_attachment(view))],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        };

        // Dropping the pass ends it.
        drop(encoder.begin_render_pass(&descriptor));
    }
}

/// Convert a config RGBA array into a clear color.
impl From<[f64; 4]> for ClearPass {
    fn from([r, g, b, a]: [f64; 4]) -> Self {
        Self::new(wgpu::Color { r, g, b, a })
    }
}
