//! Shared GPU types and utilities used by the rect and sprite pipelines.

use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;

// ── globals uniform ───────────────────────────────────────────────────────

/// Per-draw uniform: viewport for the NDC transform plus one color
/// (batch color for rects, tint for sprites).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct Globals {
    pub viewport: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
    pub color: [f32; 4],
}

impl Globals {
    #[inline]
    pub(super) fn new(viewport: Viewport, color: [f32; 4]) -> Self {
        Self {
            viewport: viewport.shader_size(),
            _pad: [0.0; 2],
            color,
        }
    }
}

const GLOBALS_SIZE: u64 = std::mem::size_of::<Globals>() as u64;

pub(super) fn globals_layout(device: &wgpu::Device, label: &'static str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(GLOBALS_SIZE),
            },
            count: None,
        }],
    })
}

pub(super) fn globals_buffer(device: &wgpu::Device, label: &'static str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: GLOBALS_SIZE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

// ── pipeline ──────────────────────────────────────────────────────────────

/// Triangle-list pipeline with `vs_main`/`fs_main` entry points and one color target.
pub(super) fn create_pipeline(
    device: &wgpu::Device,
    label: &'static str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

// ── pass ──────────────────────────────────────────────────────────────────

/// Begins a single-attachment pass on `view`.
pub(super) fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
    label: &'static str,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_match_wgsl_layout() {
        // vec2 + vec2 + vec4 = 32 bytes in WGSL uniform layout.
        assert_eq!(GLOBALS_SIZE, 32);
    }

    #[test]
    fn globals_clamp_degenerate_viewport() {
        let g = Globals::new(Viewport::new(0.0, 300.0), [1.0; 4]);
        assert_eq!(g.viewport, [1.0, 300.0]);
    }
}
