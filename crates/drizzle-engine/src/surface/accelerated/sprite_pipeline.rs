use std::collections::HashMap;
use std::sync::Weak;

use bytemuck::{Pod, Zeroable};
use image::RgbaImage;

use crate::coords::{Rect, Viewport};
use crate::device::Gpu;
use crate::paint::{BlendMode, Color};
use crate::sprite::{Texture, TextureId};

use super::common::{begin_pass, create_pipeline, globals_buffer, globals_layout, Globals};

const SPRITE_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Unbatched textured-quad renderer: one draw call per sprite.
///
/// Pipelines are built lazily per blend mode. Uploaded textures are cached by
/// [`TextureId`] until forgotten, until every clone of the source
/// [`Texture`] is dropped (see [`prune_dropped`](Self::prune_dropped)), or
/// until the surface is disposed.
pub(crate) struct SpritePipeline {
    format: wgpu::TextureFormat,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    texture_bgl: wgpu::BindGroupLayout,
    pipelines: [Option<wgpu::RenderPipeline>; 3],

    globals_ubo: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    quad_vbo: wgpu::Buffer,
    sampler: wgpu::Sampler,

    textures: HashMap<TextureId, GpuTexture>,
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    owner: Weak<RgbaImage>,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct SpriteVertex {
    pos: [f32; 2],
    uv: [f32; 2],
}

impl SpriteVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2  // uv
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Same corner order as batched rects: TL, TR, BL, TR, BR, BL.
fn quad_vertices(dest: Rect) -> [SpriteVertex; 6] {
    let (x0, y0, x1, y1) = (dest.x, dest.y, dest.right(), dest.bottom());
    let v = |x, y, u, w| SpriteVertex { pos: [x, y], uv: [u, w] };
    [
        v(x0, y0, 0.0, 0.0),
        v(x1, y0, 1.0, 0.0),
        v(x0, y1, 0.0, 1.0),
        v(x1, y0, 1.0, 0.0),
        v(x1, y1, 1.0, 1.0),
        v(x0, y1, 0.0, 1.0),
    ]
}

impl SpritePipeline {
    pub(crate) fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("drizzle sprite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sprite.wgsl").into()),
        });

        let globals_bgl = globals_layout(device, "drizzle sprite globals bgl");

        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("drizzle sprite texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("drizzle sprite pipeline layout"),
            bind_group_layouts: &[&globals_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let globals_ubo = globals_buffer(device, "drizzle sprite globals ubo");
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("drizzle sprite globals bind group"),
            layout: &globals_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_ubo.as_entire_binding(),
            }],
        });

        let quad_vbo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("drizzle sprite quad vbo"),
            size: std::mem::size_of::<[SpriteVertex; 6]>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Nearest sampling, clamped: matches the immediate rasterizer.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("drizzle sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        Self {
            format,
            shader,
            pipeline_layout,
            texture_bgl,
            pipelines: [None, None, None],
            globals_ubo,
            globals_bind_group,
            quad_vbo,
            sampler,
            textures: HashMap::new(),
        }
    }

    /// Draws `texture` over `dest` as one submitted draw call.
    ///
    /// `modulation` is the tint with global alpha already folded in.
    pub(crate) fn draw(
        &mut self,
        gpu: &Gpu,
        view: &wgpu::TextureView,
        viewport: Viewport,
        texture: &Texture,
        dest: Rect,
        modulation: Color,
        blend: BlendMode,
    ) {
        // Mutating methods must happen before borrowing pipeline/textures immutably.
        self.ensure_pipeline(gpu.device(), blend);
        if !self.ensure_texture(gpu, texture) {
            return;
        }

        let Some(pipeline) = self.pipelines[blend.index()].as_ref() else { return };
        let Some(gpu_texture) = self.textures.get(&texture.id()) else { return };

        let globals = Globals::new(viewport, modulation.to_array());
        gpu.queue().write_buffer(&self.globals_ubo, 0, bytemuck::bytes_of(&globals));
        gpu.queue()
            .write_buffer(&self.quad_vbo, 0, bytemuck::cast_slice(&quad_vertices(dest)));

        let mut encoder = gpu.encoder("drizzle sprite encoder");
        {
            let mut rpass = begin_pass(&mut encoder, view, wgpu::LoadOp::Load, "drizzle sprite pass");
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &self.globals_bind_group, &[]);
            rpass.set_bind_group(1, &gpu_texture.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
            rpass.draw(0..6, 0..1);
        }
        gpu.submit(encoder);
    }

    /// Drops the cached upload for `id`, if any.
    pub(crate) fn forget_texture(&mut self, id: TextureId) {
        if let Some(t) = self.textures.remove(&id) {
            t.texture.destroy();
        }
    }

    pub(crate) fn cached_textures(&self) -> usize {
        self.textures.len()
    }

    /// Destroys uploads whose source texture no longer exists.
    pub(crate) fn prune_dropped(&mut self) {
        let before = self.textures.len();
        self.textures.retain(|_, t| {
            let live = t.owner.strong_count() > 0;
            if !live {
                t.texture.destroy();
            }
            live
        });
        let pruned = before - self.textures.len();
        if pruned > 0 {
            log::trace!("released {pruned} sprite textures");
        }
    }

    /// Releases cached textures and buffers.
    pub(crate) fn destroy(&mut self) {
        for (_, t) in self.textures.drain() {
            t.texture.destroy();
        }
        self.quad_vbo.destroy();
        self.globals_ubo.destroy();
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, blend: BlendMode) {
        let slot = &mut self.pipelines[blend.index()];
        if slot.is_some() {
            return;
        }
        log::debug!("building sprite pipeline for {blend:?}");
        *slot = Some(create_pipeline(
            device,
            "drizzle sprite pipeline",
            &self.pipeline_layout,
            &self.shader,
            &[SpriteVertex::layout()],
            self.format,
            blend.to_wgpu(),
        ));
    }

    /// Uploads `texture` once. Returns `false` if it cannot be drawn.
    fn ensure_texture(&mut self, gpu: &Gpu, texture: &Texture) -> bool {
        if self.textures.contains_key(&texture.id()) {
            return true;
        }

        let (width, height) = (texture.width(), texture.height());
        let max = gpu.max_texture_dimension();
        if texture.is_empty() || width > max || height > max {
            log::warn!("sprite texture {width}x{height} cannot be uploaded (limit {max}); skipped");
            return false;
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let gpu_tex = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("drizzle sprite texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SPRITE_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu_tex,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texture.image().as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = gpu_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("drizzle sprite texture bind group"),
            layout: &self.texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        self.textures.insert(
            texture.id(),
            GpuTexture {
                texture: gpu_tex,
                bind_group,
                owner: texture.downgrade(),
            },
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_corners_follow_rect_winding() {
        let v = quad_vertices(Rect::new(2.0, 3.0, 4.0, 5.0));
        let pos: Vec<[f32; 2]> = v.iter().map(|v| v.pos).collect();
        assert_eq!(
            pos,
            vec![[2.0, 3.0], [6.0, 3.0], [2.0, 8.0], [6.0, 3.0], [6.0, 8.0], [2.0, 8.0]]
        );
    }

    #[test]
    fn quad_uvs_span_whole_texture() {
        let v = quad_vertices(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(v[0].uv, [0.0, 0.0]);
        assert_eq!(v[4].uv, [1.0, 1.0]);
    }

    #[test]
    fn vertex_stride_is_four_floats() {
        assert_eq!(SpriteVertex::layout().array_stride, 16);
    }
}
