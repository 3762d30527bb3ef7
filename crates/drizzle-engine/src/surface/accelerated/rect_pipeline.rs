use crate::batch::{BatchDraw, BatchSink, FLOATS_PER_RECT, FLOATS_PER_VERTEX, MAX_BATCH_SIZE_LIMIT};
use crate::coords::Viewport;
use crate::device::{Gpu, RenderTarget};
use crate::paint::BlendMode;

use super::common::{begin_pass, create_pipeline, globals_buffer, globals_layout, Globals};

/// GPU side of the rectangle batcher.
///
/// Owns the program, the color/viewport uniform and one vertex buffer sized
/// for a full batch. The vertex buffer is created once and never grown; each
/// flush overwrites its prefix.
pub(crate) struct RectPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    globals_ubo: wgpu::Buffer,
    vertex_vbo: wgpu::Buffer,
    max_rects: usize,
}

impl RectPipeline {
    pub(crate) fn new(device: &wgpu::Device, format: wgpu::TextureFormat, max_rects: usize) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("drizzle rect shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/rect.wgsl").into()),
        });

        let bind_group_layout = globals_layout(device, "drizzle rect bgl");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("drizzle rect pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = create_pipeline(
            device,
            "drizzle rect pipeline",
            &pipeline_layout,
            &shader,
            &[vertex_layout()],
            format,
            BlendMode::Normal.to_wgpu(),
        );

        let globals_ubo = globals_buffer(device, "drizzle rect globals ubo");

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("drizzle rect bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_ubo.as_entire_binding(),
            }],
        });

        let vertex_vbo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("drizzle rect vbo"),
            size: (max_rects * FLOATS_PER_RECT * std::mem::size_of::<f32>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::debug!("rect pipeline ready: {max_rects} rects per batch, {format:?}");

        Self {
            pipeline,
            bind_group,
            globals_ubo,
            vertex_vbo,
            max_rects,
        }
    }

    /// Uploads one batch and records + submits its single draw call.
    ///
    /// Each batch is submitted on its own so the next batch's buffer writes
    /// are ordered after this draw.
    pub(crate) fn draw(
        &self,
        gpu: &Gpu,
        view: &wgpu::TextureView,
        viewport: Viewport,
        batch: &BatchDraw<'_>,
    ) {
        debug_assert!(batch.rect_count <= self.max_rects);
        let bytes: &[u8] = bytemuck::cast_slice(batch.vertices);

        let globals = Globals::new(viewport, batch.color);
        gpu.queue().write_buffer(&self.globals_ubo, 0, bytemuck::bytes_of(&globals));
        gpu.queue().write_buffer(&self.vertex_vbo, 0, bytes);

        let mut encoder = gpu.encoder("drizzle rect batch encoder");
        {
            let mut rpass = begin_pass(&mut encoder, view, wgpu::LoadOp::Load, "drizzle rect pass");
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.vertex_vbo.slice(..bytes.len() as u64));
            rpass.draw(0..batch.vertex_count(), 0..1);
        }
        gpu.submit(encoder);
    }

    /// Releases the vertex and uniform buffers.
    pub(crate) fn destroy(&self) {
        self.vertex_vbo.destroy();
        self.globals_ubo.destroy();
    }
}

const RECT_BYTES: u64 = (FLOATS_PER_RECT * std::mem::size_of::<f32>()) as u64;

/// Largest batch, at most `requested`, whose vertex buffer fits in
/// `max_buffer_size` bytes. Never below one rect.
pub(crate) fn fit_batch_to_device(requested: usize, max_buffer_size: u64) -> usize {
    let requested = requested.clamp(1, MAX_BATCH_SIZE_LIMIT);
    match (requested as u64).checked_mul(RECT_BYTES) {
        Some(bytes) if bytes <= max_buffer_size => requested,
        _ => {
            let fitted = usize::try_from(max_buffer_size / RECT_BYTES)
                .unwrap_or(requested)
                .clamp(1, requested);
            log::warn!(
                "batch of {requested} rects exceeds the device buffer limit \
                 ({max_buffer_size} bytes); using {fitted}"
            );
            fitted
        }
    }
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRS,
    }
}

/// [`BatchSink`] that draws into the surface's target.
///
/// The drawable is acquired only when a batch is actually drawn. Batches are
/// dropped when no frame can be acquired or the device is lost.
pub(crate) struct RectSink<'a> {
    gpu: &'a Gpu,
    pipeline: &'a RectPipeline,
    target: &'a mut RenderTarget,
}

impl<'a> RectSink<'a> {
    pub(crate) fn new(gpu: &'a Gpu, pipeline: &'a RectPipeline, target: &'a mut RenderTarget) -> Self {
        Self { gpu, pipeline, target }
    }
}

impl BatchSink for RectSink<'_> {
    fn draw_batch(&mut self, batch: &BatchDraw<'_>) {
        if self.gpu.is_lost() || !self.target.acquire(self.gpu) {
            log::trace!("no drawable; dropped batch of {} rects", batch.rect_count);
            return;
        }
        let (width, height) = self.target.size();
        if let Some(view) = self.target.view() {
            self.pipeline.draw(self.gpu, view, Viewport::from_physical(width, height), batch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_within_limit_is_kept() {
        assert_eq!(fit_batch_to_device(10_000, 256 << 20), 10_000);
        assert_eq!(fit_batch_to_device(0, 256 << 20), 1);
    }

    #[test]
    fn batch_over_device_limit_is_shrunk() {
        // 48 bytes per rect.
        assert_eq!(fit_batch_to_device(1_000, 480), 10);
        assert_eq!(fit_batch_to_device(8_000_000, 1 << 20), (1 << 20) / 48);
    }

    #[test]
    fn huge_requests_do_not_overflow() {
        assert_eq!(fit_batch_to_device(usize::MAX, u64::MAX), MAX_BATCH_SIZE_LIMIT);
        assert_eq!(fit_batch_to_device(usize::MAX, 0), 1);
    }
}
