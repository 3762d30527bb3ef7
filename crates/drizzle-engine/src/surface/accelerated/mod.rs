//! wgpu backend.
//!
//! Rectangles go through [`RectBatch`] and reach the GPU one batch per draw
//! call. Sprites are unbatched: the pending rect batch is flushed, then the
//! sprite is drawn with its own call.

mod common;
mod readback;
mod rect_pipeline;
mod sprite_pipeline;

use anyhow::bail;
use image::RgbaImage;

use crate::batch::{RectBatch, RenderStats};
use crate::config::RendererConfig;
use crate::coords::{Rect, Viewport};
use crate::device::{Gpu, RenderTarget};
use crate::error::InitError;
use crate::paint::Color;
use crate::sprite::{SpriteOptions, Texture, TextureId};

use self::common::begin_pass;
use self::rect_pipeline::{fit_batch_to_device, RectPipeline, RectSink};
use self::sprite_pipeline::SpritePipeline;

use super::{BackendKind, Canvas, RenderSurface};

/// GPU surface drawing into an offscreen texture or a window swapchain.
pub struct AcceleratedSurface {
    gpu: Gpu,
    target: RenderTarget,
    batch: RectBatch,
    rects: RectPipeline,
    sprites: SpritePipeline,
}

impl AcceleratedSurface {
    /// Brings up a device and drawable for `canvas`.
    ///
    /// Fails with [`InitError::Disabled`] when `config.allow_acceleration` is off.
    pub fn new(canvas: &Canvas, config: &RendererConfig) -> Result<Self, InitError> {
        if !config.allow_acceleration {
            return Err(InitError::Disabled(BackendKind::Accelerated));
        }

        let window = match canvas {
            Canvas::Window(w) => Some(w.clone()),
            Canvas::Offscreen { .. } => None,
        };
        let (gpu, surface) = Gpu::new_blocking(&config.gpu, window)?;

        let target = match (canvas, surface) {
            (Canvas::Window(w), Some(surface)) => {
                RenderTarget::window(&gpu, &config.gpu, w.clone(), surface)?
            }
            (Canvas::Window(_), None) => {
                return Err(InitError::Surface("window surface was not created".into()));
            }
            (Canvas::Offscreen { width, height }, _) => {
                RenderTarget::offscreen(&gpu, *width, *height)?
            }
        };

        let max_rects =
            fit_batch_to_device(config.max_batch_size, gpu.device().limits().max_buffer_size);
        let batch = RectBatch::new(max_rects);
        let rects = RectPipeline::new(gpu.device(), target.format(), batch.capacity());
        let sprites = SpritePipeline::new(gpu.device(), target.format());

        let (width, height) = target.size();
        log::info!(
            "accelerated surface: {width}x{height} {:?}, {} rects per batch",
            target.format(),
            batch.capacity()
        );

        Ok(Self {
            gpu,
            target,
            batch,
            rects,
            sprites,
        })
    }

    #[inline]
    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Drops the GPU copy of a sprite texture. The next draw re-uploads it.
    pub fn forget_texture(&mut self, id: TextureId) {
        self.sprites.forget_texture(id);
    }

    /// Number of sprite textures currently resident on the GPU.
    pub fn cached_textures(&self) -> usize {
        self.sprites.cached_textures()
    }
}

impl RenderSurface for AcceleratedSurface {
    fn backend(&self) -> BackendKind {
        BackendKind::Accelerated
    }

    fn is_initialized(&self) -> bool {
        !self.gpu.is_lost()
    }

    fn size(&self) -> (u32, u32) {
        self.target.size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.flush();
        self.target.resize(&self.gpu, width, height);
    }

    fn begin_frame(&mut self, clear: Option<Color>) {
        self.flush();
        self.target.reopen();
        let Some(color) = clear else { return };
        if self.gpu.is_lost() || !self.target.acquire(&self.gpu) {
            return;
        }
        let Some(view) = self.target.view() else { return };

        let mut encoder = self.gpu.encoder("drizzle clear encoder");
        drop(begin_pass(
            &mut encoder,
            view,
            wgpu::LoadOp::Clear(color.to_wgpu()),
            "drizzle clear pass",
        ));
        self.gpu.submit(encoder);
    }

    fn end_frame(&mut self) {
        self.flush();
        self.target.present();
        self.sprites.prune_dropped();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let mut sink = RectSink::new(&self.gpu, &self.rects, &mut self.target);
        self.batch.push(rect, color, &mut sink);
    }

    fn draw_sprite(&mut self, texture: &Texture, dest: Rect, options: SpriteOptions) {
        self.flush();

        let stats = self.batch.stats_mut();
        stats.record_sprite();
        stats.record_draw_call();

        if self.gpu.is_lost() || !self.target.acquire(&self.gpu) {
            return;
        }
        let (width, height) = self.target.size();
        let Some(view) = self.target.view() else { return };

        let modulation = options.modulation(self.batch.global_alpha());
        self.sprites.draw(
            &self.gpu,
            view,
            Viewport::from_physical(width, height),
            texture,
            dest,
            modulation,
            options.blend,
        );
    }

    fn global_alpha(&self) -> f32 {
        self.batch.global_alpha()
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        let mut sink = RectSink::new(&self.gpu, &self.rects, &mut self.target);
        self.batch.set_global_alpha(alpha, &mut sink);
    }

    fn flush(&mut self) {
        if !self.batch.is_pending() {
            return;
        }
        let mut sink = RectSink::new(&self.gpu, &self.rects, &mut self.target);
        self.batch.flush(&mut sink);
    }

    fn stats(&self) -> RenderStats {
        self.batch.stats()
    }

    fn reset_stats(&mut self) {
        self.batch.reset_stats();
    }

    fn read_pixels(&mut self) -> anyhow::Result<RgbaImage> {
        self.flush();
        if self.gpu.is_lost() {
            bail!("graphics device lost");
        }
        match self.target.readable_texture() {
            Some(texture) => readback::read_texture(&self.gpu, texture),
            None => bail!("window canvases cannot be read back"),
        }
    }

    fn dispose(self: Box<Self>) {
        let Self {
            gpu,
            target,
            rects,
            mut sprites,
            ..
        } = *self;
        rects.destroy();
        sprites.destroy();
        target.destroy();
        gpu.device().destroy();
        log::debug!("accelerated surface disposed");
    }
}
