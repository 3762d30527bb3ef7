//! Immediate-mode fallback backend.
//!
//! Each primitive is rasterized straight into a CPU pixmap as soon as it is
//! drawn. There is no batching and no draw-call budget; `flush` has nothing to
//! do. The pixmap is exposed for the embedder to present or encode; only
//! offscreen canvases are accepted since nothing here can present to a window.

mod raster;

use image::RgbaImage;

use crate::batch::RenderStats;
use crate::coords::Rect;
use crate::error::InitError;
use crate::paint::Color;
use crate::sprite::{SpriteOptions, Texture};

use super::pixels::unpremultiply_in_place;
use super::{BackendKind, Canvas, RenderSurface};

/// Largest pixmap edge the fallback accepts.
pub const MAX_PIXMAP_DIMENSION: u32 = 16_384;

/// CPU backend drawing into a premultiplied RGBA8 pixmap.
#[derive(Debug)]
pub struct ImmediateSurface {
    pixmap: RgbaImage,
    global_alpha: f32,
    stats: RenderStats,
}

impl ImmediateSurface {
    /// Allocates a transparent pixmap matching `canvas`.
    ///
    /// Fails with [`InitError::InvalidCanvas`] for window canvases.
    pub fn new(canvas: &Canvas) -> Result<Self, InitError> {
        let (width, height) = pixmap_extent(canvas.offscreen_size())?;

        log::info!("immediate surface: {width}x{height} pixmap");

        Ok(Self {
            pixmap: RgbaImage::new(width, height),
            global_alpha: 1.0,
            stats: RenderStats::default(),
        })
    }

    /// Current pixels, premultiplied.
    #[inline]
    pub fn pixmap(&self) -> &RgbaImage {
        &self.pixmap
    }
}

impl RenderSurface for ImmediateSurface {
    fn backend(&self) -> BackendKind {
        BackendKind::Immediate
    }

    fn is_initialized(&self) -> bool {
        true
    }

    fn size(&self) -> (u32, u32) {
        self.pixmap.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.pixmap.dimensions() == (width, height) || check_extent(width, height).is_err() {
            return;
        }
        self.pixmap = RgbaImage::new(width, height);
    }

    fn begin_frame(&mut self, clear: Option<Color>) {
        if let Some(color) = clear {
            raster::clear(&mut self.pixmap, color);
        }
    }

    fn end_frame(&mut self) {}

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        raster::fill_rect(&mut self.pixmap, rect, color.fade(self.global_alpha));
        self.stats.record_rect();
        self.stats.record_draw_call();
    }

    fn draw_sprite(&mut self, texture: &Texture, dest: Rect, options: SpriteOptions) {
        raster::draw_sprite(
            &mut self.pixmap,
            texture.image(),
            dest,
            options.modulation(self.global_alpha),
            options.blend,
        );
        self.stats.record_sprite();
        self.stats.record_draw_call();
    }

    fn global_alpha(&self) -> f32 {
        self.global_alpha
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.global_alpha = if alpha.is_nan() { 1.0 } else { alpha.clamp(0.0, 1.0) };
    }

    fn flush(&mut self) {}

    fn stats(&self) -> RenderStats {
        self.stats
    }

    fn reset_stats(&mut self) {
        self.stats.reset();
    }

    fn read_pixels(&mut self) -> anyhow::Result<RgbaImage> {
        let mut out = self.pixmap.clone();
        unpremultiply_in_place(&mut out);
        Ok(out)
    }

    fn dispose(self: Box<Self>) {
        log::debug!("immediate surface disposed");
    }
}

fn pixmap_extent(offscreen: Option<(u32, u32)>) -> Result<(u32, u32), InitError> {
    let Some((width, height)) = offscreen else {
        return Err(InitError::InvalidCanvas(
            "immediate backend cannot present to a window".into(),
        ));
    };
    check_extent(width, height)?;
    Ok((width, height))
}

fn check_extent(width: u32, height: u32) -> Result<(), InitError> {
    if width == 0 || height == 0 {
        return Err(InitError::InvalidCanvas(format!("zero-sized canvas {width}x{height}")));
    }
    if width > MAX_PIXMAP_DIMENSION || height > MAX_PIXMAP_DIMENSION {
        return Err(InitError::InvalidCanvas(format!(
            "canvas {width}x{height} exceeds pixmap limit {MAX_PIXMAP_DIMENSION}"
        )));
    }
    Ok(())
}
