//! Backend surface contract and its two implementations.
//!
//! Every backend exposes the same drawing API through [`RenderSurface`];
//! callers hold a `Box<dyn RenderSurface>` from
//! [`create_renderer`](crate::select::create_renderer) and never need to know
//! which variant they got.
//!
//! - [`AcceleratedSurface`]: wgpu, batched rectangles, one draw call per batch
//! - [`ImmediateSurface`]: CPU pixmap, one rasterization per primitive

pub mod accelerated;
pub mod immediate;
mod pixels;

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use winit::window::Window;

use crate::batch::RenderStats;
use crate::coords::Rect;
use crate::paint::Color;
use crate::sprite::{SpriteOptions, Texture};

pub use accelerated::AcceleratedSurface;
pub use immediate::ImmediateSurface;

/// The drawable a surface is initialized against.
#[derive(Debug, Clone)]
pub enum Canvas {
    /// A `width x height` pixel buffer owned by the surface.
    Offscreen { width: u32, height: u32 },
    /// A window; the accelerated backend presents into its swapchain. The
    /// immediate backend has no presenter and rejects it.
    Window(Arc<Window>),
}

impl Canvas {
    #[inline]
    pub fn offscreen(width: u32, height: u32) -> Self {
        Canvas::Offscreen { width, height }
    }

    #[inline]
    pub fn window(window: Arc<Window>) -> Self {
        Canvas::Window(window)
    }

    /// Size of an offscreen canvas; `None` for windows.
    #[inline]
    pub fn offscreen_size(&self) -> Option<(u32, u32)> {
        match self {
            Canvas::Offscreen { width, height } => Some((*width, *height)),
            Canvas::Window(_) => None,
        }
    }

    /// Current size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        match self {
            Canvas::Offscreen { width, height } => (*width, *height),
            Canvas::Window(w) => {
                let size = w.inner_size();
                (size.width, size.height)
            }
        }
    }
}

/// Which backend a surface is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BackendKind {
    Accelerated,
    Immediate,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Accelerated => "accelerated",
            BackendKind::Immediate => "immediate",
        })
    }
}

/// Drawing API shared by all backends.
///
/// Coordinates are canvas pixels, top-left origin, +Y down. Drawing methods
/// never fail; a lost context shows up as `is_initialized() == false`.
/// Surfaces are single-threaded and must stay on the thread that owns the
/// drawable.
pub trait RenderSurface {
    fn backend(&self) -> BackendKind;

    /// `true` while the surface initialized and its context is still usable.
    fn is_initialized(&self) -> bool;

    /// Drawable size in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Reconfigures the drawable. Pending work is flushed first; zero sizes are ignored.
    fn resize(&mut self, width: u32, height: u32);

    /// Starts a frame, clearing the drawable to `clear` when given.
    fn begin_frame(&mut self, clear: Option<Color>);

    /// Flushes pending work and finalizes/presents the frame.
    fn end_frame(&mut self);

    /// Draws a filled rectangle. Degenerate rects are accepted and draw nothing visible.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draws `texture` stretched over `dest`.
    fn draw_sprite(&mut self, texture: &Texture, dest: Rect, options: SpriteOptions);

    fn global_alpha(&self) -> f32;

    /// Sets the alpha multiplier applied to every later primitive.
    fn set_global_alpha(&mut self, alpha: f32);

    /// Forces pending work out to the drawable.
    fn flush(&mut self);

    fn stats(&self) -> RenderStats;

    fn reset_stats(&mut self);

    /// Straight-alpha RGBA8 snapshot of the drawable. Flushes first.
    fn read_pixels(&mut self) -> anyhow::Result<RgbaImage>;

    /// Releases every owned resource. Pending work is *not* flushed.
    fn dispose(self: Box<Self>);
}
