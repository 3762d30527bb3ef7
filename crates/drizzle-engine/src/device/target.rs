use std::sync::Arc;

use winit::window::Window;

use crate::error::InitError;

use super::{Gpu, GpuInit, SurfaceErrorAction};

/// Format of offscreen canvases. Linear storage, matching the immediate backend.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Where the accelerated backend draws.
///
/// - `Offscreen`: a texture owned by the surface; always drawable and readable.
/// - `Window`: a swapchain; a frame texture is acquired lazily on first use
///   and presented by [`present`](Self::present).
pub enum RenderTarget {
    Offscreen(OffscreenTarget),
    Window(WindowTarget),
}

pub struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

pub struct WindowTarget {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    frame: Option<AcquiredFrame>,
    gate: FrameGate,
}

/// Whether the swapchain may still be asked for a frame this frame.
///
/// A failed acquisition closes the gate until the frame ends, so later draws
/// drop their work instead of blocking on the swapchain again.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
enum FrameGate {
    #[default]
    Open,
    Skipped,
}

impl FrameGate {
    #[inline]
    fn allows_acquire(self) -> bool {
        self == FrameGate::Open
    }
}

/// Represents a single acquired swapchain frame.
///
/// This object is short-lived. Holding the surface texture prevents
/// acquisition of subsequent frames.
struct AcquiredFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    /// Creates an offscreen texture target.
    pub fn offscreen(gpu: &Gpu, width: u32, height: u32) -> Result<Self, InitError> {
        check_extent(gpu, width, height)?;
        Ok(RenderTarget::Offscreen(OffscreenTarget::new(gpu, width, height)))
    }

    /// Configures `surface` for `window`.
    pub fn window(
        gpu: &Gpu,
        init: &GpuInit,
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
    ) -> Result<Self, InitError> {
        let size = window.inner_size();
        check_extent(gpu, size.width, size.height)?;

        let caps = surface.get_capabilities(gpu.adapter());
        let format = choose_surface_format(&caps, init.prefer_srgb)
            .ok_or_else(|| InitError::Surface("no supported surface formats".into()))?;
        let alpha_mode = choose_alpha_mode(&caps, init.alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(gpu.device(), &config);
        log::debug!("window surface configured: {}x{} {:?}", size.width, size.height, format);

        Ok(RenderTarget::Window(WindowTarget {
            window,
            surface,
            config,
            frame: None,
            gate: FrameGate::Open,
        }))
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match self {
            RenderTarget::Offscreen(t) => t.texture.format(),
            RenderTarget::Window(t) => t.config.format,
        }
    }

    /// Drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        match self {
            RenderTarget::Offscreen(t) => (t.texture.width(), t.texture.height()),
            RenderTarget::Window(t) => (t.config.width, t.config.height),
        }
    }

    /// Reconfigures the drawable. Zero sizes are ignored (minimized windows).
    pub fn resize(&mut self, gpu: &Gpu, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let max = gpu.max_texture_dimension();
        let (width, height) = (width.min(max), height.min(max));

        match self {
            RenderTarget::Offscreen(t) => *t = OffscreenTarget::new(gpu, width, height),
            RenderTarget::Window(t) => {
                t.frame = None;
                t.gate = FrameGate::Open;
                t.config.width = width;
                t.config.height = height;
                t.surface.configure(gpu.device(), &t.config);
            }
        }
    }

    /// Makes sure a drawable view exists, acquiring a swapchain frame if needed.
    ///
    /// Returns `false` when no frame could be acquired; the caller drops the
    /// work for this frame.
    pub fn acquire(&mut self, gpu: &Gpu) -> bool {
        match self {
            RenderTarget::Offscreen(_) => true,
            RenderTarget::Window(t) => t.acquire(gpu),
        }
    }

    /// The current drawable view, if one is acquired.
    pub fn view(&self) -> Option<&wgpu::TextureView> {
        match self {
            RenderTarget::Offscreen(t) => Some(&t.view),
            RenderTarget::Window(t) => t.frame.as_ref().map(|f| &f.view),
        }
    }

    /// Allows acquisition again after a skipped frame. No-op offscreen.
    pub fn reopen(&mut self) {
        if let RenderTarget::Window(t) = self {
            t.gate = FrameGate::Open;
        }
    }

    /// Presents the acquired swapchain frame, if any, and ends the frame.
    /// No-op offscreen.
    pub fn present(&mut self) {
        if let RenderTarget::Window(t) = self {
            t.gate = FrameGate::Open;
            if let Some(frame) = t.frame.take() {
                t.window.pre_present_notify();
                drop(frame.view);
                frame.surface_texture.present();
            }
        }
    }

    /// The texture backing an offscreen canvas; `None` for windows.
    pub fn readable_texture(&self) -> Option<&wgpu::Texture> {
        match self {
            RenderTarget::Offscreen(t) => Some(&t.texture),
            RenderTarget::Window(_) => None,
        }
    }

    /// Releases the GPU texture or drops the pending swapchain frame.
    pub fn destroy(self) {
        match self {
            RenderTarget::Offscreen(t) => t.texture.destroy(),
            RenderTarget::Window(mut t) => {
                t.frame = None;
            }
        }
    }
}

impl OffscreenTarget {
    fn new(gpu: &Gpu, width: u32, height: u32) -> Self {
        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("drizzle offscreen canvas"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

impl WindowTarget {
    fn acquire(&mut self, gpu: &Gpu) -> bool {
        if self.frame.is_some() {
            return true;
        }
        if !self.gate.allows_acquire() {
            return false;
        }

        // One retry after a reconfigure; a second failure skips the frame.
        for _ in 0..2 {
            match self.surface.get_current_texture() {
                Ok(surface_texture) => {
                    let view = surface_texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    self.frame = Some(AcquiredFrame { surface_texture, view });
                    return true;
                }
                Err(err) => match SurfaceErrorAction::from_error(&err) {
                    SurfaceErrorAction::Reconfigured => {
                        log::debug!("surface {err}; reconfiguring");
                        self.surface.configure(gpu.device(), &self.config);
                    }
                    SurfaceErrorAction::SkipFrame => {
                        log::debug!("surface {err}; skipping frame");
                        self.gate = FrameGate::Skipped;
                        return false;
                    }
                    SurfaceErrorAction::Fatal => {
                        log::error!("surface {err}; marking context lost");
                        gpu.mark_lost();
                        self.gate = FrameGate::Skipped;
                        return false;
                    }
                },
            }
        }
        self.gate = FrameGate::Skipped;
        false
    }
}

fn check_extent(gpu: &Gpu, width: u32, height: u32) -> Result<(), InitError> {
    let max = gpu.max_texture_dimension();
    if width == 0 || height == 0 {
        return Err(InitError::InvalidCanvas(format!("zero-sized canvas {width}x{height}")));
    }
    if width > max || height > max {
        return Err(InitError::InvalidCanvas(format!(
            "canvas {width}x{height} exceeds device limit {max}"
        )));
    }
    Ok(())
}

fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    caps.formats
        .iter()
        .copied()
        .find(|f| f.is_srgb() == prefer_srgb)
        .or_else(|| caps.formats.first().copied())
}

fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: Vec<wgpu::TextureFormat>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
            ..Default::default()
        }
    }

    #[test]
    fn frame_gate_starts_open_and_closes_on_skip() {
        assert!(FrameGate::default().allows_acquire());
        assert!(!FrameGate::Skipped.allows_acquire());
    }

    #[test]
    fn picks_linear_format_by_default() {
        let c = caps(vec![
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Bgra8Unorm,
        ]);
        assert_eq!(choose_surface_format(&c, false), Some(wgpu::TextureFormat::Bgra8Unorm));
        assert_eq!(choose_surface_format(&c, true), Some(wgpu::TextureFormat::Bgra8UnormSrgb));
    }

    #[test]
    fn falls_back_to_first_format() {
        let c = caps(vec![wgpu::TextureFormat::Bgra8UnormSrgb]);
        assert_eq!(choose_surface_format(&c, false), Some(wgpu::TextureFormat::Bgra8UnormSrgb));
        assert_eq!(choose_surface_format(&caps(vec![]), false), None);
    }

    #[test]
    fn unsupported_alpha_mode_is_replaced() {
        let c = caps(vec![wgpu::TextureFormat::Bgra8Unorm]);
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
        assert_eq!(choose_alpha_mode(&c, None), wgpu::CompositeAlphaMode::Opaque);
    }
}
