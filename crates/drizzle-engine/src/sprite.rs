//! Sprite sources and per-draw sprite options.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use image::RgbaImage;

use crate::paint::{BlendMode, Color};

/// Process-unique identity of a [`Texture`]; accelerated surfaces key their
/// GPU upload cache on it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureId(u64);

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Decoded straight-alpha RGBA8 image usable as a sprite source.
///
/// Cloning is cheap and keeps the same id, so clones share one GPU upload.
#[derive(Debug, Clone)]
pub struct Texture {
    id: TextureId,
    image: Arc<RgbaImage>,
}

impl Texture {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            id: TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)),
            image: Arc::new(image),
        }
    }

    /// Builds a texture from raw straight-alpha RGBA8 bytes.
    ///
    /// Returns `None` if `pixels.len() != width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, pixels).map(Self::new)
    }

    /// A `width x height` texture filled with one color.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let px = color_to_rgba8(color);
        Self::new(RgbaImage::from_pixel(width, height, image::Rgba(px)))
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Weak handle that dies once this texture and all its clones are dropped.
    #[inline]
    pub(crate) fn downgrade(&self) -> Weak<RgbaImage> {
        Arc::downgrade(&self.image)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Per-draw sprite settings.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SpriteOptions {
    /// Color filter multiplied into every texel (straight alpha).
    pub tint: Option<Color>,
    pub blend: BlendMode,
}

impl SpriteOptions {
    #[inline]
    pub fn tinted(tint: Color) -> Self {
        Self { tint: Some(tint), ..Self::default() }
    }

    #[inline]
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// Effective multiplier: tint (or white) with `global_alpha` folded into alpha.
    #[inline]
    pub fn modulation(&self, global_alpha: f32) -> Color {
        self.tint.unwrap_or(Color::WHITE).fade(global_alpha)
    }
}

/// Quantizes a straight-alpha color to RGBA8, rounding to nearest.
pub(crate) fn color_to_rgba8(c: Color) -> [u8; 4] {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [q(c.r), q(c.g), q(c.b), q(c.a)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_shared_by_clones() {
        let a = Texture::solid(1, 1, Color::RED);
        let b = Texture::solid(1, 1, Color::RED);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn from_rgba8_checks_length() {
        assert!(Texture::from_rgba8(2, 2, vec![0; 16]).is_some());
        assert!(Texture::from_rgba8(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn modulation_folds_global_alpha_into_tint() {
        let opts = SpriteOptions::tinted(Color::new(1.0, 0.5, 0.0, 0.5));
        assert_eq!(opts.modulation(0.5), Color::new(1.0, 0.5, 0.0, 0.25));
        assert_eq!(SpriteOptions::default().modulation(1.0), Color::WHITE);
    }

    #[test]
    fn color_to_rgba8_rounds_and_clamps() {
        assert_eq!(color_to_rgba8(Color::new(1.5, 0.5, -1.0, 1.0)), [255, 128, 0, 255]);
    }

    #[test]
    fn weak_handle_outlives_clones_only() {
        let tex = Texture::solid(1, 1, Color::WHITE);
        let weak = tex.downgrade();
        let clone = tex.clone();
        drop(tex);
        assert!(weak.upgrade().is_some());
        drop(clone);
        assert!(weak.upgrade().is_none());
    }
}
