//! Scalar rasterizer for the immediate backend.
//!
//! The pixmap stores premultiplied RGBA8. Coverage follows the pixel-center
//! rule of [`Rect::pixel_span`], so output matches the accelerated backend's
//! triangle rasterization for axis-aligned quads.

use image::RgbaImage;

use crate::coords::Rect;
use crate::paint::{BlendMode, Color};

#[inline]
fn load(px: &image::Rgba<u8>) -> [f32; 4] {
    let [r, g, b, a] = px.0;
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0]
}

#[inline]
fn store(px: &mut image::Rgba<u8>, v: [f32; 4]) {
    let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    px.0 = [q(v[0]), q(v[1]), q(v[2]), q(v[3])];
}

/// Overwrites every pixel with `color`.
pub(crate) fn clear(pixmap: &mut RgbaImage, color: Color) {
    let mut px = image::Rgba([0u8; 4]);
    store(&mut px, color.premultiplied());
    for p in pixmap.pixels_mut() {
        *p = px;
    }
}

/// Source-over fill of `rect` with straight-alpha `color`.
pub(crate) fn fill_rect(pixmap: &mut RgbaImage, rect: Rect, color: Color) {
    let Some(span) = rect.pixel_span(pixmap.width(), pixmap.height()) else { return };

    let src = color.premultiplied();
    if src[3] <= 0.0 {
        return;
    }

    if src[3] >= 1.0 {
        let mut solid = image::Rgba([0u8; 4]);
        store(&mut solid, src);
        for y in span.y0..span.y1 {
            for x in span.x0..span.x1 {
                pixmap.put_pixel(x, y, solid);
            }
        }
        return;
    }

    for y in span.y0..span.y1 {
        for x in span.x0..span.x1 {
            let px = pixmap.get_pixel_mut(x, y);
            let out = BlendMode::Normal.composite(src, load(px));
            store(px, out);
        }
    }
}

/// Draws `texture` (straight-alpha RGBA8) stretched over `dest` with
/// nearest-neighbour sampling, multiplied by `modulation`, composited with `blend`.
pub(crate) fn draw_sprite(
    pixmap: &mut RgbaImage,
    texture: &RgbaImage,
    dest: Rect,
    modulation: Color,
    blend: BlendMode,
) {
    let (tw, th) = texture.dimensions();
    if tw == 0 || th == 0 {
        return;
    }
    let Some(span) = dest.pixel_span(pixmap.width(), pixmap.height()) else { return };

    for y in span.y0..span.y1 {
        let v = ((y as f32 + 0.5) - dest.y) / dest.height;
        let ty = ((v * th as f32).floor().max(0.0) as u32).min(th - 1);

        for x in span.x0..span.x1 {
            let u = ((x as f32 + 0.5) - dest.x) / dest.width;
            let tx = ((u * tw as f32).floor().max(0.0) as u32).min(tw - 1);

            let texel = load(texture.get_pixel(tx, ty));
            let src = Color::new(
                texel[0] * modulation.r,
                texel[1] * modulation.g,
                texel[2] * modulation.b,
                texel[3] * modulation.a,
            )
            .premultiplied();
            if src[3] <= 0.0 {
                continue;
            }

            let px = pixmap.get_pixel_mut(x, y);
            let out = blend.composite(src, load(px));
            store(px, out);
        }
    }
}
