//! Conversions between the premultiplied storage both backends draw into and
//! the straight-alpha images handed to callers.

use image::RgbaImage;

/// Converts premultiplied RGBA8 pixels to straight alpha in place.
pub(crate) fn unpremultiply_in_place(image: &mut RgbaImage) {
    for px in image.pixels_mut() {
        let a = px.0[3];
        if a == 0 {
            px.0 = [0, 0, 0, 0];
        } else if a < 255 {
            for c in &mut px.0[..3] {
                *c = ((*c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8;
            }
        }
    }
}

/// Swaps the red and blue channels (BGRA <-> RGBA).
pub(crate) fn swap_red_blue(image: &mut RgbaImage) {
    for px in image.pixels_mut() {
        px.0.swap(0, 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_pixels_are_unchanged() {
        let mut img = RgbaImage::from_pixel(1, 1, image::Rgba([10, 20, 30, 255]));
        unpremultiply_in_place(&mut img);
        assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn half_alpha_doubles_color() {
        let mut img = RgbaImage::from_pixel(1, 1, image::Rgba([64, 0, 128, 128]));
        unpremultiply_in_place(&mut img);
        assert_eq!(img.get_pixel(0, 0).0, [128, 0, 255, 128]);
    }

    #[test]
    fn transparent_pixels_clear_color() {
        let mut img = RgbaImage::from_pixel(1, 1, image::Rgba([5, 5, 5, 0]));
        unpremultiply_in_place(&mut img);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn swap_red_blue_round_trips() {
        let mut img = RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 4]));
        swap_red_blue(&mut img);
        assert_eq!(img.get_pixel(0, 0).0, [3, 2, 1, 4]);
    }
}
