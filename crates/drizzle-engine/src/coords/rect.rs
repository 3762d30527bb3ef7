/// Axis-aligned rectangle in canvas pixels (top-left origin).
///
/// Extents are stored verbatim. Zero or negative width/height is legal and
/// describes a degenerate rectangle that covers no pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Half-open range of whole pixels `[x0, x1) x [y0, y1)` covered by a rect.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PixelSpan {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelSpan {
    #[inline]
    pub fn width(self) -> u32 {
        self.x1 - self.x0
    }

    #[inline]
    pub fn height(self) -> u32 {
        self.y1 - self.y0
    }
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn right(self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Pixels whose centers fall inside `[x, right) x [y, bottom)`, clipped to
    /// a `bounds_w x bounds_h` target.
    ///
    /// This is the same sampling rule a GPU rasterizer applies to the two
    /// triangles of the quad, so both backends agree on coverage.
    /// Returns `None` when nothing is covered.
    pub fn pixel_span(self, bounds_w: u32, bounds_h: u32) -> Option<PixelSpan> {
        if self.is_empty() || !self.is_finite() {
            return None;
        }

        let first = |v: f32, max: u32| ((v - 0.5).ceil().max(0.0) as u32).min(max);

        let span = PixelSpan {
            x0: first(self.x, bounds_w),
            y0: first(self.y, bounds_h),
            x1: first(self.right(), bounds_w),
            y1: first(self.bottom(), bounds_h),
        };

        if span.x1 <= span.x0 || span.y1 <= span.y0 {
            None
        } else {
            Some(span)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── is_empty ──────────────────────────────────────────────────────────

    #[test]
    fn is_empty_zero_or_negative_size() {
        assert!(r(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(r(0.0, 0.0, 5.0, 0.0).is_empty());
        assert!(r(0.0, 0.0, -3.0, 5.0).is_empty());
    }

    #[test]
    fn is_empty_nan_extent() {
        assert!(r(0.0, 0.0, f32::NAN, 5.0).is_empty());
    }

    #[test]
    fn is_empty_positive_size() {
        assert!(!r(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    // ── pixel_span ────────────────────────────────────────────────────────

    #[test]
    fn span_integer_aligned() {
        let s = r(2.0, 3.0, 4.0, 5.0).pixel_span(100, 100).unwrap();
        assert_eq!(s, PixelSpan { x0: 2, y0: 3, x1: 6, y1: 8 });
        assert_eq!(s.width(), 4);
        assert_eq!(s.height(), 5);
    }

    #[test]
    fn span_uses_pixel_centers() {
        // Center of pixel 0 is 0.5, which is left of 0.6; first covered column is 1.
        let s = r(0.6, 0.0, 1.0, 1.0).pixel_span(10, 10).unwrap();
        assert_eq!((s.x0, s.x1), (1, 2));
    }

    #[test]
    fn span_clipped_to_bounds() {
        let s = r(-5.0, -5.0, 20.0, 20.0).pixel_span(8, 6).unwrap();
        assert_eq!(s, PixelSpan { x0: 0, y0: 0, x1: 8, y1: 6 });
    }

    #[test]
    fn span_sub_pixel_rect_covers_nothing() {
        // Spans 0.1..0.4; no pixel center inside.
        assert!(r(0.1, 0.1, 0.3, 0.3).pixel_span(10, 10).is_none());
    }

    #[test]
    fn span_outside_bounds_is_none() {
        assert!(r(50.0, 50.0, 5.0, 5.0).pixel_span(10, 10).is_none());
    }

    #[test]
    fn span_degenerate_is_none() {
        assert!(r(1.0, 1.0, 0.0, 4.0).pixel_span(10, 10).is_none());
        assert!(r(1.0, 1.0, -4.0, 4.0).pixel_span(10, 10).is_none());
    }
}
