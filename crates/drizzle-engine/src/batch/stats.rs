/// Running render counters for profiling overlays.
///
/// Counters never influence rendering; they are cumulative until
/// [`reset`](Self::reset).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct RenderStats {
    /// Draw commands issued to the backend (one per flushed batch or sprite).
    pub draw_calls: u64,
    /// Rectangles accepted by `fill_rect`.
    pub total_rects: u64,
    /// Sprites accepted by `draw_sprite`.
    pub total_sprites: u64,
}

impl RenderStats {
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub(crate) fn record_draw_call(&mut self) {
        self.draw_calls += 1;
    }

    #[inline]
    pub(crate) fn record_rect(&mut self) {
        self.total_rects += 1;
    }

    #[inline]
    pub(crate) fn record_sprite(&mut self) {
        self.total_sprites += 1;
    }

    /// Average primitives (rects + sprites) per draw call; `0.0` before the first draw.
    pub fn primitives_per_draw_call(&self) -> f64 {
        if self.draw_calls == 0 {
            0.0
        } else {
            (self.total_rects + self.total_sprites) as f64 / self.draw_calls as f64
        }
    }
}
