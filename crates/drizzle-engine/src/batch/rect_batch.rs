use crate::coords::Rect;
use crate::paint::Color;

use super::stats::RenderStats;
use super::vertex::{write_rect_vertices, FLOATS_PER_RECT, FLOATS_PER_VERTEX, VERTICES_PER_RECT};

/// Reference batch capacity in rectangles.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 4096;

/// Upper bound on batch capacity: 48 MiB of vertex data.
pub const MAX_BATCH_SIZE_LIMIT: usize = 1 << 20;

/// One finished batch, ready for a single draw call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BatchDraw<'a> {
    /// Uniform color: `(r, g, b, a * global_alpha)`, straight alpha.
    pub color: [f32; 4],
    /// Exactly `rect_count * FLOATS_PER_RECT` floats; never the unused tail.
    pub vertices: &'a [f32],
    pub rect_count: usize,
}

impl BatchDraw<'_> {
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        (self.vertices.len() / FLOATS_PER_VERTEX) as u32
    }
}

/// Receiver of finished batches.
///
/// Implementations bind their program, write `color` as the uniform, upload
/// `vertices` and issue one triangle-list draw of `vertex_count()` vertices.
/// They must not fail; a lost context is reported through the surface.
pub trait BatchSink {
    fn draw_batch(&mut self, batch: &BatchDraw<'_>);
}

/// Accumulates same-colored rectangles into a pre-allocated vertex buffer.
///
/// Invariants:
/// - `vertices` is allocated once in [`new`](Self::new) and never resized
/// - while `rect_count > 0`, every rect in `vertices[..rect_count * 12]` was
///   drawn with `current_color`
/// - `rect_count <= max_rects`
///
/// The sink is passed per call so the owner can lend out GPU resources that
/// live next to the batch without borrowing the whole surface.
#[derive(Debug)]
pub struct RectBatch {
    vertices: Box<[f32]>,
    max_rects: usize,
    rect_count: usize,

    current_color: Color,
    has_color: bool,

    global_alpha: f32,
    stats: RenderStats,
}

impl RectBatch {
    /// Creates a batch holding up to `max_rects` rectangles, clamped to
    /// `1..=MAX_BATCH_SIZE_LIMIT`.
    pub fn new(max_rects: usize) -> Self {
        let max_rects = max_rects.clamp(1, MAX_BATCH_SIZE_LIMIT);
        Self {
            vertices: vec![0.0; max_rects * FLOATS_PER_RECT].into_boxed_slice(),
            max_rects,
            rect_count: 0,
            current_color: Color::TRANSPARENT,
            has_color: false,
            global_alpha: 1.0,
            stats: RenderStats::default(),
        }
    }

    /// Queues one rectangle, flushing into `sink` first if the color changed
    /// or the buffer is full.
    pub fn push(&mut self, rect: Rect, color: Color, sink: &mut impl BatchSink) {
        if self.has_color && self.rect_count > 0 && color != self.current_color {
            self.flush(sink);
        }
        if self.rect_count == self.max_rects {
            self.flush(sink);
        }

        let offset = self.rect_count * FLOATS_PER_RECT;
        write_rect_vertices(&mut self.vertices[offset..offset + FLOATS_PER_RECT], rect);

        self.current_color = color;
        self.has_color = true;
        self.rect_count += 1;
        self.stats.record_rect();
    }

    /// Hands the pending batch to `sink` as one draw call and empties it.
    ///
    /// No-op (no sink call, no stats change) when nothing is pending.
    pub fn flush(&mut self, sink: &mut impl BatchSink) {
        if self.rect_count == 0 {
            return;
        }

        let c = self.current_color;
        let draw = BatchDraw {
            color: [c.r, c.g, c.b, c.a * self.global_alpha],
            vertices: &self.vertices[..self.rect_count * FLOATS_PER_RECT],
            rect_count: self.rect_count,
        };
        sink.draw_batch(&draw);

        log::trace!(
            "RectBatch: flushed {} rects ({} vertices)",
            self.rect_count,
            self.rect_count * VERTICES_PER_RECT
        );

        self.stats.record_draw_call();
        self.rect_count = 0;
        self.has_color = false;
    }

    #[inline]
    pub fn global_alpha(&self) -> f32 {
        self.global_alpha
    }

    /// Sets the alpha multiplier applied at flush time.
    ///
    /// Values are clamped to `[0, 1]`; NaN resets to `1.0`. If the value
    /// changes while rects are pending they are flushed under the old alpha.
    pub fn set_global_alpha(&mut self, alpha: f32, sink: &mut impl BatchSink) {
        let alpha = if alpha.is_nan() { 1.0 } else { alpha.clamp(0.0, 1.0) };
        if alpha == self.global_alpha {
            return;
        }
        if self.rect_count > 0 {
            self.flush(sink);
        }
        self.global_alpha = alpha;
    }

    #[inline]
    pub fn pending_rects(&self) -> usize {
        self.rect_count
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.rect_count > 0
    }

    /// Maximum rectangles per batch.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_rects
    }

    /// Color of the pending batch, if any.
    #[inline]
    pub fn current_color(&self) -> Option<Color> {
        self.has_color.then_some(self.current_color)
    }

    #[inline]
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Counter access for draw calls issued outside the batch (sprites).
    #[inline]
    pub(crate) fn stats_mut(&mut self) -> &mut RenderStats {
        &mut self.stats
    }

    #[inline]
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that records every batch it receives.
    #[derive(Debug, Default)]
    struct RecordingSink {
        pub batches: Vec<(Vec<f32>, [f32; 4])>,
    }

    impl RecordingSink {
        pub fn rect_counts(&self) -> Vec<usize> {
            self.batches.iter().map(|(v, _)| v.len() / FLOATS_PER_RECT).collect()
        }

        pub fn colors(&self) -> Vec<[f32; 4]> {
            self.batches.iter().map(|(_, c)| *c).collect()
        }
    }

    impl BatchSink for RecordingSink {
        fn draw_batch(&mut self, batch: &BatchDraw<'_>) {
            assert_eq!(batch.vertices.len(), batch.rect_count * FLOATS_PER_RECT);
            self.batches.push((batch.vertices.to_vec(), batch.color));
        }
    }

    const RED: Color = Color::RED;
    const BLUE: Color = Color::BLUE;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── scenario ──────────────────────────────────────────────────────────

    #[test]
    fn red_red_blue_produces_two_ordered_draw_calls() {
        let mut batch = RectBatch::new(DEFAULT_MAX_BATCH_SIZE);
        let mut sink = RecordingSink::default();

        batch.push(r(0.0, 0.0, 10.0, 10.0), RED, &mut sink);
        batch.push(r(10.0, 0.0, 10.0, 10.0), RED, &mut sink);
        batch.push(r(0.0, 10.0, 10.0, 10.0), BLUE, &mut sink);
        batch.flush(&mut sink);

        assert_eq!(sink.colors(), vec![RED.to_array(), BLUE.to_array()]);
        assert_eq!(sink.batches[0].0.len() / FLOATS_PER_VERTEX, 12);
        assert_eq!(sink.batches[1].0.len() / FLOATS_PER_VERTEX, 6);
        assert_eq!(batch.stats().draw_calls, 2);
        assert_eq!(batch.stats().total_rects, 3);
    }

    // ── flush triggers ────────────────────────────────────────────────────

    #[test]
    fn flushes_equal_color_runs() {
        let colors = [RED, RED, BLUE, BLUE, BLUE, RED, Color::GREEN, Color::GREEN];
        let mut batch = RectBatch::new(64);
        let mut sink = RecordingSink::default();

        for (i, c) in colors.iter().enumerate() {
            batch.push(r(i as f32, 0.0, 1.0, 1.0), *c, &mut sink);
        }
        batch.flush(&mut sink);

        assert_eq!(sink.rect_counts(), vec![2, 3, 1, 2]);
        assert_eq!(
            sink.colors(),
            vec![RED.to_array(), BLUE.to_array(), RED.to_array(), Color::GREEN.to_array()]
        );
    }

    #[test]
    fn alpha_only_difference_splits_batch() {
        let mut batch = RectBatch::new(8);
        let mut sink = RecordingSink::default();

        batch.push(r(0.0, 0.0, 1.0, 1.0), RED, &mut sink);
        batch.push(r(0.0, 0.0, 1.0, 1.0), RED.with_alpha(0.5), &mut sink);
        batch.flush(&mut sink);

        assert_eq!(sink.rect_counts(), vec![1, 1]);
    }

    #[test]
    fn capacity_split_at_max_plus_one() {
        let max = 16;
        let mut batch = RectBatch::new(max);
        let mut sink = RecordingSink::default();

        for i in 0..=max {
            batch.push(r(i as f32, 0.0, 1.0, 1.0), RED, &mut sink);
        }
        assert_eq!(sink.batches.len(), 1, "full buffer flushes before accepting the extra rect");
        batch.flush(&mut sink);

        assert_eq!(sink.rect_counts(), vec![max, 1]);
        assert_eq!(batch.stats().draw_calls, 2);
    }

    #[test]
    fn exactly_full_buffer_does_not_flush_early() {
        let mut batch = RectBatch::new(4);
        let mut sink = RecordingSink::default();

        for _ in 0..4 {
            batch.push(r(0.0, 0.0, 1.0, 1.0), RED, &mut sink);
        }

        assert!(sink.batches.is_empty());
        assert_eq!(batch.pending_rects(), 4);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut batch = RectBatch::new(0);
        let mut sink = RecordingSink::default();

        batch.push(r(0.0, 0.0, 1.0, 1.0), RED, &mut sink);
        batch.push(r(0.0, 0.0, 1.0, 1.0), RED, &mut sink);
        batch.flush(&mut sink);

        assert_eq!(batch.capacity(), 1);
        assert_eq!(sink.rect_counts(), vec![1, 1]);
    }

    #[test]
    fn oversized_capacity_is_clamped_without_overflow() {
        let batch = RectBatch::new(usize::MAX / 8);
        assert_eq!(batch.capacity(), MAX_BATCH_SIZE_LIMIT);
        assert_eq!(RectBatch::new(usize::MAX).capacity(), MAX_BATCH_SIZE_LIMIT);
    }

    // ── flush ─────────────────────────────────────────────────────────────

    #[test]
    fn empty_flush_is_noop() {
        let mut batch = RectBatch::new(8);
        let mut sink = RecordingSink::default();

        batch.flush(&mut sink);
        batch.flush(&mut sink);

        assert!(sink.batches.is_empty());
        assert_eq!(batch.stats(), RenderStats::default());
    }

    #[test]
    fn flush_uploads_only_the_used_prefix() {
        let mut batch = RectBatch::new(100);
        let mut sink = RecordingSink::default();

        batch.push(r(1.0, 2.0, 3.0, 4.0), RED, &mut sink);
        batch.flush(&mut sink);

        let (verts, _) = &sink.batches[0];
        assert_eq!(verts.len(), FLOATS_PER_RECT);
        assert_eq!(verts, &vec![1.0, 2.0, 4.0, 2.0, 1.0, 6.0, 4.0, 2.0, 4.0, 6.0, 1.0, 6.0]);
    }

    #[test]
    fn buffer_is_reused_after_flush() {
        let mut batch = RectBatch::new(2);
        let mut sink = RecordingSink::default();

        batch.push(r(0.0, 0.0, 1.0, 1.0), RED, &mut sink);
        batch.push(r(5.0, 5.0, 1.0, 1.0), RED, &mut sink);
        batch.flush(&mut sink);
        batch.push(r(9.0, 9.0, 1.0, 1.0), BLUE, &mut sink);
        batch.flush(&mut sink);

        assert_eq!(sink.batches[1].0[..2], [9.0, 9.0]);
        assert_eq!(sink.batches[1].0.len(), FLOATS_PER_RECT);
        assert_eq!(batch.current_color(), None);
    }

    #[test]
    fn dropping_a_pending_batch_never_reaches_the_sink() {
        let mut sink = RecordingSink::default();
        {
            let mut batch = RectBatch::new(8);
            batch.push(r(0.0, 0.0, 1.0, 1.0), RED, &mut sink);
            batch.push(r(1.0, 0.0, 1.0, 1.0), RED, &mut sink);
            assert_eq!(batch.stats().draw_calls, 0);
        }
        assert!(sink.batches.is_empty());
    }

    // ── global alpha ──────────────────────────────────────────────────────

    #[test]
    fn alpha_is_applied_at_flush() {
        let mut batch = RectBatch::new(8);
        let mut sink = RecordingSink::default();

        batch.set_global_alpha(0.5, &mut sink);
        batch.push(r(0.0, 0.0, 1.0, 1.0), RED.with_alpha(0.8), &mut sink);
        batch.flush(&mut sink);

        assert_eq!(sink.colors(), vec![[1.0, 0.0, 0.0, 0.4]]);
    }

    #[test]
    fn alpha_change_with_pending_rects_flushes_under_old_alpha() {
        let mut batch = RectBatch::new(8);
        let mut sink = RecordingSink::default();

        batch.push(r(0.0, 0.0, 1.0, 1.0), RED, &mut sink);
        batch.push(r(1.0, 0.0, 1.0, 1.0), RED, &mut sink);
        batch.set_global_alpha(0.25, &mut sink);
        assert_eq!(batch.stats().draw_calls, 1);

        batch.push(r(2.0, 0.0, 1.0, 1.0), RED, &mut sink);
        batch.flush(&mut sink);

        assert_eq!(sink.colors(), vec![[1.0, 0.0, 0.0, 1.0], [1.0, 0.0, 0.0, 0.25]]);
        assert_eq!(sink.rect_counts(), vec![2, 1]);
    }

    #[test]
    fn unchanged_alpha_does_not_flush() {
        let mut batch = RectBatch::new(8);
        let mut sink = RecordingSink::default();

        batch.push(r(0.0, 0.0, 1.0, 1.0), RED, &mut sink);
        batch.set_global_alpha(1.0, &mut sink);

        assert!(sink.batches.is_empty());
        assert_eq!(batch.pending_rects(), 1);
    }

    #[test]
    fn alpha_change_without_pending_rects_does_not_draw() {
        let mut batch = RectBatch::new(8);
        let mut sink = RecordingSink::default();

        batch.set_global_alpha(0.3, &mut sink);

        assert!(sink.batches.is_empty());
        assert_eq!(batch.global_alpha(), 0.3);
    }

    #[test]
    fn alpha_is_clamped_and_nan_resets() {
        let mut batch = RectBatch::new(8);
        let mut sink = RecordingSink::default();

        batch.set_global_alpha(4.0, &mut sink);
        assert_eq!(batch.global_alpha(), 1.0);
        batch.set_global_alpha(-1.0, &mut sink);
        assert_eq!(batch.global_alpha(), 0.0);
        batch.set_global_alpha(f32::NAN, &mut sink);
        assert_eq!(batch.global_alpha(), 1.0);
    }

    // ── stats ─────────────────────────────────────────────────────────────

    #[test]
    fn reset_stats_keeps_pending_batch() {
        let mut batch = RectBatch::new(8);
        let mut sink = RecordingSink::default();

        batch.push(r(0.0, 0.0, 1.0, 1.0), RED, &mut sink);
        batch.reset_stats();

        assert_eq!(batch.stats().total_rects, 0);
        assert_eq!(batch.pending_rects(), 1);

        batch.flush(&mut sink);
        assert_eq!(batch.stats().draw_calls, 1);
    }
}
