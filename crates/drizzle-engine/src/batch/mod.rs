//! Rectangle batching engine.
//!
//! [`RectBatch`] turns a stream of colored-rectangle draws into the smallest
//! number of monochrome batches and hands each one to a [`BatchSink`] as a
//! single draw call. It is backend-agnostic: the accelerated surface plugs in
//! a wgpu sink, tests plug in a recording sink.
//!
//! Flush triggers:
//! - color change while a batch is pending
//! - capacity reached
//! - global alpha change while a batch is pending
//! - explicit `flush` (frame end, sprite draw, resize)

mod rect_batch;
mod stats;
mod vertex;

pub use rect_batch::{BatchDraw, BatchSink, RectBatch, DEFAULT_MAX_BATCH_SIZE, MAX_BATCH_SIZE_LIMIT};
pub use stats::RenderStats;
pub use vertex::{write_rect_vertices, FLOATS_PER_RECT, FLOATS_PER_VERTEX, VERTICES_PER_RECT};
