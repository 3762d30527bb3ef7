//! Geometry value types shared by the batching engine and both backends.
//!
//! Canonical CPU space:
//! - pixels of the canvas the surface was created for
//! - origin top-left
//! - +X right, +Y down
//!
//! The accelerated backend converts to NDC in its vertex shader using a
//! viewport uniform; the immediate backend rasterizes in this space directly.

mod rect;
mod viewport;

pub use rect::{PixelSpan, Rect};
pub use viewport::Viewport;
