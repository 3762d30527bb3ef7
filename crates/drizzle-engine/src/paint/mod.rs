//! Paint model shared between the batching engine and both backends.
//!
//! Scope:
//! - color representation (straight alpha, normalized channels)
//! - sprite compositing modes
//!
//! Geometry types remain in `coords`.

pub mod blend;
pub mod color;

pub use blend::BlendMode;
pub use color::Color;
