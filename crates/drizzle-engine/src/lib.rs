//! Drizzle engine crate.
//!
//! Draws large numbers of filled rectangles and sprites with as few GPU draw
//! calls as possible. Same-colored rectangles are batched into one vertex
//! buffer upload and one draw; when no GPU is usable the same API runs on a
//! CPU pixmap.
//!
//! Entry point: [`create_renderer`].

pub mod batch;
pub mod config;
pub mod coords;
pub mod device;
pub mod error;
pub mod logging;
pub mod paint;
pub mod select;
pub mod sprite;
pub mod surface;

pub use batch::RenderStats;
pub use config::{BackendPreference, RendererConfig};
pub use coords::{Rect, Viewport};
pub use error::InitError;
pub use paint::{BlendMode, Color};
pub use select::{create_renderer, create_renderer_with, is_acceleration_available, BackendFactory};
pub use sprite::{SpriteOptions, Texture, TextureId};
pub use surface::{BackendKind, Canvas, RenderSurface};
