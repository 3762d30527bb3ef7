//! GPU device + drawable management for the accelerated backend.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the drawable (offscreen texture or window swapchain)
//! - the side-effect-free acceleration probe

mod error;
mod gpu;
mod init;
mod probe;
mod target;

pub use error::SurfaceErrorAction;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use probe::{is_acceleration_available, is_acceleration_available_with};
pub use target::{RenderTarget, OFFSCREEN_FORMAT};
