//! Initialization errors raised by backend constructors and the selector.

use crate::surface::BackendKind;

/// Why a backend could not be brought up.
///
/// Steady-state drawing never fails; these are only produced while creating a
/// surface. The selector turns them into a fallback attempt in automatic mode
/// and returns them as-is when a backend was forced.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The canvas cannot back a drawable (zero-sized, too large).
    #[error("invalid canvas: {0}")]
    InvalidCanvas(String),

    /// No graphics adapter satisfied the request.
    #[error("no suitable graphics adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to create a device.
    #[error("failed to create graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// The window surface could not be created or configured.
    #[error("failed to create window surface: {0}")]
    Surface(String),

    /// Embedder policy disabled this backend.
    #[error("{0} backend disabled by configuration")]
    Disabled(BackendKind),
}

impl From<wgpu::CreateSurfaceError> for InitError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        InitError::Surface(err.to_string())
    }
}
