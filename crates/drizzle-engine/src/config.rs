//! Renderer configuration.

use std::fmt;
use std::str::FromStr;

use crate::batch::DEFAULT_MAX_BATCH_SIZE;
use crate::device::GpuInit;

/// Which backend [`create_renderer`](crate::select::create_renderer) should build.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum BackendPreference {
    /// Accelerated when it initializes, immediate otherwise.
    #[default]
    Auto,
    /// Accelerated or an error.
    Accelerated,
    /// Always the immediate backend.
    Fallback,
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendPreference::Auto => "auto",
            BackendPreference::Accelerated => "accelerated",
            BackendPreference::Fallback => "fallback",
        })
    }
}

impl FromStr for BackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendPreference::Auto),
            "accelerated" | "gpu" => Ok(BackendPreference::Accelerated),
            "fallback" | "immediate" | "cpu" => Ok(BackendPreference::Fallback),
            other => Err(format!(
                "unknown backend '{other}' (expected auto, accelerated or fallback)"
            )),
        }
    }
}

/// Everything needed to create a surface.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub preference: BackendPreference,

    /// Rectangles per batch on the accelerated backend. Clamped to
    /// `1..=MAX_BATCH_SIZE_LIMIT`, then shrunk to fit the device's
    /// `max_buffer_size`.
    pub max_batch_size: usize,

    /// Embedder policy switch. When `false`, the accelerated backend is never
    /// attempted: `Auto` goes straight to the immediate backend and
    /// `Accelerated` fails with [`InitError::Disabled`](crate::InitError::Disabled).
    pub allow_acceleration: bool,

    /// GPU context parameters for the accelerated backend.
    pub gpu: GpuInit,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            preference: BackendPreference::Auto,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            allow_acceleration: true,
            gpu: GpuInit::default(),
        }
    }
}

impl RendererConfig {
    pub fn with_preference(mut self, preference: BackendPreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_names() {
        assert_eq!("auto".parse(), Ok(BackendPreference::Auto));
        assert_eq!("GPU".parse(), Ok(BackendPreference::Accelerated));
        assert_eq!("immediate".parse(), Ok(BackendPreference::Fallback));
        assert!("vulkan".parse::<BackendPreference>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for p in [
            BackendPreference::Auto,
            BackendPreference::Accelerated,
            BackendPreference::Fallback,
        ] {
            assert_eq!(p.to_string().parse(), Ok(p));
        }
    }

    #[test]
    fn defaults_allow_acceleration() {
        let cfg = RendererConfig::default();
        assert_eq!(cfg.preference, BackendPreference::Auto);
        assert_eq!(cfg.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
        assert!(cfg.allow_acceleration);
    }
}
