/// Parameters for bringing up the accelerated backend's device.
///
/// Window-only fields (`present_mode`, `alpha_mode`, frame latency,
/// `prefer_srgb`) are ignored for offscreen canvases.
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub backends: wgpu::Backends,

    /// Dense particle scenes want the discrete GPU when there is one.
    pub power_preference: wgpu::PowerPreference,

    /// Only accept a software adapter. Handy on CI machines without a GPU.
    pub force_fallback_adapter: bool,

    /// Pick an sRGB swapchain format when one exists.
    ///
    /// Defaults to `false`: blending then happens on stored values, exactly
    /// like the immediate backend, so both produce the same pixels.
    pub prefer_srgb: bool,

    pub present_mode: wgpu::PresentMode,

    /// Requested compositor alpha mode; unsupported values are replaced.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Nothing the built-in pipelines do needs optional features.
    pub required_features: wgpu::Features,

    /// Downlevel defaults by default, so WebGL2-class adapters qualify.
    pub required_limits: wgpu::Limits,

    /// Swapchain latency hint.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}

impl GpuInit {
    /// Low-power adapter, for battery-sensitive embedders.
    pub fn low_power() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::LowPower,
            ..Self::default()
        }
    }

    /// Software adapter only (e.g. lavapipe, WARP).
    pub fn software() -> Self {
        Self {
            force_fallback_adapter: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_portable() {
        let init = GpuInit::default();
        assert!(init.required_features.is_empty());
        assert!(!init.prefer_srgb);
        assert!(!init.force_fallback_adapter);
    }

    #[test]
    fn presets_change_one_knob() {
        assert_eq!(GpuInit::low_power().power_preference, wgpu::PowerPreference::LowPower);
        assert!(GpuInit::software().force_fallback_adapter);
    }
}
