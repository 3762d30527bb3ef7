use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use winit::window::Window;

use crate::error::InitError;

use super::GpuInit;

/// Owns the wgpu core objects used by one accelerated surface.
///
/// This type is the low-level rendering context:
/// - creates the Instance and stores Adapter/Device/Queue
/// - optionally creates the window Surface against that instance
/// - tracks device loss so the surface can report it
pub struct Gpu {
    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    /// Set from the device-lost callback.
    lost: Arc<AtomicBool>,
}

impl Gpu {
    /// Creates a GPU context, plus a surface when drawing to a window.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(
        init: &GpuInit,
        window: Option<Arc<Window>>,
    ) -> Result<(Self, Option<wgpu::Surface<'static>>), InitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        // Surface must exist before the adapter so the adapter can be checked against it.
        let surface = match window {
            Some(window) => Some(instance.create_surface(window)?),
            None => None,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: surface.as_ref(),
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await?;

        let info = adapter.get_info();
        log::info!(
            "gpu adapter: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("drizzle device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await?;

        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            if matches!(reason, wgpu::DeviceLostReason::Destroyed) {
                log::debug!("gpu device destroyed");
            } else {
                log::error!("gpu device lost ({reason:?}): {message}");
            }
            flag.store(true, Ordering::Release);
        });

        Ok((
            Self {
                adapter,
                device,
                queue,
                lost,
            },
            surface,
        ))
    }

    /// Blocking wrapper around [`new`](Self::new).
    pub fn new_blocking(
        init: &GpuInit,
        window: Option<Arc<Window>>,
    ) -> Result<(Self, Option<wgpu::Surface<'static>>), InitError> {
        pollster::block_on(Self::new(init, window))
    }

    #[inline]
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Largest 2D texture edge the device accepts.
    #[inline]
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Returns `true` once the device has been lost or destroyed.
    #[inline]
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Marks the context unusable after a fatal surface error.
    #[inline]
    pub fn mark_lost(&self) {
        self.lost.store(true, Ordering::Release);
    }

    /// Submits one finished encoder.
    #[inline]
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    #[inline]
    pub fn encoder(&self, label: &'static str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }
}
