//! Backend selection.
//!
//! [`create_renderer`] is the single entry point embedders use. It honours
//! [`BackendPreference`] and the `allow_acceleration` policy, and in `Auto`
//! mode degrades to the immediate backend instead of failing.

use crate::config::{BackendPreference, RendererConfig};
use crate::error::InitError;
use crate::surface::{AcceleratedSurface, BackendKind, Canvas, ImmediateSurface, RenderSurface};

pub use crate::device::is_acceleration_available;

/// Constructs concrete backends for the selector.
pub trait BackendFactory {
    fn accelerated(
        &self,
        canvas: &Canvas,
        config: &RendererConfig,
    ) -> Result<Box<dyn RenderSurface>, InitError>;

    fn fallback(
        &self,
        canvas: &Canvas,
        config: &RendererConfig,
    ) -> Result<Box<dyn RenderSurface>, InitError>;
}

/// The real backends: [`AcceleratedSurface`] and [`ImmediateSurface`].
#[derive(Debug, Default, Copy, Clone)]
pub struct DefaultBackends;

impl BackendFactory for DefaultBackends {
    fn accelerated(
        &self,
        canvas: &Canvas,
        config: &RendererConfig,
    ) -> Result<Box<dyn RenderSurface>, InitError> {
        Ok(Box::new(AcceleratedSurface::new(canvas, config)?))
    }

    fn fallback(
        &self,
        canvas: &Canvas,
        _config: &RendererConfig,
    ) -> Result<Box<dyn RenderSurface>, InitError> {
        Ok(Box::new(ImmediateSurface::new(canvas)?))
    }
}

/// Creates a surface for `canvas` using the real backends.
pub fn create_renderer(
    canvas: &Canvas,
    config: &RendererConfig,
) -> Result<Box<dyn RenderSurface>, InitError> {
    create_renderer_with(&DefaultBackends, canvas, config)
}

/// Creates a surface for `canvas`, building backends through `factory`.
pub fn create_renderer_with<F: BackendFactory + ?Sized>(
    factory: &F,
    canvas: &Canvas,
    config: &RendererConfig,
) -> Result<Box<dyn RenderSurface>, InitError> {
    let surface = match config.preference {
        BackendPreference::Fallback => factory.fallback(canvas, config)?,

        BackendPreference::Accelerated => {
            if !config.allow_acceleration {
                return Err(InitError::Disabled(BackendKind::Accelerated));
            }
            factory.accelerated(canvas, config)?
        }

        BackendPreference::Auto if !config.allow_acceleration => {
            log::info!("acceleration disabled by configuration; using immediate backend");
            factory.fallback(canvas, config)?
        }

        BackendPreference::Auto => match factory.accelerated(canvas, config) {
            Ok(surface) => surface,
            Err(err) => {
                log::warn!("accelerated backend unavailable ({err}); falling back to immediate");
                factory.fallback(canvas, config)?
            }
        },
    };

    log::info!("renderer ready: {} backend", surface.backend());
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::coords::Rect;
    use crate::paint::Color;

    /// Accelerated construction always fails; counts attempts.
    #[derive(Default)]
    struct NoGpu {
        accelerated_attempts: Cell<u32>,
    }

    impl BackendFactory for NoGpu {
        fn accelerated(
            &self,
            _canvas: &Canvas,
            _config: &RendererConfig,
        ) -> Result<Box<dyn RenderSurface>, InitError> {
            self.accelerated_attempts.set(self.accelerated_attempts.get() + 1);
            Err(InitError::Surface("simulated context failure".into()))
        }

        fn fallback(
            &self,
            canvas: &Canvas,
            config: &RendererConfig,
        ) -> Result<Box<dyn RenderSurface>, InitError> {
            DefaultBackends.fallback(canvas, config)
        }
    }

    fn config(preference: BackendPreference) -> RendererConfig {
        RendererConfig::default().with_preference(preference)
    }

    #[test]
    fn auto_falls_back_and_still_draws() {
        let factory = NoGpu::default();
        let mut surface =
            create_renderer_with(&factory, &Canvas::offscreen(4, 4), &config(BackendPreference::Auto))
                .unwrap();

        assert_eq!(factory.accelerated_attempts.get(), 1);
        assert_eq!(surface.backend(), BackendKind::Immediate);
        assert!(surface.is_initialized());

        surface.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Color::GREEN);
        surface.flush();
        let img = surface.read_pixels().unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(3, 3).0, [0, 0, 0, 0]);
        surface.dispose();
    }

    #[test]
    fn forced_accelerated_reports_the_failure() {
        let factory = NoGpu::default();
        let err = create_renderer_with(
            &factory,
            &Canvas::offscreen(4, 4),
            &config(BackendPreference::Accelerated),
        )
        .err();
        assert!(matches!(err, Some(InitError::Surface(_))));
    }

    #[test]
    fn forced_fallback_never_tries_the_gpu() {
        let factory = NoGpu::default();
        let surface = create_renderer_with(
            &factory,
            &Canvas::offscreen(4, 4),
            &config(BackendPreference::Fallback),
        )
        .unwrap();
        assert_eq!(factory.accelerated_attempts.get(), 0);
        assert_eq!(surface.backend(), BackendKind::Immediate);
    }

    #[test]
    fn policy_disables_acceleration() {
        let factory = NoGpu::default();
        let mut cfg = config(BackendPreference::Auto);
        cfg.allow_acceleration = false;

        let surface = create_renderer_with(&factory, &Canvas::offscreen(4, 4), &cfg).unwrap();
        assert_eq!(surface.backend(), BackendKind::Immediate);
        assert_eq!(factory.accelerated_attempts.get(), 0);

        cfg.preference = BackendPreference::Accelerated;
        let err = create_renderer_with(&factory, &Canvas::offscreen(4, 4), &cfg).err();
        assert!(matches!(err, Some(InitError::Disabled(BackendKind::Accelerated))));
        assert_eq!(factory.accelerated_attempts.get(), 0);
    }

    #[test]
    fn fallback_failure_is_returned() {
        let factory = NoGpu::default();
        let err = create_renderer_with(
            &factory,
            &Canvas::offscreen(0, 0),
            &config(BackendPreference::Auto),
        )
        .err();
        assert!(matches!(err, Some(InitError::InvalidCanvas(_))));
    }

    #[test]
    fn availability_check_never_panics() {
        let _ = is_acceleration_available();
    }
}
