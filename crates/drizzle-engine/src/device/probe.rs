use std::panic::{catch_unwind, AssertUnwindSafe};

use super::{Gpu, GpuInit};

/// Checks whether an accelerated context can be created right now.
///
/// Builds a throwaway instance, adapter and device with `init`, then drops
/// them. Never fails: errors and panics inside wgpu both read as
/// "unavailable".
pub fn is_acceleration_available_with(init: &GpuInit) -> bool {
    let result = catch_unwind(AssertUnwindSafe(|| Gpu::new_blocking(init, None)));
    match result {
        Ok(Ok((gpu, _))) => {
            gpu.device().destroy();
            true
        }
        Ok(Err(err)) => {
            log::debug!("acceleration probe: {err}");
            false
        }
        Err(_) => {
            log::warn!("acceleration probe panicked; treating as unavailable");
            false
        }
    }
}

/// [`is_acceleration_available_with`] using default GPU settings.
pub fn is_acceleration_available() -> bool {
    is_acceleration_available_with(&GpuInit::default())
}
