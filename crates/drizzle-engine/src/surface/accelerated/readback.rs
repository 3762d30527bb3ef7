//! Copies a rendered texture back to the CPU.

use std::sync::mpsc::channel;

use anyhow::{anyhow, bail, Context};
use image::RgbaImage;

use crate::device::Gpu;
use crate::surface::pixels::{swap_red_blue, unpremultiply_in_place};

const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch padded to wgpu's copy alignment.
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Reads `texture` into a straight-alpha RGBA8 image.
///
/// Blocks until the GPU has finished every submitted batch.
pub(crate) fn read_texture(gpu: &Gpu, texture: &wgpu::Texture) -> anyhow::Result<RgbaImage> {
    let format = texture.format();
    let bgra = match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
        other => bail!("cannot read back {other:?} textures"),
    };

    let (width, height) = (texture.width(), texture.height());
    let row_bytes = (width * BYTES_PER_PIXEL) as usize;
    let padded = padded_bytes_per_row(width);

    let buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("drizzle readback buffer"),
        size: padded as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu.encoder("drizzle readback encoder");
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.submit(encoder);

    let slice = buffer.slice(..);
    let (sender, receiver) = channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        drop(sender.send(res));
    });
    gpu.device()
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| anyhow!("device poll failed: {e}"))?;
    receiver
        .recv()
        .context("readback callback dropped")?
        .context("readback buffer mapping failed")?;

    let mut out = Vec::with_capacity(row_bytes * height as usize);
    {
        let mapped = slice.get_mapped_range();
        for row in mapped.chunks_exact(padded as usize) {
            out.extend_from_slice(&row[..row_bytes]);
        }
    }
    buffer.unmap();
    buffer.destroy();

    let mut image = RgbaImage::from_raw(width, height, out)
        .ok_or_else(|| anyhow!("readback produced a short buffer"))?;
    if bgra {
        swap_red_blue(&mut image);
    }
    unpremultiply_in_place(&mut image);
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
    }
}
