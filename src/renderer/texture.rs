//! Simulation texture atlas → host renderer
//!
//! The simulation fills one RGBA8 atlas during global init. It is handed to
//! the renderer once per session and never updated afterwards.

use wgpu::util::DeviceExt;

use crate::consts::{TEXTURE_HEIGHT, TEXTURE_WIDTH};
use crate::host::TextureSink;

/// Texture creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mip_levels: u32,
    pub array_size: u32,
    pub format: wgpu::TextureFormat,
}

impl TextureDescriptor {
    /// The simulation's fixed-size atlas
    pub const fn sim_atlas() -> Self {
        Self {
            width: TEXTURE_WIDTH,
            height: TEXTURE_HEIGHT,
            depth: 1,
            mip_levels: 1,
            array_size: 1,
            format: wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    /// Bytes of one row of the top mip
    pub const fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }

    /// Bytes of pixel data the request expects
    pub const fn byte_len(&self) -> usize {
        (self.bytes_per_row() * self.height * self.depth * self.array_size) as usize
    }

    pub fn to_wgpu<'a>(&self, label: Option<&'a str>) -> wgpu::TextureDescriptor<'a> {
        wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: self.depth.max(self.array_size),
            },
            mip_level_count: self.mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        }
    }
}

/// Uploads the atlas through a wgpu device
pub struct WgpuTextureSink<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    texture: Option<wgpu::Texture>,
}

impl<'a> WgpuTextureSink<'a> {
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            texture: None,
        }
    }

    /// The uploaded texture, once `create_texture` ran
    pub fn into_texture(self) -> Option<wgpu::Texture> {
        self.texture
    }
}

impl TextureSink for WgpuTextureSink<'_> {
    fn create_texture(&mut self, descriptor: &TextureDescriptor, pixels: &[u8]) {
        if pixels.len() != descriptor.byte_len() {
            log::error!(
                "Texture upload expects {} bytes, got {}",
                descriptor.byte_len(),
                pixels.len()
            );
            return;
        }

        let texture = self.device.create_texture_with_data(
            self.queue,
            &descriptor.to_wgpu(Some("sm64 atlas")),
            wgpu::util::TextureDataOrder::LayerMajor,
            pixels,
        );
        self.texture = Some(texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atlas_descriptor() {
        let desc = TextureDescriptor::sim_atlas();
        assert_eq!((desc.width, desc.height), (704, 64));
        assert_eq!(desc.byte_len(), 704 * 64 * 4);

        let wgpu_desc = desc.to_wgpu(None);
        assert_eq!(wgpu_desc.mip_level_count, 1);
        assert_eq!(wgpu_desc.size.depth_or_array_layers, 1);
        assert_eq!(wgpu_desc.format, wgpu::TextureFormat::Rgba8Unorm);
    }
}
