use anyhow::{bail, Result};
use image::RgbaImage;
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::types::TextureSlot;

/// A decoded image resident on the GPU with its sampler.
pub(crate) struct GpuTexture {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: (u32, u32),
}

impl GpuTexture {
    /// Uploads an already flipped RGBA8 image. Rows arrive bottom-up so that
    /// `v = 0` samples the bottom of the picture, matching `v_uv`.
    pub(crate) fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        slot: TextureSlot,
        image: &RgbaImage,
        max_dimension: u32,
    ) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            bail!("{slot} image is empty");
        }
        if width > max_dimension || height > max_dimension {
            bail!(
                "{slot} image is {width}x{height}, GPU max texture dimension is {max_dimension}"
            );
        }

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(&format!("{} texture", slot.label())),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            image.as_raw(),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} sampler", slot.label())),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        tracing::debug!(slot = %slot, width, height, "uploaded texture");

        Ok(Self {
            _texture: texture,
            view,
            sampler,
            size: (width, height),
        })
    }

    pub(crate) fn aspect(&self) -> f32 {
        self.size.0 as f32 / self.size.1 as f32
    }
}
