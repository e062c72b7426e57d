use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use image::RgbaImage;
use tracing::debug;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::animation::RenderUniforms;
use crate::types::{EngineError, GpuPowerPreference, TextureSlot};

use super::context::GpuContext;
use super::pipeline::ShaderPipeline;
use super::textures::GpuTexture;
use super::uniforms::GlitchUniforms;

pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: ShaderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: GlitchUniforms,
    textures: [Option<GpuTexture>; 2],
    texture_bind_group: Option<wgpu::BindGroup>,
    frame_count: u64,
    last_fps_update: Instant,
    frames_since_last_update: u32,
    frames_per_second: f32,
}

impl GpuState {
    pub(crate) fn new(
        window: Arc<Window>,
        initial_size: PhysicalSize<u32>,
        gpu_power: GpuPowerPreference,
    ) -> Result<Self, EngineError> {
        let context = GpuContext::new(window, initial_size, gpu_power)
            .map_err(|err| EngineError::GpuUnavailable(format!("{err:#}")))?;
        let pipeline = ShaderPipeline::new(&context.device, context.surface_format)
            .map_err(|err| EngineError::Shader(err.to_string()))?;

        let uniforms = GlitchUniforms::new(context.size.width, context.size.height);
        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glitch uniform buffer"),
            size: std::mem::size_of::<GlitchUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("glitch uniform bind group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });
        Self::write_uniforms(&context.queue, &uniform_buffer, &uniforms);

        Ok(Self {
            context,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            textures: [None, None],
            texture_bind_group: None,
            frame_count: 0,
            last_fps_update: Instant::now(),
            frames_since_last_update: 0,
            frames_per_second: 0.0,
        })
    }

    pub(crate) fn texture_size(&self, slot: TextureSlot) -> Option<(u32, u32)> {
        self.textures[slot.index()].as_ref().map(|texture| texture.size)
    }

    pub(crate) fn texture_aspect(&self, slot: TextureSlot) -> Option<f32> {
        self.textures[slot.index()].as_ref().map(GpuTexture::aspect)
    }

    /// Both slots are resident and bound.
    pub(crate) fn textures_ready(&self) -> bool {
        self.texture_bind_group.is_some()
    }

    /// Uploads `image` into `slot`, replacing whatever was bound there. The
    /// previous texture keeps rendering until the upload succeeds; the swap
    /// itself is a single bind group replacement.
    pub(crate) fn install_texture(&mut self, slot: TextureSlot, image: &RgbaImage) -> Result<()> {
        let texture = GpuTexture::upload(
            &self.context.device,
            &self.context.queue,
            slot,
            image,
            self.context.max_texture_dimension,
        )?;
        self.textures[slot.index()] = Some(texture);

        if let [Some(background), Some(logo)] = &self.textures {
            self.texture_bind_group = Some(self.pipeline.texture_bind_group(
                &self.context.device,
                background,
                logo,
            ));
        }
        Ok(())
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size == self.context.size {
            return;
        }
        self.context.resize(new_size);
        debug!(
            width = self.context.size.width,
            height = self.context.size.height,
            "resized surface"
        );
    }

    pub(crate) fn reconfigure(&self) {
        self.context.reconfigure();
    }

    /// Draws one frame. Skips silently while either texture is missing.
    pub(crate) fn render(&mut self, frame: &RenderUniforms) -> Result<(), wgpu::SurfaceError> {
        let Some(texture_bind_group) = self.texture_bind_group.as_ref() else {
            return Ok(());
        };

        let output = self.context.surface.get_current_texture()?;

        let now = Instant::now();
        self.frame_count += 1;
        self.frames_since_last_update += 1;
        let elapsed_since_fps_update = now.saturating_duration_since(self.last_fps_update);
        if elapsed_since_fps_update >= Duration::from_secs(1) {
            self.frames_per_second =
                self.frames_since_last_update as f32 / elapsed_since_fps_update.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(
                fps = self.frames_per_second.round(),
                frame_count = self.frame_count,
                time = frame.time,
                flash = frame.flash,
                hover = frame.logo_hover,
                "render stats"
            );
        }

        self.uniforms = GlitchUniforms::from(frame);
        Self::write_uniforms(&self.context.queue, &self.uniform_buffer, &self.uniforms);

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("hero encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("hero pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, texture_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Drops bound resources and invalidates the device.
    pub(crate) fn destroy(mut self) {
        self.texture_bind_group = None;
        self.textures = [None, None];
        self.context.destroy();
        debug!(frames = self.frame_count, "destroyed GPU state");
    }

    fn write_uniforms(queue: &wgpu::Queue, buffer: &wgpu::Buffer, uniforms: &GlitchUniforms) {
        queue.write_buffer(buffer, 0, bytemuck::bytes_of(uniforms));
    }
}
