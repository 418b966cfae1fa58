use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use bytemuck::Zeroable;
use carousel::{TextureId, UniformSnapshot};
use tracing::{debug, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::context::GpuContext;
use super::pipeline::{create_carousel_pipeline, create_texture_bind_group, PipelineLayouts};
use super::textures::TextureStore;
use super::uniforms::CarouselUniforms;

type BindingKey = (TextureId, TextureId, TextureId);

/// GPU resources for one window: surface, the carousel pipeline, its uniform
/// buffer and the loaded textures.
pub(crate) struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    textures: TextureStore,
    bind_groups: HashMap<BindingKey, wgpu::BindGroup>,
    clear_color: wgpu::Color,
}

impl GpuState {
    pub(crate) fn new(
        window: Arc<Window>,
        size: PhysicalSize<u32>,
        clear_color: wgpu::Color,
    ) -> Result<Self> {
        let context = GpuContext::new(window, size)?;
        let layouts = PipelineLayouts::new(&context.device);
        let pipeline = create_carousel_pipeline(&context.device, &layouts, context.surface_format);

        let uniform_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("carousel uniforms"),
                contents: bytemuck::bytes_of(&CarouselUniforms::zeroed()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let textures = TextureStore::new(
            context.device.clone(),
            context.queue.clone(),
            context.max_texture_dimension,
        );

        Ok(Self {
            context,
            layouts,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            textures,
            bind_groups: HashMap::new(),
            clear_color,
        })
    }

    pub(crate) fn textures_mut(&mut self) -> &mut TextureStore {
        &mut self.textures
    }

    pub(crate) fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    /// Uploads `snapshot`, then clears and draws the full-screen triangle once.
    pub(crate) fn render(&mut self, snapshot: &UniformSnapshot) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniforms = CarouselUniforms::from_snapshot(snapshot);
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let key = (snapshot.texture0.id, snapshot.texture1.id, snapshot.noise.id);
        self.ensure_bind_group(key);

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("carousel pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(texture_group) = self.bind_groups.get(&key) {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_bind_group(1, texture_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Bind groups are cached per `(slot 0, slot 1, noise)` triple.
    fn ensure_bind_group(&mut self, key: BindingKey) {
        if self.bind_groups.contains_key(&key) {
            return;
        }
        let (slot0, slot1, noise) = key;
        let textures = match (
            self.textures.get(slot0),
            self.textures.get(slot1),
            self.textures.get(noise),
        ) {
            (Some(a), Some(b), Some(c)) => [a, b, c],
            _ => {
                warn!(?key, "texture bound to the carousel is not in the store; skipping draw");
                return;
            }
        };
        let group = create_texture_bind_group(
            &self.context.device,
            &self.layouts.texture_layout,
            textures,
        );
        debug!(?key, cached = self.bind_groups.len() + 1, "created texture bind group");
        self.bind_groups.insert(key, group);
    }
}
