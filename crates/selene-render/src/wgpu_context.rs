//! [`GraphicsContext`] backed by a wgpu device and window surface.

use std::collections::HashMap;
use std::num::NonZeroU64;

use selene_mesh::{MeshIndex, SphereMesh, SphereVertex};

use crate::buffer::{MeshBuffer, SphereAttributes};
use crate::context::{
    ContextError, DrawCall, GraphicsContext, MeshHandle, ProgramHandle, RenderSettings,
    TextureHandle,
};
use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, RenderContextError};
use crate::shader::{ResourceKind, ResourceSlot, ShaderProgram, UniformLocation};
use crate::texture::{DecodedImage, SurfaceTexture, TextureError, TexturePolicy};

struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    /// Indexed by group number.
    bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    uniform_buffers: HashMap<(u32, u32), wgpu::Buffer>,
    slots: Vec<ResourceSlot>,
}

/// Renders into a window through wgpu.
pub struct WgpuContext {
    render: RenderContext,
    depth: DepthBuffer,
    settings: RenderSettings,
    next_handle: u64,
    programs: HashMap<u64, GpuProgram>,
    meshes: HashMap<u64, MeshBuffer>,
    textures: HashMap<u64, SurfaceTexture>,
    /// Bind groups per `(program, texture)` pair, indexed by group number.
    bind_groups: HashMap<(u64, u64), Vec<wgpu::BindGroup>>,
}

impl WgpuContext {
    pub fn new(render: RenderContext) -> Self {
        let (width, height) = render.size();
        let depth = DepthBuffer::new(&render.device, width, height);
        Self {
            render,
            depth,
            settings: RenderSettings::default(),
            next_handle: 1,
            programs: HashMap::new(),
            meshes: HashMap::new(),
            textures: HashMap::new(),
            bind_groups: HashMap::new(),
        }
    }

    pub fn render_context(&self) -> &RenderContext {
        &self.render
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    fn bind_groups_for(
        &mut self,
        program_id: u64,
        texture_id: u64,
        call: &DrawCall<'_>,
    ) -> Result<(), ContextError> {
        if self.bind_groups.contains_key(&(program_id, texture_id)) {
            return Ok(());
        }

        let program = self
            .programs
            .get(&program_id)
            .ok_or(ContextError::UnknownHandle {
                kind: "program",
                id: program_id,
            })?;
        let texture = self
            .textures
            .get(&texture_id)
            .ok_or(ContextError::UnknownHandle {
                kind: "texture",
                id: texture_id,
            })?;

        let mut groups = Vec::with_capacity(program.bind_group_layouts.len());
        for (group, layout) in program.bind_group_layouts.iter().enumerate() {
            let group = group as u32;
            let mut entries = Vec::new();
            for slot in program.slots.iter().filter(|s| s.group == group) {
                let resource = match slot.kind {
                    ResourceKind::UniformBuffer { .. } => program
                        .uniform_buffers
                        .get(&(slot.group, slot.binding))
                        .map(|buffer| buffer.as_entire_binding()),
                    ResourceKind::Texture2d if targets(call.texture_location, slot) => {
                        Some(wgpu::BindingResource::TextureView(&texture.view))
                    }
                    ResourceKind::Sampler if targets(call.sampler_location, slot) => {
                        Some(wgpu::BindingResource::Sampler(&texture.sampler))
                    }
                    _ => None,
                };
                let resource = resource.ok_or_else(|| ContextError::Pipeline {
                    reason: format!(
                        "nothing bound to '{}' at group {} binding {}",
                        slot.name, slot.group, slot.binding
                    ),
                })?;
                entries.push(wgpu::BindGroupEntry {
                    binding: slot.binding,
                    resource,
                });
            }

            groups.push(
                self.render
                    .device
                    .create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("sphere-bind-group"),
                        layout,
                        entries: &entries,
                    }),
            );
        }

        self.bind_groups.insert((program_id, texture_id), groups);
        Ok(())
    }
}

fn targets(location: UniformLocation, slot: &ResourceSlot) -> bool {
    matches!(
        location,
        UniformLocation::Resource { group, binding, .. }
            if group == slot.group && binding == slot.binding
    )
}

fn layout_entry(slot: &ResourceSlot) -> wgpu::BindGroupLayoutEntry {
    let ty = match slot.kind {
        ResourceKind::UniformBuffer { size } => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(u64::from(size)),
        },
        ResourceKind::Texture2d => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        ResourceKind::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
    };
    wgpu::BindGroupLayoutEntry {
        binding: slot.binding,
        visibility: slot.visibility,
        ty,
        count: None,
    }
}

fn context_lost(err: RenderContextError) -> ContextError {
    ContextError::Lost {
        reason: err.to_string(),
    }
}

impl GraphicsContext for WgpuContext {
    fn create_program(
        &mut self,
        program: &ShaderProgram,
        attributes: &SphereAttributes,
    ) -> Result<ProgramHandle, ContextError> {
        let device = &self.render.device;
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sphere-vertex"),
            source: wgpu::ShaderSource::Wgsl(program.vertex_source().into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sphere-fragment"),
            source: wgpu::ShaderSource::Wgsl(program.fragment_source().into()),
        });

        let slots = program.resources().to_vec();
        let group_count = slots.iter().map(|s| s.group + 1).max().unwrap_or(0);
        let bind_group_layouts: Vec<wgpu::BindGroupLayout> = (0..group_count)
            .map(|group| {
                let entries: Vec<_> = slots
                    .iter()
                    .filter(|s| s.group == group)
                    .map(layout_entry)
                    .collect();
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("sphere-bind-group-layout"),
                    entries: &entries,
                })
            })
            .collect();

        let uniform_buffers = slots
            .iter()
            .filter_map(|slot| match slot.kind {
                ResourceKind::UniformBuffer { size } => Some((
                    (slot.group, slot.binding),
                    device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(&format!("{}-uniforms", slot.name)),
                        size: u64::from(size),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    }),
                )),
                _ => None,
            })
            .collect();

        let layout_refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sphere-pipeline-layout"),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        let vertex_attributes = attributes.vertex_attributes(program.id());
        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: SphereVertex::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &vertex_attributes,
        };

        let mut depth_state = DepthBuffer::state();
        if !self.settings.depth_test {
            depth_state.depth_compare = wgpu::CompareFunction::Always;
            depth_state.depth_write_enabled = false;
        }

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sphere-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(program.vertex_entry_point()),
                buffers: &[vertex_layout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(depth_state),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(program.fragment_entry_point()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.render.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(ContextError::Pipeline {
                reason: err.to_string(),
            });
        }

        let handle = ProgramHandle(self.allocate());
        self.programs.insert(
            handle.0,
            GpuProgram {
                pipeline,
                bind_group_layouts,
                uniform_buffers,
                slots,
            },
        );
        log::debug!("Created sphere pipeline for program {}", program.id().get());
        Ok(handle)
    }

    fn upload_mesh<I: MeshIndex>(
        &mut self,
        mesh: &SphereMesh<I>,
    ) -> Result<MeshHandle, ContextError> {
        let buffer = MeshBuffer::from_mesh(&self.render.device, mesh);
        let handle = MeshHandle(self.allocate());
        self.meshes.insert(handle.0, buffer);
        Ok(handle)
    }

    fn upload_texture(
        &mut self,
        image: &DecodedImage,
        policy: &TexturePolicy,
    ) -> Result<TextureHandle, TextureError> {
        let texture =
            SurfaceTexture::upload(&self.render.device, &self.render.queue, image, policy)?;
        let handle = TextureHandle(self.allocate());
        self.textures.insert(handle.0, texture);
        Ok(handle)
    }

    fn configure(&mut self, settings: &RenderSettings) {
        self.settings = *settings;
    }

    fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), ContextError> {
        self.render.resize(width, height);
        let (width, height) = self.render.size();
        self.depth.resize(&self.render.device, width, height);
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), ContextError> {
        self.bind_groups_for(call.program.0, call.texture.0, call)?;

        let program = self
            .programs
            .get(&call.program.0)
            .ok_or(ContextError::UnknownHandle {
                kind: "program",
                id: call.program.0,
            })?;
        let mesh = self
            .meshes
            .get(&call.mesh.0)
            .ok_or(ContextError::UnknownHandle {
                kind: "mesh",
                id: call.mesh.0,
            })?;
        let bind_groups = self
            .bind_groups
            .get(&(call.program.0, call.texture.0))
            .ok_or(ContextError::UnknownHandle {
                kind: "texture",
                id: call.texture.0,
            })?;

        for (group, binding, bytes) in call.uniforms.iter() {
            if let Some(buffer) = program.uniform_buffers.get(&(group, binding)) {
                self.render.queue.write_buffer(buffer, 0, bytes);
            }
        }

        let frame = match self.render.get_current_texture() {
            Ok(frame) => frame,
            Err(RenderContextError::Timeout) => {
                log::warn!("Timed out acquiring frame, skipping");
                return Ok(());
            }
            Err(err) => return Err(context_lost(err)),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .render
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sphere-frame-encoder"),
            });

        let [r, g, b, a] = self.settings.clear_color.map(f64::from);
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sphere-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(&program.pipeline);
            for (group, bind_group) in bind_groups.iter().enumerate() {
                pass.set_bind_group(group as u32, bind_group, &[]);
            }
            mesh.bind(&mut pass);
            mesh.draw(&mut pass);
        }

        self.render.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn release_program(&mut self, handle: ProgramHandle) {
        self.programs.remove(&handle.0);
        self.bind_groups.retain(|(program, _), _| *program != handle.0);
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        self.meshes.remove(&handle.0);
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle.0);
        self.bind_groups.retain(|(_, texture), _| *texture != handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{SPHERE_FRAGMENT_SHADER, SPHERE_VERTEX_SHADER};

    #[test]
    fn test_layout_entries_follow_reflected_slots() {
        let program =
            ShaderProgram::compile_and_link(SPHERE_VERTEX_SHADER, SPHERE_FRAGMENT_SHADER).unwrap();
        let entries: Vec<_> = program.resources().iter().map(layout_entry).collect();

        assert_eq!(entries.len(), 3);
        assert!(matches!(
            entries[0].ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                ..
            }
        ));
        assert!(matches!(entries[1].ty, wgpu::BindingType::Texture { .. }));
        assert!(matches!(entries[2].ty, wgpu::BindingType::Sampler(_)));
        assert_eq!(entries[2].visibility, wgpu::ShaderStages::FRAGMENT);
    }

    #[test]
    fn test_resource_location_targets_matching_slot_only() {
        let program =
            ShaderProgram::compile_and_link(SPHERE_VERTEX_SHADER, SPHERE_FRAGMENT_SHADER).unwrap();
        let texture_slot = &program.resources()[1];
        let sampler_slot = &program.resources()[2];
        let location = program.uniform_location("surface_texture");

        assert!(targets(location, texture_slot));
        assert!(!targets(location, sampler_slot));
        assert!(!targets(UniformLocation::Invalid, texture_slot));
    }
}
