//! Mesh renderer component: a GPU primitive plus a shading pipeline.
//!
//! The primitive comes from a built-in template ("cube", "plane") or a mesh
//! file; both the primitive and the pipeline are reference-counted GPU
//! handles, so renderers can share them freely. Every frame the renderer
//! uploads its entity's world matrix and base color as instance data.

use std::any::Any;

use anyhow::anyhow;
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{instance::InstanceRaw, primitive::Primitive},
    entity::{Component, ComponentType, EntityState},
    pipelines::scene::{ScenePipeline, TargetKind},
    resources,
};

pub struct MeshRenderer {
    primitive: Primitive,
    pipeline: ScenePipeline,
    color: [f32; 4],
    instance_buffer: wgpu::Buffer,
}

impl MeshRenderer {
    pub fn from_primitive(
        device: &wgpu::Device,
        pipeline: ScenePipeline,
        primitive: Primitive,
    ) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&[InstanceRaw::new(
                cgmath::Matrix4::from_scale(1.0),
                cgmath::Quaternion::new(1.0, 0.0, 0.0, 0.0),
                [1.0, 1.0, 1.0, 1.0],
            )]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            primitive,
            pipeline,
            color: [1.0, 1.0, 1.0, 1.0],
            instance_buffer,
        }
    }

    /// Builds a renderer from one of the built-in primitive templates.
    pub fn from_template(
        device: &wgpu::Device,
        pipeline: ScenePipeline,
        name: &str,
    ) -> anyhow::Result<Self> {
        let primitive = match name {
            "cube" => Primitive::cube(device),
            "plane" => Primitive::plane(device),
            other => return Err(anyhow!("unknown primitive template: {}", other)),
        };
        Ok(Self::from_primitive(device, pipeline, primitive))
    }

    /// Loads the primitive from an OBJ file under `assets/`.
    pub async fn from_file(
        device: &wgpu::Device,
        pipeline: ScenePipeline,
        file_name: &str,
    ) -> anyhow::Result<Self> {
        let primitive = resources::load_primitive_obj(file_name, device).await?;
        Ok(Self::from_primitive(device, pipeline, primitive))
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
    }

    pub fn pipeline(&self) -> &ScenePipeline {
        &self.pipeline
    }

    pub fn set_pipeline(&mut self, pipeline: ScenePipeline) {
        self.pipeline = pipeline;
    }

    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }
}

impl Component for MeshRenderer {
    fn component_type(&self) -> ComponentType {
        ComponentType::MeshRenderer
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn upload(&mut self, state: &EntityState, ctx: &Context) {
        let raw = InstanceRaw::new(state.current_transform(), state.rotation(), self.color);
        ctx.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&[raw]));
    }

    fn draw<'pass>(
        &'pass self,
        _state: &EntityState,
        render_pass: &mut wgpu::RenderPass<'pass>,
        target: TargetKind,
    ) {
        render_pass.set_pipeline(self.pipeline.variant(target));
        render_pass.set_vertex_buffer(0, self.primitive.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        match &self.primitive.index_buffer {
            Some(index_buffer) => {
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.primitive.num_elements, 0, 0..1);
            }
            None => render_pass.draw(0..self.primitive.num_elements, 0..1),
        }
    }
}
