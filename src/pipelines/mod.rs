//! Render pipeline definitions and the GPU resources they bind.
//!
//! - `scene` is the diffuse-specular pipeline with shadow sampling, compiled
//!   once per color-target format so one handle draws to any target
//! - `shadow` holds the offscreen framebuffer used as shadow map and the
//!   light-matrix binding
//! - `debug` draws textured overlay quads, e.g. to inspect the shadow map

pub mod debug;
pub mod scene;
pub mod shadow;

use crate::pipelines::{debug::DebugPipelines, scene::ScenePipeline};

/// The pipeline set owned by the context.
#[derive(Clone, Debug)]
pub struct Pipelines {
    pub scene: ScenePipeline,
    pub debug: DebugPipelines,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
        shadow_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            scene: ScenePipeline::new(
                device,
                surface_format,
                camera_bind_group_layout,
                light_bind_group_layout,
                shadow_bind_group_layout,
            ),
            debug: DebugPipelines::new(device, surface_format),
        }
    }
}
