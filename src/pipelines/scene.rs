//! The diffuse-specular shading pipeline with shadow sampling.
//!
//! Toolkit-style pipelines are not tied to a framebuffer, but wgpu render
//! pipelines are tied to a color format. [`ScenePipeline`] therefore
//! compiles the same shader once per target format (window surface and
//! offscreen RGBA8) and hands out the variant matching the pass.

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::data_structures::{
    instance::InstanceRaw,
    primitive::{PrimitiveVertex, Vertex},
    texture::Texture,
};

/// Which kind of target the current render pass draws into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    Onscreen,
    Offscreen,
}

/// GPU representation of the active camera.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// World-space eye position, w = 1.
    pub view_pos: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_pos: [0.0, 0.0, 0.0, 1.0],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn from_view_proj(view_proj: Matrix4<f32>, position: Vector3<f32>) -> Self {
        Self {
            view_pos: [position.x, position.y, position.z, 1.0],
            view_proj: view_proj.into(),
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// A uniform-buffer-only bind group layout, shared by camera and light.
pub fn uniform_bind_group_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some(label),
    })
}

/// The shading pipeline, one wgpu pipeline per color-target format.
///
/// Cheap to clone; wgpu pipelines are reference counted.
#[derive(Clone, Debug)]
pub struct ScenePipeline {
    onscreen: wgpu::RenderPipeline,
    offscreen: wgpu::RenderPipeline,
}

impl ScenePipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
        shadow_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[
                camera_bind_group_layout,
                light_bind_group_layout,
                shadow_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let mk_variant = |format| {
            let shader = wgpu::ShaderModuleDescriptor {
                label: Some("Scene Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
            };
            mk_render_pipeline(
                device,
                &layout,
                format,
                Some(wgpu::BlendState {
                    alpha: wgpu::BlendComponent::REPLACE,
                    color: wgpu::BlendComponent::REPLACE,
                }),
                Some(Texture::DEPTH_FORMAT),
                &[PrimitiveVertex::desc(), InstanceRaw::desc()],
                shader,
            )
        };

        Self {
            onscreen: mk_variant(surface_format),
            offscreen: mk_variant(Texture::RENDER_TARGET_FORMAT),
        }
    }

    pub fn variant(&self, target: TargetKind) -> &wgpu::RenderPipeline {
        match target {
            TargetKind::Onscreen => &self.onscreen,
            TargetKind::Offscreen => &self.offscreen,
        }
    }
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
