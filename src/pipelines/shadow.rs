//! Shadow map resources: the offscreen framebuffer and light-matrix binding.
//!
//! The shadow map is the depth side of an ordinary offscreen framebuffer:
//! the shadow pass renders the scene from the light's camera into it, the
//! main pass samples it through a comparison sampler. The color side is
//! kept — it carries the light camera's clear color and feeds the debug
//! overlay.

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::data_structures::texture::{Texture, create_default_sampler};

/// Default edge length of the shadow map framebuffer.
pub const SHADOW_MAP_SIZE: u32 = 512;

/// Maps clip space onto shadow map texture coordinates: x/y from [-1, 1] to
/// [0, 1] with y flipped, z kept (wgpu clip z is already [0, 1]).
#[rustfmt::skip]
pub const SHADOW_BIAS_MATRIX: Matrix4<f32> = Matrix4::new(
    0.5, 0.0, 0.0, 0.0,
    0.0, -0.5, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.5, 0.5, 0.0, 1.0,
);

/// An offscreen framebuffer: color and depth textures of the same size.
#[derive(Debug)]
pub struct OffscreenTarget {
    pub color: Texture,
    pub depth: Texture,
    pub width: u32,
    pub height: u32,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let color = Texture::create_render_target(device, [width, height], "offscreen_color");
        let depth = Texture::create_depth_texture(device, [width, height], "offscreen_depth");
        Self {
            color,
            depth,
            width,
            height,
        }
    }
}

/// GPU representation of the light's shadow matrix.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniform {
    pub light_matrix: [[f32; 4]; 4],
}

impl Default for ShadowUniform {
    fn default() -> Self {
        Self {
            light_matrix: Matrix4::identity().into(),
        }
    }
}

/// bias · light projection · light view — the matrix that takes a world
/// position into shadow map coordinates.
///
/// Returns `None` when the light transform is not invertible.
pub fn compute_light_matrix(
    light_projection: Matrix4<f32>,
    light_transform: Matrix4<f32>,
) -> Option<Matrix4<f32>> {
    let light_view = light_transform.invert()?;
    Some(SHADOW_BIAS_MATRIX * light_projection * light_view)
}

/// Layout of the shadow bind group: light matrix, depth map, comparison
/// sampler.
pub fn shadow_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("shadow_bind_group_layout"),
    })
}

/// Per-scene shadow binding: the shadow map target plus the light-matrix
/// buffer and bind group sampling it.
#[derive(Debug)]
pub struct ShadowBinding {
    pub target: Arc<OffscreenTarget>,
    pub matrix_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ShadowBinding {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        target: Arc<OffscreenTarget>,
    ) -> Self {
        let matrix_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Matrix Buffer"),
            contents: bytemuck::cast_slice(&[ShadowUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = target
            .depth
            .sampler
            .clone()
            .unwrap_or_else(|| create_default_sampler(device));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: matrix_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&target.depth.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("shadow_bind_group"),
        });

        Self {
            target,
            matrix_buffer,
            bind_group,
        }
    }

    pub fn write_matrix(&self, queue: &wgpu::Queue, light_matrix: Matrix4<f32>) {
        let uniform = ShadowUniform {
            light_matrix: light_matrix.into(),
        };
        queue.write_buffer(&self.matrix_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Point3, Transform, Vector4};

    fn close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{} != {}", a, b);
    }

    #[test]
    fn bias_matrix_maps_clip_space_to_texture_coordinates() {
        let center = SHADOW_BIAS_MATRIX * Vector4::new(0.0, 0.0, 0.3, 1.0);
        close(center.x, 0.5);
        close(center.y, 0.5);
        close(center.z, 0.3);

        // Clip-space top-left lands on the texture origin.
        let top_left = SHADOW_BIAS_MATRIX * Vector4::new(-1.0, 1.0, 0.0, 1.0);
        close(top_left.x, 0.0);
        close(top_left.y, 0.0);
    }

    #[test]
    fn light_matrix_composes_bias_projection_and_inverse_transform() {
        let projection = cgmath::ortho(-2.0, 2.0, -2.0, 2.0, 0.0, 10.0);
        let light_transform = Matrix4::from_translation([0.0, 0.0, 5.0].into());

        let matrix = compute_light_matrix(projection, light_transform).unwrap();

        // A point at the world origin sits 5 units in front of the light,
        // centered, so it maps to the middle of the shadow map.
        let mapped = matrix.transform_point(Point3::new(0.0, 0.0, 0.0));
        close(mapped.x, 0.5);
        close(mapped.y, 0.5);
    }

    #[test]
    fn singular_light_transform_is_rejected() {
        let projection = cgmath::ortho(-1.0, 1.0, -1.0, 1.0, 0.0, 1.0);
        let singular = Matrix4::from_nonuniform_scale(1.0, 1.0, 0.0);
        assert!(compute_light_matrix(projection, singular).is_none());
    }
}
