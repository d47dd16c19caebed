//! Per-entity transformation data for GPU rendering.
//!
//! Every mesh renderer uploads one [`InstanceRaw`] per frame: the entity's
//! world matrix, the normal matrix derived from its rotation, and the base
//! color the shading pipeline multiplies the light terms with.

use cgmath::{Matrix3, Matrix4, Quaternion};

use crate::data_structures::primitive::Vertex;

/// The raw instance is the actual data stored on the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    color: [f32; 4],
}

impl InstanceRaw {
    pub fn new(transform: Matrix4<f32>, rotation: Quaternion<f32>, color: [f32; 4]) -> Self {
        Self {
            model: transform.into(),
            normal: Matrix3::from(rotation).into(),
            color,
        }
    }
}

impl Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Advance per instance, not per vertex.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // A mat4 occupies four vec4 slots.
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // The normal matrix as three vec3 rows.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Base color.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 25]>() as wgpu::BufferAddress,
                    shader_location: 12,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{One, SquareMatrix};

    #[test]
    fn identity_transform_round_trips() {
        let raw = InstanceRaw::new(
            Matrix4::identity(),
            Quaternion::one(),
            [0.0, 0.1, 1.0, 1.0],
        );
        let identity_model: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        let identity_normal: [[f32; 3]; 3] = Matrix3::<f32>::identity().into();
        assert_eq!(raw.model, identity_model);
        assert_eq!(raw.normal, identity_normal);
        assert_eq!(raw.color, [0.0, 0.1, 1.0, 1.0]);
    }

    #[test]
    fn layout_covers_the_whole_struct() {
        let desc = InstanceRaw::desc();
        assert_eq!(
            desc.array_stride,
            std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress
        );
        let last = desc.attributes.last().unwrap();
        assert_eq!(
            last.offset + std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
            desc.array_stride
        );
    }
}
