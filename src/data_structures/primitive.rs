//! GPU primitives: vertex data plus the buffers it lives in.
//!
//! A [`Primitive`] pairs a vertex buffer (and optionally an index buffer)
//! with its element count. The built-in templates produce the unit cube and
//! a 20x20 floor plane; arbitrary meshes come in through
//! [`crate::resources::load_primitive_obj`].

use wgpu::util::DeviceExt;

/// Anything that can describe its GPU vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PrimitiveVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for PrimitiveVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<PrimitiveVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/*
 *        f +--------+ e
 *         /        /|
 *        /        / |
 *    b  /      a /  |
 *      +--------+   |
 *      |  g     |   + h
 *      |        |  /
 *      |        | /
 *    c |        |/
 *      +--------+ d
 */
const CUBE_CORNERS: [[f32; 3]; 8] = [
    [1.0, 1.0, 1.0],    // a
    [-1.0, 1.0, 1.0],   // b
    [-1.0, -1.0, 1.0],  // c
    [1.0, -1.0, 1.0],   // d
    [1.0, 1.0, -1.0],   // e
    [-1.0, 1.0, -1.0],  // f
    [-1.0, -1.0, -1.0], // g
    [1.0, -1.0, -1.0],  // h
];

// Each face as (normal, counter-clockwise corner indices).
const CUBE_FACES: [([f32; 3], [usize; 4]); 6] = [
    ([0.0, 0.0, 1.0], [0, 1, 2, 3]),  // front: a b c d
    ([1.0, 0.0, 0.0], [4, 0, 3, 7]),  // right: e a d h
    ([0.0, 0.0, -1.0], [5, 4, 7, 6]), // back: f e h g
    ([-1.0, 0.0, 0.0], [1, 5, 6, 2]), // left: b f g c
    ([0.0, 1.0, 0.0], [4, 5, 1, 0]),  // top: e f b a
    ([0.0, -1.0, 0.0], [2, 6, 7, 3]), // bottom: c g h d
];

pub(crate) fn cube_vertices() -> Vec<PrimitiveVertex> {
    let mut vertices = Vec::with_capacity(36);
    for (normal, corners) in CUBE_FACES.iter() {
        for &index in [corners[0], corners[1], corners[2], corners[2], corners[3], corners[0]].iter()
        {
            vertices.push(PrimitiveVertex {
                position: CUBE_CORNERS[index],
                normal: *normal,
            });
        }
    }
    vertices
}

/*
 *        b +--------+ a
 *         /        /
 *        /        /
 *    c  /      d /
 *      +--------+
 */
pub(crate) fn plane_vertices() -> Vec<PrimitiveVertex> {
    let corners = [
        [10.0, -2.0, -10.0],  // a
        [-10.0, -2.0, -10.0], // b
        [-10.0, -2.0, 10.0],  // c
        [10.0, -2.0, 10.0],   // d
    ];
    let normal = [0.0, 1.0, 0.0];
    [0, 1, 2, 2, 3, 0]
        .iter()
        .map(|&index: &usize| PrimitiveVertex {
            position: corners[index],
            normal,
        })
        .collect()
}

/// A GPU-resident vertex (and optional index) buffer pairing.
///
/// Cheap to clone; the underlying buffers are reference counted by wgpu.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: Option<wgpu::Buffer>,
    /// Index count when indexed, vertex count otherwise.
    pub num_elements: u32,
}

impl Primitive {
    pub fn from_vertices(
        device: &wgpu::Device,
        name: &str,
        vertices: &[PrimitiveVertex],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer: None,
            num_elements: vertices.len() as u32,
        }
    }

    pub fn from_indexed_vertices(
        device: &wgpu::Device,
        name: &str,
        vertices: &[PrimitiveVertex],
        indices: &[u32],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer: Some(index_buffer),
            num_elements: indices.len() as u32,
        }
    }

    /// The unit cube template, 36 non-indexed vertices with face normals.
    pub fn cube(device: &wgpu::Device) -> Self {
        Self::from_vertices(device, "cube", &cube_vertices())
    }

    /// The floor plane template: 20x20 units at y = -2.
    pub fn plane(device: &wgpu::Device) -> Self {
        Self::from_vertices(device, "plane", &plane_vertices())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_36_vertices_with_unit_normals() {
        let vertices = cube_vertices();
        assert_eq!(vertices.len(), 36);
        for vertex in vertices.iter() {
            let len = vertex.normal.iter().map(|n| n * n).sum::<f32>().sqrt();
            assert!((len - 1.0).abs() < 1e-6);
            // All corners sit on the unit cube.
            for p in vertex.position.iter() {
                assert_eq!(p.abs(), 1.0);
            }
        }
    }

    #[test]
    fn cube_faces_wind_counter_clockwise() {
        let vertices = cube_vertices();
        for triangle in vertices.chunks(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]];
            let edge1 = [
                b.position[0] - a.position[0],
                b.position[1] - a.position[1],
                b.position[2] - a.position[2],
            ];
            let edge2 = [
                c.position[0] - b.position[0],
                c.position[1] - b.position[1],
                c.position[2] - b.position[2],
            ];
            let cross = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];
            // The face winding must agree with the declared normal.
            let dot: f32 = cross
                .iter()
                .zip(a.normal.iter())
                .map(|(c, n)| c * n)
                .sum();
            assert!(dot > 0.0);
        }
    }

    #[test]
    fn plane_lies_at_y_minus_two() {
        let vertices = plane_vertices();
        assert_eq!(vertices.len(), 6);
        for vertex in vertices.iter() {
            assert_eq!(vertex.position[1], -2.0);
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        }
    }
}
