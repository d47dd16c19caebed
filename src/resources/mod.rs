//! Loading of meshes and textures from external files.
//!
//! Files are resolved relative to the `assets/` directory next to the
//! binary (the build script copies the crate's `assets/` there).

use std::io::{BufReader, Cursor};

use anyhow::bail;

use crate::data_structures::{
    primitive::{Primitive, PrimitiveVertex},
    texture::Texture,
};

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    let path = std::path::Path::new("./").join("assets").join(file_name);
    let txt = std::fs::read_to_string(path)?;
    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    let path = std::path::Path::new("./").join("assets").join(file_name);
    let data = std::fs::read(path)?;
    Ok(data)
}

pub async fn load_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(file_name).await?;
    Texture::from_bytes(device, queue, &data, file_name, None)
}

/// Loads an OBJ file into a single indexed primitive.
///
/// Materials are ignored; only positions and normals are read. Meshes
/// without normals get zeroed ones and will render unlit.
pub async fn load_primitive_obj(
    file_name: &str,
    device: &wgpu::Device,
) -> anyhow::Result<Primitive> {
    let obj_text = load_string(file_name).await?;
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);

    let (models, _materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_material_path| async move {
            tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(String::new())))
        },
    )
    .await?;

    let mut vertices: Vec<PrimitiveVertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    for model in models.iter() {
        let base = vertices.len() as u32;
        let mesh = &model.mesh;
        if mesh.normals.is_empty() {
            log::warn!(
                "mesh {:?} in {} has no normals and will render unlit",
                model.name,
                file_name
            );
        }
        vertices.extend((0..mesh.positions.len() / 3).map(|i| PrimitiveVertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            normal: [
                mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
        }));
        indices.extend(mesh.indices.iter().map(|i| i + base));
    }

    if vertices.is_empty() {
        bail!("no geometry found in {}", file_name);
    }

    Ok(Primitive::from_indexed_vertices(
        device, file_name, &vertices, &indices,
    ))
}
