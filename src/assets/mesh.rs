//! Mesh and model decoding (OBJ and glTF).

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use cgmath::InnerSpace;
use gltf::Gltf;

use crate::data_structures::model::{
    MaterialData, MeshData, ModelData, ModelVertex, NodeData, TextureData,
};
use crate::data_structures::transform::Transform;
use crate::error::ImportError;

use super::texture;

/// Fill in vertex normals from face geometry.
///
/// Each vertex gets the area-weighted average of its adjoining face normals.
/// OBJ files often ship without normals; glTF primitives occasionally do too.
pub fn generate_normals(vertices: &mut [ModelVertex], indices: &[u32]) {
    for v in vertices.iter_mut() {
        v.normal = [0.0; 3];
    }
    for tri in indices.chunks_exact(3) {
        let p0: cgmath::Vector3<f32> = vertices[tri[0] as usize].position.into();
        let p1: cgmath::Vector3<f32> = vertices[tri[1] as usize].position.into();
        let p2: cgmath::Vector3<f32> = vertices[tri[2] as usize].position.into();
        // Unnormalized cross product: larger faces weigh more.
        let face = (p1 - p0).cross(p2 - p0);
        for &i in tri {
            let n: cgmath::Vector3<f32> = vertices[i as usize].normal.into();
            vertices[i as usize].normal = (n + face).into();
        }
    }
    for v in vertices.iter_mut() {
        let n: cgmath::Vector3<f32> = v.normal.into();
        if n.magnitude2() > 0.0 {
            v.normal = n.normalize().into();
        }
    }
}

/// Decode a Wavefront OBJ (with its MTL) into a [`ModelData`].
///
/// OBJ has no hierarchy, so every mesh becomes its own root node with an
/// identity transform.
pub fn load_obj(path: &Path) -> Result<ModelData, ImportError> {
    let text = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_obj(path, &text)
}

/// Decode OBJ text already in memory. `path` provides error context and the
/// base directory for MTL and texture references.
pub fn decode_obj(path: &Path, text: &str) -> Result<ModelData, ImportError> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let (models, obj_materials) = tobj::load_obj_buf(
        &mut BufReader::new(Cursor::new(text)),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |mtl| tobj::load_mtl(base.join(mtl)),
    )
    .map_err(|e| ImportError::decode(path, "obj", e))?;

    let mut materials = Vec::new();
    if let Ok(obj_materials) = obj_materials {
        for m in obj_materials {
            let diffuse = m.diffuse_texture.as_ref().and_then(|file| {
                match texture::load_texture(&base.join(file)) {
                    Ok(data) => Some(data),
                    Err(e) => {
                        log::warn!("skipping diffuse texture of material {}: {e}", m.name);
                        None
                    }
                }
            });
            let normal = m.normal_texture.as_ref().and_then(|file| {
                match texture::load_texture(&base.join(file)) {
                    Ok(data) => Some(data),
                    Err(e) => {
                        log::warn!("skipping normal texture of material {}: {e}", m.name);
                        None
                    }
                }
            });
            let [r, g, b] = m.diffuse.unwrap_or([1.0, 1.0, 1.0]);
            materials.push(MaterialData {
                name: m.name,
                base_color: [r, g, b, 1.0],
                diffuse,
                normal,
            });
        }
    }
    if materials.is_empty() {
        materials.push(MaterialData::default());
    }

    let mut meshes = Vec::new();
    for m in models {
        let had_normals = !m.mesh.normals.is_empty();
        let mut vertices = (0..m.mesh.positions.len() / 3)
            .map(|i| ModelVertex {
                position: [
                    m.mesh.positions[i * 3],
                    m.mesh.positions[i * 3 + 1],
                    m.mesh.positions[i * 3 + 2],
                ],
                tex_coords: [
                    m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                    1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                ],
                normal: [
                    m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                    m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                    m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                ],
                ..ModelVertex::default()
            })
            .collect::<Vec<_>>();
        if !had_normals {
            generate_normals(&mut vertices, &m.mesh.indices);
        }
        let material = m.mesh.material_id.unwrap_or(0).min(materials.len() - 1);
        meshes.push(MeshData {
            name: m.name,
            vertices,
            indices: m.mesh.indices,
            material,
        });
    }

    // Flat format: one root node per mesh.
    let nodes = meshes
        .iter()
        .enumerate()
        .map(|(i, mesh)| NodeData {
            name: Some(mesh.name.clone()),
            transform: Transform::new(),
            meshes: vec![i],
            children: Vec::new(),
        })
        .collect::<Vec<_>>();
    let roots = (0..nodes.len()).collect();

    Ok(ModelData {
        meshes,
        materials,
        nodes,
        roots,
    })
}

/// Decode a glTF or GLB file into a [`ModelData`], keeping its node
/// hierarchy and per-node transforms.
pub fn load_gltf(path: &Path) -> Result<ModelData, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let gltf = Gltf::from_reader(BufReader::new(file))
        .map_err(|e| ImportError::decode(path, "gltf", e))?;
    decode_gltf_document(path, gltf)
}

/// Decode glTF or GLB bytes already in memory. External buffer and image
/// URIs resolve relative to `path`'s directory.
pub fn decode_gltf(path: &Path, bytes: &[u8]) -> Result<ModelData, ImportError> {
    let gltf = Gltf::from_slice(bytes).map_err(|e| ImportError::decode(path, "gltf", e))?;
    decode_gltf_document(path, gltf)
}

fn decode_gltf_document(path: &Path, gltf: Gltf) -> Result<ModelData, ImportError> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => {
                    return Err(ImportError::decode(
                        path,
                        "buffer",
                        "file references a binary chunk it does not contain",
                    ))
                }
            },
            gltf::buffer::Source::Uri(uri) => {
                if uri.starts_with("data:") {
                    return Err(ImportError::decode(
                        path,
                        "buffer",
                        "base64 data URIs are not supported",
                    ));
                }
                let bin = std::fs::read(base.join(uri)).map_err(|source| ImportError::Io {
                    path: base.join(uri),
                    source,
                })?;
                buffer_data.push(bin);
            }
        }
    }

    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let name = material
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("material_{}", materials.len()));
        let diffuse = match pbr.base_color_texture() {
            Some(info) => Some(load_gltf_texture(
                path,
                base,
                &buffer_data,
                &info.texture(),
                &format!("{name}_diffuse"),
            )?),
            None => None,
        };
        let normal = match material.normal_texture() {
            Some(info) => Some(load_gltf_texture(
                path,
                base,
                &buffer_data,
                &info.texture(),
                &format!("{name}_normal"),
            )?),
            None => None,
        };
        materials.push(MaterialData {
            name,
            base_color: pbr.base_color_factor(),
            diffuse,
            normal,
        });
    }
    // Primitives without a material reference this fallback entry.
    let default_material = materials.len();
    materials.push(MaterialData::default());

    let mut meshes = Vec::new();
    // glTF mesh index to the range of flattened primitive meshes.
    let mut primitive_lists: Vec<Vec<usize>> = Vec::new();
    for mesh in gltf.meshes() {
        let mesh_name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let mut list = Vec::new();
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| ImportError::decode(path, "primitive", "missing positions"))?
                .collect();

            let mut vertices: Vec<ModelVertex> = positions
                .into_iter()
                .map(|position| ModelVertex {
                    position,
                    ..ModelVertex::default()
                })
                .collect();
            if let Some(tex_coords) = reader.read_tex_coords(0) {
                for (v, uv) in vertices.iter_mut().zip(tex_coords.into_f32()) {
                    v.tex_coords = uv;
                }
            }
            let mut had_normals = false;
            if let Some(normals) = reader.read_normals() {
                had_normals = true;
                for (v, normal) in vertices.iter_mut().zip(normals) {
                    v.normal = normal;
                }
            }
            if let Some(joints) = reader.read_joints(0) {
                for (v, joint) in vertices.iter_mut().zip(joints.into_u16()) {
                    v.joints = joint;
                }
            }
            if let Some(weights) = reader.read_weights(0) {
                for (v, weight) in vertices.iter_mut().zip(weights.into_f32()) {
                    v.weights = weight;
                }
            }

            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };
            let max = vertices.len() as u32;
            if let Some(&bad) = indices.iter().find(|&&i| i >= max) {
                return Err(ImportError::decode(
                    path,
                    "primitive",
                    format!("index {bad} out of range for {max} vertices"),
                ));
            }
            if !had_normals {
                generate_normals(&mut vertices, &indices);
            }

            list.push(meshes.len());
            meshes.push(MeshData {
                name: mesh_name.clone(),
                vertices,
                indices,
                material: primitive.material().index().unwrap_or(default_material),
            });
        }
        primitive_lists.push(list);
    }

    let nodes = gltf
        .nodes()
        .map(|node| {
            let (translation, rotation, scale) = node.transform().decomposed();
            NodeData {
                name: node.name().map(str::to_string),
                transform: Transform {
                    position: translation.into(),
                    // Decomposed rotation is xyzw, matching cgmath's array order.
                    rotation: rotation.into(),
                    scale: scale.into(),
                },
                meshes: node
                    .mesh()
                    .map(|m| primitive_lists[m.index()].clone())
                    .unwrap_or_default(),
                children: node.children().map(|c| c.index()).collect(),
            }
        })
        .collect();

    let roots = match gltf.default_scene().or_else(|| gltf.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => Vec::new(),
    };

    Ok(ModelData {
        meshes,
        materials,
        nodes,
        roots,
    })
}

fn load_gltf_texture(
    path: &Path,
    base: &Path,
    buffer_data: &[Vec<u8>],
    tex: &gltf::Texture,
    name: &str,
) -> Result<TextureData, ImportError> {
    match tex.source().source() {
        gltf::image::Source::View { view, .. } => {
            let buffer = buffer_data.get(view.buffer().index()).ok_or_else(|| {
                ImportError::decode(path, "texture", "image view references a missing buffer")
            })?;
            let bytes = buffer
                .get(view.offset()..view.offset() + view.length())
                .ok_or_else(|| {
                    ImportError::decode(path, "texture", "image view exceeds its buffer")
                })?;
            texture::decode_texture(path, name, bytes)
        }
        gltf::image::Source::Uri { uri, .. } => texture::load_texture(&base.join(uri)),
    }
}
