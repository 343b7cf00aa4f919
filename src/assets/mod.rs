//! Asset import: decoding external files into engine-native descriptors.
//!
//! - `mesh` decodes OBJ and glTF/GLB into [`ModelData`]
//! - `texture` decodes image files into [`TextureData`]
//! - `primitives` generates meshes and textures procedurally
//! - `loader` runs imports on a background pool and hands results back at
//!   frame boundaries
//!
//! Import never touches the GPU. A decoded descriptor is uploaded later,
//! explicitly, through the resource manager.

use std::path::Path;

use crate::data_structures::model::{ModelData, TextureData};
use crate::error::ImportError;

pub mod loader;
pub mod mesh;
pub mod primitives;
pub mod texture;

/// Any asset an import can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportedAsset {
    Model(ModelData),
    Texture(TextureData),
}

/// Decode `path` by file extension.
pub fn import(path: &Path) -> Result<ImportedAsset, ImportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "obj" => Ok(ImportedAsset::Model(mesh::load_obj(path)?)),
        "gltf" | "glb" => Ok(ImportedAsset::Model(mesh::load_gltf(path)?)),
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "tif" | "tiff" | "bmp" | "ico" | "hdr"
        | "exr" | "qoi" => Ok(ImportedAsset::Texture(texture::load_texture(path)?)),
        _ => Err(ImportError::Unsupported {
            path: path.to_path_buf(),
        }),
    }
}
