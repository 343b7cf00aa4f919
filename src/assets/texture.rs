//! Texture decoding into engine descriptors.

use std::path::Path;

use image::DynamicImage;

use crate::data_structures::model::{ChannelLayout, TextureData};
use crate::error::ImportError;

/// Decode an image file from disk.
pub fn load_texture(path: &Path) -> Result<TextureData, ImportError> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_texture(path, &path.display().to_string(), &bytes)
}

/// Decode an in-memory image (embedded glTF textures, downloaded bytes).
///
/// Single-channel and three-channel images keep their layout; everything
/// else is expanded to RGBA8.
pub fn decode_texture(path: &Path, name: &str, bytes: &[u8]) -> Result<TextureData, ImportError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ImportError::decode(path, "image", e))?;

    let (width, height) = (decoded.width(), decoded.height());
    let (layout, pixels) = match decoded {
        DynamicImage::ImageLuma8(img) => (ChannelLayout::Gray8, img.into_raw()),
        DynamicImage::ImageRgb8(img) => (ChannelLayout::Rgb8, img.into_raw()),
        other => (ChannelLayout::Rgba8, other.to_rgba8().into_raw()),
    };

    Ok(TextureData {
        name: name.to_string(),
        width,
        height,
        layout,
        pixels,
    })
}
