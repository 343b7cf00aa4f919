//! Engine-native asset descriptors.
//!
//! The asset importer decodes files into these in-memory descriptors; GPU
//! upload is a separate explicit step performed through the resource manager.
//! Descriptors are plain data: they hold no GPU state and no file handles.

use cgmath::InnerSpace;

use crate::data_structures::transform::Transform;

/// A single vertex as stored in mesh descriptors and uploaded verbatim.
///
/// Skinning joints/weights are always present and zeroed for meshes without
/// skeletal data, which keeps the layout `Pod` and the vertex stride fixed.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub weights: [f32; 4],
    pub joints: [u16; 4],
}

impl Default for ModelVertex {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

/// Sphere enclosing a mesh, used for frustum culling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: cgmath::Vector3<f32>,
    pub radius: f32,
}

impl BoundingSphere {
    /// Centroid-based enclosing sphere. Not minimal, but cheap and stable,
    /// which matters because culling results must be reproducible.
    pub fn from_vertices(vertices: &[ModelVertex]) -> Self {
        if vertices.is_empty() {
            return Self {
                center: cgmath::Vector3::new(0.0, 0.0, 0.0),
                radius: 0.0,
            };
        }
        let mut center = cgmath::Vector3::new(0.0, 0.0, 0.0);
        for v in vertices {
            center += cgmath::Vector3::from(v.position);
        }
        center /= vertices.len() as f32;
        let mut radius2: f32 = 0.0;
        for v in vertices {
            let d = cgmath::Vector3::from(v.position) - center;
            radius2 = radius2.max(d.magnitude2());
        }
        Self {
            center,
            radius: radius2.sqrt(),
        }
    }
}

/// Decoded triangle mesh: vertices plus an index sequence defining triangles.
/// Immutable once uploaded; re-import creates a new mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// Index into the owning model's material list.
    pub material: usize,
}

impl MeshData {
    pub fn bounds(&self) -> BoundingSphere {
        BoundingSphere::from_vertices(&self.vertices)
    }

    /// Descriptor-level validation performed before any GPU allocation.
    pub fn validate(&self) -> Result<(), String> {
        if self.vertices.is_empty() {
            return Err("mesh has no vertices".into());
        }
        if self.indices.is_empty() {
            return Err("mesh has no indices".into());
        }
        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            ));
        }
        let max = self.vertices.len() as u32;
        if let Some(bad) = self.indices.iter().find(|&&i| i >= max) {
            return Err(format!("index {bad} out of range for {max} vertices"));
        }
        Ok(())
    }
}

/// Channel layout of a decoded pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Rgba8,
    Rgb8,
    Gray8,
}

impl ChannelLayout {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            ChannelLayout::Rgba8 => 4,
            ChannelLayout::Rgb8 => 3,
            ChannelLayout::Gray8 => 1,
        }
    }
}

/// Decoded texture: pixel buffer plus dimensions and channel layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub layout: ChannelLayout,
    pub pixels: Vec<u8>,
}

impl TextureData {
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("degenerate size {}x{}", self.width, self.height));
        }
        let expected = self.width as u64 * self.height as u64 * self.layout.bytes_per_pixel() as u64;
        if self.pixels.len() as u64 != expected {
            return Err(format!(
                "pixel buffer holds {} bytes, layout requires {expected}",
                self.pixels.len()
            ));
        }
        Ok(())
    }
}

/// Material descriptor as decoded from a model file. Textures are embedded
/// here as data; the upload step turns them into handles.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub base_color: [f32; 4],
    pub diffuse: Option<TextureData>,
    pub normal: Option<TextureData>,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            diffuse: None,
            normal: None,
        }
    }
}

/// One node of a model file's embedded hierarchy. Indices refer into the
/// owning [`ModelData`]'s `meshes` and `nodes` lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeData {
    pub name: Option<String>,
    pub transform: Transform,
    pub meshes: Vec<usize>,
    pub children: Vec<usize>,
}

/// A decoded model: meshes, material assignments, and the node hierarchy
/// embedded in the file. Merging this hierarchy into an application scene
/// graph is an explicit step the application controls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelData {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub nodes: Vec<NodeData>,
    /// Indices of hierarchy roots within `nodes`. Empty for flat formats
    /// like OBJ, where every mesh is its own implicit root.
    pub roots: Vec<usize>,
}
