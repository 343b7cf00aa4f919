//! GPU resource management: upload, handle tracking, and reclamation.
//!
//! The [`ResourceManager`] owns every GPU object it creates, exclusively.
//! Callers hold slot+generation [`Handle`]s instead of references; releasing
//! a resource invalidates its handle, and later lookups fail with
//! [`InvalidHandle`](crate::error::InvalidHandle) rather than returning stale
//! data. All device memory goes through the [`RenderDevice`] trait, so the
//! manager itself never touches a graphics API.

pub mod device;

use crate::data_structures::arena::{Arena, Handle};
use crate::data_structures::model::{BoundingSphere, ChannelLayout, MeshData, TextureData};
use crate::error::{InvalidHandle, UploadError};
use crate::gpu::device::{BufferId, BufferKind, RenderDevice, TextureId};

pub use crate::gpu::device::HeadlessDevice;

pub type MeshHandle = Handle<GpuMesh>;
pub type TextureHandle = Handle<GpuTexture>;
pub type MaterialHandle = Handle<Material>;

/// GPU-resident mesh: vertex and index buffers plus the counts and bounds
/// the render pipeline needs without touching the descriptor again.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
    pub vertex_count: u32,
    pub index_count: u32,
    pub bounds: BoundingSphere,
}

/// GPU-resident texture.
#[derive(Debug)]
pub struct GpuTexture {
    pub name: String,
    pub texture: TextureId,
    pub size: [u32; 2],
    pub layout: ChannelLayout,
}

/// One shader parameter. The tagged variants keep per-material parameter
/// sets dynamic while the typed accessors on [`Material`] stay checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialParam {
    Scalar(f32),
    Vector([f32; 4]),
    Texture(TextureHandle),
}

/// Named set of shader parameters and texture bindings, shared by handle
/// across many scene nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    params: Vec<(String, MaterialParam)>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Set `name`, replacing an existing parameter of the same name.
    pub fn set(&mut self, name: impl Into<String>, param: MaterialParam) {
        let name = name.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = param,
            None => self.params.push((name, param)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, param: MaterialParam) -> Self {
        self.set(name, param);
        self
    }

    fn get(&self, name: &str) -> Option<&MaterialParam> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Typed accessors: `None` when the parameter is absent *or* of another
    /// kind, so a caller can never read a texture slot as a scalar.
    pub fn scalar(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(MaterialParam::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn vector(&self, name: &str) -> Option<[f32; 4]> {
        match self.get(name) {
            Some(MaterialParam::Vector(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        match self.get(name) {
            Some(MaterialParam::Texture(h)) => Some(*h),
            _ => None,
        }
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &MaterialParam)> {
        self.params.iter().map(|(n, p)| (n.as_str(), p))
    }
}

/// Uploads decoded assets to the device, tracks handles, and reclaims them.
///
/// Accessed exclusively from the owning thread; completed background imports
/// are handed over before upload (see `assets::loader`).
pub struct ResourceManager<D: RenderDevice = HeadlessDevice> {
    device: D,
    meshes: Arena<GpuMesh>,
    textures: Arena<GpuTexture>,
    materials: Arena<Material>,
}

impl<D: RenderDevice> ResourceManager<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            meshes: Arena::new(),
            textures: Arena::new(),
            materials: Arena::new(),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Upload a mesh descriptor, creating its vertex and index buffers.
    ///
    /// On any failure the manager is left unchanged: a vertex buffer whose
    /// sibling index buffer fails to allocate is destroyed before returning.
    pub fn upload_mesh(&mut self, data: &MeshData) -> Result<MeshHandle, UploadError> {
        data.validate().map_err(|reason| UploadError::InvalidDescriptor {
            name: data.name.clone(),
            reason,
        })?;

        let vertex_buffer = self.device.create_buffer(
            &data.name,
            BufferKind::Vertex,
            bytemuck::cast_slice(&data.vertices),
        )?;
        let index_buffer = match self.device.create_buffer(
            &data.name,
            BufferKind::Index,
            bytemuck::cast_slice(&data.indices),
        ) {
            Ok(buffer) => buffer,
            Err(e) => {
                // Unwind the half-done upload; no partial allocation survives.
                self.device.destroy_buffer(vertex_buffer);
                return Err(e);
            }
        };

        Ok(self.meshes.insert(GpuMesh {
            name: data.name.clone(),
            vertex_buffer,
            index_buffer,
            vertex_count: data.vertices.len() as u32,
            index_count: data.indices.len() as u32,
            bounds: data.bounds(),
        }))
    }

    pub fn upload_texture(&mut self, data: &TextureData) -> Result<TextureHandle, UploadError> {
        data.validate().map_err(|reason| UploadError::InvalidDescriptor {
            name: data.name.clone(),
            reason,
        })?;

        let texture = self.device.create_texture(
            &data.name,
            [data.width, data.height],
            data.layout,
            &data.pixels,
        )?;

        Ok(self.textures.insert(GpuTexture {
            name: data.name.clone(),
            texture,
            size: [data.width, data.height],
            layout: data.layout,
        }))
    }

    /// Register a material. Texture parameters must resolve to live handles
    /// owned by this manager.
    pub fn create_material(&mut self, material: Material) -> Result<MaterialHandle, UploadError> {
        for (name, param) in material.params() {
            if let MaterialParam::Texture(handle) = param {
                if self.textures.get(*handle).is_err() {
                    return Err(UploadError::InvalidDescriptor {
                        name: material.name.clone(),
                        reason: format!("texture parameter {name} references dead handle {handle}"),
                    });
                }
            }
        }
        Ok(self.materials.insert(material))
    }

    pub fn mesh(&self, handle: MeshHandle) -> Result<&GpuMesh, InvalidHandle> {
        self.meshes.get(handle)
    }

    pub fn texture(&self, handle: TextureHandle) -> Result<&GpuTexture, InvalidHandle> {
        self.textures.get(handle)
    }

    pub fn material(&self, handle: MaterialHandle) -> Result<&Material, InvalidHandle> {
        self.materials.get(handle)
    }

    pub fn material_mut(&mut self, handle: MaterialHandle) -> Result<&mut Material, InvalidHandle> {
        self.materials.get_mut(handle)
    }

    /// Release a mesh: frees its device buffers and invalidates the handle.
    pub fn release_mesh(&mut self, handle: MeshHandle) -> Result<(), InvalidHandle> {
        let mesh = self.meshes.remove(handle)?;
        self.device.destroy_buffer(mesh.vertex_buffer);
        self.device.destroy_buffer(mesh.index_buffer);
        Ok(())
    }

    pub fn release_texture(&mut self, handle: TextureHandle) -> Result<(), InvalidHandle> {
        let texture = self.textures.remove(handle)?;
        self.device.destroy_texture(texture.texture);
        Ok(())
    }

    pub fn release_material(&mut self, handle: MaterialHandle) -> Result<(), InvalidHandle> {
        self.materials.remove(handle)?;
        Ok(())
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Release everything. Also runs on drop; engine shutdown must not leak
    /// device memory.
    pub fn release_all(&mut self) {
        for mesh in self.meshes.drain_all() {
            self.device.destroy_buffer(mesh.vertex_buffer);
            self.device.destroy_buffer(mesh.index_buffer);
        }
        for texture in self.textures.drain_all() {
            self.device.destroy_texture(texture.texture);
        }
        self.materials.drain_all();
    }
}

impl<D: RenderDevice> Drop for ResourceManager<D> {
    fn drop(&mut self) {
        self.release_all();
    }
}
