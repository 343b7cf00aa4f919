//! Engine context: the state bundle every lifecycle hook receives.
//!
//! The [`Context`] owns the resource manager, the scene graph, the camera and
//! the background asset loader. It also carries the two-step model path:
//! [`Context::upload_model`] pushes a decoded model's resources to the device,
//! [`Context::instantiate_model`] merges its node hierarchy into the scene
//! graph. Uploading once and instantiating many times is how a model is
//! shown in several places without duplicating GPU memory.

use cgmath::Deg;

use crate::assets::loader::AssetLoader;
use crate::camera::{Camera, Projection};
use crate::data_structures::model::{MaterialData, ModelData};
use crate::data_structures::scene_graph::{NodeId, SceneGraph};
use crate::error::{SceneError, UploadError};
use crate::gpu::device::RenderDevice;
use crate::gpu::{
    HeadlessDevice, Material, MaterialHandle, MaterialParam, MeshHandle, ResourceManager,
    TextureHandle,
};
use crate::render::{render_frame, FrameOutput};
use crate::surface::EngineConfig;

/// Handles produced by [`Context::upload_model`]. Indices line up with the
/// source [`ModelData`]'s `meshes` and `materials` lists.
#[derive(Debug, Clone, Default)]
pub struct UploadedModel {
    pub meshes: Vec<MeshHandle>,
    pub materials: Vec<MaterialHandle>,
    pub textures: Vec<TextureHandle>,
}

pub struct Context<D: RenderDevice = HeadlessDevice> {
    pub resources: ResourceManager<D>,
    pub scene: SceneGraph,
    pub camera: Camera,
    pub projection: Projection,
    pub loader: AssetLoader,
    pub(crate) exit_requested: bool,
}

impl<D: RenderDevice> Context<D> {
    pub fn new(config: &EngineConfig, device: D) -> anyhow::Result<Self> {
        let camera = Camera::new((0.0, 0.0, 5.0), Deg(-90.0), Deg(0.0));
        let projection = Projection::new(
            config.surface.width,
            config.surface.height,
            Deg(config.fovy_degrees),
            config.znear,
            config.zfar,
        );
        Ok(Self {
            resources: ResourceManager::new(device),
            scene: SceneGraph::new(),
            camera,
            projection,
            loader: AssetLoader::new()?,
            exit_requested: false,
        })
    }

    /// Ask the frame loop to stop. The current frame still completes and is
    /// presented before the loop exits.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.projection.resize(width, height);
        }
    }

    /// Upload a decoded model's textures, materials and meshes.
    ///
    /// All-or-nothing: if any upload fails, everything uploaded so far for
    /// this model is released before the error is returned.
    pub fn upload_model(&mut self, model: &ModelData) -> Result<UploadedModel, UploadError> {
        let mut uploaded = UploadedModel::default();
        match self.try_upload_model(model, &mut uploaded) {
            Ok(()) => Ok(uploaded),
            Err(e) => {
                self.release_model(&uploaded);
                Err(e)
            }
        }
    }

    fn try_upload_model(
        &mut self,
        model: &ModelData,
        uploaded: &mut UploadedModel,
    ) -> Result<(), UploadError> {
        for data in &model.materials {
            let material = self.upload_material(data, uploaded)?;
            let handle = self.resources.create_material(material)?;
            uploaded.materials.push(handle);
        }
        for mesh in &model.meshes {
            uploaded.meshes.push(self.resources.upload_mesh(mesh)?);
        }
        Ok(())
    }

    fn upload_material(
        &mut self,
        data: &MaterialData,
        uploaded: &mut UploadedModel,
    ) -> Result<Material, UploadError> {
        let mut material = Material::new(&data.name)
            .with("base_color", MaterialParam::Vector(data.base_color));
        if let Some(texture) = &data.diffuse {
            let handle = self.resources.upload_texture(texture)?;
            uploaded.textures.push(handle);
            material.set("diffuse", MaterialParam::Texture(handle));
        }
        if let Some(texture) = &data.normal {
            let handle = self.resources.upload_texture(texture)?;
            uploaded.textures.push(handle);
            material.set("normal", MaterialParam::Texture(handle));
        }
        Ok(material)
    }

    /// Release every resource of a previously uploaded model.
    pub fn release_model(&mut self, uploaded: &UploadedModel) {
        for &mesh in &uploaded.meshes {
            if let Err(stale) = self.resources.release_mesh(mesh) {
                log::warn!("model mesh already released: {stale}");
            }
        }
        for &material in &uploaded.materials {
            if let Err(stale) = self.resources.release_material(material) {
                log::warn!("model material already released: {stale}");
            }
        }
        for &texture in &uploaded.textures {
            if let Err(stale) = self.resources.release_texture(texture) {
                log::warn!("model texture already released: {stale}");
            }
        }
    }

    /// Merge a model's node hierarchy into the scene graph, under `parent`
    /// when given. Returns the created root nodes. Can be called repeatedly
    /// for multiple instances sharing one upload.
    pub fn instantiate_model(
        &mut self,
        model: &ModelData,
        uploaded: &UploadedModel,
        parent: Option<NodeId>,
    ) -> Result<Vec<NodeId>, SceneError> {
        let mut roots = Vec::with_capacity(model.roots.len());
        for &root in &model.roots {
            if let Some(id) = self.instantiate_node(model, uploaded, root, parent)? {
                roots.push(id);
            }
        }
        Ok(roots)
    }

    fn instantiate_node(
        &mut self,
        model: &ModelData,
        uploaded: &UploadedModel,
        index: usize,
        parent: Option<NodeId>,
    ) -> Result<Option<NodeId>, SceneError> {
        let data = match model.nodes.get(index) {
            Some(data) => data,
            None => {
                log::warn!("model references node {index} outside its hierarchy, skipping");
                return Ok(None);
            }
        };

        let id = match parent {
            Some(parent) => self.scene.add_child(parent)?,
            None => self.scene.add_root(),
        };
        self.scene.set_local_transform(id, data.transform)?;
        if let Some(name) = &data.name {
            self.scene.set_name(id, name)?;
        }

        match data.meshes.as_slice() {
            [] => {}
            // A single mesh binds directly to this node.
            &[mesh] => {
                if let Some(renderable) = self.resolve_renderable(model, uploaded, mesh) {
                    self.scene.set_renderable(id, Some(renderable))?;
                }
            }
            // Multiple meshes become child nodes so each keeps its own binding.
            meshes => {
                for &mesh in meshes {
                    if let Some(renderable) = self.resolve_renderable(model, uploaded, mesh) {
                        let child = self.scene.add_child(id)?;
                        self.scene.set_renderable(child, Some(renderable))?;
                    }
                }
            }
        }

        for &child in &data.children {
            self.instantiate_node(model, uploaded, child, Some(id))?;
        }
        Ok(Some(id))
    }

    fn resolve_renderable(
        &self,
        model: &ModelData,
        uploaded: &UploadedModel,
        mesh_index: usize,
    ) -> Option<(MeshHandle, MaterialHandle)> {
        let mesh = match uploaded.meshes.get(mesh_index) {
            Some(&mesh) => mesh,
            None => {
                log::warn!("model references mesh {mesh_index} that was not uploaded, skipping");
                return None;
            }
        };
        let material_index = model.meshes.get(mesh_index).map(|m| m.material)?;
        let material = match uploaded.materials.get(material_index) {
            Some(&material) => material,
            None => {
                log::warn!("mesh {mesh_index} references material {material_index} that was not uploaded, skipping");
                return None;
            }
        };
        Some((mesh, material))
    }

    /// Run the render pipeline over the current scene and camera.
    pub fn render(&mut self) -> FrameOutput {
        render_frame(&mut self.scene, &self.resources, &self.camera, &self.projection)
    }
}
