#![allow(dead_code)]

use cgmath::Deg;
use prism_ngin::assets::primitives;
use prism_ngin::camera::{Camera, Projection};
use prism_ngin::data_structures::model::MeshData;
use prism_ngin::gpu::{HeadlessDevice, Material, MaterialParam, ResourceManager};

/// Camera at z = 5 looking down the negative z axis, so geometry around the
/// origin is comfortably in view.
pub fn test_camera() -> (Camera, Projection) {
    let camera = Camera::new((0.0, 0.0, 5.0), Deg(-90.0), Deg(0.0));
    let projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
    (camera, projection)
}

pub fn manager() -> ResourceManager<HeadlessDevice> {
    ResourceManager::new(HeadlessDevice::new())
}

pub fn manager_with_budget(bytes: u64) -> ResourceManager<HeadlessDevice> {
    ResourceManager::new(HeadlessDevice::with_budget(Some(bytes)))
}

pub fn quad(name: &str) -> MeshData {
    let mut mesh = primitives::quad();
    mesh.name = name.to_string();
    mesh
}

pub fn flat_material(name: &str) -> Material {
    Material::new(name).with("base_color", MaterialParam::Vector([1.0, 1.0, 1.0, 1.0]))
}
