use cgmath::Vector3;
use prism_ngin::context::Context;
use prism_ngin::data_structures::model::{MaterialData, ModelData, NodeData};
use prism_ngin::data_structures::transform::Transform;
use prism_ngin::error::UploadError;
use prism_ngin::gpu::HeadlessDevice;
use prism_ngin::surface::EngineConfig;

use crate::common::test_utils::quad;

mod common;

fn context() -> Context<HeadlessDevice> {
    Context::new(&EngineConfig::default(), HeadlessDevice::new()).unwrap()
}

/// Two-level hierarchy: "body" carries two meshes of its own and one child,
/// "wheel", with a third.
fn cart_model() -> ModelData {
    ModelData {
        meshes: vec![quad("hull"), quad("deck"), quad("wheel")],
        materials: vec![MaterialData::default()],
        nodes: vec![
            NodeData {
                name: Some("body".to_string()),
                transform: Transform::from_position(Vector3::new(1.0, 0.0, 0.0)),
                meshes: vec![0, 1],
                children: vec![1],
            },
            NodeData {
                name: Some("wheel".to_string()),
                transform: Transform::from_position(Vector3::new(0.0, -1.0, 0.0)),
                meshes: vec![2],
                children: Vec::new(),
            },
        ],
        roots: vec![0],
    }
}

#[test]
fn uploaded_model_instantiates_into_the_scene_graph() {
    let mut ctx = context();
    let model = cart_model();

    let uploaded = ctx.upload_model(&model).unwrap();
    assert_eq!(uploaded.meshes.len(), 3);
    assert_eq!(uploaded.materials.len(), 1);

    let roots = ctx.instantiate_model(&model, &uploaded, None).unwrap();
    assert_eq!(roots.len(), 1);
    let body = roots[0];
    assert_eq!(ctx.scene.name(body).unwrap(), Some("body"));

    // A node with several meshes carries no binding itself; the meshes fan
    // out into child nodes so each keeps its own mesh+material pair.
    assert!(ctx.scene.renderable(body).unwrap().is_none());
    let children = ctx.scene.children(body).unwrap().to_vec();
    assert_eq!(children.len(), 3);

    let wheel = ctx.scene.find_by_name("wheel").unwrap();
    assert_eq!(ctx.scene.parent(wheel).unwrap(), Some(body));
    // A single mesh binds directly to its node.
    assert_eq!(
        ctx.scene.renderable(wheel).unwrap(),
        Some((uploaded.meshes[2], uploaded.materials[0]))
    );

    ctx.scene.compute_world_transforms();
    assert_eq!(
        ctx.scene.world_transform(wheel).unwrap().position,
        Vector3::new(1.0, -1.0, 0.0)
    );

    // Everything the hierarchy binds actually draws.
    let output = ctx.render();
    assert!(output.warnings.is_empty());
    assert_eq!(output.stats.drawn, 3);
}

#[test]
fn one_upload_backs_many_instances() {
    let mut ctx = context();
    let model = cart_model();
    let uploaded = ctx.upload_model(&model).unwrap();

    let first = ctx.instantiate_model(&model, &uploaded, None).unwrap();
    let second = ctx.instantiate_model(&model, &uploaded, None).unwrap();

    assert_ne!(first[0], second[0]);
    // Instantiation only creates scene nodes, never new GPU resources.
    assert_eq!(ctx.resources.mesh_count(), 3);
    assert_eq!(ctx.resources.material_count(), 1);

    let output = ctx.render();
    assert_eq!(output.stats.drawn, 6);
}

#[test]
fn failed_model_upload_releases_everything_it_uploaded() {
    let quad_bytes = (4 * 56 + 6 * 4) as u64;
    // Room for two of the model's three meshes.
    let device = HeadlessDevice::with_budget(Some(quad_bytes * 2 + 8));
    let mut ctx: Context<HeadlessDevice> =
        Context::new(&EngineConfig::default(), device).unwrap();

    let err = ctx.upload_model(&cart_model()).unwrap_err();

    assert!(matches!(err, UploadError::OutOfMemory { .. }));
    assert_eq!(ctx.resources.mesh_count(), 0);
    assert_eq!(ctx.resources.material_count(), 0);
    assert_eq!(ctx.resources.device().allocated_bytes(), 0);
}
