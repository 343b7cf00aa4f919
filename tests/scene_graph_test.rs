use cgmath::{Deg, Quaternion, Rotation3, Vector3};
use prism_ngin::data_structures::scene_graph::SceneGraph;
use prism_ngin::data_structures::transform::Transform;
use prism_ngin::error::SceneError;

fn translated(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_position(Vector3::new(x, y, z))
}

#[test]
fn world_transforms_compose_down_the_hierarchy() {
    let mut scene = SceneGraph::new();
    let root = scene.add_root();
    let child = scene.add_child(root).unwrap();
    let grandchild = scene.add_child(child).unwrap();

    scene.set_local_transform(root, translated(1.0, 0.0, 0.0)).unwrap();
    scene.set_local_transform(child, translated(0.0, 2.0, 0.0)).unwrap();
    scene
        .set_local_transform(grandchild, translated(0.0, 0.0, 3.0))
        .unwrap();
    scene.compute_world_transforms();

    let world = scene.world_transform(grandchild).unwrap();
    assert_eq!(world.position, Vector3::new(1.0, 2.0, 3.0));
}

#[test]
fn scale_and_rotation_propagate_to_child_translation() {
    let mut scene = SceneGraph::new();
    let root = scene.add_root();
    let child = scene.add_child(root).unwrap();

    let mut parent_local = Transform::new();
    parent_local.scale = Vector3::new(2.0, 2.0, 2.0);
    parent_local.rotation = Quaternion::from_angle_y(Deg(90.0));
    scene.set_local_transform(root, parent_local).unwrap();
    scene.set_local_transform(child, translated(1.0, 0.0, 0.0)).unwrap();
    scene.compute_world_transforms();

    let world = scene.world_transform(child).unwrap();
    // Scaled to 2 along x, then rotated 90 degrees about y onto -z.
    assert!((world.position.x - 0.0).abs() < 1e-5);
    assert!((world.position.z - -2.0).abs() < 1e-5);
    assert_eq!(world.scale, Vector3::new(2.0, 2.0, 2.0));
}

#[test]
fn identity_chain_matches_a_single_node() {
    let mut scene = SceneGraph::new();
    let deep_root = scene.add_root();
    let mid = scene.add_child(deep_root).unwrap();
    let leaf = scene.add_child(mid).unwrap();
    let local = translated(4.0, -1.0, 2.5);
    scene.set_local_transform(leaf, local).unwrap();

    let flat_root = scene.add_root();
    scene.set_local_transform(flat_root, local).unwrap();

    scene.compute_world_transforms();

    // Identity parents contribute nothing, bit for bit.
    assert_eq!(
        scene.world_transform(leaf).unwrap(),
        scene.world_transform(flat_root).unwrap()
    );
    assert_eq!(
        scene.world_matrix(leaf).unwrap(),
        scene.world_matrix(flat_root).unwrap()
    );
}

#[test]
fn recomputing_an_unchanged_scene_is_bit_identical() {
    let mut scene = SceneGraph::new();
    let root = scene.add_root();
    let child = scene.add_child(root).unwrap();
    let mut local = translated(0.3, 0.7, -1.1);
    local.rotation = Quaternion::from_angle_x(Deg(33.3));
    local.scale = Vector3::new(1.5, 0.5, 2.0);
    scene.set_local_transform(root, local).unwrap();
    scene.set_local_transform(child, translated(0.1, 0.2, 0.3)).unwrap();

    scene.compute_world_transforms();
    let first = scene.world_matrix(child).unwrap();
    scene.compute_world_transforms();
    let second = scene.world_matrix(child).unwrap();

    assert_eq!(first, second);
}

#[test]
fn reparenting_moves_a_subtree() {
    let mut scene = SceneGraph::new();
    let a = scene.add_root();
    let b = scene.add_root();
    let child = scene.add_child(a).unwrap();

    scene.set_local_transform(b, translated(10.0, 0.0, 0.0)).unwrap();
    scene.set_parent(child, b).unwrap();
    scene.compute_world_transforms();

    assert_eq!(scene.parent(child).unwrap(), Some(b));
    assert!(scene.children(a).unwrap().is_empty());
    assert_eq!(
        scene.world_transform(child).unwrap().position,
        Vector3::new(10.0, 0.0, 0.0)
    );
}

#[test]
fn a_node_cannot_become_its_own_ancestor() {
    let mut scene = SceneGraph::new();
    let root = scene.add_root();
    let child = scene.add_child(root).unwrap();
    let grandchild = scene.add_child(child).unwrap();

    assert!(matches!(
        scene.set_parent(root, grandchild),
        Err(SceneError::Cycle { .. })
    ));
    assert!(matches!(
        scene.set_parent(root, root),
        Err(SceneError::Cycle { .. })
    ));
    // The failed reparent left the tree untouched.
    assert_eq!(scene.parent(root).unwrap(), None);
    assert_eq!(scene.roots(), &[root]);
}

#[test]
fn removal_destroys_the_subtree_and_stales_its_ids() {
    let mut scene = SceneGraph::new();
    let root = scene.add_root();
    let child = scene.add_child(root).unwrap();
    let grandchild = scene.add_child(child).unwrap();
    let keeper = scene.add_root();

    scene.remove(child).unwrap();

    assert!(scene.contains(root));
    assert!(scene.contains(keeper));
    assert!(!scene.contains(child));
    assert!(!scene.contains(grandchild));
    assert!(matches!(
        scene.local_transform(grandchild),
        Err(SceneError::InvalidNode(_))
    ));
    assert_eq!(scene.len(), 2);
}

#[test]
fn names_resolve_in_traversal_order() {
    let mut scene = SceneGraph::new();
    let root = scene.add_root();
    let first = scene.add_child(root).unwrap();
    let second = scene.add_child(root).unwrap();
    scene.set_name(first, "door").unwrap();
    scene.set_name(second, "door").unwrap();

    assert_eq!(scene.find_by_name("door"), Some(first));
    assert_eq!(scene.find_by_name("window"), None);
}
