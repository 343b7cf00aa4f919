use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use cgmath::Vector3;
use prism_ngin::assets::loader::AssetLoader;
use prism_ngin::assets::{import, primitives, ImportedAsset};
use prism_ngin::data_structures::model::ChannelLayout;
use prism_ngin::error::ImportError;

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("prism-ngin-{test}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const TRIANGLE_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
f 1/1 2/2 3/3
";

const TRIANGLE_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "buffers": [{ "uri": "tri.bin", "byteLength": 42 }],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
  ],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
  "nodes": [{ "name": "tri", "mesh": 0, "translation": [1.0, 2.0, 3.0] }],
  "scenes": [{ "nodes": [0] }],
  "scene": 0
}"#;

/// Triangle in the xy plane with an external buffer, no normals, and the
/// given index list.
fn write_triangle_gltf(dir: &Path, indices: [u16; 3]) -> PathBuf {
    let mut bin = Vec::new();
    for f in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bin.extend_from_slice(&f.to_le_bytes());
    }
    for i in indices {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    std::fs::write(dir.join("tri.bin"), &bin).unwrap();

    let path = dir.join("tri.gltf");
    std::fs::write(&path, TRIANGLE_GLTF).unwrap();
    path
}

#[test]
fn obj_without_normals_gets_generated_ones() {
    let dir = scratch_dir("obj");
    let path = dir.join("triangle.obj");
    std::fs::write(&path, TRIANGLE_OBJ).unwrap();

    let model = match import(&path).unwrap() {
        ImportedAsset::Model(model) => model,
        other => panic!("expected a model, got {other:?}"),
    };

    assert_eq!(model.meshes.len(), 1);
    let mesh = &model.meshes[0];
    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    mesh.validate().unwrap();
    // Counter-clockwise in the xy plane faces +z.
    for v in &mesh.vertices {
        assert_eq!(v.normal, [0.0, 0.0, 1.0]);
    }
    // No MTL: one default material, every mesh its own root.
    assert_eq!(model.materials.len(), 1);
    assert_eq!(model.roots.len(), 1);
    assert_eq!(model.nodes[0].meshes, vec![0]);
}

#[test]
fn png_round_trips_through_the_importer() {
    let dir = scratch_dir("png");
    let path = dir.join("checker.png");
    let source = primitives::checkerboard("checker", 4, 4, 2, [255, 0, 0, 255], [0, 0, 255, 255]);
    image::RgbaImage::from_raw(source.width, source.height, source.pixels.clone())
        .unwrap()
        .save(&path)
        .unwrap();

    let texture = match import(&path).unwrap() {
        ImportedAsset::Texture(texture) => texture,
        other => panic!("expected a texture, got {other:?}"),
    };

    assert_eq!((texture.width, texture.height), (4, 4));
    assert_eq!(texture.layout, ChannelLayout::Rgba8);
    assert_eq!(texture.pixels, source.pixels);
}

#[test]
fn gltf_keeps_names_and_node_transforms() {
    let dir = scratch_dir("gltf");
    let path = write_triangle_gltf(&dir, [0, 1, 2]);

    let model = match import(&path).unwrap() {
        ImportedAsset::Model(model) => model,
        other => panic!("expected a model, got {other:?}"),
    };

    assert_eq!(model.meshes.len(), 1);
    let mesh = &model.meshes[0];
    mesh.validate().unwrap();
    // No NORMAL attribute: face normals are generated.
    for v in &mesh.vertices {
        assert_eq!(v.normal, [0.0, 0.0, 1.0]);
    }
    // A primitive without a material falls back to the appended default.
    assert_eq!(model.materials.len(), 1);
    assert_eq!(mesh.material, 0);

    assert_eq!(model.roots, vec![0]);
    let node = &model.nodes[0];
    assert_eq!(node.name.as_deref(), Some("tri"));
    assert_eq!(node.transform.position, Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(node.meshes, vec![0]);
}

#[test]
fn gltf_indices_past_the_vertex_count_fail_to_decode() {
    let dir = scratch_dir("gltf-bad");
    let path = write_triangle_gltf(&dir, [0, 1, 9]);

    let err = import(&path).unwrap_err();
    match err {
        ImportError::Decode { stage, message, .. } => {
            assert_eq!(stage, "primitive");
            assert!(message.contains("out of range"));
        }
        other => panic!("expected a decode error, got {other}"),
    }
}

#[test]
fn unknown_extension_is_rejected() {
    let err = import(&PathBuf::from("model.fbx")).unwrap_err();
    assert!(matches!(err, ImportError::Unsupported { .. }));
}

#[test]
fn missing_file_reports_the_path() {
    let err = import(&PathBuf::from("/nonexistent/mesh.obj")).unwrap_err();
    match err {
        ImportError::Io { path, .. } => assert!(path.ends_with("mesh.obj")),
        other => panic!("expected an io error, got {other}"),
    }
}

#[test]
fn background_import_delivers_at_the_next_drain() {
    let dir = scratch_dir("loader");
    let path = dir.join("triangle.obj");
    std::fs::write(&path, TRIANGLE_OBJ).unwrap();

    let mut loader = AssetLoader::new().unwrap();
    let ticket = loader.request(&path);
    assert_eq!(loader.in_flight(), 1);

    let deadline = Instant::now() + Duration::from_secs(10);
    let done = loop {
        let mut completed = loader.drain_completed();
        if let Some(done) = completed.pop() {
            break done;
        }
        assert!(Instant::now() < deadline, "import never completed");
        std::thread::sleep(Duration::from_millis(5));
    };

    assert_eq!(done.ticket, ticket);
    assert_eq!(done.path, path);
    assert!(matches!(done.result, Ok(ImportedAsset::Model(_))));
    assert_eq!(loader.in_flight(), 0);
}

#[test]
fn cancelled_import_is_never_delivered() {
    let dir = scratch_dir("cancel");
    let path = dir.join("triangle.obj");
    std::fs::write(&path, TRIANGLE_OBJ).unwrap();

    let mut loader = AssetLoader::new().unwrap();
    let ticket = loader.request(&path);
    loader.cancel(ticket);

    // Wait until the decode has definitely finished, then drain.
    let deadline = Instant::now() + Duration::from_secs(10);
    while loader.in_flight() > 0 {
        assert!(loader.drain_completed().is_empty());
        assert!(Instant::now() < deadline, "import never completed");
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(loader.drain_completed().is_empty());
}

#[test]
fn blocking_batch_import_preserves_request_order() {
    let dir = scratch_dir("batch");
    let obj = dir.join("triangle.obj");
    std::fs::write(&obj, TRIANGLE_OBJ).unwrap();
    let missing = dir.join("missing.obj");

    let loader = AssetLoader::new().unwrap();
    let results = loader.import_all_blocking(&[obj, missing]);

    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Ok(ImportedAsset::Model(_))));
    assert!(matches!(results[1], Err(ImportError::Io { .. })));
}

#[test]
fn primitive_meshes_are_valid_descriptors() {
    for mesh in [
        primitives::quad(),
        primitives::cube(),
        primitives::pyramid(),
        primitives::prism(),
        primitives::uv_sphere(8, 12),
    ] {
        mesh.validate().unwrap();
        assert!(mesh.bounds().radius > 0.0);
    }
}
