//! Procedural meshes and textures.
//!
//! These need no files on disk, which makes them the cheapest way to put
//! something on screen and the backbone of the engine's own tests.

use crate::data_structures::model::{ChannelLayout, MeshData, ModelVertex, TextureData};

fn vertex(position: [f32; 3], tex_coords: [f32; 2], normal: [f32; 3]) -> ModelVertex {
    ModelVertex {
        position,
        tex_coords,
        normal,
        ..ModelVertex::default()
    }
}

/// Unit quad in the xy plane, facing +z.
pub fn quad() -> MeshData {
    MeshData {
        name: "quad".to_string(),
        vertices: vec![
            vertex([-0.5, -0.5, 0.0], [0.0, 1.0], [0.0, 0.0, 1.0]),
            vertex([0.5, -0.5, 0.0], [1.0, 1.0], [0.0, 0.0, 1.0]),
            vertex([0.5, 0.5, 0.0], [1.0, 0.0], [0.0, 0.0, 1.0]),
            vertex([-0.5, 0.5, 0.0], [0.0, 0.0], [0.0, 0.0, 1.0]),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
        material: 0,
    }
}

/// Unit cube centered on the origin, one quad per face so normals stay flat.
pub fn cube() -> MeshData {
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        // (normal, u axis, v axis)
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = vertices.len() as u32;
        for (du, dv, uv) in [
            (-0.5, -0.5, [0.0, 1.0]),
            (0.5, -0.5, [1.0, 1.0]),
            (0.5, 0.5, [1.0, 0.0]),
            (-0.5, 0.5, [0.0, 0.0]),
        ] {
            let position = [
                normal[0] * 0.5 + u[0] * du + v[0] * dv,
                normal[1] * 0.5 + u[1] * du + v[1] * dv,
                normal[2] * 0.5 + u[2] * du + v[2] * dv,
            ];
            vertices.push(vertex(position, uv, normal));
        }
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData {
        name: "cube".to_string(),
        vertices,
        indices,
        material: 0,
    }
}

/// Square-based pyramid with its apex at +y.
pub fn pyramid() -> MeshData {
    let mut mesh = MeshData {
        name: "pyramid".to_string(),
        vertices: vec![
            vertex([-0.5, 0.0, -0.5], [0.0, 1.0], [0.0, -1.0, 0.0]),
            vertex([0.5, 0.0, -0.5], [1.0, 1.0], [0.0, -1.0, 0.0]),
            vertex([0.5, 0.0, 0.5], [1.0, 0.0], [0.0, -1.0, 0.0]),
            vertex([-0.5, 0.0, 0.5], [0.0, 0.0], [0.0, -1.0, 0.0]),
            vertex([0.0, 1.0, 0.0], [0.5, 0.5], [0.0, 1.0, 0.0]),
        ],
        indices: vec![
            0, 2, 1, 0, 3, 2, // base
            0, 1, 4, 1, 2, 4, 2, 3, 4, 3, 0, 4, // sides
        ],
        material: 0,
    };
    super::mesh::generate_normals(&mut mesh.vertices, &mesh.indices);
    mesh
}

/// Triangular prism: an equilateral triangle extruded along z.
pub fn prism() -> MeshData {
    let h = 3f32.sqrt() / 4.0; // centroid-to-base distance of the unit triangle
    let front = [
        [0.0, 2.0 * h, 0.5],
        [-0.5, -h, 0.5],
        [0.5, -h, 0.5],
    ];
    let mut vertices = Vec::with_capacity(18);
    let mut indices = Vec::with_capacity(24);

    // Front and back caps.
    for p in front {
        vertices.push(vertex(p, [p[0] + 0.5, h - p[1]], [0.0, 0.0, 1.0]));
    }
    for p in front {
        vertices.push(vertex([p[0], p[1], -0.5], [p[0] + 0.5, h - p[1]], [0.0, 0.0, -1.0]));
    }
    indices.extend([0, 1, 2, 3, 5, 4]);

    // One quad per side, flat normals come from the triangle edges.
    for i in 0..3u32 {
        let a = front[i as usize];
        let b = front[((i + 1) % 3) as usize];
        let base = vertices.len() as u32;
        vertices.push(vertex(a, [0.0, 0.0], [0.0; 3]));
        vertices.push(vertex(b, [1.0, 0.0], [0.0; 3]));
        vertices.push(vertex([b[0], b[1], -0.5], [1.0, 1.0], [0.0; 3]));
        vertices.push(vertex([a[0], a[1], -0.5], [0.0, 1.0], [0.0; 3]));
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let mut mesh = MeshData {
        name: "prism".to_string(),
        vertices,
        indices,
        material: 0,
    };
    super::mesh::generate_normals(&mut mesh.vertices, &mesh.indices);
    mesh
}

/// Longitude/latitude sphere of the given resolution.
pub fn uv_sphere(rings: u32, segments: u32) -> MeshData {
    let rings = rings.max(2);
    let segments = segments.max(3);

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let phi = std::f32::consts::PI * ring as f32 / rings as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for segment in 0..=segments {
            let theta = std::f32::consts::TAU * segment as f32 / segments as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let normal = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
            vertices.push(vertex(
                [normal[0] * 0.5, normal[1] * 0.5, normal[2] * 0.5],
                [
                    segment as f32 / segments as f32,
                    ring as f32 / rings as f32,
                ],
                normal,
            ));
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            indices.extend([a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    MeshData {
        name: "uv_sphere".to_string(),
        vertices,
        indices,
        material: 0,
    }
}

/// Single-color RGBA texture.
pub fn solid(name: &str, width: u32, height: u32, rgba: [u8; 4]) -> TextureData {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        pixels.extend_from_slice(&rgba);
    }
    TextureData {
        name: name.to_string(),
        width,
        height,
        layout: ChannelLayout::Rgba8,
        pixels,
    }
}

/// Two-color checkerboard with `tile`-pixel squares.
pub fn checkerboard(
    name: &str,
    width: u32,
    height: u32,
    tile: u32,
    even: [u8; 4],
    odd: [u8; 4],
) -> TextureData {
    let tile = tile.max(1);
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let color = if ((x / tile) + (y / tile)) % 2 == 0 {
                even
            } else {
                odd
            };
            pixels.extend_from_slice(&color);
        }
    }
    TextureData {
        name: name.to_string(),
        width,
        height,
        layout: ChannelLayout::Rgba8,
        pixels,
    }
}
