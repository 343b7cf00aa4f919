//! The per-frame render pipeline: world transforms, culling, batching.
//!
//! A frame is produced in fixed stages:
//!
//! 1. recompute world transforms over the scene graph
//! 2. collect drawable nodes and resolve their resource handles
//! 3. frustum-cull against the camera's world-space bounding spheres
//! 4. sort survivors by material, then mesh, then creation order
//! 5. merge runs with equal material and mesh into instanced draw commands
//!
//! The output is an API-agnostic [`FrameOutput`]: an ordered draw-command
//! list a graphics binding can submit directly. Nodes whose handles went
//! stale are skipped with a [`DanglingResourceWarning`]; a bad node never
//! aborts the frame.

use cgmath::Vector3;

use crate::camera::{Camera, Frustum, Projection};
use crate::data_structures::scene_graph::{DrawItem, NodeId, SceneGraph};
use crate::data_structures::transform::TransformRaw;
use crate::error::DanglingResourceWarning;
use crate::gpu::device::RenderDevice;
use crate::gpu::{MaterialHandle, MaterialParam, MeshHandle, ResourceManager};

/// One instanced draw: a mesh and material pair plus the per-instance
/// transforms of every visible node that binds them.
#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub instances: Vec<TransformRaw>,
    /// Source nodes in instance order, for picking and debugging.
    pub nodes: Vec<NodeId>,
}

impl DrawCommand {
    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }
}

/// Counters for one produced frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Drawable nodes collected from the scene graph.
    pub drawables: usize,
    /// Nodes rejected by the frustum test.
    pub culled: usize,
    /// Nodes skipped because a handle they referenced was stale.
    pub dangling: usize,
    /// Instances that made it into draw commands.
    pub drawn: usize,
}

/// Result of [`render_frame`]: the ordered command list plus diagnostics.
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    pub commands: Vec<DrawCommand>,
    pub stats: FrameStats,
    pub warnings: Vec<DanglingResourceWarning>,
}

struct Visible {
    item: DrawItem,
    material_slot: u32,
    mesh_slot: u32,
}

/// Produce the draw-command list for the current scene and camera.
///
/// Given identical inputs the output is identical, including command order:
/// the sort is stable and ties break on node creation order.
pub fn render_frame<D: RenderDevice>(
    scene: &mut SceneGraph,
    resources: &ResourceManager<D>,
    camera: &Camera,
    projection: &Projection,
) -> FrameOutput {
    scene.compute_world_transforms();
    let items = scene.collect_drawables();
    let frustum = Frustum::from_camera(camera, projection);

    let mut stats = FrameStats {
        drawables: items.len(),
        ..FrameStats::default()
    };
    let mut warnings = Vec::new();
    let mut visible: Vec<Visible> = Vec::with_capacity(items.len());

    for item in items {
        let mesh = match resources.mesh(item.mesh) {
            Ok(mesh) => mesh,
            Err(stale) => {
                dangle(&mut warnings, scene, item.node, format!("mesh {stale}"));
                stats.dangling += 1;
                continue;
            }
        };
        let material = match resources.material(item.material) {
            Ok(material) => material,
            Err(stale) => {
                dangle(&mut warnings, scene, item.node, format!("material {stale}"));
                stats.dangling += 1;
                continue;
            }
        };
        // Texture handles embedded in the material can go stale after
        // `create_material` validated them; resolve them per frame too.
        let dead_texture = material.params().find_map(|(_, param)| match param {
            MaterialParam::Texture(handle) => resources.texture(*handle).err(),
            _ => None,
        });
        if let Some(stale) = dead_texture {
            dangle(&mut warnings, scene, item.node, format!("texture {stale}"));
            stats.dangling += 1;
            continue;
        }

        // Bounding sphere into world space: rotate and scale the center,
        // scale the radius by the largest axis so the test stays conservative
        // under non-uniform scale.
        let world = item.world;
        let scaled = Vector3::new(
            world.scale.x * mesh.bounds.center.x,
            world.scale.y * mesh.bounds.center.y,
            world.scale.z * mesh.bounds.center.z,
        );
        let center = world.position + world.rotation * scaled;
        let radius = mesh.bounds.radius * world.max_scale();
        if !frustum.contains_sphere(center, radius) {
            stats.culled += 1;
            continue;
        }

        visible.push(Visible {
            material_slot: item.material.slot(),
            mesh_slot: item.mesh.slot(),
            item,
        });
    }

    visible.sort_by_key(|v| (v.material_slot, v.mesh_slot, v.item.order));

    let mut commands: Vec<DrawCommand> = Vec::new();
    for v in visible {
        stats.drawn += 1;
        match commands.last_mut() {
            Some(cmd) if cmd.material == v.item.material && cmd.mesh == v.item.mesh => {
                cmd.instances.push(v.item.world.to_raw());
                cmd.nodes.push(v.item.node);
            }
            _ => commands.push(DrawCommand {
                mesh: v.item.mesh,
                material: v.item.material,
                instances: vec![v.item.world.to_raw()],
                nodes: vec![v.item.node],
            }),
        }
    }

    FrameOutput {
        commands,
        stats,
        warnings,
    }
}

fn dangle(
    warnings: &mut Vec<DanglingResourceWarning>,
    scene: &SceneGraph,
    node: NodeId,
    detail: String,
) {
    let name = match scene.name(node) {
        Ok(Some(name)) => name.to_string(),
        _ => node.to_string(),
    };
    let warning = DanglingResourceWarning { node: name, detail };
    log::warn!("{warning}");
    warnings.push(warning);
}
