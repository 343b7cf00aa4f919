//! Scene graph and hierarchical scene organization.
//!
//! The scene graph is a tree of transform nodes stored in a generational
//! arena: the graph owns every node, parents reference children by id, and a
//! [`NodeId`] kept across a `remove` is detected as stale instead of
//! resolving to whatever reuses the slot. Nodes optionally bind a mesh and
//! material by handle; destroying a node never releases GPU resources, since
//! those may be shared across many nodes.
//!
//! Traversal visits children in insertion order, so world-transform updates
//! and the draw lists derived from them are reproducible across runs.

use cgmath::SquareMatrix;

use crate::data_structures::arena::{Arena, Handle};
use crate::data_structures::transform::Transform;
use crate::error::SceneError;
use crate::gpu::{MaterialHandle, MeshHandle};

/// Id of a scene node. Stale ids (after `remove`) fail instead of aliasing.
pub type NodeId = Handle<Node>;

/// One element of the transform tree. Fields are managed through
/// [`SceneGraph`] so the tree invariants cannot be broken from outside.
pub struct Node {
    name: Option<String>,
    local: Transform,
    world: Transform,
    world_matrix: cgmath::Matrix4<f32>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    renderable: Option<(MeshHandle, MaterialHandle)>,
    /// Monotonic creation order, used to break batching ties deterministically.
    order: u64,
}

/// A drawable node flattened for the render pipeline: resolved world
/// transform plus the bound resource handles.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub node: NodeId,
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub world: Transform,
    pub order: u64,
}

/// Hierarchical transform tree of entities referencing GPU resources.
pub struct SceneGraph {
    nodes: Arena<Node>,
    roots: Vec<NodeId>,
    next_order: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            roots: Vec::new(),
            next_order: 0,
        }
    }

    fn new_node(&mut self, parent: Option<NodeId>) -> NodeId {
        let order = self.next_order;
        self.next_order += 1;
        self.nodes.insert(Node {
            name: None,
            local: Transform::new(),
            world: Transform::new(),
            world_matrix: cgmath::Matrix4::identity(),
            parent,
            children: Vec::new(),
            renderable: None,
            order,
        })
    }

    /// Create a node at the top level of the graph.
    pub fn add_root(&mut self) -> NodeId {
        let id = self.new_node(None);
        self.roots.push(id);
        id
    }

    /// Create a node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId) -> Result<NodeId, SceneError> {
        self.node(parent)?;
        let id = self.new_node(Some(parent));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Re-parent `node` under `parent`.
    ///
    /// Rejected when `parent` is `node` itself or one of its descendants:
    /// the graph must stay a tree, a node may never be its own ancestor.
    pub fn set_parent(&mut self, node: NodeId, parent: NodeId) -> Result<(), SceneError> {
        self.node(node)?;
        self.node(parent)?;
        // Walk up from the prospective parent; finding `node` means a cycle.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == node {
                return Err(SceneError::Cycle {
                    parent: parent.to_string(),
                    child: node.to_string(),
                });
            }
            cursor = self.node(id)?.parent;
        }
        self.detach(node)?;
        self.node_mut(node)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(node);
        Ok(())
    }

    /// Remove `node` from the tree, recursively destroying its children.
    /// Referenced GPU resources are left untouched.
    pub fn remove(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.node(node)?;
        self.detach(node)?;
        self.destroy_recursive(node)
    }

    fn detach(&mut self, node: NodeId) -> Result<(), SceneError> {
        match self.node(node)?.parent {
            Some(parent) => {
                let siblings = &mut self.node_mut(parent)?.children;
                siblings.retain(|&c| c != node);
            }
            None => self.roots.retain(|&r| r != node),
        }
        Ok(())
    }

    fn destroy_recursive(&mut self, node: NodeId) -> Result<(), SceneError> {
        let children = self.node(node)?.children.clone();
        for child in children {
            self.destroy_recursive(child)?;
        }
        self.nodes.remove(node).map_err(SceneError::InvalidNode)?;
        Ok(())
    }

    pub fn set_local_transform(&mut self, node: NodeId, t: Transform) -> Result<(), SceneError> {
        self.node_mut(node)?.local = t;
        Ok(())
    }

    pub fn local_transform(&self, node: NodeId) -> Result<Transform, SceneError> {
        Ok(self.node(node)?.local)
    }

    /// Bind (or clear) the mesh and material this node draws.
    pub fn set_renderable(
        &mut self,
        node: NodeId,
        renderable: Option<(MeshHandle, MaterialHandle)>,
    ) -> Result<(), SceneError> {
        self.node_mut(node)?.renderable = renderable;
        Ok(())
    }

    pub fn renderable(
        &self,
        node: NodeId,
    ) -> Result<Option<(MeshHandle, MaterialHandle)>, SceneError> {
        Ok(self.node(node)?.renderable)
    }

    pub fn set_name(&mut self, node: NodeId, name: impl Into<String>) -> Result<(), SceneError> {
        self.node_mut(node)?.name = Some(name.into());
        Ok(())
    }

    pub fn name(&self, node: NodeId) -> Result<Option<&str>, SceneError> {
        Ok(self.node(node)?.name.as_deref())
    }

    /// First node carrying `name`, in traversal order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut found = None;
        self.visit(|id, node| {
            if found.is_none() && node.name.as_deref() == Some(name) {
                found = Some(id);
            }
        });
        found
    }

    pub fn parent(&self, node: NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.node(node)?.parent)
    }

    pub fn children(&self, node: NodeId) -> Result<&[NodeId], SceneError> {
        Ok(&self.node(node)?.children)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Recompute every node's world transform in a single top-down traversal.
    ///
    /// A node's world transform is its parent's world transform composed with
    /// its local transform; roots compose with identity. Children are visited
    /// in insertion order. Calling this again without any mutation in between
    /// yields bit-identical results. Structural mutation during the traversal
    /// is impossible: the traversal holds the graph exclusively.
    pub fn compute_world_transforms(&mut self) {
        let roots = self.roots.clone();
        let identity = Transform::new();
        for root in roots {
            self.update_world(root, &identity);
        }
    }

    fn update_world(&mut self, id: NodeId, parent_world: &Transform) {
        let (local, children) = match self.nodes.get(id) {
            Ok(node) => (node.local, node.children.clone()),
            // Unreachable through the public API; ids in child lists are live.
            Err(_) => return,
        };
        let world = parent_world * &local;
        if let Ok(node) = self.nodes.get_mut(id) {
            node.world = world;
            node.world_matrix = world.to_matrix();
        }
        for child in children {
            self.update_world(child, &world);
        }
    }

    /// World transform as cached by the last `compute_world_transforms`.
    pub fn world_transform(&self, node: NodeId) -> Result<Transform, SceneError> {
        Ok(self.node(node)?.world)
    }

    pub fn world_matrix(&self, node: NodeId) -> Result<cgmath::Matrix4<f32>, SceneError> {
        Ok(self.node(node)?.world_matrix)
    }

    /// All nodes with a mesh+material binding, flattened in traversal order.
    /// Uses the world transforms cached by `compute_world_transforms`.
    pub fn collect_drawables(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        self.visit(|id, node| {
            if let Some((mesh, material)) = node.renderable {
                items.push(DrawItem {
                    node: id,
                    mesh,
                    material,
                    world: node.world,
                    order: node.order,
                });
            }
        });
        items
    }

    /// Depth-first visit over all nodes, children in insertion order.
    fn visit(&self, mut f: impl FnMut(NodeId, &Node)) {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Ok(node) = self.nodes.get(id) {
                f(id, node);
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(id).map_err(SceneError::InvalidNode)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(id).map_err(SceneError::InvalidNode)
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
