//! Engine data structures: asset descriptors, transforms, and the scene graph.
//!
//! - `arena` is the generational slot storage behind handles and node ids
//! - `model` contains the mesh/texture/material descriptors produced by import
//! - `transform` holds local/world transforms and their raw GPU layout
//! - `scene_graph` enables hierarchical scene organization

pub mod arena;
pub mod model;
pub mod scene_graph;
pub mod transform;
