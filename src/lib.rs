//! prism-ngin
//!
//! A lightweight, API-agnostic rendering-engine core focused on instanced
//! drawing. This crate imports assets into engine descriptors, manages GPU
//! resources behind generational handles, organizes entities in a scene
//! graph and turns each frame into a culled, batched draw-command list a
//! graphics binding can submit directly. The design emphasizes deterministic
//! output, cheap instancing and a runtime surface small enough to embed.
//!
//! High-level modules
//! - `assets`: decoding OBJ/glTF/image files and procedural primitives
//! - `camera`: camera, projection and the culling frustum
//! - `context`: central state bundle owning resources, scene and loader
//! - `data_structures`: engine data models (arena, descriptors, scene graph)
//! - `error`: the error taxonomy shared across modules
//! - `flow`: high level flow control (scenes / the fixed-step frame loop)
//! - `gpu`: the render-device abstraction and handle-based resource manager
//! - `render`: the cull/sort/batch pipeline producing draw commands
//! - `surface`: the presentation-surface abstraction and headless impl
//!

pub mod assets;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod gpu;
pub mod render;
pub mod surface;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use context::{Context, UploadedModel};
pub use data_structures::arena::Handle;
pub use data_structures::scene_graph::{NodeId, SceneGraph};
pub use data_structures::transform::Transform;
pub use flow::{run, FixedStep, Flow, FrameMetrics, FrameState, InputSnapshot, RunSummary};
pub use gpu::{HeadlessDevice, ResourceManager};
pub use render::{DrawCommand, FrameOutput};
pub use surface::{EngineConfig, HeadlessSurface, PresentationSurface, SurfaceEvent};
