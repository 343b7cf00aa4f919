//! Engine error taxonomy.
//!
//! Errors are split by recovery strategy:
//!
//! - [`ImportError`] covers bad asset data; callers skip the asset and log
//! - [`UploadError`] covers GPU allocation failures; recoverable per resource
//! - [`InvalidHandle`] flags use of a stale resource handle (programmer error)
//! - [`DanglingResourceWarning`] is a non-fatal render-time inconsistency
//! - [`SceneError`] covers invalid scene-graph mutations
//! - [`DeviceError`] is reserved for loss of the graphics context itself and
//!   terminates the frame loop

use std::path::PathBuf;

use thiserror::Error;

/// Asset decoding failed. Carries the file path and decoder stage so the
/// failure can be logged actionably.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path} ({stage}): {message}")]
    Decode {
        path: PathBuf,
        stage: &'static str,
        message: String,
    },
    #[error("unsupported asset format for {path}")]
    Unsupported { path: PathBuf },
}

impl ImportError {
    /// Shorthand for a decode failure at a named decoder stage.
    pub fn decode(path: impl Into<PathBuf>, stage: &'static str, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            stage,
            message: message.to_string(),
        }
    }
}

/// GPU upload failed. The resource manager guarantees its state is unchanged
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("gpu allocation of {requested} bytes exceeds the remaining budget of {available} bytes")]
    OutOfMemory { requested: u64, available: u64 },
    #[error("invalid resource descriptor for {name}: {reason}")]
    InvalidDescriptor { name: String, reason: String },
}

/// A handle referenced a slot whose generation has moved on, i.e. the
/// resource was released (or never existed in this manager).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("stale resource handle (slot {slot}, generation {generation})")]
pub struct InvalidHandle {
    pub slot: u32,
    pub generation: u32,
}

/// A scene node referenced a released mesh, texture or material during
/// rendering. Non-fatal: the node is skipped, the frame completes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("scene node {node} references a dead resource: {detail}")]
pub struct DanglingResourceWarning {
    pub node: String,
    pub detail: String,
}

/// Invalid structural mutation of the scene graph.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("stale scene node id: {0}")]
    InvalidNode(InvalidHandle),
    #[error("attaching {child} under {parent} would make a node its own ancestor")]
    Cycle { parent: String, child: String },
}

/// Loss of the graphics context. There is no local recovery; the frame loop
/// surfaces this to its caller for full engine shutdown.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("graphics device lost")]
    Lost,
    #[error("presentation surface unavailable: {0}")]
    Surface(String),
}
