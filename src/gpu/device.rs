//! Abstract graphics-device interface.
//!
//! The engine core never calls a graphics API directly; every allocation goes
//! through [`RenderDevice`], implemented by an adapter around the concrete
//! binding. [`HeadlessDevice`] is the in-crate implementation: it tracks
//! allocations byte-accurately without a GPU, which makes resource-lifetime
//! behavior testable and gives the manager a default collaborator.

use std::collections::HashMap;

use crate::data_structures::model::ChannelLayout;
use crate::error::UploadError;

/// Opaque id of a device buffer allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Opaque id of a device texture allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Allocation interface of the underlying graphics context.
///
/// Implementations must make `destroy_*` infallible and idempotent-safe for
/// ids they handed out: the resource manager relies on being able to unwind
/// a partially-completed multi-part upload on any failure path.
pub trait RenderDevice {
    fn create_buffer(
        &mut self,
        label: &str,
        kind: BufferKind,
        contents: &[u8],
    ) -> Result<BufferId, UploadError>;

    fn create_texture(
        &mut self,
        label: &str,
        size: [u32; 2],
        layout: ChannelLayout,
        pixels: &[u8],
    ) -> Result<TextureId, UploadError>;

    fn destroy_buffer(&mut self, id: BufferId);

    fn destroy_texture(&mut self, id: TextureId);
}

/// In-memory device with an optional byte budget.
///
/// Exceeding the budget fails with [`UploadError::OutOfMemory`] and leaves
/// the device unchanged, mirroring how a real device rejects an allocation.
pub struct HeadlessDevice {
    budget: Option<u64>,
    used: u64,
    next_id: u64,
    buffers: HashMap<BufferId, u64>,
    textures: HashMap<TextureId, u64>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::with_budget(None)
    }

    /// Device that refuses allocations past `budget` bytes in total.
    pub fn with_budget(budget: Option<u64>) -> Self {
        Self {
            budget,
            used: 0,
            next_id: 0,
            buffers: HashMap::new(),
            textures: HashMap::new(),
        }
    }

    /// Bytes currently allocated across all live buffers and textures.
    pub fn allocated_bytes(&self) -> u64 {
        self.used
    }

    /// Number of live device objects (buffers + textures).
    pub fn allocation_count(&self) -> usize {
        self.buffers.len() + self.textures.len()
    }

    fn reserve(&mut self, requested: u64) -> Result<(), UploadError> {
        if let Some(budget) = self.budget {
            let available = budget.saturating_sub(self.used);
            if requested > available {
                return Err(UploadError::OutOfMemory {
                    requested,
                    available,
                });
            }
        }
        self.used += requested;
        Ok(())
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl RenderDevice for HeadlessDevice {
    fn create_buffer(
        &mut self,
        label: &str,
        kind: BufferKind,
        contents: &[u8],
    ) -> Result<BufferId, UploadError> {
        self.reserve(contents.len() as u64)?;
        let id = BufferId(self.next());
        self.buffers.insert(id, contents.len() as u64);
        log::trace!(
            "allocated {:?} buffer {:?} ({} bytes) for {label}",
            kind,
            id,
            contents.len()
        );
        Ok(id)
    }

    fn create_texture(
        &mut self,
        label: &str,
        size: [u32; 2],
        layout: ChannelLayout,
        pixels: &[u8],
    ) -> Result<TextureId, UploadError> {
        let expected = size[0] as u64 * size[1] as u64 * layout.bytes_per_pixel() as u64;
        if pixels.len() as u64 != expected {
            return Err(UploadError::InvalidDescriptor {
                name: label.to_string(),
                reason: format!(
                    "pixel buffer holds {} bytes, {}x{} {:?} requires {expected}",
                    pixels.len(),
                    size[0],
                    size[1],
                    layout
                ),
            });
        }
        self.reserve(expected)?;
        let id = TextureId(self.next());
        self.textures.insert(id, expected);
        log::trace!("allocated texture {:?} ({expected} bytes) for {label}", id);
        Ok(id)
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        if let Some(size) = self.buffers.remove(&id) {
            self.used -= size;
        }
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if let Some(size) = self.textures.remove(&id) {
            self.used -= size;
        }
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}
