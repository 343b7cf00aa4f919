//! Generational arena used for handle-based storage.
//!
//! GPU resources and scene nodes are stored in slots addressed by a
//! [`Handle`]: a slot index plus a generation counter. Releasing a slot bumps
//! its generation, so a handle kept across a release can never silently alias
//! whatever gets stored in that slot next. This avoids raw ownership pointers
//! from scene nodes into GPU objects.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::error::InvalidHandle;

/// Opaque reference to an arena slot, typed by the stored resource kind.
///
/// Handles are small and `Copy`; they stay valid until the resource is
/// released from its owning arena, after which every access fails with
/// [`InvalidHandle`].
pub struct Handle<T> {
    slot: u32,
    generation: u32,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(slot: u32, generation: u32) -> Self {
        Self {
            slot,
            generation,
            _kind: PhantomData,
        }
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

// Manual impls: `derive` would needlessly bound these on `T`.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Handle<T> {}
impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.generation == other.generation
    }
}
impl<T> Eq for Handle<T> {}
impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slot.hash(state);
        self.generation.hash(state);
    }
}
impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.slot, self.generation)
    }
}
impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot-and-generation storage backing the resource manager and scene graph.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store a value, reusing a freed slot when one is available. Reused
    /// slots carry a newer generation than any handle issued for them before.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.value = Some(value);
                Handle::new(slot, entry.generation)
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                Handle::new(slot, 0)
            }
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Result<&T, InvalidHandle> {
        self.slots
            .get(handle.slot as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_ref())
            .ok_or(InvalidHandle {
                slot: handle.slot,
                generation: handle.generation,
            })
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, InvalidHandle> {
        self.slots
            .get_mut(handle.slot as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
            .ok_or(InvalidHandle {
                slot: handle.slot,
                generation: handle.generation,
            })
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_ok()
    }

    /// Remove the value and invalidate the handle by bumping the slot's
    /// generation. Any later access through the old handle fails.
    pub fn remove(&mut self, handle: Handle<T>) -> Result<T, InvalidHandle> {
        let stale = InvalidHandle {
            slot: handle.slot,
            generation: handle.generation,
        };
        let entry = self
            .slots
            .get_mut(handle.slot as usize)
            .filter(|s| s.generation == handle.generation)
            .ok_or(stale)?;
        let value = entry.value.take().ok_or(stale)?;
        entry.generation += 1;
        self.free.push(handle.slot);
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value
                .as_ref()
                .map(|v| (Handle::new(i as u32, s.generation), v))
        })
    }

    /// Remove every live entry, invalidating all outstanding handles.
    /// Used on shutdown to hand the stored GPU objects back to the device.
    pub fn drain_all(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                slot.generation += 1;
                self.free.push(i as u32);
                out.push(value);
            }
        }
        out
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
