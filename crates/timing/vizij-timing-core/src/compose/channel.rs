//! Rendering-channel bookkeeping and the per-frame registration queue.
//!
//! The channel itself is external. [`ResourceChannel`] is the narrow surface
//! the composer needs from it; [`LocalChannel`] is an in-process reference
//! counting implementation used by default and in tests.

use hashbrown::HashMap;

use crate::ids::{AnimatableId, PropertyId, ResourceHandle};

/// Resource backing one independently animated property of one target.
pub type ResourceKey = (AnimatableId, PropertyId);

pub trait ResourceChannel {
    /// Add a reference, creating the resource on first use.
    fn add_ref(&mut self, key: ResourceKey) -> ResourceHandle;

    /// Drop a reference. Returns true when the resource was freed.
    /// Unknown keys are ignored.
    fn release(&mut self, key: ResourceKey) -> bool;

    /// Current handle, or [`ResourceHandle::NULL`] if the key has none.
    fn handle_of(&self, key: ResourceKey) -> ResourceHandle;
}

#[derive(Debug)]
struct Entry {
    handle: ResourceHandle,
    refs: u32,
}

#[derive(Debug)]
pub struct LocalChannel {
    resources: HashMap<ResourceKey, Entry>,
    next_handle: u32,
}

impl Default for LocalChannel {
    fn default() -> Self {
        Self {
            resources: HashMap::new(),
            // 0 is the null handle.
            next_handle: 1,
        }
    }
}

impl LocalChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live resources.
    #[inline]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn ref_count(&self, key: ResourceKey) -> u32 {
        self.resources.get(&key).map(|e| e.refs).unwrap_or(0)
    }
}

impl ResourceChannel for LocalChannel {
    fn add_ref(&mut self, key: ResourceKey) -> ResourceHandle {
        let next = &mut self.next_handle;
        let entry = self.resources.entry(key).or_insert_with(|| {
            let handle = ResourceHandle(*next);
            *next = next.wrapping_add(1).max(1);
            Entry { handle, refs: 0 }
        });
        entry.refs += 1;
        entry.handle
    }

    fn release(&mut self, key: ResourceKey) -> bool {
        let Some(entry) = self.resources.get_mut(&key) else {
            return false;
        };
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs == 0 {
            self.resources.remove(&key);
            true
        } else {
            false
        }
    }

    fn handle_of(&self, key: ResourceKey) -> ResourceHandle {
        self.resources
            .get(&key)
            .map(|e| e.handle)
            .unwrap_or(ResourceHandle::NULL)
    }
}

/// Work registered for the next frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameBatch {
    /// Targets needing a whole-object update.
    pub objects: Vec<AnimatableId>,
    /// Independent resources needing a value refresh.
    pub resources: Vec<ResourceKey>,
}

impl FrameBatch {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.resources.is_empty()
    }
}

/// One-shot per-frame registrations. Callers coalesce (one entry per target
/// per frame); draining fires every registration exactly once.
#[derive(Debug)]
pub struct FrameQueue {
    pending: FrameBatch,
    capacity: usize,
}

impl FrameQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: FrameBatch {
                objects: Vec::with_capacity(capacity),
                resources: Vec::with_capacity(capacity),
            },
            capacity,
        }
    }

    #[inline]
    pub fn register_object(&mut self, target: AnimatableId) {
        self.pending.objects.push(target);
    }

    #[inline]
    pub fn register_resource(&mut self, key: ResourceKey) {
        self.pending.resources.push(key);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.objects.len() + self.pending.resources.len()
    }

    #[inline]
    pub fn pending(&self) -> &FrameBatch {
        &self.pending
    }

    /// Take everything registered so far, leaving the queue empty.
    pub fn drain(&mut self) -> FrameBatch {
        let fresh = FrameBatch {
            objects: Vec::with_capacity(self.capacity),
            resources: Vec::with_capacity(self.capacity),
        };
        std::mem::replace(&mut self.pending, fresh)
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
