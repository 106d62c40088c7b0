//! Identifiers for clocks, timelines, animatables, properties and resources.
//!
//! Arena keys are generational: once a slot is removed its key never resolves
//! again, even after the slot is reused. Holders of a key therefore treat it as
//! a weak reference and check liveness against the owning arena.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

slotmap::new_key_type! {
    /// Runtime timing node in a [`ClockTree`](crate::clock::ClockTree).
    pub struct ClockId;

    /// Author-time node in a [`TimelineTree`](crate::timeline::TimelineTree).
    pub struct TimelineId;

    /// Animated target instance owned by the [`Engine`](crate::engine::Engine).
    pub struct AnimatableId;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub u32);

/// Handle of a resource on the rendering channel.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle(pub u32);

impl ResourceHandle {
    /// Sentinel for "no resource on the channel".
    pub const NULL: ResourceHandle = ResourceHandle(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

/// Name → PropertyId registry with monotonic allocation.
/// Dense ids keep per-target property maps small; names are for hosts/tests.
#[derive(Default, Debug)]
pub struct PropertyRegistry {
    next: u32,
    by_name: HashMap<String, PropertyId>,
    names: Vec<String>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id registered for `name`, allocating one on first use.
    pub fn register(&mut self, name: &str) -> PropertyId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = PropertyId(self.next);
        self.next = self.next.wrapping_add(1);
        self.by_name.insert(name.to_string(), id);
        self.names.push(name.to_string());
        id
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<PropertyId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn name(&self, id: PropertyId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent_and_monotonic() {
        let mut reg = PropertyRegistry::new();
        let opacity = reg.register("Opacity");
        let width = reg.register("Width");
        assert_eq!(opacity, PropertyId(0));
        assert_eq!(width, PropertyId(1));
        assert_eq!(reg.register("Opacity"), opacity);
        assert_eq!(reg.name(width), Some("Width"));
        assert_eq!(reg.lookup("Height"), None);
    }

    #[test]
    fn null_handle_sentinel() {
        assert!(ResourceHandle::NULL.is_null());
        assert!(ResourceHandle::default().is_null());
        assert!(!ResourceHandle(7).is_null());
    }
}
