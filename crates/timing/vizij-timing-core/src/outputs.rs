//! Output contracts from the timing engine.
//!
//! Outputs carry the composed values pushed this frame. Hosts apply each
//! change either to the resource named by `handle` (independent properties)
//! or to the target object as a whole (`handle` is null).

use serde::{Deserialize, Serialize};

use crate::ids::{AnimatableId, PropertyId, ResourceHandle};
use crate::value::Value;

/// One composed property value pushed this frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub target: AnimatableId,
    pub property: PropertyId,
    pub value: Value,
    #[serde(default)]
    pub handle: ResourceHandle,
}

impl Change {
    #[inline]
    pub fn is_independent(&self) -> bool {
        !self.handle.is_null()
    }
}

/// Outputs returned by `Engine::update()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Latest change for `(target, property)` this frame.
    pub fn find(&self, target: AnimatableId, property: PropertyId) -> Option<&Change> {
        self.changes
            .iter()
            .rev()
            .find(|c| c.target == target && c.property == property)
    }
}
