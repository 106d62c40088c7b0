//! Per-property composition chains and resource invalidation.
//!
//! Each animated property of an [`Animatable`] keeps an [`AnimationStorage`]:
//! the ordered clocks layered on it, the base value underneath them, and its
//! bookkeeping on the rendering channel. Invalidations are coalesced so a
//! target is pushed to the channel at most once per frame.

pub mod animation;
pub mod blend;
pub mod channel;

use hashbrown::HashMap;

use crate::clock::ClockTree;
use crate::ids::{AnimatableId, ClockId, PropertyId, ResourceHandle};
use crate::value::Value;

pub use animation::{AnimationLayer, AnimationOutput, ValueAnimation};
pub use channel::{FrameBatch, FrameQueue, LocalChannel, ResourceChannel, ResourceKey};

/// What one link of a chain saw and produced. `output` is `None` for stopped
/// links.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedLink {
    pub origin: Value,
    pub destination: Value,
    pub output: Option<Value>,
}

/// Result of resolving a whole chain.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedChain {
    pub links: Vec<ResolvedLink>,
    /// Output of the last running link, or the base value if none ran.
    pub value: Value,
}

/// Resolve a composition chain first to last.
///
/// A link's origin is the output of the nearest preceding running link, or
/// `base` if there is none. Its destination is the input the next running
/// link will start from (that link's declared origin, or else its own
/// destination), or `destination` for the last running link. Stopped links
/// are skipped entirely.
pub fn resolve_chain<L: AnimationOutput>(
    layers: &[L],
    base: &Value,
    destination: &Value,
) -> ResolvedChain {
    // Destinations depend on later links, so resolve them back to front.
    let mut destinations = Vec::with_capacity(layers.len());
    let mut next_input = destination.clone();
    for layer in layers.iter().rev() {
        destinations.push(next_input.clone());
        if !layer.is_stopped() {
            if let Some(declared) = layer.declared_origin() {
                next_input = declared.clone();
            }
        }
    }
    destinations.reverse();

    let mut links = Vec::with_capacity(layers.len());
    let mut origin = base.clone();
    for (layer, destination) in layers.iter().zip(destinations) {
        if layer.is_stopped() {
            links.push(ResolvedLink {
                origin: origin.clone(),
                destination,
                output: None,
            });
            continue;
        }
        let output = layer.current_value(&origin, &destination);
        links.push(ResolvedLink {
            origin: std::mem::replace(&mut origin, output.clone()),
            destination,
            output: Some(output),
        });
    }
    ResolvedChain {
        links,
        value: origin,
    }
}

/// Animation bookkeeping for one property of one target.
#[derive(Clone, Debug)]
pub struct AnimationStorage {
    /// Clocks layered on the property, lowest first.
    pub(crate) layers: Vec<ClockId>,
    pub(crate) base_value: Value,
    /// Pushed to its own channel resource instead of the whole object.
    pub(crate) independent: bool,
    pub(crate) handle: ResourceHandle,
    pub(crate) needs_refresh: bool,
}

impl AnimationStorage {
    pub fn new(base_value: Value) -> Self {
        Self {
            layers: Vec::new(),
            base_value,
            independent: false,
            handle: ResourceHandle::NULL,
            needs_refresh: false,
        }
    }

    #[inline]
    pub fn layers(&self) -> &[ClockId] {
        &self.layers
    }

    #[inline]
    pub fn base_value(&self) -> &Value {
        &self.base_value
    }

    #[inline]
    pub fn is_independent(&self) -> bool {
        self.independent
    }

    #[inline]
    pub fn handle(&self) -> ResourceHandle {
        self.handle
    }

    #[inline]
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    #[inline]
    pub fn is_animated(&self) -> bool {
        !self.layers.is_empty()
    }

    /// Resolve the chain against the clocks' current state. Layers whose
    /// clock is gone or has no animation are treated as stopped.
    pub fn compose(&self, clocks: &ClockTree) -> ResolvedChain {
        let views: Vec<ChainLayer<'_>> = self
            .layers
            .iter()
            .map(|id| ChainLayer(clocks.get(*id).and_then(AnimationLayer::of)))
            .collect();
        resolve_chain(&views, &self.base_value, &self.base_value)
    }
}

/// Layer slot that may have lost its clock.
struct ChainLayer<'a>(Option<AnimationLayer<'a>>);

impl AnimationOutput for ChainLayer<'_> {
    fn is_stopped(&self) -> bool {
        self.0.as_ref().map(|l| l.is_stopped()).unwrap_or(true)
    }

    fn declared_origin(&self) -> Option<&Value> {
        self.0.as_ref().and_then(|l| l.declared_origin())
    }

    fn is_destination_default(&self) -> bool {
        self.0
            .as_ref()
            .map(|l| l.is_destination_default())
            .unwrap_or(true)
    }

    fn current_value(&self, origin: &Value, destination: &Value) -> Value {
        match &self.0 {
            Some(layer) => layer.current_value(origin, destination),
            None => origin.clone(),
        }
    }
}

/// How an invalidation was handled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Invalidation {
    /// Independent resource marked for refresh.
    Resource,
    /// Whole-object update registered for the next frame.
    Object,
    /// Already registered this frame.
    Coalesced,
    /// Target is not on the channel; nothing to push.
    OffChannel,
    /// Property has no storage on this target.
    Unknown,
}

/// A target instance with animated properties.
#[derive(Clone, Debug, Default)]
pub struct Animatable {
    pub(crate) name: String,
    pub(crate) properties: HashMap<PropertyId, AnimationStorage>,
    /// Set while a whole-object update is queued; cleared when it fires.
    pub(crate) update_pending: bool,
    pub(crate) channel_refs: u32,
}

impl Animatable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn storage(&self, property: PropertyId) -> Option<&AnimationStorage> {
        self.properties.get(&property)
    }

    #[inline]
    pub fn is_on_channel(&self) -> bool {
        self.channel_refs > 0
    }

    #[inline]
    pub fn channel_refs(&self) -> u32 {
        self.channel_refs
    }

    #[inline]
    pub fn update_pending(&self) -> bool {
        self.update_pending
    }

    pub fn properties(&self) -> impl Iterator<Item = (PropertyId, &AnimationStorage)> {
        self.properties.iter().map(|(k, v)| (*k, v))
    }

    pub(crate) fn storage_or_insert(&mut self, property: PropertyId) -> &mut AnimationStorage {
        self.properties
            .entry(property)
            .or_insert_with(|| AnimationStorage::new(Value::default()))
    }

    /// Properties that `clock` is layered on.
    pub(crate) fn properties_driven_by(&self, clock: ClockId) -> Vec<PropertyId> {
        self.properties
            .iter()
            .filter(|(_, s)| s.layers.contains(&clock))
            .map(|(p, _)| *p)
            .collect()
    }

    /// Note that `property`'s composed value changed.
    ///
    /// Independent resources on the channel only get their refresh flag set
    /// (and are queued once). Everything else registers the whole object,
    /// at most once per frame and only while it is on the channel.
    pub fn invalidate(
        &mut self,
        id: AnimatableId,
        property: PropertyId,
        queue: &mut FrameQueue,
    ) -> Invalidation {
        let on_channel = self.is_on_channel();
        let Some(storage) = self.properties.get_mut(&property) else {
            return Invalidation::Unknown;
        };

        if storage.independent && !storage.handle.is_null() {
            if !storage.needs_refresh {
                storage.needs_refresh = true;
                queue.register_resource((id, property));
            }
            return Invalidation::Resource;
        }

        if !on_channel {
            return Invalidation::OffChannel;
        }
        if self.update_pending {
            return Invalidation::Coalesced;
        }
        self.update_pending = true;
        queue.register_object(id);
        log::trace!("target {} registered for frame update", self.name);
        Invalidation::Object
    }

    /// Add a channel reference and a resource reference for every independent
    /// property. Returns the resulting handles.
    pub fn add_ref_on_channel<C: ResourceChannel>(
        &mut self,
        id: AnimatableId,
        channel: &mut C,
    ) -> Vec<(PropertyId, ResourceHandle)> {
        self.channel_refs += 1;
        let mut handles = Vec::new();
        for (property, storage) in self.properties.iter_mut() {
            if storage.independent {
                storage.handle = channel.add_ref((id, *property));
                handles.push((*property, storage.handle));
            }
        }
        handles
    }

    /// Drop one channel reference. Returns false if the target was not on
    /// the channel.
    pub fn release_on_channel<C: ResourceChannel>(
        &mut self,
        id: AnimatableId,
        channel: &mut C,
    ) -> bool {
        if self.channel_refs == 0 {
            return false;
        }
        self.channel_refs -= 1;
        for (property, storage) in self.properties.iter_mut() {
            if storage.independent {
                channel.release((id, *property));
                storage.handle = channel.handle_of((id, *property));
                if storage.handle.is_null() {
                    storage.needs_refresh = false;
                }
            }
        }
        true
    }

    /// Switch a property between independent and whole-object pushing,
    /// moving its channel references along.
    pub fn set_independent<C: ResourceChannel>(
        &mut self,
        id: AnimatableId,
        property: PropertyId,
        independent: bool,
        channel: &mut C,
    ) -> bool {
        let refs = self.channel_refs;
        let Some(storage) = self.properties.get_mut(&property) else {
            return false;
        };
        if storage.independent == independent {
            return true;
        }
        storage.independent = independent;
        let key = (id, property);
        if independent {
            for _ in 0..refs {
                storage.handle = channel.add_ref(key);
            }
        } else {
            for _ in 0..refs {
                channel.release(key);
            }
            storage.handle = ResourceHandle::NULL;
            storage.needs_refresh = false;
        }
        true
    }
}
