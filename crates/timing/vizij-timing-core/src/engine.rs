//! Engine: data ownership and the per-frame update.
//!
//! Methods:
//! - timelines / timelines_mut, realize, begin, stop, remove_clock
//! - create_animatable, apply_animation, set_base_value, set_independent
//! - add_ref_on_channel / release_on_channel
//! - update (tick clocks → invalidate targets → fire frame queue → outputs)

use slotmap::SlotMap;

use crate::clock::{ClockState, ClockTree};
use crate::compose::{
    Animatable, FrameQueue, Invalidation, LocalChannel, ResolvedChain, ResourceChannel,
};
use crate::config::Config;
use crate::ids::{AnimatableId, ClockId, PropertyId, PropertyRegistry, ResourceHandle, TimelineId};
use crate::outputs::{Change, Outputs};
use crate::timeline::TimelineTree;
use crate::value::Value;
use crate::weak::ArenaLiveness;

#[derive(Debug)]
pub struct Engine<C: ResourceChannel = LocalChannel> {
    // Owned data
    cfg: Config,
    timelines: TimelineTree,
    clocks: ClockTree,
    animatables: SlotMap<AnimatableId, Animatable>,
    properties: PropertyRegistry,

    // Systems
    channel: C,
    frame: FrameQueue,

    // Per-frame outputs
    outputs: Outputs,
}

impl Engine<LocalChannel> {
    /// Create a new engine with the given config and an in-process channel.
    pub fn new(cfg: Config) -> Self {
        Self::with_channel(cfg, LocalChannel::new())
    }
}

impl Default for Engine<LocalChannel> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<C: ResourceChannel> Engine<C> {
    pub fn with_channel(cfg: Config, channel: C) -> Self {
        Self {
            frame: FrameQueue::with_capacity(cfg.frame_queue_capacity),
            cfg,
            timelines: TimelineTree::new(),
            clocks: ClockTree::new(),
            animatables: SlotMap::with_key(),
            properties: PropertyRegistry::new(),
            channel,
            outputs: Outputs::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    #[inline]
    pub fn timelines(&self) -> &TimelineTree {
        &self.timelines
    }

    #[inline]
    pub fn timelines_mut(&mut self) -> &mut TimelineTree {
        &mut self.timelines
    }

    #[inline]
    pub fn clocks(&self) -> &ClockTree {
        &self.clocks
    }

    #[inline]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    #[inline]
    pub fn frame_queue(&self) -> &FrameQueue {
        &self.frame
    }

    #[inline]
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    // ----- clocks -----

    /// Realize the timeline subtree at `timeline` as a new clock tree.
    pub fn realize(&mut self, timeline: TimelineId) -> Option<ClockId> {
        self.clocks.realize(&self.timelines, timeline, &self.cfg)
    }

    /// Start a realized root clock at global time `at`.
    pub fn begin(&mut self, root: ClockId, at: f64) -> bool {
        self.clocks.begin(root, at)
    }

    /// Stop a root clock; its animations release on the next update.
    pub fn stop(&mut self, root: ClockId) -> bool {
        self.clocks.stop(root)
    }

    #[inline]
    pub fn clock_state(&self, clock: ClockId) -> Option<ClockState> {
        self.clocks.get(clock).map(|c| c.state())
    }

    /// Tear down a clock subtree and drop its layers from every target.
    pub fn remove_clock(&mut self, root: ClockId) -> usize {
        let doomed: hashbrown::HashSet<ClockId> = self.clocks.postfix(root, true).collect();
        if doomed.is_empty() {
            return 0;
        }
        for (id, target) in self.animatables.iter_mut() {
            let mut touched = Vec::new();
            for (property, storage) in target.properties.iter_mut() {
                let before = storage.layers.len();
                storage.layers.retain(|c| !doomed.contains(c));
                if storage.layers.len() != before {
                    touched.push(*property);
                }
            }
            for property in touched {
                target.invalidate(id, property, &mut self.frame);
            }
        }
        self.clocks.remove(root)
    }

    // ----- targets -----

    pub fn register_property(&mut self, name: &str) -> PropertyId {
        self.properties.register(name)
    }

    #[inline]
    pub fn properties(&self) -> &PropertyRegistry {
        &self.properties
    }

    pub fn create_animatable(&mut self, name: &str) -> AnimatableId {
        self.animatables.insert(Animatable::new(name))
    }

    #[inline]
    pub fn animatable(&self, id: AnimatableId) -> Option<&Animatable> {
        self.animatables.get(id)
    }

    /// Remove a target, releasing everything it holds on the channel. Clocks
    /// that referenced it forget it on their next walk.
    pub fn remove_animatable(&mut self, id: AnimatableId) -> bool {
        let Some(mut target) = self.animatables.remove(id) else {
            return false;
        };
        while target.release_on_channel(id, &mut self.channel) {}
        log::debug!("target {} removed", target.name());
        true
    }

    /// Set the value underneath a property's animations.
    pub fn set_base_value(&mut self, target: AnimatableId, property: PropertyId, value: Value) -> bool {
        let Some(t) = self.animatables.get_mut(target) else {
            return false;
        };
        t.storage_or_insert(property).base_value = value;
        t.invalidate(target, property, &mut self.frame);
        true
    }

    /// Notification that a property's local value changed outside the engine.
    pub fn property_changed(&mut self, target: AnimatableId, property: PropertyId) -> Invalidation {
        match self.animatables.get_mut(target) {
            Some(t) => t.invalidate(target, property, &mut self.frame),
            None => Invalidation::Unknown,
        }
    }

    /// Layer the animation clock `clock` on top of `property`.
    pub fn apply_animation(&mut self, target: AnimatableId, property: PropertyId, clock: ClockId) -> bool {
        let has_animation = self
            .clocks
            .get(clock)
            .map(|c| c.animation().is_some())
            .unwrap_or(false);
        if !has_animation {
            return false;
        }
        let Some(t) = self.animatables.get_mut(target) else {
            return false;
        };
        let storage = t.storage_or_insert(property);
        if !storage.layers.contains(&clock) {
            storage.layers.push(clock);
        }
        self.clocks.add_target(clock, target);
        t.invalidate(target, property, &mut self.frame);
        true
    }

    /// Drop every layer on `property`; its base value is pushed next frame.
    pub fn clear_animations(&mut self, target: AnimatableId, property: PropertyId) -> bool {
        let Some(t) = self.animatables.get_mut(target) else {
            return false;
        };
        match t.properties.get_mut(&property) {
            Some(storage) => storage.layers.clear(),
            None => return false,
        }
        t.invalidate(target, property, &mut self.frame);
        true
    }

    pub fn set_independent(&mut self, target: AnimatableId, property: PropertyId, independent: bool) -> bool {
        let Some(t) = self.animatables.get_mut(target) else {
            return false;
        };
        t.storage_or_insert(property);
        t.set_independent(target, property, independent, &mut self.channel)
    }

    // ----- channel -----

    /// Put `target` on the rendering channel (or add another reference).
    pub fn add_ref_on_channel(&mut self, target: AnimatableId) -> Vec<(PropertyId, ResourceHandle)> {
        match self.animatables.get_mut(target) {
            Some(t) => t.add_ref_on_channel(target, &mut self.channel),
            None => Vec::new(),
        }
    }

    pub fn release_on_channel(&mut self, target: AnimatableId) -> bool {
        match self.animatables.get_mut(target) {
            Some(t) => t.release_on_channel(target, &mut self.channel),
            None => false,
        }
    }

    /// Channel handle of an independent property, or null.
    pub fn handle_of(&self, target: AnimatableId, property: PropertyId) -> ResourceHandle {
        self.animatables
            .get(target)
            .and_then(|t| t.storage(property))
            .map(|s| s.handle())
            .unwrap_or(ResourceHandle::NULL)
    }

    // ----- composition -----

    /// Compose a property's current value on demand.
    pub fn animated_value(&self, target: AnimatableId, property: PropertyId) -> Option<Value> {
        self.compose(target, property).map(|chain| chain.value)
    }

    /// Full chain resolution for a property, link by link.
    pub fn compose(&self, target: AnimatableId, property: PropertyId) -> Option<ResolvedChain> {
        let storage = self.animatables.get(target)?.storage(property)?;
        Some(storage.compose(&self.clocks))
    }

    /// Advance every clock tree to `global_time` and push what changed.
    pub fn update(&mut self, global_time: f64) -> &Outputs {
        self.outputs.clear();

        for root in self.clocks.roots() {
            for clock in self.clocks.tick(root, global_time) {
                self.invalidate_targets(clock);
            }
        }

        self.fire_frame();
        &self.outputs
    }

    fn invalidate_targets(&mut self, clock: ClockId) {
        let targets = match self.clocks.get_mut(clock) {
            Some(c) => c
                .targets
                .live(&self.animatables as &dyn ArenaLiveness<AnimatableId>),
            None => return,
        };
        for target in targets {
            let Some(t) = self.animatables.get_mut(target) else {
                continue;
            };
            for property in t.properties_driven_by(clock) {
                t.invalidate(target, property, &mut self.frame);
            }
        }
    }

    fn fire_frame(&mut self) {
        let batch = self.frame.drain();
        if batch.is_empty() {
            return;
        }
        log::debug!(
            "frame fired: {} object(s), {} resource(s)",
            batch.objects.len(),
            batch.resources.len()
        );

        for (target, property) in batch.resources {
            let Some(t) = self.animatables.get_mut(target) else {
                continue;
            };
            let Some(storage) = t.properties.get_mut(&property) else {
                continue;
            };
            if !std::mem::take(&mut storage.needs_refresh) || storage.handle.is_null() {
                continue;
            }
            let handle = storage.handle;
            let value = storage.compose(&self.clocks).value;
            self.outputs.push_change(Change {
                target,
                property,
                value,
                handle,
            });
        }

        for target in batch.objects {
            let Some(t) = self.animatables.get_mut(target) else {
                continue;
            };
            t.update_pending = false;
            if !t.is_on_channel() {
                continue;
            }
            let mut changes: Vec<Change> = t
                .properties
                .iter()
                .filter(|(_, s)| !(s.independent && !s.handle.is_null()))
                .map(|(property, storage)| Change {
                    target,
                    property: *property,
                    value: storage.compose(&self.clocks).value,
                    handle: ResourceHandle::NULL,
                })
                .collect();
            changes.sort_by_key(|c| c.property.0);
            self.outputs.changes.extend(changes);
        }
    }
}
