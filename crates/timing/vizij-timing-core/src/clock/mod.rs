//! Runtime clocks.
//!
//! A clock is the running instance of a timeline. Clocks form a tree mirroring
//! the timeline tree they were realized from, stored in a [`ClockTree`] arena
//! and linked first-child/next-sibling with parent back-links. Links are
//! arena keys, so there are no ownership cycles; a node's parent chain always
//! lists it exactly once while attached.

pub mod subtree;
pub mod tick;

use slotmap::SlotMap;

use crate::compose::animation::ValueAnimation;
use crate::config::Config;
use crate::ids::{AnimatableId, ClockId, TimelineId};
use crate::timeline::{TimelineKind, TimelineTree, TimelineWalker, Timing};
use crate::weak::WeakList;

pub use subtree::{PostfixIter, PostfixSubtree, PrefixIter, PrefixSubtree};
pub use tick::{ClockSample, ClockState};

#[derive(Debug)]
pub struct Clock {
    pub(crate) timeline: TimelineId,
    pub(crate) parent: Option<ClockId>,
    pub(crate) first_child: Option<ClockId>,
    pub(crate) next_sibling: Option<ClockId>,

    pub(crate) timing: Timing,
    /// Iteration length resolved at realization (`None` = unbounded).
    pub(crate) natural_duration: Option<f64>,
    pub(crate) animation: Option<ValueAnimation>,

    /// Global time at which a root clock was begun.
    pub(crate) start_time: Option<f64>,
    pub(crate) sample: ClockSample,
    pub(crate) previous_state: ClockState,

    /// Instances this clock animates; entries die with their instance.
    pub(crate) targets: WeakList<AnimatableId>,
}

impl Clock {
    fn new(timeline: TimelineId, timing: Timing, natural_duration: Option<f64>) -> Self {
        Self {
            timeline,
            parent: None,
            first_child: None,
            next_sibling: None,
            timing,
            natural_duration,
            animation: None,
            start_time: None,
            sample: ClockSample::STOPPED,
            previous_state: ClockState::Stopped,
            targets: WeakList::new(),
        }
    }

    #[inline]
    pub fn timeline(&self) -> TimelineId {
        self.timeline
    }

    #[inline]
    pub fn state(&self) -> ClockState {
        self.sample.state
    }

    #[inline]
    pub fn progress(&self) -> f64 {
        self.sample.progress
    }

    #[inline]
    pub fn current_time(&self) -> Option<f64> {
        self.sample.current_time
    }

    #[inline]
    pub fn current_iteration(&self) -> u32 {
        self.sample.iteration
    }

    #[inline]
    pub fn animation(&self) -> Option<&ValueAnimation> {
        self.animation.as_ref()
    }

    #[inline]
    pub fn natural_duration(&self) -> Option<f64> {
        self.natural_duration
    }

    /// Target slots, including dead ones not yet compacted away.
    #[inline]
    pub fn targets(&self) -> &[AnimatableId] {
        self.targets.slots()
    }

    /// True if the last tick changed the clock's state.
    #[inline]
    pub fn state_changed(&self) -> bool {
        self.previous_state != self.sample.state
    }
}

/// Arena of runtime clocks.
#[derive(Default, Debug)]
pub struct ClockTree {
    nodes: SlotMap<ClockId, Clock>,
}

impl ClockTree {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, id: ClockId) -> Option<&Clock> {
        self.nodes.get(id)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: ClockId) -> Option<&mut Clock> {
        self.nodes.get_mut(id)
    }

    #[inline]
    pub fn contains(&self, id: ClockId) -> bool {
        self.nodes.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn parent(&self, id: ClockId) -> Option<ClockId> {
        self.nodes.get(id).and_then(|c| c.parent)
    }

    #[inline]
    pub fn first_child(&self, id: ClockId) -> Option<ClockId> {
        self.nodes.get(id).and_then(|c| c.first_child)
    }

    #[inline]
    pub fn next_sibling(&self, id: ClockId) -> Option<ClockId> {
        self.nodes.get(id).and_then(|c| c.next_sibling)
    }

    /// Direct children in order.
    pub fn children(&self, id: ClockId) -> Vec<ClockId> {
        let mut out = Vec::new();
        let mut next = self.first_child(id);
        while let Some(child) = next {
            out.push(child);
            next = self.next_sibling(child);
        }
        out
    }

    /// Clocks with no parent.
    pub fn roots(&self) -> Vec<ClockId> {
        self.nodes
            .iter()
            .filter(|(_, c)| c.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn prefix(&self, root: ClockId, include_root: bool) -> PrefixIter<'_> {
        PrefixIter::new(self, PrefixSubtree::new(root, include_root))
    }

    pub fn postfix(&self, root: ClockId, include_root: bool) -> PostfixIter<'_> {
        PostfixIter::new(self, PostfixSubtree::new(root, include_root))
    }

    /// Add a detached clock for `timeline` with the given timing.
    pub fn insert(
        &mut self,
        timeline: TimelineId,
        timing: Timing,
        natural_duration: Option<f64>,
    ) -> ClockId {
        self.nodes
            .insert(Clock::new(timeline, timing, natural_duration))
    }

    /// Append a detached `child` as the last child of `parent`.
    ///
    /// Refused if either id is unknown, `child` is already attached, or
    /// `child` is `parent` or one of its ancestors.
    pub fn attach(&mut self, parent: ClockId, child: ClockId) -> bool {
        if !self.nodes.contains_key(parent) || self.parent(child).is_some() {
            return false;
        }
        if !self.nodes.contains_key(child) {
            return false;
        }
        let mut ancestor = Some(parent);
        while let Some(a) = ancestor {
            if a == child {
                return false;
            }
            ancestor = self.parent(a);
        }

        match self.first_child(parent) {
            None => {
                if let Some(p) = self.nodes.get_mut(parent) {
                    p.first_child = Some(child);
                }
            }
            Some(first) => {
                let mut last = first;
                while let Some(next) = self.next_sibling(last) {
                    last = next;
                }
                if let Some(l) = self.nodes.get_mut(last) {
                    l.next_sibling = Some(child);
                }
            }
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.next_sibling = None;
        }
        true
    }

    /// Unlink `child` (and its subtree) from its parent. The subtree stays in
    /// the arena as a new root.
    pub fn detach(&mut self, child: ClockId) -> bool {
        let Some(parent) = self.parent(child) else {
            return false;
        };
        let after = self.next_sibling(child);
        if self.first_child(parent) == Some(child) {
            if let Some(p) = self.nodes.get_mut(parent) {
                p.first_child = after;
            }
        } else {
            let mut prev = self.first_child(parent);
            while let Some(node) = prev {
                if self.next_sibling(node) == Some(child) {
                    if let Some(n) = self.nodes.get_mut(node) {
                        n.next_sibling = after;
                    }
                    break;
                }
                prev = self.next_sibling(node);
            }
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
            c.next_sibling = None;
        }
        true
    }

    /// Detach `root` and free its whole subtree, children before parents.
    /// Returns the number of clocks removed.
    pub fn remove(&mut self, root: ClockId) -> usize {
        if !self.nodes.contains_key(root) {
            return 0;
        }
        self.detach(root);
        let doomed: Vec<ClockId> = self.postfix(root, true).collect();
        for id in &doomed {
            self.nodes.remove(*id);
        }
        log::debug!("clock subtree removed: {} clock(s)", doomed.len());
        doomed.len()
    }

    /// Build a clock subtree mirroring the timeline subtree at `root`.
    ///
    /// Returns `None` if `root` is not in `timelines`.
    pub fn realize(
        &mut self,
        timelines: &TimelineTree,
        root: TimelineId,
        cfg: &Config,
    ) -> Option<ClockId> {
        timelines.get(root)?;
        let mut walker =
            TimelineWalker::with_capacity(root, true, cfg.walker_stack_capacity);
        // Clock created at each depth of the current walk path.
        let mut path: Vec<ClockId> = Vec::with_capacity(cfg.walker_stack_capacity);
        let mut root_clock = None;
        let mut created = 0usize;

        while walker.move_next(timelines) {
            let Some(timeline_id) = walker.current() else {
                break;
            };
            let Some(timeline) = timelines.get(timeline_id) else {
                walker.skip_subtree();
                continue;
            };
            let natural =
                timelines.natural_duration(timeline_id, cfg.default_animation_duration);
            let clock = self.insert(timeline_id, timeline.timing, natural);
            created += 1;
            if let TimelineKind::Animation(anim) = &timeline.kind {
                if let Some(c) = self.nodes.get_mut(clock) {
                    c.animation = Some(anim.clone());
                }
            }

            path.truncate(walker.depth() - 1);
            match path.last() {
                Some(parent) => {
                    self.attach(*parent, clock);
                }
                None => root_clock = Some(clock),
            }
            path.push(clock);
        }

        log::debug!("realized clock tree with {created} clock(s)");
        root_clock
    }

    /// Start a root clock at global time `at`.
    pub fn begin(&mut self, root: ClockId, at: f64) -> bool {
        match self.nodes.get_mut(root) {
            Some(c) if c.parent.is_none() => {
                c.start_time = Some(at);
                true
            }
            _ => false,
        }
    }

    /// Stop a root clock; its subtree goes Stopped on the next tick.
    pub fn stop(&mut self, root: ClockId) -> bool {
        match self.nodes.get_mut(root) {
            Some(c) if c.parent.is_none() => {
                c.start_time = None;
                true
            }
            _ => false,
        }
    }

    /// Remember that `clock` animates `target`.
    pub(crate) fn add_target(&mut self, clock: ClockId, target: AnimatableId) -> bool {
        match self.nodes.get_mut(clock) {
            Some(c) => {
                c.targets.push_unique(target);
                true
            }
            None => false,
        }
    }

    /// Advance every clock under `root` to `global_time`.
    ///
    /// Returns, in prefix order, the clocks that are not Stopped or that
    /// became Stopped on this tick.
    pub fn tick(&mut self, root: ClockId, global_time: f64) -> Vec<ClockId> {
        let mut touched = Vec::new();
        let mut walk = PrefixSubtree::new(root, true);

        while walk.move_next(self) {
            let Some(id) = walk.current() else {
                break;
            };
            let parent_time = if id == root {
                self.nodes
                    .get(id)
                    .and_then(|c| c.start_time)
                    .map(|start| global_time - start)
            } else {
                self.parent(id)
                    .and_then(|p| self.nodes.get(p))
                    .and_then(|p| p.sample.current_time)
            };

            let Some(clock) = self.nodes.get_mut(id) else {
                break;
            };
            clock.previous_state = clock.sample.state;
            clock.sample = tick::sample(&clock.timing, clock.natural_duration, parent_time);
            let stopped = clock.sample.state == ClockState::Stopped;
            if !stopped || clock.previous_state != ClockState::Stopped {
                touched.push(id);
            }

            if stopped {
                self.stop_descendants(id, &mut touched);
                walk.skip_subtree();
            }
        }
        touched
    }

    fn stop_descendants(&mut self, id: ClockId, touched: &mut Vec<ClockId>) {
        let mut walk = PrefixSubtree::new(id, false);
        while walk.move_next(self) {
            let Some(child) = walk.current() else {
                break;
            };
            let Some(clock) = self.nodes.get_mut(child) else {
                break;
            };
            clock.previous_state = clock.sample.state;
            clock.sample = ClockSample::STOPPED;
            if clock.previous_state != ClockState::Stopped {
                touched.push(child);
            } else {
                // Already-stopped subtrees stay stopped below.
                walk.skip_subtree();
            }
        }
    }
}
