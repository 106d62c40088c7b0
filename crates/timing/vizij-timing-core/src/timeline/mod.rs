//! Author-time timelines.
//!
//! A timeline describes when and for how long something is active. Group
//! timelines own an ordered child sequence; animation timelines carry the
//! value animation their clocks will drive. Timelines live in a
//! [`TimelineTree`] arena and are referenced by [`TimelineId`].

pub mod collection;
pub mod walker;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::compose::animation::ValueAnimation;
use crate::ids::TimelineId;

pub use collection::{TimelineCollection, TimelineEnumerator};
pub use walker::{TimelineWalk, TimelineWalker};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum TimelineDuration {
    /// Animations use the configured default; groups span their children.
    #[default]
    Automatic,
    Forever,
    /// Seconds.
    Time(f64),
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RepeatBehavior {
    /// Number of iterations (fractional counts stop mid-iteration).
    Count(f64),
    /// Total active time in seconds, regardless of iteration length.
    Duration(f64),
    Forever,
}

impl Default for RepeatBehavior {
    fn default() -> Self {
        RepeatBehavior::Count(1.0)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillBehavior {
    /// Hold the final value once the active period ends.
    #[default]
    HoldEnd,
    /// Stop (and release the property) once the active period ends.
    Stop,
}

/// Timing attributes shared by all timelines. Clocks copy these when realized.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Offset (seconds) from the parent's time; `None` never begins.
    pub begin_time: Option<f64>,
    pub duration: TimelineDuration,
    pub repeat: RepeatBehavior,
    pub auto_reverse: bool,
    pub fill: FillBehavior,
    pub speed_ratio: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            begin_time: Some(0.0),
            duration: TimelineDuration::Automatic,
            repeat: RepeatBehavior::default(),
            auto_reverse: false,
            fill: FillBehavior::HoldEnd,
            speed_ratio: 1.0,
        }
    }
}

impl Timing {
    /// Active period length for a given iteration length (`None` = unbounded).
    pub fn active_duration(&self, natural: Option<f64>) -> Option<f64> {
        let iteration = natural?;
        let cycle = if self.auto_reverse {
            iteration * 2.0
        } else {
            iteration
        };
        match self.repeat {
            RepeatBehavior::Count(count) => Some(cycle * count.max(0.0)),
            RepeatBehavior::Duration(total) => Some(total.max(0.0)),
            RepeatBehavior::Forever => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum TimelineKind {
    Group(TimelineCollection),
    Animation(ValueAnimation),
}

#[derive(Clone, Debug)]
pub struct Timeline {
    pub name: String,
    pub timing: Timing,
    pub kind: TimelineKind,
}

impl Timeline {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timing: Timing::default(),
            kind: TimelineKind::Group(TimelineCollection::new()),
        }
    }

    pub fn animation(name: impl Into<String>, animation: ValueAnimation) -> Self {
        Self {
            name: name.into(),
            timing: Timing::default(),
            kind: TimelineKind::Animation(animation),
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_begin(mut self, begin_time: Option<f64>) -> Self {
        self.timing.begin_time = begin_time;
        self
    }

    pub fn with_duration(mut self, duration: TimelineDuration) -> Self {
        self.timing.duration = duration;
        self
    }

    pub fn with_repeat(mut self, repeat: RepeatBehavior) -> Self {
        self.timing.repeat = repeat;
        self
    }

    pub fn with_auto_reverse(mut self, auto_reverse: bool) -> Self {
        self.timing.auto_reverse = auto_reverse;
        self
    }

    pub fn with_fill(mut self, fill: FillBehavior) -> Self {
        self.timing.fill = fill;
        self
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, TimelineKind::Group(_))
    }

    #[inline]
    pub fn children(&self) -> Option<&TimelineCollection> {
        match &self.kind {
            TimelineKind::Group(children) => Some(children),
            TimelineKind::Animation(_) => None,
        }
    }

    #[inline]
    pub fn animation_data(&self) -> Option<&ValueAnimation> {
        match &self.kind {
            TimelineKind::Animation(anim) => Some(anim),
            TimelineKind::Group(_) => None,
        }
    }
}

/// Arena of author timelines.
#[derive(Default, Debug)]
pub struct TimelineTree {
    nodes: SlotMap<TimelineId, Timeline>,
}

impl TimelineTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, timeline: Timeline) -> TimelineId {
        self.nodes.insert(timeline)
    }

    pub fn add_group(&mut self, name: &str) -> TimelineId {
        self.insert(Timeline::group(name))
    }

    pub fn add_animation(&mut self, name: &str, animation: ValueAnimation) -> TimelineId {
        self.insert(Timeline::animation(name, animation))
    }

    #[inline]
    pub fn get(&self, id: TimelineId) -> Option<&Timeline> {
        self.nodes.get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: TimelineId) -> Option<&mut Timeline> {
        self.nodes.get_mut(id)
    }

    #[inline]
    pub fn contains(&self, id: TimelineId) -> bool {
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

    /// Children of a group; empty for animations and unknown ids.
    #[inline]
    pub fn children(&self, id: TimelineId) -> &[TimelineId] {
        self.nodes
            .get(id)
            .and_then(Timeline::children)
            .map(TimelineCollection::as_slice)
            .unwrap_or(&[])
    }

    pub fn collection(&self, id: TimelineId) -> Option<&TimelineCollection> {
        self.nodes.get(id).and_then(Timeline::children)
    }

    fn collection_mut(&mut self, id: TimelineId) -> Option<&mut TimelineCollection> {
        match &mut self.nodes.get_mut(id)?.kind {
            TimelineKind::Group(children) => Some(children),
            TimelineKind::Animation(_) => None,
        }
    }

    /// Append `child` to the group `parent`. Fails for non-groups, unknown ids
    /// and links that would close a cycle.
    pub fn add_child(&mut self, parent: TimelineId, child: TimelineId) -> bool {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child)
    }

    pub fn insert_child(&mut self, parent: TimelineId, index: usize, child: TimelineId) -> bool {
        if parent == child || !self.nodes.contains_key(child) {
            return false;
        }
        if self.walk(child, false).any(|id| id == parent) {
            return false;
        }
        match self.collection_mut(parent) {
            Some(children) => {
                children.insert(index, child);
                true
            }
            None => false,
        }
    }

    pub fn remove_child(&mut self, parent: TimelineId, child: TimelineId) -> bool {
        self.collection_mut(parent)
            .map(|children| children.remove(child))
            .unwrap_or(false)
    }

    pub fn clear_children(&mut self, parent: TimelineId) {
        if let Some(children) = self.collection_mut(parent) {
            children.clear();
        }
    }

    /// Remove a timeline and drop it from every group that lists it. Its own
    /// children are left in the arena as independent roots.
    pub fn remove(&mut self, id: TimelineId) -> Option<Timeline> {
        let removed = self.nodes.remove(id)?;
        for (_, node) in self.nodes.iter_mut() {
            if let TimelineKind::Group(children) = &mut node.kind {
                children.purge(id);
            }
        }
        Some(removed)
    }

    /// Prefix walk from `root`.
    pub fn walk(&self, root: TimelineId, include_root: bool) -> TimelineWalk<'_> {
        TimelineWalk::new(self, TimelineWalker::new(root, include_root))
    }

    /// Iteration length in seconds (`None` = unbounded).
    ///
    /// Automatic groups span the latest end time among their children; nested
    /// groups are resolved bottom-up without recursion.
    pub fn natural_duration(&self, id: TimelineId, default_animation: f64) -> Option<f64> {
        let order: Vec<TimelineId> = self.walk(id, true).collect();
        let mut resolved: HashMap<TimelineId, Option<f64>> = HashMap::with_capacity(order.len());
        for node_id in order.into_iter().rev() {
            if resolved.contains_key(&node_id) {
                continue;
            }
            let Some(node) = self.nodes.get(node_id) else {
                continue;
            };
            let natural = match node.timing.duration {
                TimelineDuration::Time(d) => Some(d.max(0.0)),
                TimelineDuration::Forever => None,
                TimelineDuration::Automatic => match &node.kind {
                    TimelineKind::Animation(_) => Some(default_animation),
                    TimelineKind::Group(children) => {
                        let mut end = Some(0.0f64);
                        for child in children.as_slice() {
                            let Some(child_node) = self.nodes.get(*child) else {
                                continue;
                            };
                            let Some(begin) = child_node.timing.begin_time else {
                                continue;
                            };
                            let child_natural = resolved.get(child).copied().flatten();
                            let speed = child_node.timing.speed_ratio.max(f64::EPSILON);
                            match child_node.timing.active_duration(child_natural) {
                                Some(active) => {
                                    end = end.map(|e| e.max(begin + active / speed));
                                }
                                None => end = None,
                            }
                        }
                        end
                    }
                },
            };
            resolved.insert(node_id, natural);
        }
        resolved.get(&id).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_that_close_a_cycle_are_refused() {
        let mut tree = TimelineTree::new();
        let a = tree.add_group("a");
        let b = tree.add_group("b");
        let c = tree.add_group("c");
        assert!(tree.add_child(a, b));
        assert!(tree.add_child(b, c));
        assert!(!tree.add_child(b, a));
        assert!(!tree.add_child(c, a));
        assert!(!tree.insert_child(c, 0, b));
        assert_eq!(tree.walk(a, true).count(), 3);
        // Sharing a child between groups is not a cycle.
        assert!(tree.add_child(a, c));
        assert_eq!(tree.walk(a, true).count(), 4);
    }

    #[test]
    fn automatic_group_spans_children() {
        let mut tree = TimelineTree::new();
        let root = tree.add_group("root");
        let a = tree.insert(
            Timeline::animation("a", ValueAnimation::default())
                .with_duration(TimelineDuration::Time(2.0))
                .with_begin(Some(1.0)),
        );
        let b = tree.insert(
            Timeline::animation("b", ValueAnimation::default())
                .with_auto_reverse(true)
                .with_repeat(RepeatBehavior::Count(2.0)),
        );
        tree.add_child(root, a);
        tree.add_child(root, b);
        // a ends at 1 + 2 = 3; b lasts 1s * 2 (reverse) * 2 (count) = 4.
        assert_eq!(tree.natural_duration(root, 1.0), Some(4.0));
        assert_eq!(tree.natural_duration(a, 1.0), Some(2.0));
    }

    #[test]
    fn forever_child_makes_group_unbounded() {
        let mut tree = TimelineTree::new();
        let root = tree.add_group("root");
        let a = tree.insert(
            Timeline::animation("a", ValueAnimation::default()).with_repeat(RepeatBehavior::Forever),
        );
        tree.add_child(root, a);
        assert_eq!(tree.natural_duration(root, 1.0), None);
    }

    #[test]
    fn animations_cannot_hold_children() {
        let mut tree = TimelineTree::new();
        let a = tree.add_animation("a", ValueAnimation::default());
        let b = tree.add_animation("b", ValueAnimation::default());
        assert!(!tree.add_child(a, b));
        assert!(tree.children(a).is_empty());
    }

    #[test]
    fn remove_purges_parent_lists() {
        let mut tree = TimelineTree::new();
        let root = tree.add_group("root");
        let a = tree.add_animation("a", ValueAnimation::default());
        tree.add_child(root, a);
        let version = tree.collection(root).unwrap().version();
        assert!(tree.remove(a).is_some());
        assert!(tree.children(root).is_empty());
        assert!(tree.collection(root).unwrap().version() > version);
    }
}
