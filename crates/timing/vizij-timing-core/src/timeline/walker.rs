//! Prefix walk over an author timeline tree using explicit stacks.
//!
//! Authored trees can nest thousands of levels deep, so the walk keeps its own
//! node stack plus a parallel stack holding each node's index within its
//! parent's children. Nothing here recurses on tree depth.

use crate::ids::TimelineId;
use crate::timeline::TimelineTree;

#[derive(Clone, Debug)]
pub struct TimelineWalker {
    root: TimelineId,
    include_root: bool,
    skip_subtree: bool,
    started: bool,
    nodes: Vec<TimelineId>,
    indices: Vec<usize>,
}

impl TimelineWalker {
    pub fn new(root: TimelineId, include_root: bool) -> Self {
        Self::with_capacity(root, include_root, 10)
    }

    /// Stacks start at `capacity` entries and grow as needed.
    pub fn with_capacity(root: TimelineId, include_root: bool, capacity: usize) -> Self {
        Self {
            root,
            include_root,
            skip_subtree: false,
            started: false,
            nodes: Vec::with_capacity(capacity),
            indices: Vec::with_capacity(capacity),
        }
    }

    /// Node the walk is positioned on.
    #[inline]
    pub fn current(&self) -> Option<TimelineId> {
        self.nodes.last().copied()
    }

    /// Parent of the current node within this walk (None for the root).
    #[inline]
    pub fn parent(&self) -> Option<TimelineId> {
        let len = self.nodes.len();
        if len >= 2 {
            Some(self.nodes[len - 2])
        } else {
            None
        }
    }

    /// Depth of the current node; the root is at depth 1.
    #[inline]
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    /// Make the next `move_next` bypass the current node's children.
    #[inline]
    pub fn skip_subtree(&mut self) {
        self.skip_subtree = true;
    }

    pub fn reset(&mut self) {
        self.started = false;
        self.skip_subtree = false;
        self.nodes.clear();
        self.indices.clear();
    }

    pub fn move_next(&mut self, tree: &TimelineTree) -> bool {
        if !self.started {
            self.started = true;
            self.nodes.push(self.root);
            self.indices.push(0);
            if !self.include_root {
                return self.move_next(tree);
            }
            return true;
        }

        let Some(&top) = self.nodes.last() else {
            return false;
        };

        let skip = std::mem::take(&mut self.skip_subtree);
        if !skip {
            if let Some(first) = tree.children(top).first() {
                self.nodes.push(*first);
                self.indices.push(0);
                return true;
            }
        }

        // Pop until an ancestor has a next sibling for us.
        self.nodes.pop();
        let mut index = self.indices.pop().unwrap_or(0);
        while let Some(&parent) = self.nodes.last() {
            let siblings = tree.children(parent);
            let next = index + 1;
            if next < siblings.len() {
                self.nodes.push(siblings[next]);
                self.indices.push(next);
                return true;
            }
            self.nodes.pop();
            index = self.indices.pop().unwrap_or(0);
        }
        debug_assert!(self.indices.is_empty());
        false
    }
}

/// Borrowing iterator form of [`TimelineWalker`] for walks that never skip.
pub struct TimelineWalk<'a> {
    tree: &'a TimelineTree,
    walker: TimelineWalker,
}

impl<'a> TimelineWalk<'a> {
    pub(crate) fn new(tree: &'a TimelineTree, walker: TimelineWalker) -> Self {
        Self { tree, walker }
    }
}

impl Iterator for TimelineWalk<'_> {
    type Item = TimelineId;

    fn next(&mut self) -> Option<TimelineId> {
        if self.walker.move_next(self.tree) {
            self.walker.current()
        } else {
            None
        }
    }
}
