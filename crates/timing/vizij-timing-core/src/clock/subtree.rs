//! Prefix and postfix walks over a clock subtree.
//!
//! Clocks are linked first-child/next-sibling with parent back-links, so both
//! walks run in constant extra space. The walkers are cursors: they do not
//! borrow the tree between steps, which lets callers update the node they are
//! positioned on.

use crate::clock::ClockTree;
use crate::ids::ClockId;

/// Parents before children, siblings in order.
#[derive(Clone, Debug)]
pub struct PrefixSubtree {
    root: ClockId,
    include_root: bool,
    skip_subtree: bool,
    started: bool,
    current: Option<ClockId>,
}

impl PrefixSubtree {
    pub fn new(root: ClockId, include_root: bool) -> Self {
        Self {
            root,
            include_root,
            skip_subtree: false,
            started: false,
            current: None,
        }
    }

    #[inline]
    pub fn current(&self) -> Option<ClockId> {
        self.current
    }

    /// Make the next `move_next` bypass the current node's children.
    #[inline]
    pub fn skip_subtree(&mut self) {
        self.skip_subtree = true;
    }

    pub fn reset(&mut self) {
        self.started = false;
        self.skip_subtree = false;
        self.current = None;
    }

    pub fn move_next(&mut self, tree: &ClockTree) -> bool {
        let next = if !self.started {
            self.started = true;
            if self.include_root {
                tree.contains(self.root).then_some(self.root)
            } else {
                tree.first_child(self.root)
            }
        } else {
            match self.current {
                None => None,
                Some(node) => {
                    let skip = std::mem::take(&mut self.skip_subtree);
                    match tree.first_child(node) {
                        Some(child) if !skip => Some(child),
                        _ => self.next_after(tree, node),
                    }
                }
            }
        };
        self.current = next;
        next.is_some()
    }

    /// Nearest following sibling of `node` or of one of its ancestors below the root.
    fn next_after(&self, tree: &ClockTree, mut node: ClockId) -> Option<ClockId> {
        loop {
            if node == self.root {
                return None;
            }
            if let Some(sibling) = tree.next_sibling(node) {
                return Some(sibling);
            }
            // A missing parent means the subtree was detached under us.
            node = tree.parent(node)?;
        }
    }
}

/// Children before parents: leftmost leaf first, root last.
#[derive(Clone, Debug)]
pub struct PostfixSubtree {
    root: ClockId,
    include_root: bool,
    started: bool,
    current: Option<ClockId>,
}

impl PostfixSubtree {
    pub fn new(root: ClockId, include_root: bool) -> Self {
        Self {
            root,
            include_root,
            started: false,
            current: None,
        }
    }

    #[inline]
    pub fn current(&self) -> Option<ClockId> {
        self.current
    }

    pub fn reset(&mut self) {
        self.started = false;
        self.current = None;
    }

    pub fn move_next(&mut self, tree: &ClockTree) -> bool {
        let next = if !self.started {
            self.started = true;
            if !tree.contains(self.root) {
                None
            } else if let Some(child) = tree.first_child(self.root) {
                Some(leftmost_leaf(tree, child))
            } else if self.include_root {
                Some(self.root)
            } else {
                None
            }
        } else {
            match self.current {
                None => None,
                Some(node) if node == self.root => None,
                Some(node) => {
                    if let Some(sibling) = tree.next_sibling(node) {
                        Some(leftmost_leaf(tree, sibling))
                    } else {
                        match tree.parent(node) {
                            Some(parent) if parent == self.root => {
                                self.include_root.then_some(self.root)
                            }
                            // Every child below the root was reached from a
                            // visited descendant, so its parent is a group.
                            Some(parent) => {
                                debug_assert!(tree.first_child(parent).is_some());
                                Some(parent)
                            }
                            None => None,
                        }
                    }
                }
            }
        };
        self.current = next;
        next.is_some()
    }
}

fn leftmost_leaf(tree: &ClockTree, mut node: ClockId) -> ClockId {
    while let Some(child) = tree.first_child(node) {
        node = child;
    }
    node
}

/// Borrowing iterator over a prefix walk.
pub struct PrefixIter<'a> {
    tree: &'a ClockTree,
    walk: PrefixSubtree,
}

impl<'a> PrefixIter<'a> {
    pub(crate) fn new(tree: &'a ClockTree, walk: PrefixSubtree) -> Self {
        Self { tree, walk }
    }
}

impl Iterator for PrefixIter<'_> {
    type Item = ClockId;

    fn next(&mut self) -> Option<ClockId> {
        if self.walk.move_next(self.tree) {
            self.walk.current()
        } else {
            None
        }
    }
}

/// Borrowing iterator over a postfix walk.
pub struct PostfixIter<'a> {
    tree: &'a ClockTree,
    walk: PostfixSubtree,
}

impl<'a> PostfixIter<'a> {
    pub(crate) fn new(tree: &'a ClockTree, walk: PostfixSubtree) -> Self {
        Self { tree, walk }
    }
}

impl Iterator for PostfixIter<'_> {
    type Item = ClockId;

    fn next(&mut self) -> Option<ClockId> {
        if self.walk.move_next(self.tree) {
            self.walk.current()
        } else {
            None
        }
    }
}
