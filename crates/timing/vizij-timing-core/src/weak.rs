//! Weak handle lists that compact themselves while being walked.
//!
//! Clocks remember the instances they animate without owning them. An instance
//! can go away at any time; rather than unregistering eagerly, dead slots are
//! dropped the next time the list is walked anyway.
//!
//! [`WeakHandleEnumerator`] walks the list from index 0 keeping two cursors:
//! live slots found at the read cursor are moved down to the write cursor, so
//! `[0, write)` is always the compacted live prefix and `[write, read)` is
//! garbage. The garbage range is removed when the walk is exhausted or when
//! the enumerator is dropped early (or [`finish`](WeakHandleEnumerator::finish)ed).

use std::rc;
use std::sync;

use slotmap::{Key, SlotMap};

/// A non-owning reference whose referent may disappear at any time.
///
/// `Context` is whatever owns the referents; `upgrade` returns `None` once the
/// referent is gone.
pub trait WeakHandle {
    type Strong;
    type Context: ?Sized;

    fn upgrade(&self, cx: &Self::Context) -> Option<Self::Strong>;
}

impl<T> WeakHandle for rc::Weak<T> {
    type Strong = rc::Rc<T>;
    type Context = ();

    #[inline]
    fn upgrade(&self, _: &()) -> Option<rc::Rc<T>> {
        rc::Weak::upgrade(self)
    }
}

impl<T> WeakHandle for sync::Weak<T> {
    type Strong = sync::Arc<T>;
    type Context = ();

    #[inline]
    fn upgrade(&self, _: &()) -> Option<sync::Arc<T>> {
        sync::Weak::upgrade(self)
    }
}

/// Resolve a generational key against the arena that owns its slot.
pub trait ArenaLiveness<K: Key> {
    fn is_live(&self, key: K) -> bool;
}

impl<K: Key, V> ArenaLiveness<K> for SlotMap<K, V> {
    #[inline]
    fn is_live(&self, key: K) -> bool {
        self.contains_key(key)
    }
}

// Arena keys are weak by construction: a removed slot's key never resolves
// again, even after the slot is reused.
macro_rules! arena_weak_handle {
    ($($key:ty),* $(,)?) => {
        $(
            impl WeakHandle for $key {
                type Strong = $key;
                type Context = dyn ArenaLiveness<$key>;

                #[inline]
                fn upgrade(&self, cx: &dyn ArenaLiveness<$key>) -> Option<$key> {
                    cx.is_live(*self).then_some(*self)
                }
            }
        )*
    };
}

arena_weak_handle!(
    crate::ids::AnimatableId,
    crate::ids::ClockId,
    crate::ids::TimelineId,
);

/// Single-pass, forward-only walk over a weak list that drops dead slots.
pub struct WeakHandleEnumerator<'a, H: WeakHandle> {
    list: &'a mut Vec<H>,
    cx: &'a H::Context,
    read: usize,
    write: usize,
    current: Option<H::Strong>,
    flushed: bool,
}

impl<'a, H: WeakHandle> WeakHandleEnumerator<'a, H> {
    pub fn new(list: &'a mut Vec<H>, cx: &'a H::Context) -> Self {
        Self {
            list,
            cx,
            read: 0,
            write: 0,
            current: None,
            flushed: false,
        }
    }

    /// Advance to the next live referent. Returns false once the list is exhausted.
    pub fn move_next(&mut self) -> bool {
        while self.read < self.list.len() {
            let read = self.read;
            self.read += 1;
            if let Some(strong) = self.list[read].upgrade(self.cx) {
                if read != self.write {
                    self.list.swap(self.write, read);
                }
                self.write += 1;
                self.current = Some(strong);
                return true;
            }
        }
        self.current = None;
        self.flush();
        false
    }

    /// The referent found by the last successful `move_next`.
    #[inline]
    pub fn current(&self) -> Option<&H::Strong> {
        self.current.as_ref()
    }

    /// Stop early and remove the dead slots seen so far.
    pub fn finish(mut self) {
        self.flush();
    }

    fn flush(&mut self) {
        if self.flushed {
            return;
        }
        self.flushed = true;
        if self.read != self.write {
            let removed = self.read - self.write;
            self.list.drain(self.write..self.read);
            self.read = self.write;
            log::trace!("weak list compacted: {removed} dead slot(s) removed");
        }
    }
}

impl<H: WeakHandle> Iterator for WeakHandleEnumerator<'_, H>
where
    H::Strong: Clone,
{
    type Item = H::Strong;

    fn next(&mut self) -> Option<H::Strong> {
        if self.move_next() {
            self.current.clone()
        } else {
            None
        }
    }
}

impl<H: WeakHandle> Drop for WeakHandleEnumerator<'_, H> {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Append-only list of weak handles, compacted lazily during walks.
#[derive(Debug, Clone)]
pub struct WeakList<H> {
    slots: Vec<H>,
}

impl<H> Default for WeakList<H> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<H: WeakHandle> WeakList<H> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, handle: H) {
        self.slots.push(handle);
    }

    /// Number of slots, dead ones included until the next walk.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn slots(&self) -> &[H] {
        &self.slots
    }

    /// Walk live referents, compacting as we go.
    pub fn enumerate<'a>(&'a mut self, cx: &'a H::Context) -> WeakHandleEnumerator<'a, H> {
        WeakHandleEnumerator::new(&mut self.slots, cx)
    }

    /// Collect live referents, leaving the list fully compacted.
    pub fn live(&mut self, cx: &H::Context) -> Vec<H::Strong> {
        let mut out = Vec::with_capacity(self.slots.len());
        let mut walk = WeakHandleEnumerator::new(&mut self.slots, cx);
        while walk.move_next() {
            if let Some(strong) = walk.current.take() {
                out.push(strong);
            }
        }
        out
    }
}

impl<H: WeakHandle + PartialEq> WeakList<H> {
    /// Push unless an equal handle is already present.
    pub fn push_unique(&mut self, handle: H) {
        if !self.slots.contains(&handle) {
            self.slots.push(handle);
        }
    }
}
