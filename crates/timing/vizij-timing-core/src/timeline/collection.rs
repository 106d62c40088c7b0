//! Ordered child sequence of a group timeline, with a structural version stamp.
//!
//! Child order is composition order. Every structural mutation bumps the
//! version; [`TimelineEnumerator`] captures the version when created and fails
//! with `InvalidState` once the two disagree.

use crate::error::TimingError;
use crate::ids::TimelineId;

#[derive(Clone, Debug, Default)]
pub struct TimelineCollection {
    items: Vec<TimelineId>,
    version: u64,
}

impl TimelineCollection {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<TimelineId> {
        self.items.get(index).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[TimelineId] {
        &self.items
    }

    #[inline]
    pub fn contains(&self, id: TimelineId) -> bool {
        self.items.contains(&id)
    }

    pub fn index_of(&self, id: TimelineId) -> Option<usize> {
        self.items.iter().position(|c| *c == id)
    }

    pub fn push(&mut self, id: TimelineId) {
        self.items.push(id);
        self.bump();
    }

    /// Insert at `index` (clamped to the end).
    pub fn insert(&mut self, index: usize, id: TimelineId) {
        let index = index.min(self.items.len());
        self.items.insert(index, id);
        self.bump();
    }

    pub fn remove_at(&mut self, index: usize) -> Option<TimelineId> {
        if index >= self.items.len() {
            return None;
        }
        let id = self.items.remove(index);
        self.bump();
        Some(id)
    }

    /// Remove the first occurrence of `id`.
    pub fn remove(&mut self, id: TimelineId) -> bool {
        match self.index_of(id) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }

    /// Remove every occurrence of `id`.
    pub(crate) fn purge(&mut self, id: TimelineId) -> bool {
        let before = self.items.len();
        self.items.retain(|c| *c != id);
        let changed = self.items.len() != before;
        if changed {
            self.bump();
        }
        changed
    }

    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.bump();
        }
    }

    /// Fail-fast enumerator positioned before the first element.
    pub fn enumerator(&self) -> TimelineEnumerator {
        TimelineEnumerator {
            version: self.version,
            position: Position::BeforeStart,
        }
    }

    #[inline]
    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Position {
    BeforeStart,
    At(usize),
    AfterEnd,
}

/// Cursor over a [`TimelineCollection`] that detects structural mutation.
///
/// The cursor does not borrow the collection, so the collection may be
/// mutated between calls; any call after such a mutation fails.
#[derive(Clone, Debug)]
pub struct TimelineEnumerator {
    version: u64,
    position: Position,
}

impl TimelineEnumerator {
    pub fn move_next(&mut self, collection: &TimelineCollection) -> Result<bool, TimingError> {
        self.check(collection)?;
        let next = match self.position {
            Position::BeforeStart => 0,
            Position::At(i) => i + 1,
            Position::AfterEnd => return Ok(false),
        };
        if next < collection.len() {
            self.position = Position::At(next);
            Ok(true)
        } else {
            self.position = Position::AfterEnd;
            Ok(false)
        }
    }

    pub fn current(&self, collection: &TimelineCollection) -> Result<TimelineId, TimingError> {
        self.check(collection)?;
        match self.position {
            Position::At(i) => collection.get(i).ok_or_else(TimingError::not_positioned),
            _ => Err(TimingError::not_positioned()),
        }
    }

    pub fn reset(&mut self, collection: &TimelineCollection) -> Result<(), TimingError> {
        self.check(collection)?;
        self.position = Position::BeforeStart;
        Ok(())
    }

    #[inline]
    fn check(&self, collection: &TimelineCollection) -> Result<(), TimingError> {
        if self.version == collection.version() {
            Ok(())
        } else {
            Err(TimingError::invalidated())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<TimelineId> {
        let mut arena: SlotMap<TimelineId, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn walks_in_order() {
        let ids = ids(3);
        let mut coll = TimelineCollection::new();
        ids.iter().for_each(|id| coll.push(*id));
        let mut e = coll.enumerator();
        let mut seen = Vec::new();
        while e.move_next(&coll).unwrap() {
            seen.push(e.current(&coll).unwrap());
        }
        assert_eq!(seen, ids);
        assert!(e.current(&coll).is_err());
        assert!(!e.move_next(&coll).unwrap());
    }

    #[test]
    fn reset_restarts() {
        let ids = ids(2);
        let mut coll = TimelineCollection::new();
        ids.iter().for_each(|id| coll.push(*id));
        let mut e = coll.enumerator();
        assert!(e.move_next(&coll).unwrap());
        assert!(e.move_next(&coll).unwrap());
        e.reset(&coll).unwrap();
        assert!(e.current(&coll).is_err());
        assert!(e.move_next(&coll).unwrap());
        assert_eq!(e.current(&coll).unwrap(), ids[0]);
    }

    #[test]
    fn version_tracks_structural_changes_only() {
        let ids = ids(2);
        let mut coll = TimelineCollection::new();
        let v0 = coll.version();
        coll.clear();
        assert_eq!(coll.version(), v0);
        coll.push(ids[0]);
        coll.insert(0, ids[1]);
        assert_eq!(coll.as_slice(), &[ids[1], ids[0]]);
        assert_eq!(coll.version(), v0 + 2);
        assert!(!coll.remove(TimelineId::default()));
        assert_eq!(coll.version(), v0 + 2);
    }
}
