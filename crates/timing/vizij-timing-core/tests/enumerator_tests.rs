use std::rc::{Rc, Weak};

use slotmap::SlotMap;
use vizij_timing_core::{
    error::TimingError,
    ids::{AnimatableId, TimelineId},
    timeline::TimelineCollection,
    weak::{ArenaLiveness, WeakHandleEnumerator, WeakList},
};

/// Five slots; the referents of slots 1 and 3 are already gone.
fn five_with_holes() -> (Vec<Rc<&'static str>>, Vec<Weak<&'static str>>) {
    let names = ["a", "b", "c", "d", "e"];
    let strong: Vec<Rc<&'static str>> = names.iter().map(|n| Rc::new(*n)).collect();
    let weak = strong.iter().map(Rc::downgrade).collect();
    let keep = strong
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i != 1 && *i != 3)
        .map(|(_, s)| s)
        .collect();
    (keep, weak)
}

#[test]
fn weak_enumeration_skips_and_compacts_dead_slots() {
    let (_keep, mut list) = five_with_holes();
    let seen: Vec<&str> = WeakHandleEnumerator::new(&mut list, &()).map(|rc| *rc).collect();
    assert_eq!(seen, vec!["a", "c", "e"]);
    assert_eq!(list.len(), 3);
    let order: Vec<&str> = list.iter().map(|w| *w.upgrade().unwrap()).collect();
    assert_eq!(order, vec!["a", "c", "e"]);
}

#[test]
fn abandoned_walk_flushes_on_finish() {
    let (_keep, mut list) = five_with_holes();
    let mut walk = WeakHandleEnumerator::new(&mut list, &());
    assert!(walk.move_next());
    assert!(walk.move_next());
    assert_eq!(**walk.current().unwrap(), "c");
    walk.finish();
    // Slot 1 was seen and dropped; slot 3 was never reached.
    assert_eq!(list.len(), 4);
    assert!(list[2].upgrade().is_none());
    let live = list.iter().filter(|w| w.upgrade().is_some()).count();
    assert_eq!(live, 3);
}

#[test]
fn weak_list_over_arena_keys() {
    let mut arena: SlotMap<AnimatableId, u32> = SlotMap::with_key();
    let keys: Vec<AnimatableId> = (0..5).map(|i| arena.insert(i)).collect();
    let mut list = WeakList::new();
    for k in &keys {
        list.push(*k);
    }
    arena.remove(keys[1]);
    arena.remove(keys[3]);
    // A reused slot must not revive the dead key.
    let reused = arena.insert(99);

    let live = list.live(&arena as &dyn ArenaLiveness<AnimatableId>);
    assert_eq!(live, vec![keys[0], keys[2], keys[4]]);
    assert!(!live.contains(&reused));
    assert_eq!(list.len(), 3);
}

#[test]
fn push_unique_ignores_duplicates() {
    let mut arena: SlotMap<AnimatableId, ()> = SlotMap::with_key();
    let k = arena.insert(());
    let mut list = WeakList::new();
    list.push_unique(k);
    list.push_unique(k);
    assert_eq!(list.len(), 1);
}

fn collection(n: usize) -> (TimelineCollection, Vec<TimelineId>) {
    let mut arena: SlotMap<TimelineId, ()> = SlotMap::with_key();
    let ids: Vec<TimelineId> = (0..n).map(|_| arena.insert(())).collect();
    let mut coll = TimelineCollection::new();
    for id in &ids {
        coll.push(*id);
    }
    (coll, ids)
}

#[test]
fn sequence_enumerator_fails_fast_on_append() {
    let (mut coll, ids) = collection(3);
    let mut e = coll.enumerator();
    assert!(e.move_next(&coll).unwrap());
    assert_eq!(e.current(&coll).unwrap(), ids[0]);

    coll.push(ids[0]);
    let err = e.move_next(&coll).unwrap_err();
    assert_eq!(err.category(), "state");
    assert!(matches!(err, TimingError::InvalidState { .. }));
    assert!(e.current(&coll).is_err());
    assert!(e.reset(&coll).is_err());
}

#[test]
fn sequence_current_outside_range_is_invalid_state() {
    let (coll, _) = collection(1);
    let mut e = coll.enumerator();
    assert!(matches!(
        e.current(&coll),
        Err(TimingError::InvalidState { .. })
    ));
    assert!(e.move_next(&coll).unwrap());
    assert!(!e.move_next(&coll).unwrap());
    assert!(matches!(
        e.current(&coll),
        Err(TimingError::InvalidState { .. })
    ));
    e.reset(&coll).unwrap();
    assert!(e.move_next(&coll).unwrap());
}

#[test]
fn clearing_an_empty_collection_keeps_enumerators_valid() {
    let (mut coll, _) = collection(0);
    let mut e = coll.enumerator();
    coll.clear();
    assert!(!e.move_next(&coll).unwrap());
}
