use approx::assert_abs_diff_eq;
use vizij_timing_core::{
    clock::ClockState,
    compose::{Invalidation, ValueAnimation},
    config::Config,
    engine::Engine,
    ids::{AnimatableId, ClockId, PropertyId, ResourceHandle},
    timeline::{FillBehavior, RepeatBehavior, Timeline, TimelineDuration},
    value::Value,
};

fn approx(a: f32, b: f32) {
    assert_abs_diff_eq!(a, b, epsilon = 1e-5);
}

/// One 2s 0→10 animation realized as a root clock, begun at t=0.
fn single(engine: &mut Engine, fill: FillBehavior) -> ClockId {
    let tl = engine.timelines_mut().insert(
        Timeline::animation("fade", ValueAnimation::from_to(0.0f32, 10.0f32))
            .with_duration(TimelineDuration::Time(2.0))
            .with_fill(fill),
    );
    let clock = engine.realize(tl).unwrap();
    assert!(engine.begin(clock, 0.0));
    clock
}

fn target(engine: &mut Engine, name: &str) -> (AnimatableId, PropertyId) {
    let t = engine.create_animatable(name);
    let p = engine.register_property("opacity");
    (t, p)
}

#[test]
fn whole_object_update_once_per_frame() {
    let mut engine: Engine = Engine::default();
    let clock = single(&mut engine, FillBehavior::HoldEnd);
    let (t, opacity) = target(&mut engine, "box");
    let width = engine.register_property("width");
    engine.add_ref_on_channel(t);
    assert!(engine.apply_animation(t, opacity, clock));
    assert!(engine.apply_animation(t, width, clock));
    assert!(engine.animatable(t).unwrap().update_pending());
    assert_eq!(engine.frame_queue().len(), 1);

    let out = engine.update(1.0);
    assert_eq!(out.changes.len(), 2);
    for change in &out.changes {
        assert_eq!(change.target, t);
        assert_eq!(change.handle, ResourceHandle::NULL);
        approx(change.value.as_scalar().unwrap(), 5.0);
    }
    assert!(!engine.animatable(t).unwrap().update_pending());

    let out = engine.update(1.5);
    approx(out.find(t, opacity).unwrap().value.as_scalar().unwrap(), 7.5);
}

#[test]
fn second_invalidation_in_a_frame_is_coalesced() {
    let mut engine: Engine = Engine::default();
    let clock = single(&mut engine, FillBehavior::HoldEnd);
    let (t, p) = target(&mut engine, "box");
    engine.add_ref_on_channel(t);
    engine.apply_animation(t, p, clock);
    assert_eq!(engine.property_changed(t, p), Invalidation::Coalesced);
    assert_eq!(engine.frame_queue().len(), 1);
}

#[test]
fn off_channel_targets_are_not_pushed() {
    let mut engine: Engine = Engine::default();
    let clock = single(&mut engine, FillBehavior::HoldEnd);
    let (t, p) = target(&mut engine, "hidden");
    engine.apply_animation(t, p, clock);
    assert_eq!(engine.property_changed(t, p), Invalidation::OffChannel);

    assert!(engine.update(1.0).is_empty());
    approx(engine.animated_value(t, p).unwrap().as_scalar().unwrap(), 5.0);
}

#[test]
fn independent_property_refreshes_its_resource() {
    let mut engine: Engine = Engine::default();
    let clock = single(&mut engine, FillBehavior::HoldEnd);
    let (t, p) = target(&mut engine, "box");
    assert!(engine.set_independent(t, p, true));
    assert!(engine.handle_of(t, p).is_null());

    let handles = engine.add_ref_on_channel(t);
    assert_eq!(handles.len(), 1);
    let handle = handles[0].1;
    assert!(!handle.is_null());
    assert_eq!(engine.handle_of(t, p), handle);

    engine.apply_animation(t, p, clock);
    assert_eq!(engine.property_changed(t, p), Invalidation::Resource);
    assert!(!engine.animatable(t).unwrap().update_pending());

    let out = engine.update(1.0);
    assert_eq!(out.changes.len(), 1);
    assert_eq!(out.changes[0].handle, handle);
    assert!(out.changes[0].is_independent());
    approx(out.changes[0].value.as_scalar().unwrap(), 5.0);
    assert!(!engine.animatable(t).unwrap().storage(p).unwrap().needs_refresh());

    assert!(engine.release_on_channel(t));
    assert!(engine.handle_of(t, p).is_null());
    assert_eq!(engine.channel().ref_count((t, p)), 0);
    assert!(!engine.release_on_channel(t));
}

#[test]
fn fill_stop_pushes_base_once_then_goes_quiet() {
    let mut engine: Engine = Engine::default();
    let clock = single(&mut engine, FillBehavior::Stop);
    let (t, p) = target(&mut engine, "box");
    engine.add_ref_on_channel(t);
    engine.set_base_value(t, p, Value::Scalar(42.0));
    engine.apply_animation(t, p, clock);

    engine.update(1.0);
    assert_eq!(engine.clock_state(clock), Some(ClockState::Active));

    let out = engine.update(3.0).clone();
    assert_eq!(engine.clock_state(clock), Some(ClockState::Stopped));
    approx(out.find(t, p).unwrap().value.as_scalar().unwrap(), 42.0);

    assert!(engine.update(4.0).is_empty());
}

#[test]
fn hold_end_fills_at_final_value() {
    let mut engine: Engine = Engine::default();
    let clock = single(&mut engine, FillBehavior::HoldEnd);
    let (t, p) = target(&mut engine, "box");
    engine.apply_animation(t, p, clock);
    engine.update(5.0);
    assert_eq!(engine.clock_state(clock), Some(ClockState::Filling));
    approx(engine.animated_value(t, p).unwrap().as_scalar().unwrap(), 10.0);
}

#[test]
fn stopping_a_root_stops_its_children() {
    let mut engine: Engine = Engine::default();
    let tl = engine.timelines_mut();
    let group = tl.add_group("g");
    let child = tl.insert(
        Timeline::animation("a", ValueAnimation::to(1.0f32))
            .with_repeat(RepeatBehavior::Forever),
    );
    tl.add_child(group, child);
    let root = engine.realize(group).unwrap();
    let child_clock = engine.clocks().first_child(root).unwrap();
    engine.begin(root, 0.0);

    engine.update(0.25);
    assert_eq!(engine.clock_state(child_clock), Some(ClockState::Active));

    assert!(engine.stop(root));
    engine.update(0.5);
    assert_eq!(engine.clock_state(root), Some(ClockState::Stopped));
    assert_eq!(engine.clock_state(child_clock), Some(ClockState::Stopped));
    // Only roots can be started or stopped directly.
    assert!(!engine.begin(child_clock, 0.0));
}

#[test]
fn child_begin_offsets_from_parent_time() {
    let mut engine: Engine = Engine::default();
    let tl = engine.timelines_mut();
    let group = tl.add_group("g");
    let late = tl.insert(
        Timeline::animation("late", ValueAnimation::from_to(0.0f32, 1.0f32))
            .with_begin(Some(1.0))
            .with_duration(TimelineDuration::Time(1.0)),
    );
    tl.add_child(group, late);
    let root = engine.realize(group).unwrap();
    let late_clock = engine.clocks().first_child(root).unwrap();
    engine.begin(root, 10.0);

    engine.update(10.5);
    assert_eq!(engine.clock_state(late_clock), Some(ClockState::Stopped));
    engine.update(11.5);
    assert_eq!(engine.clock_state(late_clock), Some(ClockState::Active));
    let progress = engine.clocks().get(late_clock).unwrap().progress();
    assert_abs_diff_eq!(progress, 0.5, epsilon = 1e-12);
}

#[test]
fn removed_targets_are_compacted_from_clocks() {
    let mut engine: Engine = Engine::default();
    let clock = single(&mut engine, FillBehavior::HoldEnd);
    let (a, p) = target(&mut engine, "a");
    let b = engine.create_animatable("b");
    engine.apply_animation(a, p, clock);
    engine.apply_animation(b, p, clock);
    assert_eq!(engine.clocks().get(clock).unwrap().targets().len(), 2);

    assert!(engine.remove_animatable(a));
    assert!(!engine.remove_animatable(a));
    engine.update(1.0);
    assert_eq!(engine.clocks().get(clock).unwrap().targets(), &[b]);
}

#[test]
fn removing_a_clock_drops_its_layers() {
    let mut engine: Engine = Engine::default();
    let clock = single(&mut engine, FillBehavior::HoldEnd);
    let (t, p) = target(&mut engine, "box");
    engine.set_base_value(t, p, Value::Scalar(3.0));
    engine.apply_animation(t, p, clock);
    engine.update(1.0);

    assert_eq!(engine.remove_clock(clock), 1);
    assert!(engine.animatable(t).unwrap().storage(p).unwrap().layers().is_empty());
    approx(engine.animated_value(t, p).unwrap().as_scalar().unwrap(), 3.0);
    assert_eq!(engine.remove_clock(clock), 0);
}

#[test]
fn unknown_ids_fail_soft() {
    let mut engine: Engine = Engine::default();
    let clock = single(&mut engine, FillBehavior::HoldEnd);
    let (t, p) = target(&mut engine, "box");
    engine.remove_animatable(t);
    assert!(!engine.apply_animation(t, p, clock));
    assert!(!engine.set_base_value(t, p, Value::Scalar(1.0)));
    assert_eq!(engine.property_changed(t, p), Invalidation::Unknown);
    assert!(engine.add_ref_on_channel(t).is_empty());
    assert!(engine.animated_value(t, p).is_none());
}

#[test]
fn config_from_json_fills_defaults() -> anyhow::Result<()> {
    let cfg = Config::from_json(r#"{ "default_animation_duration": 0.5 }"#)?;
    assert_eq!(cfg.default_animation_duration, 0.5);
    assert_eq!(cfg.walker_stack_capacity, Config::default().walker_stack_capacity);

    let mut engine = Engine::new(cfg);
    let tl = engine
        .timelines_mut()
        .add_animation("auto", ValueAnimation::from_to(0.0f32, 1.0f32));
    let clock = engine
        .realize(tl)
        .ok_or_else(|| anyhow::anyhow!("timeline not realized"))?;
    assert_eq!(engine.clocks().get(clock).map(|c| c.natural_duration()), Some(Some(0.5)));

    let err = Config::from_json("{ nope").unwrap_err();
    assert_eq!(err.category(), "config");
    Ok(())
}

#[test]
fn engine_can_be_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Engine>();
}
