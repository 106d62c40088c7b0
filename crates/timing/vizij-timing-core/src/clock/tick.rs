//! Per-clock state from a parent time.
//!
//! A clock's local time is `(parent_time - begin) * speed_ratio`. Within the
//! active period the clock is Active; after it, HoldEnd clocks are Filling at
//! their final position and Stop clocks are Stopped. Auto-reverse folds the
//! second half of each cycle back towards 0.

use crate::timeline::{FillBehavior, Timing};

/// Relative distance from a cycle boundary treated as on it when filling.
const END_SNAP: f64 = 1e-9;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ClockState {
    Active,
    Filling,
    #[default]
    Stopped,
}

/// Result of sampling a clock at one parent time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClockSample {
    pub state: ClockState,
    /// Time within the current iteration; what children see as parent time.
    pub current_time: Option<f64>,
    /// Linear progress in [0, 1] within the current iteration.
    pub progress: f64,
    pub iteration: u32,
}

impl ClockSample {
    pub const STOPPED: ClockSample = ClockSample {
        state: ClockState::Stopped,
        current_time: None,
        progress: 0.0,
        iteration: 0,
    };
}

/// Sample a clock with `timing` and iteration length `natural` at `parent_time`.
pub fn sample(timing: &Timing, natural: Option<f64>, parent_time: Option<f64>) -> ClockSample {
    let (Some(parent_time), Some(begin)) = (parent_time, timing.begin_time) else {
        return ClockSample::STOPPED;
    };
    let speed = if timing.speed_ratio > 0.0 {
        timing.speed_ratio
    } else {
        1.0
    };
    let local = (parent_time - begin) * speed;
    if local < 0.0 {
        return ClockSample::STOPPED;
    }

    match timing.active_duration(natural) {
        Some(active) if local >= active => match timing.fill {
            FillBehavior::Stop => ClockSample::STOPPED,
            FillBehavior::HoldEnd => position(ClockState::Filling, timing, natural, active, true),
        },
        _ => position(ClockState::Active, timing, natural, local, false),
    }
}

fn position(
    state: ClockState,
    timing: &Timing,
    natural: Option<f64>,
    local: f64,
    end_inclusive: bool,
) -> ClockSample {
    let Some(iteration_len) = natural else {
        // Unbounded iterations never progress past their start.
        return ClockSample {
            state,
            current_time: Some(local),
            progress: 0.0,
            iteration: 0,
        };
    };
    if iteration_len <= 0.0 {
        return ClockSample {
            state,
            current_time: Some(0.0),
            progress: if timing.auto_reverse { 0.0 } else { 1.0 },
            iteration: 0,
        };
    }

    let cycle = if timing.auto_reverse {
        iteration_len * 2.0
    } else {
        iteration_len
    };
    let mut cycles = (local / cycle).floor();
    let mut in_cycle = local - cycles * cycle;
    // At the very end of the active period report the end of the last cycle,
    // not the start of a new one. Rounding in `local / cycle` can land on
    // either side of the boundary.
    if end_inclusive && local > 0.0 {
        let snap = END_SNAP * cycle;
        if in_cycle <= snap {
            cycles -= 1.0;
            in_cycle = cycle;
        } else if cycle - in_cycle <= snap {
            in_cycle = cycle;
        }
    }

    let in_cycle = in_cycle.clamp(0.0, cycle);
    let current = if !timing.auto_reverse {
        in_cycle.min(iteration_len)
    } else if in_cycle <= iteration_len {
        in_cycle
    } else {
        cycle - in_cycle
    };
    ClockSample {
        state,
        current_time: Some(current),
        progress: (current / iteration_len).clamp(0.0, 1.0),
        iteration: cycles.max(0.0) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{RepeatBehavior, TimelineDuration};

    fn timing() -> Timing {
        Timing {
            duration: TimelineDuration::Time(2.0),
            ..Timing::default()
        }
    }

    #[test]
    fn before_begin_is_stopped() {
        let t = Timing {
            begin_time: Some(1.0),
            ..timing()
        };
        assert_eq!(sample(&t, Some(2.0), Some(0.5)).state, ClockState::Stopped);
        assert_eq!(sample(&t, Some(2.0), None).state, ClockState::Stopped);
    }

    #[test]
    fn active_then_filling() {
        let t = timing();
        let mid = sample(&t, Some(2.0), Some(0.5));
        assert_eq!(mid.state, ClockState::Active);
        assert!((mid.progress - 0.25).abs() < 1e-12);

        let end = sample(&t, Some(2.0), Some(5.0));
        assert_eq!(end.state, ClockState::Filling);
        assert_eq!(end.progress, 1.0);
    }

    #[test]
    fn fill_stop_releases() {
        let t = Timing {
            fill: FillBehavior::Stop,
            ..timing()
        };
        assert_eq!(sample(&t, Some(2.0), Some(2.0)).state, ClockState::Stopped);
    }

    #[test]
    fn auto_reverse_folds_back() {
        let t = Timing {
            auto_reverse: true,
            repeat: RepeatBehavior::Count(1.0),
            ..timing()
        };
        let s = sample(&t, Some(2.0), Some(3.0));
        assert_eq!(s.state, ClockState::Active);
        assert!((s.progress - 0.5).abs() < 1e-12);
        let end = sample(&t, Some(2.0), Some(10.0));
        assert_eq!(end.state, ClockState::Filling);
        assert!(end.progress.abs() < 1e-12);
    }

    #[test]
    fn repeat_count_reports_iteration() {
        let t = Timing {
            repeat: RepeatBehavior::Count(3.0),
            ..timing()
        };
        let s = sample(&t, Some(2.0), Some(4.5));
        assert_eq!(s.iteration, 2);
        assert!((s.progress - 0.25).abs() < 1e-12);
        let end = sample(&t, Some(2.0), Some(6.0));
        assert_eq!(end.state, ClockState::Filling);
        assert_eq!(end.iteration, 2);
        assert_eq!(end.progress, 1.0);
    }

    #[test]
    fn hold_end_fills_at_end_when_division_rounds_low() {
        let len = 0.333;
        let t = Timing {
            duration: TimelineDuration::Time(len),
            repeat: RepeatBehavior::Count(28.0),
            ..Timing::default()
        };
        let s = sample(&t, Some(len), Some(1e6));
        assert_eq!(s.state, ClockState::Filling);
        assert_eq!(s.progress, 1.0);
        assert_eq!(s.iteration, 27);

        for step in 1..100 {
            let len = 0.013 + step as f64 * 0.02;
            for n in 1..40 {
                let t = Timing {
                    duration: TimelineDuration::Time(len),
                    repeat: RepeatBehavior::Count(n as f64),
                    ..Timing::default()
                };
                let s = sample(&t, Some(len), Some(1e6));
                assert_eq!(s.progress, 1.0, "len={len} count={n}");
            }
        }
    }
}
