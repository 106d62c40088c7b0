//! Easing curves built on a single ease-in primitive per curve.
//!
//! Each [`EasingFunction`] only knows its ease-in shape (`ease_in_core`);
//! [`EasingMode`] derives ease-out and ease-in-out from it:
//! - EaseIn:    f(t)
//! - EaseOut:   1 - f(1 - t)
//! - EaseInOut: f(2t) / 2 below 0.5, (1 - f(2(1 - t))) / 2 + 0.5 from 0.5 on
//!
//! Any core with f(0) = 0 and f(1) = 1 is therefore continuous at t = 0.5.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Values closer than this are treated as equal when guarding singular formulas.
const ZERO_EPSILON: f64 = 2.220_446_049_250_313e-15;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EasingMode {
    EaseIn,
    EaseOut,
    /// Also used for unrecognised mode names in serialized documents.
    #[default]
    #[serde(other)]
    EaseInOut,
}

/// Closed set of curve shapes. Parameters mirror the usual easing vocabulary.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EasingFunction {
    /// Retracts slightly before moving along the path.
    Back { amplitude: f64 },
    /// Decaying bounces towards the end value.
    Bounce { bounces: u32, bounciness: f64 },
    /// Circular arc.
    Circle,
    Cubic,
    /// Spring oscillation settling at the end value.
    Elastic { oscillations: u32, springiness: f64 },
    /// (e^(k·t) - 1) / (e^k - 1).
    Exponential { exponent: f64 },
    /// t^power
    Power { power: f64 },
    Quadratic,
    Quartic,
    Quintic,
    Sine,
}

impl EasingFunction {
    pub const BACK: EasingFunction = EasingFunction::Back { amplitude: 1.0 };
    pub const BOUNCE: EasingFunction = EasingFunction::Bounce {
        bounces: 3,
        bounciness: 2.0,
    };
    pub const ELASTIC: EasingFunction = EasingFunction::Elastic {
        oscillations: 3,
        springiness: 3.0,
    };
    pub const EXPONENTIAL: EasingFunction = EasingFunction::Exponential { exponent: 2.0 };
    pub const POWER: EasingFunction = EasingFunction::Power { power: 2.0 };

    /// Every curve with its default parameters.
    pub fn all() -> [EasingFunction; 11] {
        [
            Self::BACK,
            Self::BOUNCE,
            EasingFunction::Circle,
            EasingFunction::Cubic,
            Self::ELASTIC,
            Self::EXPONENTIAL,
            Self::POWER,
            EasingFunction::Quadratic,
            EasingFunction::Quartic,
            EasingFunction::Quintic,
            EasingFunction::Sine,
        ]
    }

    /// Ease `progress` in [0, 1] under `mode`.
    pub fn ease(&self, progress: f64, mode: EasingMode) -> f64 {
        match mode {
            EasingMode::EaseIn => self.ease_in_core(progress),
            EasingMode::EaseOut => 1.0 - self.ease_in_core(1.0 - progress),
            EasingMode::EaseInOut => {
                if progress < 0.5 {
                    self.ease_in_core(progress * 2.0) * 0.5
                } else {
                    (1.0 - self.ease_in_core((1.0 - progress) * 2.0)) * 0.5 + 0.5
                }
            }
        }
    }

    /// The ease-in shape of this curve.
    pub fn ease_in_core(&self, t: f64) -> f64 {
        match *self {
            EasingFunction::Back { amplitude } => {
                let amp = amplitude.max(0.0);
                t * t * t - t * amp * (PI * t).sin()
            }
            EasingFunction::Bounce {
                bounces,
                bounciness,
            } => bounce_core(t, bounces, bounciness),
            EasingFunction::Circle => {
                let t = t.clamp(0.0, 1.0);
                1.0 - (1.0 - t * t).sqrt()
            }
            EasingFunction::Cubic => t * t * t,
            EasingFunction::Elastic {
                oscillations,
                springiness,
            } => {
                let springiness = springiness.max(0.0);
                let expo = exponential_core(t, springiness);
                expo * ((PI * 2.0 * oscillations as f64 + PI * 0.5) * t).sin()
            }
            EasingFunction::Exponential { exponent } => exponential_core(t, exponent),
            EasingFunction::Power { power } => t.powf(power.max(0.0)),
            EasingFunction::Quadratic => t * t,
            EasingFunction::Quartic => t * t * t * t,
            EasingFunction::Quintic => t * t * t * t * t,
            EasingFunction::Sine => 1.0 - ((1.0 - t) * PI * 0.5).sin(),
        }
    }
}

/// Identity at k = 0 removes the 0/0 singularity.
#[inline]
fn exponential_core(t: f64, k: f64) -> f64 {
    if k.abs() < ZERO_EPSILON {
        t
    } else {
        ((k * t).exp() - 1.0) / (k.exp() - 1.0)
    }
}

/// Bounces are parabolic arcs whose widths shrink geometrically by `bounciness`;
/// the final arc peaks exactly at t = 1.
fn bounce_core(t: f64, bounces: u32, bounciness: f64) -> f64 {
    let bounces = bounces as f64;
    let b = if bounciness <= 1.0 || (bounciness - 1.0).abs() < ZERO_EPSILON {
        1.001
    } else {
        bounciness
    };

    let pow = b.powf(bounces);
    let one_minus_b = 1.0 - b;

    // Total width in units of the final half-arc.
    let sum_of_units = (1.0 - pow) / one_minus_b + pow * 0.5;
    let unit_at_t = t * sum_of_units;

    // Which bounce t falls in.
    let bounce_at_t = (-unit_at_t * one_minus_b + 1.0).ln() / b.ln();
    let start = bounce_at_t.floor();
    let end = start + 1.0;

    let start_time = (1.0 - b.powf(start)) / (one_minus_b * sum_of_units);
    let end_time = (1.0 - b.powf(end)) / (one_minus_b * sum_of_units);

    let mid_time = (start_time + end_time) * 0.5;
    let time_relative_to_peak = t - mid_time;
    let radius = mid_time - start_time;
    let amplitude = (1.0 / b).powf(bounces - start);

    (-amplitude / (radius * radius)) * (time_relative_to_peak - radius) * (time_relative_to_peak + radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_match_core_at_quarter() {
        let f = EasingFunction::Quadratic;
        assert!((f.ease(0.25, EasingMode::EaseIn) - 0.0625).abs() < 1e-12);
        assert!((f.ease(0.25, EasingMode::EaseOut) - (1.0 - 0.5625)).abs() < 1e-12);
        assert!((f.ease(0.25, EasingMode::EaseInOut) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn zero_exponent_is_identity() {
        let f = EasingFunction::Exponential { exponent: 0.0 };
        for t in [0.0, 0.3, 0.7, 1.0] {
            assert_eq!(f.ease_in_core(t), t);
        }
    }

    #[test]
    fn unknown_mode_deserializes_to_ease_in_out() {
        let mode: EasingMode = serde_json::from_str("\"EaseSideways\"").unwrap();
        assert_eq!(mode, EasingMode::EaseInOut);
        assert_eq!(EasingMode::default(), EasingMode::EaseInOut);
    }

    #[test]
    fn bounce_peaks_at_end() {
        let v = EasingFunction::BOUNCE.ease_in_core(1.0);
        assert!((v - 1.0).abs() < 1e-9, "bounce(1) = {v}");
    }
}
