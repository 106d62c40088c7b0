//! From/To/By value animations and the per-layer output seam.

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, ClockState};
use crate::compose::blend::{add_value, lerp_value};
use crate::curve::Easing;
use crate::value::Value;

/// A basic animation between two values.
///
/// | set         | start          | end                  |
/// |-------------|----------------|----------------------|
/// | from + to   | from           | to                   |
/// | from + by   | from           | from + by            |
/// | from        | from           | destination          |
/// | to          | origin         | to                   |
/// | by          | origin         | origin + by          |
/// | (none)      | origin         | destination          |
///
/// `to` wins over `by` when both are set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueAnimation {
    pub from: Option<Value>,
    pub to: Option<Value>,
    pub by: Option<Value>,
    pub easing: Easing,
}

impl ValueAnimation {
    pub fn from_to(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            ..Self::default()
        }
    }

    pub fn to(to: impl Into<Value>) -> Self {
        Self {
            to: Some(to.into()),
            ..Self::default()
        }
    }

    pub fn by(by: impl Into<Value>) -> Self {
        Self {
            by: Some(by.into()),
            ..Self::default()
        }
    }

    pub fn with_from(mut self, from: impl Into<Value>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// True when the end value comes from the supplied destination.
    #[inline]
    pub fn is_destination_default(&self) -> bool {
        self.to.is_none() && self.by.is_none()
    }

    /// Start and end values for the given chain inputs.
    pub fn endpoints(&self, origin: &Value, destination: &Value) -> (Value, Value) {
        let start = self.from.clone().unwrap_or_else(|| origin.clone());
        let end = match (&self.to, &self.by) {
            (Some(to), _) => to.clone(),
            (None, Some(by)) => add_value(&start, by),
            (None, None) => destination.clone(),
        };
        (start, end)
    }

    /// Value at linear `progress`, after easing.
    pub fn value_at(&self, origin: &Value, destination: &Value, progress: f64) -> Value {
        let (start, end) = self.endpoints(origin, destination);
        let eased = self.easing.apply(progress.clamp(0.0, 1.0));
        lerp_value(&start, &end, eased as f32)
    }
}

/// One link of a composition chain as the chain resolver sees it.
pub trait AnimationOutput {
    fn is_stopped(&self) -> bool;

    /// Start value the link declares for itself, if any.
    fn declared_origin(&self) -> Option<&Value>;

    /// True when the link ends at the supplied destination.
    fn is_destination_default(&self) -> bool;

    fn current_value(&self, origin: &Value, destination: &Value) -> Value;
}

/// A [`ValueAnimation`] driven by a clock's current state.
#[derive(Clone, Copy, Debug)]
pub struct AnimationLayer<'a> {
    pub animation: &'a ValueAnimation,
    pub state: ClockState,
    pub progress: f64,
}

impl<'a> AnimationLayer<'a> {
    /// View of a clock; `None` for clocks without an animation (groups).
    pub fn of(clock: &'a Clock) -> Option<Self> {
        Some(Self {
            animation: clock.animation()?,
            state: clock.state(),
            progress: clock.progress(),
        })
    }
}

impl AnimationOutput for AnimationLayer<'_> {
    #[inline]
    fn is_stopped(&self) -> bool {
        self.state == ClockState::Stopped
    }

    #[inline]
    fn declared_origin(&self) -> Option<&Value> {
        self.animation.from.as_ref()
    }

    #[inline]
    fn is_destination_default(&self) -> bool {
        self.animation.is_destination_default()
    }

    fn current_value(&self, origin: &Value, destination: &Value) -> Value {
        self.animation.value_at(origin, destination, self.progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: f32) -> Value {
        Value::Scalar(x)
    }

    #[test]
    fn endpoint_table() {
        let origin = s(1.0);
        let dest = s(10.0);
        let cases = [
            (ValueAnimation::from_to(2.0f32, 4.0f32), (2.0, 4.0)),
            (ValueAnimation::by(3.0f32).with_from(2.0f32), (2.0, 5.0)),
            (
                ValueAnimation {
                    from: Some(s(2.0)),
                    ..Default::default()
                },
                (2.0, 10.0),
            ),
            (ValueAnimation::to(4.0f32), (1.0, 4.0)),
            (ValueAnimation::by(3.0f32), (1.0, 4.0)),
            (ValueAnimation::default(), (1.0, 10.0)),
        ];
        for (anim, (start, end)) in cases {
            assert_eq!(anim.endpoints(&origin, &dest), (s(start), s(end)), "{anim:?}");
        }
    }

    #[test]
    fn destination_default_only_without_to_or_by() {
        assert!(ValueAnimation::default().is_destination_default());
        assert!(ValueAnimation::default().with_from(1.0f32).is_destination_default());
        assert!(!ValueAnimation::to(1.0f32).is_destination_default());
        assert!(!ValueAnimation::by(1.0f32).is_destination_default());
    }

    #[test]
    fn value_at_midpoint() {
        let anim = ValueAnimation::from_to(0.0f32, 10.0f32);
        assert_eq!(anim.value_at(&s(0.0), &s(0.0), 0.5), s(5.0));
    }
}
