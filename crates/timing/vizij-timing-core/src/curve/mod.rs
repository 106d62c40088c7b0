//! Progress reshaping: easing curves and key splines.

pub mod ease;
pub mod key_spline;

use serde::{Deserialize, Serialize};

pub use ease::{EasingFunction, EasingMode};
pub use key_spline::{KeySpline, Point};

/// How an animation reshapes its clock's linear progress.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Easing {
    #[default]
    None,
    Function {
        function: EasingFunction,
        #[serde(default)]
        mode: EasingMode,
    },
    Spline(KeySpline),
}

impl Easing {
    pub fn function(function: EasingFunction, mode: EasingMode) -> Self {
        Easing::Function { function, mode }
    }

    /// Apply the easing to progress in [0, 1].
    #[inline]
    pub fn apply(&self, progress: f64) -> f64 {
        match self {
            Easing::None => progress,
            Easing::Function { function, mode } => function.ease(progress, *mode),
            Easing::Spline(spline) => spline.get_spline_progress(progress),
        }
    }
}
