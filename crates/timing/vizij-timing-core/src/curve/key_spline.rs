//! Key splines: cubic Bezier remapping of linear progress.
//!
//! The curve runs from (0,0) to (1,1) with two authored control points. Both
//! control points have x in [0, 1], so X(t) is monotonic and can be inverted
//! by a bracketed Newton-Raphson search; Y(t) need not be monotonic.

use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TimingError;

/// Bracket width at which the search stops.
const FUZZ: f64 = 0.000_001;
/// Stop once |X(t) - x| < ACCURACY * |dX/dt|. The dY/dt factor (at most 3) is
/// deliberately left out; tightening this changes visible timing.
const ACCURACY: f64 = 0.001;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Cached Bezier coefficients derived from the control points.
#[derive(Copy, Clone, Debug)]
enum Coefficients {
    /// Control points (0,0) and (1,1): the spline is the identity map.
    Identity,
    Cubic {
        bx: f64,
        cx: f64,
        cx_bx: f64,
        three_cx: f64,
        by: f64,
        cy: f64,
    },
}

/// A cubic Bezier progress curve.
///
/// Coefficients are rebuilt lazily on the first evaluation after a control
/// point changes. Solving keeps no other state, so a spline can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct KeySpline {
    control_point1: Point,
    control_point2: Point,
    coefficients: OnceLock<Coefficients>,
}

impl Default for KeySpline {
    fn default() -> Self {
        Self::from_points_unchecked(Point::new(0.0, 0.0), Point::new(1.0, 1.0))
    }
}

impl PartialEq for KeySpline {
    fn eq(&self, other: &Self) -> bool {
        self.control_point1 == other.control_point1 && self.control_point2 == other.control_point2
    }
}

impl KeySpline {
    /// Build a spline from control points (x1, y1) and (x2, y2).
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, TimingError> {
        Self::from_points(Point::new(x1, y1), Point::new(x2, y2))
    }

    pub fn from_points(control_point1: Point, control_point2: Point) -> Result<Self, TimingError> {
        check_control_point("control_point1", control_point1)?;
        check_control_point("control_point2", control_point2)?;
        Ok(Self::from_points_unchecked(control_point1, control_point2))
    }

    fn from_points_unchecked(control_point1: Point, control_point2: Point) -> Self {
        Self {
            control_point1,
            control_point2,
            coefficients: OnceLock::new(),
        }
    }

    #[inline]
    pub fn control_point1(&self) -> Point {
        self.control_point1
    }

    #[inline]
    pub fn control_point2(&self) -> Point {
        self.control_point2
    }

    pub fn set_control_point1(&mut self, point: Point) -> Result<(), TimingError> {
        check_control_point("control_point1", point)?;
        self.control_point1 = point;
        self.coefficients = OnceLock::new();
        Ok(())
    }

    pub fn set_control_point2(&mut self, point: Point) -> Result<(), TimingError> {
        check_control_point("control_point2", point)?;
        self.control_point2 = point;
        self.coefficients = OnceLock::new();
        Ok(())
    }

    /// True when the control points make this spline the identity map.
    pub fn is_identity(&self) -> bool {
        matches!(self.coefficients(), Coefficients::Identity)
    }

    /// Map linear progress in [0, 1] onto the curve.
    pub fn get_spline_progress(&self, linear_progress: f64) -> f64 {
        match self.coefficients() {
            Coefficients::Identity => linear_progress,
            Coefficients::Cubic { by, cy, .. } => {
                let t = self.solve_parameter(linear_progress);
                bezier_value(by, cy, t)
            }
        }
    }

    /// Find t in [0, 1] with X(t) = `x`. Non-finite input is returned as is.
    pub fn solve_parameter(&self, x: f64) -> f64 {
        let coeffs = self.coefficients();
        if let Coefficients::Identity = coeffs {
            return x;
        }
        if !x.is_finite() || x == 0.0 || x == 1.0 {
            return x;
        }

        let mut bottom = 0.0f64;
        let mut top = 1.0f64;
        // X stays close to the diagonal, so x itself is a good first guess.
        let mut t = x.clamp(0.0, 1.0);

        while top - bottom > FUZZ {
            let (xt, dx) = x_and_dx(&coeffs, t);
            let abs_dx = dx.abs();

            // X is monotonic, so the sign of the error tells which side of t the root is on.
            if xt > x {
                top = t;
            } else {
                bottom = t;
            }

            if (xt - x).abs() < ACCURACY * abs_dx {
                break;
            }

            if abs_dx > FUZZ {
                let next = t - (xt - x) / dx;
                // Newton steps that leave the bracket fall back to bisection.
                t = if next >= top {
                    (t + top) * 0.5
                } else if next <= bottom {
                    (t + bottom) * 0.5
                } else {
                    next
                };
            } else {
                t = (bottom + top) * 0.5;
            }
        }

        t
    }

    /// X component of the curve at parameter `t`.
    pub fn bezier_x(&self, t: f64) -> f64 {
        match self.coefficients() {
            Coefficients::Identity => t,
            coeffs @ Coefficients::Cubic { .. } => x_and_dx(&coeffs, t).0,
        }
    }

    /// Y component of the curve at parameter `t`.
    pub fn bezier_y(&self, t: f64) -> f64 {
        match self.coefficients() {
            Coefficients::Identity => t,
            Coefficients::Cubic { by, cy, .. } => bezier_value(by, cy, t),
        }
    }

    fn coefficients(&self) -> Coefficients {
        *self
            .coefficients
            .get_or_init(|| build(self.control_point1, self.control_point2))
    }
}

fn check_control_point(name: &str, point: Point) -> Result<(), TimingError> {
    if (0.0..=1.0).contains(&point.x) {
        Ok(())
    } else {
        Err(TimingError::InvalidArgument {
            name: format!("{name}.x"),
            value: point.x,
            reason: "key spline control point x must lie in [0, 1]".to_string(),
        })
    }
}

fn build(p1: Point, p2: Point) -> Coefficients {
    if p1 == Point::new(0.0, 0.0) && p2 == Point::new(1.0, 1.0) {
        return Coefficients::Identity;
    }
    // B0 = (0,0) and B3 = (1,1) drop out of the Bernstein form.
    let bx = 3.0 * p1.x;
    let cx = 3.0 * p2.x;
    Coefficients::Cubic {
        bx,
        cx,
        cx_bx: 2.0 * (cx - bx),
        three_cx: 3.0 - cx,
        by: 3.0 * p1.y,
        cy: 3.0 * p2.y,
    }
}

/// b·t·(1-t)² + c·t²·(1-t) + t³
#[inline]
fn bezier_value(b: f64, c: f64, t: f64) -> f64 {
    let s = 1.0 - t;
    let t2 = t * t;
    b * t * s * s + c * t2 * s + t2 * t
}

#[inline]
fn x_and_dx(coeffs: &Coefficients, t: f64) -> (f64, f64) {
    match *coeffs {
        Coefficients::Identity => (t, 1.0),
        Coefficients::Cubic {
            bx,
            cx,
            cx_bx,
            three_cx,
            ..
        } => {
            let s = 1.0 - t;
            let t2 = t * t;
            let s2 = s * s;
            let x = bx * t * s2 + cx * t2 * s + t2 * t;
            let dx = bx * s2 + cx_bx * s * t + three_cx * t2;
            (x, dx)
        }
    }
}

#[derive(Serialize, Deserialize)]
struct KeySplineRepr {
    control_point1: Point,
    control_point2: Point,
}

impl Serialize for KeySpline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        KeySplineRepr {
            control_point1: self.control_point1,
            control_point2: self.control_point2,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KeySpline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = KeySplineRepr::deserialize(deserializer)?;
        KeySpline::from_points(repr.control_point1, repr.control_point2)
            .map_err(serde::de::Error::custom)
    }
}
