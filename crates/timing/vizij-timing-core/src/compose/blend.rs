//! Value blending helpers:
//! - lerp_value (component-wise, quaternion NLERP, step for Bool/Text)
//! - add_value (component-wise, used for `by` animations)
//!
//! Mismatched kinds are fail-soft: the left operand wins.

use crate::value::Value;

#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn lerp_n<const N: usize>(a: [f32; N], b: [f32; N], t: f32) -> [f32; N] {
    std::array::from_fn(|i| lerp_f32(a[i], b[i], t))
}

#[inline]
fn add_n<const N: usize>(a: [f32; N], b: [f32; N]) -> [f32; N] {
    std::array::from_fn(|i| a[i] + b[i])
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
fn normalize4(q: [f32; 4]) -> [f32; 4] {
    let len2 = dot4(q, q);
    if len2 > 0.0 {
        let inv = len2.sqrt().recip();
        [q[0] * inv, q[1] * inv, q[2] * inv, q[3] * inv]
    } else {
        q
    }
}

/// Quaternion NLERP along the shorter arc; result is normalized (x,y,z,w).
#[inline]
pub fn nlerp_quat(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let b = if dot4(a, b) < 0.0 {
        [-b[0], -b[1], -b[2], -b[3]]
    } else {
        b
    };
    normalize4(lerp_n(a, b, t))
}

/// Hamilton product, used to stack rotation offsets.
#[inline]
fn quat_mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    let [ax, ay, az, aw] = a;
    let [bx, by, bz, bw] = b;
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}

/// Interpolate from `a` to `b` at `t` (not clamped; easing may overshoot).
pub fn lerp_value(a: &Value, b: &Value, t: f32) -> Value {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Value::Scalar(lerp_f32(*x, *y, t)),
        (Value::Vec2(x), Value::Vec2(y)) => Value::Vec2(lerp_n(*x, *y, t)),
        (Value::Vec3(x), Value::Vec3(y)) => Value::Vec3(lerp_n(*x, *y, t)),
        (Value::Vec4(x), Value::Vec4(y)) => Value::Vec4(lerp_n(*x, *y, t)),
        (Value::Quat(x), Value::Quat(y)) => Value::Quat(nlerp_quat(*x, *y, t)),
        (Value::Color(x), Value::Color(y)) => Value::Color(lerp_n(*x, *y, t)),
        (
            Value::Transform {
                translation: ta,
                rotation: ra,
                scale: sa,
            },
            Value::Transform {
                translation: tb,
                rotation: rb,
                scale: sb,
            },
        ) => Value::Transform {
            translation: lerp_n(*ta, *tb, t),
            rotation: nlerp_quat(*ra, *rb, t),
            scale: lerp_n(*sa, *sb, t),
        },
        // Discrete kinds hold the start value until the end.
        _ if a.is_discrete() && a.same_kind(b) && t >= 1.0 => b.clone(),
        _ => a.clone(),
    }
}

/// `a + b` per component. Rotations compose; scales multiply. Discrete kinds
/// take `b`.
pub fn add_value(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Value::Scalar(x + y),
        (Value::Vec2(x), Value::Vec2(y)) => Value::Vec2(add_n(*x, *y)),
        (Value::Vec3(x), Value::Vec3(y)) => Value::Vec3(add_n(*x, *y)),
        (Value::Vec4(x), Value::Vec4(y)) => Value::Vec4(add_n(*x, *y)),
        (Value::Quat(x), Value::Quat(y)) => Value::Quat(normalize4(quat_mul(*y, *x))),
        (Value::Color(x), Value::Color(y)) => Value::Color(add_n(*x, *y)),
        (
            Value::Transform {
                translation: ta,
                rotation: ra,
                scale: sa,
            },
            Value::Transform {
                translation: tb,
                rotation: rb,
                scale: sb,
            },
        ) => Value::Transform {
            translation: add_n(*ta, *tb),
            rotation: normalize4(quat_mul(*rb, *ra)),
            scale: std::array::from_fn(|i| sa[i] * sb[i]),
        },
        _ if a.is_discrete() && a.same_kind(b) => b.clone(),
        _ => a.clone(),
    }
}
