//! Property values flowing through composition chains.
//!
//! Each link of a chain reads a `Value` (its origin) and produces one of the
//! same kind. Continuous kinds interpolate per component; `Bool` and `Text`
//! only ever step. A link never converts between kinds: a mismatched pair
//! keeps the incoming value.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Color,
    Transform,
    Bool,
    Text,
}

impl ValueKind {
    /// Kinds that cannot be sampled between endpoints.
    #[inline]
    pub fn is_discrete(self) -> bool {
        matches!(self, ValueKind::Bool | ValueKind::Text)
    }
}

/// Base or animated value of one property.
///
/// Serialized as `{ "type": <kind>, "data": <payload> }`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    Scalar(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Rotation as (x, y, z, w); `By` offsets compose by multiplication.
    Quat([f32; 4]),
    /// Straight RGBA.
    Color([f32; 4]),
    /// TRS; each part blends with its own rule.
    Transform {
        translation: [f32; 3],
        rotation: [f32; 4],
        scale: [f32; 3],
    },
    Bool(bool),
    Text(String),
}

/// A property with no base value starts from scalar zero.
impl Default for Value {
    fn default() -> Self {
        Value::Scalar(0.0)
    }
}

impl Value {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::Quat(_) => ValueKind::Quat,
            Value::Color(_) => ValueKind::Color,
            Value::Transform { .. } => ValueKind::Transform,
            Value::Bool(_) => ValueKind::Bool,
            Value::Text(_) => ValueKind::Text,
        }
    }

    #[inline]
    pub fn same_kind(&self, other: &Value) -> bool {
        self.kind() == other.kind()
    }

    #[inline]
    pub fn is_discrete(&self) -> bool {
        self.kind().is_discrete()
    }

    /// Scalar payload, if this is a scalar.
    #[inline]
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            Value::Scalar(x) => Some(*x),
            _ => None,
        }
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Scalar(x)
    }
}

impl From<[f32; 2]> for Value {
    fn from(v: [f32; 2]) -> Self {
        Value::Vec2(v)
    }
}

impl From<[f32; 3]> for Value {
    fn from(v: [f32; 3]) -> Self {
        Value::Vec3(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_bool_and_text_are_discrete() {
        assert!(Value::from(true).is_discrete());
        assert!(Value::from("idle").is_discrete());
        assert!(!Value::from(1.0f32).is_discrete());
        assert!(!Value::Quat([0.0, 0.0, 0.0, 1.0]).is_discrete());
    }

    #[test]
    fn kind_ignores_payload() {
        assert!(Value::from([1.0f32, 2.0]).same_kind(&Value::Vec2([0.0, 0.0])));
        assert!(!Value::Vec4([0.0; 4]).same_kind(&Value::Color([0.0; 4])));
        assert_eq!(Value::default(), Value::Scalar(0.0));
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_value(Value::Vec3([1.0, 2.0, 3.0])).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Vec3", "data": [1.0, 2.0, 3.0] }));
        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, Value::Vec3([1.0, 2.0, 3.0]));
    }
}
