//! Attribute values for eventkeel
//!
//! This module defines [`Value`], the native attribute representation used
//! at the storage boundary. Every stored record is a map of attribute names
//! to `Value`s, and event payloads cross the codec boundary as a `Value`.
//!
//! ## The Eight Types
//!
//! `Null`, `Bool`, `Int`, `Float`, `String`, `Bytes`, `Array`, `Object`.
//!
//! ## Equality Rules
//!
//! - Different types are NEVER equal (no type coercion)
//! - `Int(1)` != `Float(1.0)`
//! - `String("abc")` != `Bytes([97, 98, 99])`
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//!
//! ## JSON Bridge
//!
//! Payload types are converted through `serde_json`. Values that JSON cannot
//! carry natively use single-key wrapper objects:
//! - `{"$bytes": "<base64>"}` for binary data
//! - `{"$f64": "NaN" | "+Inf" | "-Inf" | "-0.0"}` for special floats
//!
//! Integers above `i64::MAX` have no `Int` form and are rejected.

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const BYTES_WRAPPER: &str = "$bytes";
const F64_WRAPPER: &str = "$f64";

/// Attribute value stored in a record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Null / absence of value
    Null,

    /// Boolean true or false
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit IEEE-754 floating point
    Float(f64),

    /// UTF-8 encoded string
    String(String),

    /// Arbitrary binary data
    /// NOT equivalent to String - distinct type
    Bytes(Vec<u8>),

    /// Ordered sequence of values
    Array(Vec<Value>),

    /// String-keyed map of values
    Object(HashMap<String, Value>),
}

impl Value {
    /// Returns the type name as a string (for error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
        }
    }

    /// Build an object from key/value pairs
    pub fn object<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bytes slice
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as object reference
    pub fn as_object(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

/// Kinds of special float values
///
/// These values have no JSON number form and travel inside the `$f64` wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialFloatKind {
    /// IEEE-754 Not-a-Number
    NaN,
    /// IEEE-754 positive infinity (+Inf)
    PositiveInfinity,
    /// IEEE-754 negative infinity (-Inf)
    NegativeInfinity,
    /// IEEE-754 negative zero (-0.0)
    NegativeZero,
}

impl SpecialFloatKind {
    fn of(f: f64) -> Option<Self> {
        if f.is_nan() {
            Some(SpecialFloatKind::NaN)
        } else if f == f64::INFINITY {
            Some(SpecialFloatKind::PositiveInfinity)
        } else if f == f64::NEG_INFINITY {
            Some(SpecialFloatKind::NegativeInfinity)
        } else if f == 0.0 && f.is_sign_negative() {
            Some(SpecialFloatKind::NegativeZero)
        } else {
            None
        }
    }

    /// Convert to wrapper string
    pub fn to_wire_string(&self) -> &'static str {
        match self {
            SpecialFloatKind::NaN => "NaN",
            SpecialFloatKind::PositiveInfinity => "+Inf",
            SpecialFloatKind::NegativeInfinity => "-Inf",
            SpecialFloatKind::NegativeZero => "-0.0",
        }
    }

    /// Parse from wrapper string
    pub fn from_wire_string(s: &str) -> Option<Self> {
        match s {
            "NaN" => Some(SpecialFloatKind::NaN),
            "+Inf" => Some(SpecialFloatKind::PositiveInfinity),
            "-Inf" => Some(SpecialFloatKind::NegativeInfinity),
            "-0.0" => Some(SpecialFloatKind::NegativeZero),
            _ => None,
        }
    }

    /// Convert to f64 value
    pub fn to_f64(&self) -> f64 {
        match self {
            SpecialFloatKind::NaN => f64::NAN,
            SpecialFloatKind::PositiveInfinity => f64::INFINITY,
            SpecialFloatKind::NegativeInfinity => f64::NEG_INFINITY,
            SpecialFloatKind::NegativeZero => -0.0,
        }
    }
}

// ============================================================================
// Custom PartialEq Implementation (IEEE-754 semantics, no type coercion)
// ============================================================================

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

// Eq despite NaN != NaN; conditions compare attribute values with `==`.
impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => {
                // -0.0 == 0.0, so both hash as 0
                if *f == 0.0 {
                    0u64.hash(state);
                } else {
                    f.to_bits().hash(state);
                }
            }
            Value::String(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Array(a) => {
                a.len().hash(state);
                for v in a {
                    v.hash(state);
                }
            }
            Value::Object(o) => {
                let mut entries: Vec<_> = o.iter().collect();
                entries.sort_by_key(|(k, _)| *k);
                entries.len().hash(state);
                for (k, v) in entries {
                    k.hash(state);
                    v.hash(state);
                }
            }
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(o: HashMap<String, Value>) -> Self {
        Value::Object(o)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = serde_json::Error;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => number(&n)?,
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::Array(
                a.into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(o) => {
                if let Some(unwrapped) = unwrap_special(&o) {
                    return Ok(unwrapped);
                }
                Value::Object(
                    o.into_iter()
                        .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
                        .collect::<Result<_, _>>()?,
                )
            }
        })
    }
}

/// Map a JSON number to `Int` when it is an integer in range, else `Float`
///
/// A u64 above `i64::MAX` would only survive as a rounded float, so it is an
/// error instead.
fn number(n: &serde_json::Number) -> Result<Value, serde_json::Error> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Int(i));
    }
    if n.is_u64() {
        return Err(serde::ser::Error::custom(format!(
            "integer {} does not fit in a signed 64-bit Int",
            n
        )));
    }
    n.as_f64()
        .map(Value::Float)
        .ok_or_else(|| serde::ser::Error::custom(format!("number {} is not representable", n)))
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            Value::Float(f) => match SpecialFloatKind::of(f) {
                Some(kind) => wrapper(F64_WRAPPER, kind.to_wire_string().to_string()),
                // of() returned None, so f is finite
                None => serde_json::Number::from_f64(f)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            },
            Value::String(s) => serde_json::Value::String(s),
            Value::Bytes(b) => wrapper(
                BYTES_WRAPPER,
                base64::engine::general_purpose::STANDARD.encode(b),
            ),
            Value::Array(a) => {
                serde_json::Value::Array(a.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(o) => serde_json::Value::Object(
                o.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

fn wrapper(key: &str, body: String) -> serde_json::Value {
    let mut map = serde_json::Map::with_capacity(1);
    map.insert(key.to_string(), serde_json::Value::String(body));
    serde_json::Value::Object(map)
}

/// Recognize a `$bytes` or `$f64` wrapper object
///
/// Malformed wrappers are left as plain objects.
fn unwrap_special(map: &serde_json::Map<String, serde_json::Value>) -> Option<Value> {
    if map.len() != 1 {
        return None;
    }
    let (key, body) = map.iter().next()?;
    let body = body.as_str()?;
    match key.as_str() {
        BYTES_WRAPPER => base64::engine::general_purpose::STANDARD
            .decode(body)
            .ok()
            .map(Value::Bytes),
        F64_WRAPPER => SpecialFloatKind::from_wire_string(body).map(|k| Value::Float(k.to_f64())),
        _ => None,
    }
}

/// Serialize any `Serialize` type into a [`Value`]
///
/// Fails if the type cannot be serialized, or if it holds an unsigned
/// integer above `i64::MAX`.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
    Value::try_from(serde_json::to_value(value)?)
}

/// Deserialize a [`Value`] into any `DeserializeOwned` type
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(serde_json::Value::from(value))
}

// ============================================================================
// Tests
// ============================================================================
