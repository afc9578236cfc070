// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Core value type flowing through bindings, accessors and expressions

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde_json::Value as JsonValue;
use std::fmt;

use super::object::HostObject;
use crate::reflection::{ReflectionError, ReflectionResult, ReflectorFactory};

/// Dynamic value bound to a name, read from a property or produced by an expression
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Null,

    /// Boolean value
    Boolean(bool),

    /// Integer value (64-bit signed)
    Integer(i64),

    /// Decimal value with arbitrary precision
    Decimal(Decimal),

    /// String value
    String(String),

    /// Ordered list of values
    List(Vec<Value>),

    /// Name/value mapping with insertion order preserved
    Map(IndexMap<String, Value>),

    /// Host object described by a property metamodel
    Object(HostObject),
}

impl Value {
    /// Build a mapping from name/value pairs
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wrap a host object
    pub fn object<T: super::object::Describe>(value: T) -> Self {
        Value::Object(HostObject::new(value))
    }

    /// Check for [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check for [`Value::Map`]
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Get the kind name for this value
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(_) => "boolean".to_string(),
            Value::Integer(_) => "integer".to_string(),
            Value::Decimal(_) => "decimal".to_string(),
            Value::String(_) => "string".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Object(object) => object.class_name(),
        }
    }

    /// Try to view as a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to view as an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to view as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to view as a mapping
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Try to view as a list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness used by conditions: null, false, zero and empty text are false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Decimal(d) => !d.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Convert from JSON; objects become mappings
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => number_to_decimal(&n).map(Value::Decimal).unwrap_or(Value::Null),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON; host objects render through their readable properties
    pub fn to_json(&self, reflectors: &ReflectorFactory) -> ReflectionResult<JsonValue> {
        Ok(match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Integer(i) => JsonValue::from(*i),
            // Decimals keep every digit as a JSON string
            Value::Decimal(d) => {
                rust_decimal::serde::str::serialize(d, serde_json::value::Serializer)
                    .unwrap_or_else(|_| JsonValue::String(d.to_string()))
            }
            Value::String(s) => JsonValue::String(s.clone()),
            Value::List(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| item.to_json(reflectors))
                    .collect::<ReflectionResult<_>>()?,
            ),
            Value::Map(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), v.to_json(reflectors)?);
                }
                JsonValue::Object(out)
            }
            Value::Object(object) => {
                let reflector = reflectors.find_for_object(object);
                let mut out = serde_json::Map::new();
                for name in reflector.readable_property_names() {
                    let value = object.read(|target| reflector.get_value(target, name))?;
                    out.insert(name.clone(), value.to_json(reflectors)?);
                }
                JsonValue::Object(out)
            }
        })
    }
}

/// Parse a JSON number that does not fit `i64` without going through `f64`
fn number_to_decimal(number: &serde_json::Number) -> Option<Decimal> {
    let text = number.to_string();
    Decimal::from_str_exact(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .or_else(|| number.as_f64().and_then(Decimal::from_f64))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Integer(a), Value::Decimal(b)) | (Value::Decimal(b), Value::Integer(a)) => {
                Decimal::from(*a) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Integer(i) => write!(f, "Integer({i})"),
            Value::Decimal(d) => write!(f, "Decimal({d})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map).finish(),
            Value::Object(object) => write!(f, "Object({object:?})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                f.write_str("}")
            }
            Value::Object(object) => write!(f, "{object:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<HostObject> for Value {
    fn from(value: HostObject) -> Self {
        Value::Object(value)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(value: IndexMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

fn mismatch(expected: &str, found: &Value) -> ReflectionError {
    ReflectionError::ValueMismatch {
        expected: expected.to_string(),
        found: found.type_name(),
    }
}

/// Conversion out of a [`Value`] into the Rust type a setter accepts
pub trait FromValue: Sized {
    /// Convert, failing with [`ReflectionError::ValueMismatch`]
    fn from_value(value: Value) -> ReflectionResult<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> ReflectionResult<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> ReflectionResult<Self> {
        value.as_boolean().ok_or_else(|| mismatch("boolean", &value))
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> ReflectionResult<Self> {
        match &value {
            Value::Integer(i) => Ok(*i),
            Value::Decimal(d) if d.fract().is_zero() => {
                d.to_i64().ok_or_else(|| mismatch("long", &value))
            }
            _ => Err(mismatch("long", &value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> ReflectionResult<Self> {
        let wide = i64::from_value(value.clone()).map_err(|_| mismatch("int", &value))?;
        i32::try_from(wide).map_err(|_| mismatch("int", &value))
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> ReflectionResult<Self> {
        match value {
            Value::Decimal(d) => Ok(d),
            Value::Integer(i) => Ok(Decimal::from(i)),
            other => Err(mismatch("decimal", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> ReflectionResult<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for HostObject {
    fn from_value(value: Value) -> ReflectionResult<Self> {
        match value {
            Value::Object(object) => Ok(object),
            other => Err(mismatch("object", &other)),
        }
    }
}

impl FromValue for IndexMap<String, Value> {
    fn from_value(value: Value) -> ReflectionResult<Self> {
        match value {
            Value::Map(map) => Ok(map),
            other => Err(mismatch("map", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> ReflectionResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> ReflectionResult<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch("list", &other)),
        }
    }
}
