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

//! Custom value coders
//!
//! A coder converts host objects of one type into plain values before they
//! leave the engine. Its presence also changes how a parameter object is
//! resolved by the evaluation context: a parameter with a coder is treated as
//! a structured value rather than as a single opaque scalar.

use dashmap::DashMap;
use std::sync::Arc;

use crate::model::{Describe, Value};
use crate::reflection::{ReflectionResult, TypeKey};

/// Conversion of a host value into a plain value
pub trait ValueCoder: Send + Sync {
    /// Encode `value`
    fn encode(&self, value: &Value) -> ReflectionResult<Value>;
}

impl<F> ValueCoder for F
where
    F: Fn(&Value) -> ReflectionResult<Value> + Send + Sync,
{
    fn encode(&self, value: &Value) -> ReflectionResult<Value> {
        self(value)
    }
}

/// Registry of custom coders keyed by host type
///
/// Built-in scalars, lists and mappings never have a custom coder.
#[derive(Default)]
pub struct CoderRegistry {
    coders: DashMap<TypeKey, Arc<dyn ValueCoder>>,
}

impl CoderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `coder` for host type `T`, replacing any previous one
    pub fn register<T: Describe>(&self, coder: impl ValueCoder + 'static) {
        log::debug!("Registering value coder for {}", TypeKey::of::<T>().name());
        self.coders.insert(TypeKey::of::<T>(), Arc::new(coder));
    }

    /// Coder registered for the type of `value`
    pub fn coder_for(&self, value: &Value) -> Option<Arc<dyn ValueCoder>> {
        match value {
            Value::Object(object) => self
                .coders
                .get(&object.type_key())
                .map(|entry| Arc::clone(entry.value())),
            _ => None,
        }
    }

    /// Whether the type of `value` has a custom coder
    pub fn has_coder_for(&self, value: &Value) -> bool {
        match value {
            Value::Object(object) => self.coders.contains_key(&object.type_key()),
            _ => false,
        }
    }

    /// Encode `value` and everything nested inside lists and mappings
    pub fn encode(&self, value: &Value) -> ReflectionResult<Value> {
        match value {
            Value::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| self.encode(item))
                    .collect::<ReflectionResult<_>>()?,
            )),
            Value::Map(map) => Ok(Value::Map(
                map.iter()
                    .map(|(k, v)| self.encode(v).map(|v| (k.clone(), v)))
                    .collect::<ReflectionResult<_>>()?,
            )),
            other => match self.coder_for(other) {
                Some(coder) => coder.encode(other),
                None => Ok(other.clone()),
            },
        }
    }

    /// Number of registered coders
    pub fn len(&self) -> usize {
        self.coders.len()
    }

    /// Check if no coder is registered
    pub fn is_empty(&self) -> bool {
        self.coders.is_empty()
    }
}

impl std::fmt::Debug for CoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<&'static str> = self.coders.iter().map(|entry| entry.key().name()).collect();
        f.debug_struct("CoderRegistry").field("types", &types).finish()
    }
}
