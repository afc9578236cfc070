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

//! Navigation of nested and indexed property paths over dynamic values

use indexmap::IndexMap;
use std::sync::Arc;

use super::error::{ReflectionError, ReflectionResult};
use super::factory::ReflectorFactory;
use super::tokenizer::PropertyTokenizer;
use super::types::TypeDescriptor;
use crate::model::Value;

/// Reads and writes property paths such as `orders[0].customer.name` on a value
///
/// Host objects are accessed through their cached [`Reflector`](super::Reflector),
/// mappings by key and lists by position.
#[derive(Clone)]
pub struct MetaObject {
    object: Value,
    reflectors: Arc<ReflectorFactory>,
}

impl MetaObject {
    /// Wrap `object` for navigation
    pub fn for_object(object: Value, reflectors: Arc<ReflectorFactory>) -> Self {
        Self { object, reflectors }
    }

    /// The wrapped value
    pub fn original_object(&self) -> &Value {
        &self.object
    }

    /// Take the wrapped value back, including changes made to mappings and lists
    pub fn into_inner(self) -> Value {
        self.object
    }

    /// Canonical property name for `name`, ignoring case and optionally underscores
    pub fn find_property(&self, name: &str, use_camel_case_mapping: bool) -> Option<String> {
        let name = if use_camel_case_mapping {
            name.replace('_', "")
        } else {
            name.to_string()
        };
        match &self.object {
            Value::Object(object) => self
                .reflectors
                .find_for_object(object)
                .find_property_name(&name)
                .map(str::to_string),
            Value::Map(_) => Some(name),
            _ => None,
        }
    }

    /// Names readable on the wrapped value
    pub fn getter_names(&self) -> Vec<String> {
        match &self.object {
            Value::Object(object) => self
                .reflectors
                .find_for_object(object)
                .readable_property_names()
                .to_vec(),
            Value::Map(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Names writable on the wrapped value
    pub fn setter_names(&self) -> Vec<String> {
        match &self.object {
            Value::Object(object) => self
                .reflectors
                .find_for_object(object)
                .writable_property_names()
                .to_vec(),
            Value::Map(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `path` can be read
    pub fn has_getter(&self, path: &str) -> bool {
        let prop = PropertyTokenizer::new(path);
        match prop.children() {
            Some(children) => match self.meta_object_for_property(prop.indexed_name()) {
                Ok(child) if child.object.is_null() => self.has_getter_step(prop.name()),
                Ok(child) => child.has_getter(children),
                Err(_) => false,
            },
            None => self.has_getter_step(prop.name()),
        }
    }

    /// Whether `path` can be written
    pub fn has_setter(&self, path: &str) -> bool {
        let prop = PropertyTokenizer::new(path);
        match prop.children() {
            Some(children) => match self.meta_object_for_property(prop.indexed_name()) {
                Ok(child) if child.object.is_null() => self.has_setter_step(prop.name()),
                Ok(child) => child.has_setter(children),
                Err(_) => false,
            },
            None => self.has_setter_step(prop.name()),
        }
    }

    fn has_getter_step(&self, name: &str) -> bool {
        match &self.object {
            Value::Object(object) => self.reflectors.find_for_object(object).has_getter(name),
            Value::Map(map) => map.contains_key(name),
            _ => false,
        }
    }

    fn has_setter_step(&self, name: &str) -> bool {
        match &self.object {
            Value::Object(object) => self.reflectors.find_for_object(object).has_setter(name),
            Value::Map(_) => true,
            _ => false,
        }
    }

    /// Declared type of the value at `path`
    pub fn getter_type(&self, path: &str) -> ReflectionResult<TypeDescriptor> {
        let prop = PropertyTokenizer::new(path);
        if let Some(children) = prop.children() {
            let child = self.meta_object_for_property(prop.indexed_name())?;
            if !child.object.is_null() {
                return child.getter_type(children);
            }
        }
        match &self.object {
            Value::Object(object) => Ok(self
                .reflectors
                .find_for_object(object)
                .getter_type(prop.name())?
                .clone()),
            Value::Map(map) => Ok(map.get(prop.name()).map(type_of).unwrap_or(TypeDescriptor::Any)),
            other => Err(not_readable(prop.name(), other)),
        }
    }

    /// Read the value at `path`; a null intermediate value yields null
    pub fn get_value(&self, path: &str) -> ReflectionResult<Value> {
        let prop = PropertyTokenizer::new(path);
        let Some(children) = prop.children() else {
            return self.get_step(&prop);
        };

        let child = self.meta_object_for_property(prop.indexed_name())?;
        match child.object {
            Value::Null => Ok(Value::Null),
            Value::Object(_) | Value::Map(_) | Value::List(_) => child.get_value(children),
            _ => Err(ReflectionError::TraversalDeadEnd {
                path: path.to_string(),
                property: prop.indexed_name().to_string(),
            }),
        }
    }

    /// Write `value` at `path`, creating intermediate mappings where needed
    pub fn set_value(&mut self, path: &str, value: Value) -> ReflectionResult<()> {
        let prop = PropertyTokenizer::new(path);
        let Some(children) = prop.children() else {
            return self.set_step(&prop, value);
        };

        let mut child = self.meta_object_for_property(prop.indexed_name())?;
        let created = child.object.is_null();
        if created {
            if value.is_null() {
                return Ok(());
            }
            let placeholder = self.instantiate_property_value(path, &prop)?;
            child = MetaObject::for_object(placeholder, Arc::clone(&self.reflectors));
        }

        match child.object {
            Value::Object(_) | Value::Map(_) | Value::List(_) => {}
            _ => {
                return Err(ReflectionError::TraversalDeadEnd {
                    path: path.to_string(),
                    property: prop.indexed_name().to_string(),
                });
            }
        }

        child.set_value(children, value)?;
        // Mappings and lists are held by value, so the updated copy goes back to the parent
        if created || matches!(child.object, Value::Map(_) | Value::List(_)) {
            self.set_step(&PropertyTokenizer::new(prop.indexed_name()), child.into_inner())?;
        }
        Ok(())
    }

    /// Navigator over the value of a single (possibly indexed) step
    pub fn meta_object_for_property(&self, name: &str) -> ReflectionResult<MetaObject> {
        let value = self.get_value(name)?;
        Ok(MetaObject::for_object(value, Arc::clone(&self.reflectors)))
    }

    fn get_step(&self, prop: &PropertyTokenizer) -> ReflectionResult<Value> {
        match prop.index() {
            Some(index) => {
                let collection = self.resolve_collection(prop)?;
                index_into(&collection, index, prop.name())
            }
            None => self.get_property(prop.name()),
        }
    }

    fn set_step(&mut self, prop: &PropertyTokenizer, value: Value) -> ReflectionResult<()> {
        match prop.index() {
            Some(index) => {
                let mut collection = self.resolve_collection(prop)?;
                store_at_index(&mut collection, index, prop.name(), value)?;
                if prop.name().is_empty() {
                    self.object = collection;
                    Ok(())
                } else {
                    self.set_property(prop.name(), collection)
                }
            }
            None => self.set_property(prop.name(), value),
        }
    }

    fn resolve_collection(&self, prop: &PropertyTokenizer) -> ReflectionResult<Value> {
        if prop.name().is_empty() {
            Ok(self.object.clone())
        } else {
            self.get_property(prop.name())
        }
    }

    fn get_property(&self, name: &str) -> ReflectionResult<Value> {
        match &self.object {
            Value::Object(object) => self.reflectors.find_for_object(object).read(object, name),
            Value::Map(map) => Ok(map.get(name).cloned().unwrap_or_default()),
            other => Err(not_readable(name, other)),
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> ReflectionResult<()> {
        match &mut self.object {
            Value::Object(object) => self
                .reflectors
                .find_for_object(object)
                .write(object, name, value),
            Value::Map(map) => {
                map.insert(name.to_string(), value);
                Ok(())
            }
            other => Err(ReflectionError::NoSuchWritableProperty {
                property: name.to_string(),
                class: other.type_name(),
            }),
        }
    }

    fn instantiate_property_value(&self, path: &str, prop: &PropertyTokenizer) -> ReflectionResult<Value> {
        let ty = match &self.object {
            Value::Object(object) => self
                .reflectors
                .find_for_object(object)
                .setter_type(prop.name())?
                .clone(),
            _ => TypeDescriptor::Map,
        };
        match ty {
            TypeDescriptor::Map | TypeDescriptor::Any => Ok(Value::Map(IndexMap::new())),
            TypeDescriptor::List(_) | TypeDescriptor::Array(_) => Ok(Value::List(Vec::new())),
            _ => Err(ReflectionError::TraversalDeadEnd {
                path: path.to_string(),
                property: prop.indexed_name().to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for MetaObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaObject").field("object", &self.object).finish()
    }
}

fn not_readable(name: &str, value: &Value) -> ReflectionError {
    ReflectionError::NoSuchReadableProperty {
        property: name.to_string(),
        class: value.type_name(),
    }
}

fn index_into(collection: &Value, index: &str, name: &str) -> ReflectionResult<Value> {
    match collection {
        Value::Map(map) => Ok(map.get(index).cloned().unwrap_or_default()),
        Value::List(items) => {
            let position = parse_index(index, name)?;
            items.get(position).cloned().ok_or_else(|| invalid_index(index, name))
        }
        _ => Err(invalid_index(index, name)),
    }
}

fn store_at_index(collection: &mut Value, index: &str, name: &str, value: Value) -> ReflectionResult<()> {
    match collection {
        Value::Map(map) => {
            map.insert(index.to_string(), value);
            Ok(())
        }
        Value::List(items) => {
            let position = parse_index(index, name)?;
            let slot = items.get_mut(position).ok_or_else(|| invalid_index(index, name))?;
            *slot = value;
            Ok(())
        }
        _ => Err(invalid_index(index, name)),
    }
}

fn parse_index(index: &str, name: &str) -> ReflectionResult<usize> {
    index.trim().parse::<usize>().map_err(|_| invalid_index(index, name))
}

fn invalid_index(index: &str, name: &str) -> ReflectionError {
    ReflectionError::InvalidIndex {
        index: index.to_string(),
        property: name.to_string(),
    }
}

/// Best-effort declared type of a dynamic value
pub fn type_of(value: &Value) -> TypeDescriptor {
    match value {
        Value::Null => TypeDescriptor::Any,
        Value::Boolean(_) => TypeDescriptor::Boolean,
        Value::Integer(_) => TypeDescriptor::Long,
        Value::Decimal(_) => TypeDescriptor::Decimal,
        Value::String(_) => TypeDescriptor::String,
        Value::List(_) => TypeDescriptor::list(TypeDescriptor::Any),
        Value::Map(_) => TypeDescriptor::Map,
        Value::Object(object) => object.descriptor().type_descriptor(),
    }
}
