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

//! Accessor handles stored in a property metamodel

use std::any::Any;
use std::fmt;

use super::descriptor::{MethodBody, ReadFn, WriteFn};
use super::error::{ReflectionError, ReflectionResult};
use super::types::TypeDescriptor;
use crate::model::Value;

/// Read or write capability bound to one property
#[derive(Clone)]
pub enum Invoker {
    /// Backed by an accessor method
    Method(MethodInvoker),
    /// Backed directly by a field
    Field(FieldInvoker),
    /// Conflicting accessors; every invocation fails
    Ambiguous(AmbiguousInvoker),
}

impl Invoker {
    /// Read the property from `target`
    pub fn get(&self, target: &dyn Any) -> ReflectionResult<Value> {
        match self {
            Invoker::Method(method) => method.get(target),
            Invoker::Field(field) => field.get(target),
            Invoker::Ambiguous(ambiguous) => Err(ambiguous.error()),
        }
    }

    /// Write the property on `target`
    pub fn set(&self, target: &mut dyn Any, value: Value) -> ReflectionResult<()> {
        match self {
            Invoker::Method(method) => method.set(target, value),
            Invoker::Field(field) => field.set(target, value),
            Invoker::Ambiguous(ambiguous) => Err(ambiguous.error()),
        }
    }

    /// Declared type of the value read or written
    pub fn value_type(&self) -> &TypeDescriptor {
        match self {
            Invoker::Method(method) => &method.value_type,
            Invoker::Field(field) => &field.value_type,
            Invoker::Ambiguous(ambiguous) => &ambiguous.value_type,
        }
    }

    /// Whether invoking this handle always fails
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Invoker::Ambiguous(_))
    }
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invoker::Method(method) => write!(f, "Method({}: {})", method.property, method.value_type),
            Invoker::Field(field) => write!(f, "Field({}: {})", field.property, field.value_type),
            Invoker::Ambiguous(ambiguous) => write!(f, "Ambiguous({})", ambiguous.property),
        }
    }
}

/// Invokes a getter or setter method
#[derive(Clone)]
pub struct MethodInvoker {
    property: String,
    value_type: TypeDescriptor,
    body: MethodBody,
}

impl MethodInvoker {
    pub(crate) fn new(property: &str, value_type: TypeDescriptor, body: MethodBody) -> Self {
        Self {
            property: property.to_string(),
            value_type,
            body,
        }
    }

    fn get(&self, target: &dyn Any) -> ReflectionResult<Value> {
        match &self.body {
            MethodBody::Read(read) => read(target),
            _ => Err(ReflectionError::UnsupportedOperation {
                property: self.property.clone(),
                operation: "read",
            }),
        }
    }

    fn set(&self, target: &mut dyn Any, value: Value) -> ReflectionResult<()> {
        match &self.body {
            MethodBody::Write(write) => write(target, value),
            _ => Err(ReflectionError::UnsupportedOperation {
                property: self.property.clone(),
                operation: "write",
            }),
        }
    }
}

/// Reads or writes a field directly
#[derive(Clone)]
pub struct FieldInvoker {
    property: String,
    value_type: TypeDescriptor,
    read: Option<ReadFn>,
    write: Option<WriteFn>,
}

impl FieldInvoker {
    pub(crate) fn getter(property: &str, value_type: TypeDescriptor, read: ReadFn) -> Self {
        Self {
            property: property.to_string(),
            value_type,
            read: Some(read),
            write: None,
        }
    }

    pub(crate) fn setter(property: &str, value_type: TypeDescriptor, write: WriteFn) -> Self {
        Self {
            property: property.to_string(),
            value_type,
            read: None,
            write: Some(write),
        }
    }

    fn get(&self, target: &dyn Any) -> ReflectionResult<Value> {
        match &self.read {
            Some(read) => read(target),
            None => Err(ReflectionError::UnsupportedOperation {
                property: self.property.clone(),
                operation: "read",
            }),
        }
    }

    fn set(&self, target: &mut dyn Any, value: Value) -> ReflectionResult<()> {
        match &self.write {
            Some(write) => write(target, value),
            None => Err(ReflectionError::UnsupportedOperation {
                property: self.property.clone(),
                operation: "write",
            }),
        }
    }
}

/// Placeholder for a property whose accessors could not be told apart
#[derive(Debug, Clone)]
pub struct AmbiguousInvoker {
    property: String,
    class: String,
    candidates: Vec<String>,
    message: String,
    value_type: TypeDescriptor,
}

impl AmbiguousInvoker {
    pub(crate) fn new(
        property: &str,
        class: &str,
        candidates: Vec<String>,
        message: String,
        value_type: TypeDescriptor,
    ) -> Self {
        Self {
            property: property.to_string(),
            class: class.to_string(),
            candidates,
            message,
            value_type,
        }
    }

    /// Declaration identities of the conflicting accessors
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Error raised on every invocation
    pub fn error(&self) -> ReflectionError {
        ReflectionError::AmbiguousAccessor {
            property: self.property.clone(),
            class: self.class.clone(),
            candidates: self.candidates.clone(),
            message: self.message.clone(),
        }
    }
}
