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

//! Shared handles to host objects

use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::reflection::{ClassDescriptor, TypeKey};

/// A Rust type that can describe its properties to the metamodel builder
///
/// The description is requested at most once per type by
/// [`ReflectorFactory`](crate::reflection::ReflectorFactory) when caching is enabled.
pub trait Describe: fmt::Debug + Send + Sync + Sized + 'static {
    /// Describe constructors, accessor methods, fields and supertypes
    fn describe() -> ClassDescriptor;
}

/// Object-safe view of a [`Describe`] type
pub trait Reflect: fmt::Debug + Send + Sync + 'static {
    /// Cache key of the concrete type
    fn type_key(&self) -> TypeKey;

    /// Description of the concrete type
    fn descriptor(&self) -> ClassDescriptor;

    /// Upcast for accessor downcasting
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for accessor downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Describe> Reflect for T {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn descriptor(&self) -> ClassDescriptor {
        T::describe()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Shared, interior-mutable handle to a host object
#[derive(Clone)]
pub struct HostObject {
    key: TypeKey,
    inner: Arc<RwLock<Box<dyn Reflect>>>,
}

impl HostObject {
    /// Wrap a value
    pub fn new<T: Describe>(value: T) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            inner: Arc::new(RwLock::new(Box::new(value))),
        }
    }

    /// Wrap an already boxed value (used by default constructors)
    pub fn from_boxed(value: Box<dyn Reflect>) -> Self {
        Self {
            key: value.type_key(),
            inner: Arc::new(RwLock::new(value)),
        }
    }

    /// Cache key of the wrapped type
    pub fn type_key(&self) -> TypeKey {
        self.key
    }

    /// Short name of the wrapped type
    pub fn class_name(&self) -> String {
        let full = self.key.name();
        full.rsplit("::").next().unwrap_or(full).to_string()
    }

    /// Description of the wrapped type
    pub fn descriptor(&self) -> ClassDescriptor {
        self.inner.read().descriptor()
    }

    /// Run `f` with shared access to the wrapped value
    pub fn read<R>(&self, f: impl FnOnce(&dyn Any) -> R) -> R {
        let guard = self.inner.read();
        f(guard.as_any())
    }

    /// Run `f` with exclusive access to the wrapped value
    pub fn write<R>(&self, f: impl FnOnce(&mut dyn Any) -> R) -> R {
        let mut guard = self.inner.write();
        f(guard.as_any_mut())
    }

    /// Clone the wrapped value out if it is a `T`
    pub fn downcast<T: Describe + Clone>(&self) -> Option<T> {
        self.read(|any| any.downcast_ref::<T>().cloned())
    }

    /// Whether both handles point to the same object
    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Some(guard) => write!(f, "{:?}", &**guard),
            None => write!(f, "{}(<locked>)", self.class_name()),
        }
    }
}
