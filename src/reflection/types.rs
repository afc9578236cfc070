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

//! Declared types of host properties
//!
//! [`TypeDescriptor`] plays the role of a runtime class token: it is what a
//! getter returns, what a setter accepts and what a field stores. Nominal host
//! types carry their ancestors so that assignability can be decided without a
//! global class registry.

use rustc_hash::FxHashMap;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a Rust type used as a cache key for metamodels
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for the Rust type `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified Rust type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Underlying type id
    pub fn id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

/// A nominal host type together with its direct supertypes
#[derive(Clone)]
pub struct NamedType {
    name: Arc<str>,
    supertypes: Arc<[NamedType]>,
}

impl NamedType {
    /// Create a root type with no supertypes
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            supertypes: Arc::from(Vec::new()),
        }
    }

    /// Add a direct supertype (superclass or interface)
    pub fn extends(mut self, supertype: NamedType) -> Self {
        let mut supertypes = self.supertypes.to_vec();
        if !supertypes.iter().any(|s| s.name == supertype.name) {
            supertypes.push(supertype);
        }
        self.supertypes = Arc::from(supertypes);
        self
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct supertypes
    pub fn supertypes(&self) -> &[NamedType] {
        &self.supertypes
    }

    /// Whether `self` is `other` or one of its transitive supertypes
    pub fn is_ancestor_of(&self, other: &NamedType) -> bool {
        if self.name == other.name {
            return true;
        }
        other.supertypes.iter().any(|s| self.is_ancestor_of(s))
    }
}

impl PartialEq for NamedType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for NamedType {}

impl Hash for NamedType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Declared type of a property, parameter or field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Top type, accepts every value
    Any,
    /// Absence of a value (setter return type)
    Void,
    /// Boolean
    Boolean,
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    Long,
    /// Arbitrary precision decimal
    Decimal,
    /// Text
    String,
    /// Growable list with element type
    List(Box<TypeDescriptor>),
    /// Name/value mapping
    Map,
    /// Fixed array with component type
    Array(Box<TypeDescriptor>),
    /// Nominal host type
    Named(NamedType),
    /// Unresolved generic type parameter
    Var(String),
}

impl TypeDescriptor {
    /// Shorthand for a nominal type
    pub fn named(ty: NamedType) -> Self {
        TypeDescriptor::Named(ty)
    }

    /// Shorthand for a list type
    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(element))
    }

    /// Shorthand for an array type
    pub fn array(component: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(component))
    }

    /// Shorthand for a generic type variable
    pub fn var(name: impl Into<String>) -> Self {
        TypeDescriptor::Var(name.into())
    }

    /// Whether this is a scalar with no reference form as an array component
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Boolean | TypeDescriptor::Integer | TypeDescriptor::Long
        )
    }

    /// Whether a value of type `other` can be stored where `self` is expected
    pub fn is_assignable_from(&self, other: &TypeDescriptor) -> bool {
        use TypeDescriptor::*;
        if self == other {
            return true;
        }
        match (self, other) {
            (_, Void) | (Void, _) => false,
            (Any, _) => true,
            (List(element), List(_)) => **element == Any,
            (Array(a), Array(b)) => !b.is_primitive() && a.is_assignable_from(b),
            (Named(a), Named(b)) => a.is_ancestor_of(b),
            _ => false,
        }
    }

    /// Raw form of the type: every type variable becomes [`TypeDescriptor::Any`]
    pub fn erased(&self) -> TypeDescriptor {
        self.substitute(&FxHashMap::default())
    }

    /// Resolve type variables through `env`; unbound variables erase to `Any`
    pub fn substitute(&self, env: &FxHashMap<String, TypeDescriptor>) -> TypeDescriptor {
        match self {
            TypeDescriptor::Var(name) => env.get(name).cloned().unwrap_or(TypeDescriptor::Any),
            TypeDescriptor::List(element) => TypeDescriptor::List(Box::new(element.substitute(env))),
            TypeDescriptor::Array(component) => {
                TypeDescriptor::Array(Box::new(component.substitute(env)))
            }
            other => other.clone(),
        }
    }

    /// Like [`substitute`](Self::substitute) but leaves unbound variables in place
    pub(crate) fn bind(&self, env: &FxHashMap<String, TypeDescriptor>) -> TypeDescriptor {
        match self {
            TypeDescriptor::Var(name) => env.get(name).cloned().unwrap_or_else(|| self.clone()),
            TypeDescriptor::List(element) => TypeDescriptor::List(Box::new(element.bind(env))),
            TypeDescriptor::Array(component) => TypeDescriptor::Array(Box::new(component.bind(env))),
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Any => f.write_str("Object"),
            TypeDescriptor::Void => f.write_str("void"),
            TypeDescriptor::Boolean => f.write_str("boolean"),
            TypeDescriptor::Integer => f.write_str("int"),
            TypeDescriptor::Long => f.write_str("long"),
            TypeDescriptor::Decimal => f.write_str("Decimal"),
            TypeDescriptor::String => f.write_str("String"),
            TypeDescriptor::List(element) => write!(f, "List<{element}>"),
            TypeDescriptor::Map => f.write_str("Map"),
            TypeDescriptor::Array(component) => write!(f, "{component}[]"),
            TypeDescriptor::Named(ty) => f.write_str(ty.name()),
            TypeDescriptor::Var(name) => f.write_str(name),
        }
    }
}
