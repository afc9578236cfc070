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

//! Registration of host types
//!
//! Rust has no runtime introspection, so every host type hands the metamodel
//! builder a [`ClassDescriptor`]: its constructors, accessor-shaped methods,
//! fields and supertypes, each method or field carrying a type-erased closure
//! that reads or writes the concrete Rust value.

use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::error::{ReflectionError, ReflectionResult};
use super::types::{NamedType, TypeDescriptor};
use crate::model::{Describe, FromValue, Reflect, Value};

/// Type-erased read access to a host value
pub type ReadFn = Arc<dyn Fn(&dyn Any) -> ReflectionResult<Value> + Send + Sync>;

/// Type-erased write access to a host value
pub type WriteFn = Arc<dyn Fn(&mut dyn Any, Value) -> ReflectionResult<()> + Send + Sync>;

/// Type-erased no-argument constructor
pub type ConstructFn = Arc<dyn Fn() -> Box<dyn Reflect> + Send + Sync>;

/// Body of a declared method
#[derive(Clone)]
pub enum MethodBody {
    /// No-argument method returning a value
    Read(ReadFn),
    /// Single-argument method consuming a value
    Write(WriteFn),
    /// Declared for discovery only, not invocable through the metamodel
    Opaque,
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodBody::Read(_) => f.write_str("Read"),
            MethodBody::Write(_) => f.write_str("Write"),
            MethodBody::Opaque => f.write_str("Opaque"),
        }
    }
}

/// A method declared by a host type
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Declared parameter types
    pub params: Vec<TypeDescriptor>,
    /// Declared return type
    pub returns: TypeDescriptor,
    /// Compiler-synthesized forwarding method
    pub bridge: bool,
    /// Invocation body
    pub body: MethodBody,
}

impl MethodDecl {
    /// Raw signature `ret#name:p1,p2` used to collapse overrides
    pub fn signature(&self) -> String {
        let mut signature = format!("{}#{}", self.returns.erased(), self.name);
        for (i, param) in self.params.iter().enumerate() {
            signature.push(if i == 0 { ':' } else { ',' });
            signature.push_str(&param.erased().to_string());
        }
        signature
    }
}

/// Storage-level modifiers of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldModifiers {
    /// Cannot be reassigned
    pub is_final: bool,
    /// Bound at class scope rather than per instance
    pub is_static: bool,
}

/// A field declared by a host type
#[derive(Clone)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared field type
    pub ty: TypeDescriptor,
    /// Storage modifiers
    pub modifiers: FieldModifiers,
    /// Read access
    pub get: ReadFn,
    /// Write access, absent for storage that cannot be assigned
    pub set: Option<WriteFn>,
}

impl fmt::Debug for FieldDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDecl")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("modifiers", &self.modifiers)
            .finish()
    }
}

/// A constructor declared by a host type
#[derive(Clone)]
pub struct ConstructorDecl {
    /// Declared parameter types
    pub params: Vec<TypeDescriptor>,
    /// Body, only present for no-argument constructors
    pub body: Option<ConstructFn>,
}

impl fmt::Debug for ConstructorDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDecl")
            .field("params", &self.params)
            .field("invocable", &self.body.is_some())
            .finish()
    }
}

/// A superclass or interface together with the type arguments it is instantiated with
#[derive(Debug, Clone)]
pub struct Supertype {
    /// Description of the supertype layer
    pub descriptor: ClassDescriptor,
    /// Arguments for the supertype's generic parameters, in declaration order
    pub type_args: Vec<TypeDescriptor>,
}

impl Supertype {
    /// Non-generic supertype
    pub fn new(descriptor: ClassDescriptor) -> Self {
        Self {
            descriptor,
            type_args: Vec::new(),
        }
    }

    /// Generic supertype instantiated with `type_args`
    pub fn generic(descriptor: ClassDescriptor, type_args: Vec<TypeDescriptor>) -> Self {
        Self {
            descriptor,
            type_args,
        }
    }
}

/// Description of one host type layer
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    pub(crate) ty: NamedType,
    pub(crate) type_params: Vec<String>,
    pub(crate) superclass: Option<Box<Supertype>>,
    pub(crate) interfaces: Vec<Supertype>,
    pub(crate) constructors: Vec<ConstructorDecl>,
    pub(crate) methods: Vec<MethodDecl>,
    pub(crate) fields: Vec<FieldDecl>,
    pub(crate) record: bool,
}

impl ClassDescriptor {
    /// Start describing a layer named `name` whose accessors operate on `T`
    ///
    /// Ancestor layers are described with the concrete receiver type too, so
    /// `ClassDescriptor::builder::<Dog>("Animal")` describes the `Animal`
    /// members as seen by a `Dog`.
    pub fn builder<T: Any + Send + Sync>(name: impl AsRef<str>) -> ClassBuilder<T> {
        ClassBuilder {
            descriptor: ClassDescriptor {
                ty: NamedType::new(name),
                type_params: Vec::new(),
                superclass: None,
                interfaces: Vec::new(),
                constructors: Vec::new(),
                methods: Vec::new(),
                fields: Vec::new(),
                record: false,
            },
            _receiver: PhantomData,
        }
    }

    /// Class name
    pub fn name(&self) -> &str {
        self.ty.name()
    }

    /// Nominal type including supertypes
    pub fn named_type(&self) -> &NamedType {
        &self.ty
    }

    /// Type of values of this class
    pub fn type_descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::Named(self.ty.clone())
    }

    /// Declared methods of this layer
    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    /// Declared fields of this layer
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Superclass layer
    pub fn superclass(&self) -> Option<&Supertype> {
        self.superclass.as_deref()
    }
}

fn target_mismatch<T>() -> ReflectionError {
    ReflectionError::TargetMismatch {
        expected: type_name::<T>().to_string(),
        found: "an unrelated receiver".to_string(),
    }
}

fn read_fn<T, V, F>(f: F) -> ReadFn
where
    T: Any,
    V: Into<Value>,
    F: Fn(&T) -> V + Send + Sync + 'static,
{
    Arc::new(move |target: &dyn Any| -> ReflectionResult<Value> {
        let target = target
            .downcast_ref::<T>()
            .ok_or_else(target_mismatch::<T>)?;
        Ok(f(target).into())
    })
}

fn write_fn<T, V, F>(f: F) -> WriteFn
where
    T: Any,
    V: FromValue,
    F: Fn(&mut T, V) + Send + Sync + 'static,
{
    Arc::new(move |target: &mut dyn Any, value: Value| -> ReflectionResult<()> {
        let converted = V::from_value(value)?;
        let target = target
            .downcast_mut::<T>()
            .ok_or_else(target_mismatch::<T>)?;
        f(target, converted);
        Ok(())
    })
}

/// Builder for [`ClassDescriptor`]
pub struct ClassBuilder<T> {
    descriptor: ClassDescriptor,
    _receiver: PhantomData<fn(T)>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    /// Declare generic type parameters of this layer
    pub fn type_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptor.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Set the superclass layer
    pub fn extends(mut self, supertype: Supertype) -> Self {
        self.descriptor.ty = self
            .descriptor
            .ty
            .extends(supertype.descriptor.ty.clone());
        self.descriptor.superclass = Some(Box::new(supertype));
        self
    }

    /// Add an interface layer
    pub fn implements(mut self, interface: Supertype) -> Self {
        self.descriptor.ty = self
            .descriptor
            .ty
            .extends(interface.descriptor.ty.clone());
        self.descriptor.interfaces.push(interface);
        self
    }

    /// Mark as a record: every no-argument method is a read-only component
    pub fn record(mut self) -> Self {
        self.descriptor.record = true;
        self
    }

    /// Declare a constructor with arguments (not usable for default construction)
    pub fn constructor(mut self, params: Vec<TypeDescriptor>) -> Self {
        self.descriptor.constructors.push(ConstructorDecl { params, body: None });
        self
    }

    /// Declare a no-argument getter-shaped method
    pub fn getter<V, F>(mut self, name: &str, returns: TypeDescriptor, f: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.descriptor.methods.push(MethodDecl {
            name: name.to_string(),
            params: Vec::new(),
            returns,
            bridge: false,
            body: MethodBody::Read(read_fn(f)),
        });
        self
    }

    /// Declare a compiler-synthesized forwarding getter; discovery skips it
    pub fn bridge_getter<V, F>(mut self, name: &str, returns: TypeDescriptor, f: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.descriptor.methods.push(MethodDecl {
            name: name.to_string(),
            params: Vec::new(),
            returns,
            bridge: true,
            body: MethodBody::Read(read_fn(f)),
        });
        self
    }

    /// Declare a single-argument setter-shaped method
    pub fn setter<V, F>(mut self, name: &str, param: TypeDescriptor, f: F) -> Self
    where
        V: FromValue,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.descriptor.methods.push(MethodDecl {
            name: name.to_string(),
            params: vec![param],
            returns: TypeDescriptor::Void,
            bridge: false,
            body: MethodBody::Write(write_fn(f)),
        });
        self
    }

    /// Declare a method that is not invocable through the metamodel
    pub fn method(mut self, name: &str, params: Vec<TypeDescriptor>, returns: TypeDescriptor) -> Self {
        self.descriptor.methods.push(MethodDecl {
            name: name.to_string(),
            params,
            returns,
            bridge: false,
            body: MethodBody::Opaque,
        });
        self
    }

    /// Declare a per-instance field
    pub fn field<V, G, S>(mut self, name: &str, ty: TypeDescriptor, get: G, set: S) -> Self
    where
        V: Into<Value> + FromValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.descriptor.fields.push(FieldDecl {
            name: name.to_string(),
            ty,
            modifiers: FieldModifiers::default(),
            get: read_fn(get),
            set: Some(write_fn(set)),
        });
        self
    }

    /// Declare a per-instance field that cannot be reassigned
    pub fn final_field<V, G>(mut self, name: &str, ty: TypeDescriptor, get: G) -> Self
    where
        V: Into<Value>,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.descriptor.fields.push(FieldDecl {
            name: name.to_string(),
            ty,
            modifiers: FieldModifiers {
                is_final: true,
                is_static: false,
            },
            get: read_fn(get),
            set: None,
        });
        self
    }

    /// Declare a class-scoped constant
    pub fn static_final_field<V, G>(mut self, name: &str, ty: TypeDescriptor, get: G) -> Self
    where
        V: Into<Value>,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.descriptor.fields.push(FieldDecl {
            name: name.to_string(),
            ty,
            modifiers: FieldModifiers {
                is_final: true,
                is_static: true,
            },
            get: read_fn(get),
            set: None,
        });
        self
    }

    /// Finish the description
    pub fn build(self) -> ClassDescriptor {
        self.descriptor
    }
}

impl<T: Describe + Default> ClassBuilder<T> {
    /// Declare the no-argument constructor using `Default`
    pub fn default_constructor(mut self) -> Self {
        self.descriptor.constructors.push(ConstructorDecl {
            params: Vec::new(),
            body: Some(Arc::new(|| Box::new(T::default()) as Box<dyn Reflect>)),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Sample {
        id: i64,
    }

    #[test]
    fn test_signature_erases_type_variables() {
        let descriptor = ClassDescriptor::builder::<Sample>("Sample")
            .method("getValue", vec![], TypeDescriptor::var("T"))
            .method("setValue", vec![TypeDescriptor::var("T")], TypeDescriptor::Void)
            .build();

        assert_eq!(descriptor.methods()[0].signature(), "Object#getValue");
        assert_eq!(descriptor.methods()[1].signature(), "void#setValue:Object");
    }

    #[test]
    fn test_erased_closures_check_receiver() {
        let descriptor = ClassDescriptor::builder::<Sample>("Sample")
            .getter("getId", TypeDescriptor::Long, |s: &Sample| s.id)
            .setter("setId", TypeDescriptor::Long, |s: &mut Sample, v: i64| s.id = v)
            .build();

        let mut sample = Sample { id: 4 };
        let MethodBody::Read(get) = &descriptor.methods()[0].body else {
            panic!("expected read body");
        };
        let MethodBody::Write(set) = &descriptor.methods()[1].body else {
            panic!("expected write body");
        };

        assert_eq!(get(&sample as &dyn Any).unwrap(), Value::Integer(4));
        set(&mut sample as &mut dyn Any, Value::Integer(9)).unwrap();
        assert_eq!(sample.id, 9);

        let wrong = String::from("not a sample");
        assert!(matches!(
            get(&wrong as &dyn Any),
            Err(ReflectionError::TargetMismatch { .. })
        ));
        assert!(matches!(
            set(&mut sample as &mut dyn Any, Value::from("x")),
            Err(ReflectionError::ValueMismatch { .. })
        ));
    }
}
