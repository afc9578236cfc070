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

//! Property metamodels for host types
//!
//! This module provides the pieces the data-access layer uses to treat
//! arbitrary Rust values as bags of named properties:
//!
//! - [`ClassDescriptor`]: how a host type registers its members
//! - [`Reflector`]: the conflict-resolved accessor table of one type
//! - [`ReflectorFactory`]: the build-once cache of reflectors
//! - [`PropertyTokenizer`]: decomposition of `a[0].b.c` paths
//! - [`MetaObject`]: nested/indexed navigation built on the above

#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
pub mod factory;
pub mod invoker;
pub mod navigator;
pub mod property_namer;
pub mod reflector;
pub mod tokenizer;
pub mod types;

pub use descriptor::{
    ClassBuilder, ClassDescriptor, ConstructFn, FieldModifiers, MethodBody, MethodDecl, ReadFn,
    Supertype, WriteFn,
};
pub use error::{ReflectionError, ReflectionResult};
pub use factory::{ReflectorCacheStats, ReflectorFactory};
pub use invoker::{AmbiguousInvoker, Invoker};
pub use navigator::{MetaObject, type_of};
pub use reflector::Reflector;
pub use tokenizer::PropertyTokenizer;
pub use types::{NamedType, TypeDescriptor, TypeKey};
