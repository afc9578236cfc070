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

//! Property metamodels and dynamic SQL assembly
//!
//! Host types describe their constructors, accessors and fields once; the
//! [`reflection`] module turns that description into a cached, conflict
//! resolved table of readable and writable properties and navigates property
//! paths such as `orders[0].customer.name`. The [`scripting`] module applies
//! trees of SQL fragment nodes to a per-invocation [`DynamicContext`] whose
//! bindings fall back to the parameter object.
//!
//! ```
//! use sqlweave::{Configuration, SqlTemplate, Value};
//!
//! let template = SqlTemplate::from_json_str(r#"[
//!     {"type": "bind", "name": "next", "value": "id + 1"},
//!     {"type": "text", "text": "SELECT * FROM t WHERE id = #{next}"}
//! ]"#).unwrap();
//! let bound = template
//!     .render(&Configuration::default(), Value::map([("id", 1)]))
//!     .unwrap();
//! assert_eq!(bound.sql, "SELECT * FROM t WHERE id = #{next}");
//! assert_eq!(bound.bindings["next"], Value::Integer(2));
//! ```

pub mod config;
pub mod error;
pub mod expression;
pub mod model;
pub mod reflection;
pub mod scripting;

// Re-export main types
pub use config::{CoderRegistry, Configuration, EngineConfig, ValueCoder};
pub use error::{Error, Result};
pub use expression::{ExpressionError, ExpressionEvaluator, SimpleEvaluator, VariableScope};
pub use model::{Describe, FromValue, HostObject, Value};
pub use reflection::{
    ClassDescriptor, MetaObject, PropertyTokenizer, ReflectionError, Reflector, ReflectorFactory,
    TypeDescriptor,
};
pub use scripting::{
    BoundSql, DynamicContext, MixedSqlNode, SqlNode, SqlTemplate, StaticTextSqlNode,
    VarDeclSqlNode,
};
