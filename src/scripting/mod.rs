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

//! Dynamic SQL assembly
//!
//! A [`DynamicContext`] collects SQL fragments and bindings while a tree of
//! [`SqlNode`]s is applied to it. [`SqlTemplate`] ties the two together.

#![warn(missing_docs)]

pub mod context;
pub mod node;
pub mod template;

pub use context::{BoundSql, ContextMap, DATABASE_ID_KEY, DynamicContext, PARAMETER_OBJECT_KEY};
pub use node::{MixedSqlNode, SqlNode, StaticTextSqlNode, VarDeclSqlNode};
pub use template::{SqlTemplate, TemplateNode};
