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

//! Fragment nodes
//!
//! A template is a tree of [`SqlNode`]s. Applying the root node to a
//! [`DynamicContext`] appends SQL text and bindings in document order.

use std::fmt;

use super::context::DynamicContext;
use crate::error::Result;

/// One node of a fragment tree
pub trait SqlNode: fmt::Debug + Send + Sync {
    /// Contribute to `context`; `false` means the node chose not to apply
    fn apply(&self, context: &mut DynamicContext<'_>) -> Result<bool>;
}

/// Literal SQL text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticTextSqlNode {
    text: String,
}

impl StaticTextSqlNode {
    /// Create a node appending `text` verbatim
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Text appended by this node
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl SqlNode for StaticTextSqlNode {
    fn apply(&self, context: &mut DynamicContext<'_>) -> Result<bool> {
        context.append_sql(self.text.as_str());
        Ok(true)
    }
}

/// Binds the result of an expression to a name (`<bind name=".." value=".."/>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDeclSqlNode {
    name: String,
    expression: String,
}

impl VarDeclSqlNode {
    /// Create a node binding `name` to the value of `expression`
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
        }
    }

    /// Bound name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expression text
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl SqlNode for VarDeclSqlNode {
    fn apply(&self, context: &mut DynamicContext<'_>) -> Result<bool> {
        let value = context.evaluate(&self.expression)?;
        log::trace!("Bind node '{}' = {}", self.name, value);
        context.bind(self.name.as_str(), value);
        Ok(true)
    }
}

/// Ordered sequence of child nodes
#[derive(Debug, Default)]
pub struct MixedSqlNode {
    contents: Vec<Box<dyn SqlNode>>,
}

impl MixedSqlNode {
    /// Create a node applying `contents` in order
    pub fn new(contents: Vec<Box<dyn SqlNode>>) -> Self {
        Self { contents }
    }

    /// Child nodes
    pub fn contents(&self) -> &[Box<dyn SqlNode>] {
        &self.contents
    }
}

impl SqlNode for MixedSqlNode {
    fn apply(&self, context: &mut DynamicContext<'_>) -> Result<bool> {
        for node in &self.contents {
            if !node.apply(context)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
