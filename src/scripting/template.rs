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

//! Fragment trees described as data

use serde::{Deserialize, Serialize};

use super::context::{BoundSql, DynamicContext};
use super::node::{MixedSqlNode, SqlNode, StaticTextSqlNode, VarDeclSqlNode};
use crate::config::Configuration;
use crate::error::Result;
use crate::model::Value;

/// Serializable description of a fragment node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TemplateNode {
    /// Literal SQL text
    Text {
        /// Text to append
        text: String,
    },
    /// Expression bound to a name
    Bind {
        /// Bound name
        name: String,
        /// Expression text
        value: String,
    },
    /// Ordered group of nodes
    Mixed {
        /// Child nodes
        children: Vec<TemplateNode>,
    },
}

impl TemplateNode {
    /// Build the node tree described by this entry
    pub fn build(&self) -> Box<dyn SqlNode> {
        match self {
            TemplateNode::Text { text } => Box::new(StaticTextSqlNode::new(text.as_str())),
            TemplateNode::Bind { name, value } => {
                Box::new(VarDeclSqlNode::new(name.as_str(), value.as_str()))
            }
            TemplateNode::Mixed { children } => Box::new(build_mixed(children)),
        }
    }
}

fn build_mixed(nodes: &[TemplateNode]) -> MixedSqlNode {
    MixedSqlNode::new(nodes.iter().map(TemplateNode::build).collect())
}

/// A fragment tree ready to render against parameters
#[derive(Debug)]
pub struct SqlTemplate {
    root: MixedSqlNode,
}

impl SqlTemplate {
    /// Wrap an existing root node
    pub fn new(root: MixedSqlNode) -> Self {
        Self { root }
    }

    /// Build a template from top-level node descriptions
    pub fn from_nodes(nodes: &[TemplateNode]) -> Self {
        Self::new(build_mixed(nodes))
    }

    /// Parse a JSON array of node descriptions
    pub fn from_json_str(json: &str) -> Result<Self> {
        let nodes: Vec<TemplateNode> = serde_json::from_str(json)?;
        Ok(Self::from_nodes(&nodes))
    }

    /// Root node
    pub fn root(&self) -> &MixedSqlNode {
        &self.root
    }

    /// Apply the tree to a fresh context for `parameter`
    pub fn render(&self, configuration: &Configuration, parameter: Value) -> Result<BoundSql> {
        let mut context = DynamicContext::new(configuration, parameter);
        let completed = self.root.apply(&mut context)?;
        if !completed {
            log::debug!("Template rendering stopped early");
        }
        Ok(context.into_bound_sql())
    }
}
