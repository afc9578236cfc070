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

//! Binding expressions
//!
//! Bind nodes hand their expression text to an [`ExpressionEvaluator`]
//! together with a [`VariableScope`] that exposes the current bindings.
//! [`SimpleEvaluator`] is the bundled implementation: literals, property
//! navigation, arithmetic, comparison, logic and top-level assignment.

#![warn(missing_docs)]

pub mod ast;
pub mod cache;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod tokenizer;

pub use ast::{BinaryOperator, ExpressionNode, UnaryOperator};
pub use cache::{CacheStats, ExpressionCache};
pub use error::{ExpressionError, ExpressionResult};
pub use evaluator::{DEFAULT_CACHE_SIZE, SimpleEvaluator};
pub use parser::parse_expression;

use crate::model::Value;

/// Variables visible to an expression
pub trait VariableScope {
    /// Current value of `name`; unknown names resolve to [`Value::Null`]
    fn resolve(&self, name: &str) -> ExpressionResult<Value>;

    /// Bind `name` to `value`
    fn assign(&mut self, name: &str, value: Value);
}

/// Evaluates expression text against a variable scope
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `expression`, reading and possibly assigning variables in `scope`
    fn evaluate(&self, expression: &str, scope: &mut dyn VariableScope) -> ExpressionResult<Value>;
}
