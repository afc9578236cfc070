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

//! Expression syntax tree

use crate::model::Value;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Numeric negation
    Negate,
    /// Logical negation
    Not,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// +
    Add,
    /// -
    Subtract,
    /// *
    Multiply,
    /// /
    Divide,
    /// %
    Modulo,
    /// ==
    Equal,
    /// !=
    NotEqual,
    /// <
    LessThan,
    /// <=
    LessThanOrEqual,
    /// >
    GreaterThan,
    /// >=
    GreaterThanOrEqual,
    /// Short-circuit conjunction
    And,
    /// Short-circuit disjunction
    Or,
}

impl BinaryOperator {
    /// Operator symbol as written in expressions
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

/// Parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    /// Constant
    Literal(Value),
    /// Name resolved through the variable scope
    Identifier(String),
    /// `base.name`
    Property {
        /// Receiver
        base: Box<ExpressionNode>,
        /// Property name
        name: String,
    },
    /// `base[index]`
    Index {
        /// Collection
        base: Box<ExpressionNode>,
        /// Position or key
        index: Box<ExpressionNode>,
    },
    /// Prefix operator
    Unary {
        /// Operator
        op: UnaryOperator,
        /// Operand
        operand: Box<ExpressionNode>,
    },
    /// Infix operator
    Binary {
        /// Operator
        op: BinaryOperator,
        /// Left operand
        left: Box<ExpressionNode>,
        /// Right operand
        right: Box<ExpressionNode>,
    },
    /// `name = value`, only valid at the top level
    Assign {
        /// Variable written
        name: String,
        /// Assigned expression
        value: Box<ExpressionNode>,
    },
}

impl ExpressionNode {
    pub(crate) fn binary(op: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}
