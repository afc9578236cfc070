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

// Error types for expression parsing and evaluation

use thiserror::Error;

use crate::reflection::ReflectionError;

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;

/// Errors that can occur while parsing or evaluating an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Malformed expression text
    #[error("Parse error at position {position}: {message}")]
    Parse {
        /// What went wrong
        message: String,
        /// Byte offset into the expression
        position: usize,
    },

    /// Operator applied to values it does not support
    #[error("Cannot apply '{operation}' to {left} and {right}")]
    TypeMismatch {
        /// Operator
        operation: String,
        /// Kind of the left operand
        left: String,
        /// Kind of the right operand
        right: String,
    },

    /// Prefix operator applied to a value it does not support
    #[error("Cannot apply '{operation}' to {operand}")]
    InvalidOperand {
        /// Operator
        operation: String,
        /// Kind of the operand
        operand: String,
    },

    /// Integer or decimal division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Result does not fit the numeric type
    #[error("Arithmetic overflow in '{operation}'")]
    Overflow {
        /// Operator
        operation: String,
    },

    /// Property access failed
    #[error(transparent)]
    Reflection(#[from] ReflectionError),
}

impl ExpressionError {
    pub(crate) fn parse(message: impl Into<String>, position: usize) -> Self {
        ExpressionError::Parse {
            message: message.into(),
            position,
        }
    }
}
