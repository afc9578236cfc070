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

//! Reference evaluator for binding expressions

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::sync::Arc;

use super::ast::{BinaryOperator, ExpressionNode, UnaryOperator};
use super::cache::{CacheStats, ExpressionCache};
use super::error::{ExpressionError, ExpressionResult};
use super::{ExpressionEvaluator, VariableScope};
use crate::model::Value;
use crate::reflection::{MetaObject, ReflectionError, ReflectorFactory};

/// Default number of parsed expressions kept in memory
pub const DEFAULT_CACHE_SIZE: usize = 256;

/// Small expression language used by bind nodes
///
/// Property steps go through [`MetaObject`], so host objects, mappings and
/// lists navigate the same way they do for path-based access. Navigating
/// through `null` yields `null`.
#[derive(Debug)]
pub struct SimpleEvaluator {
    reflectors: Arc<ReflectorFactory>,
    cache: ExpressionCache,
}

impl SimpleEvaluator {
    /// Create an evaluator with the default cache size
    pub fn new(reflectors: Arc<ReflectorFactory>) -> Self {
        Self::with_cache_size(reflectors, DEFAULT_CACHE_SIZE)
    }

    /// Create an evaluator caching at most `cache_size` parsed expressions
    pub fn with_cache_size(reflectors: Arc<ReflectorFactory>, cache_size: usize) -> Self {
        Self {
            reflectors,
            cache: ExpressionCache::new(cache_size),
        }
    }

    /// Parse cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn eval(&self, node: &ExpressionNode, scope: &mut dyn VariableScope) -> ExpressionResult<Value> {
        match node {
            ExpressionNode::Literal(value) => Ok(value.clone()),
            ExpressionNode::Identifier(name) => scope.resolve(name),
            ExpressionNode::Property { base, name } => {
                let base = self.eval(base, scope)?;
                self.property(base, name)
            }
            ExpressionNode::Index { base, index } => {
                let base = self.eval(base, scope)?;
                let index = self.eval(index, scope)?;
                self.index(base, index)
            }
            ExpressionNode::Unary { op, operand } => {
                let operand = self.eval(operand, scope)?;
                unary(*op, operand)
            }
            ExpressionNode::Binary {
                op: BinaryOperator::And,
                left,
                right,
            } => {
                if !self.eval(left, scope)?.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(self.eval(right, scope)?.is_truthy()))
            }
            ExpressionNode::Binary {
                op: BinaryOperator::Or,
                left,
                right,
            } => {
                if self.eval(left, scope)?.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(self.eval(right, scope)?.is_truthy()))
            }
            ExpressionNode::Binary { op, left, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                binary(*op, left, right)
            }
            ExpressionNode::Assign { name, value } => {
                let value = self.eval(value, scope)?;
                scope.assign(name, value.clone());
                Ok(value)
            }
        }
    }

    fn property(&self, base: Value, name: &str) -> ExpressionResult<Value> {
        match base {
            Value::Null => Ok(Value::Null),
            base => Ok(MetaObject::for_object(base, Arc::clone(&self.reflectors)).get_value(name)?),
        }
    }

    fn index(&self, base: Value, index: Value) -> ExpressionResult<Value> {
        match (base, index) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::List(items), Value::Integer(position)) => usize::try_from(position)
                .ok()
                .and_then(|position| items.into_iter().nth(position))
                .ok_or_else(|| {
                    ReflectionError::InvalidIndex {
                        index: position.to_string(),
                        property: String::new(),
                    }
                    .into()
                }),
            (Value::Map(mut map), key) => Ok(map.swap_remove(&key.to_string()).unwrap_or_default()),
            (object @ Value::Object(_), Value::String(name)) => self.property(object, &name),
            (base, index) => Err(ExpressionError::TypeMismatch {
                operation: "[]".to_string(),
                left: base.type_name(),
                right: index.type_name(),
            }),
        }
    }
}

impl ExpressionEvaluator for SimpleEvaluator {
    fn evaluate(&self, expression: &str, scope: &mut dyn VariableScope) -> ExpressionResult<Value> {
        let node = self.cache.get_or_parse(expression)?;
        self.eval(&node, scope)
    }
}

fn unary(op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
    match (op, operand) {
        (UnaryOperator::Not, operand) => Ok(Value::Boolean(!operand.is_truthy())),
        (UnaryOperator::Negate, Value::Integer(i)) => i
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| overflow("-")),
        (UnaryOperator::Negate, Value::Decimal(d)) => Ok(Value::Decimal(-d)),
        (UnaryOperator::Negate, other) => Err(ExpressionError::InvalidOperand {
            operation: "-".to_string(),
            operand: other.type_name(),
        }),
    }
}

fn binary(op: BinaryOperator, left: Value, right: Value) -> ExpressionResult<Value> {
    match op {
        BinaryOperator::Equal => Ok(Value::Boolean(left == right)),
        BinaryOperator::NotEqual => Ok(Value::Boolean(left != right)),
        BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => {
            let ordering = compare(&left, &right).ok_or_else(|| mismatch(op, &left, &right))?;
            let result = match op {
                BinaryOperator::LessThan => ordering == Ordering::Less,
                BinaryOperator::LessThanOrEqual => ordering != Ordering::Greater,
                BinaryOperator::GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Boolean(result))
        }
        BinaryOperator::Add if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) => {
            Ok(Value::String(format!("{left}{right}")))
        }
        _ => arithmetic(op, left, right),
    }
}

fn arithmetic(op: BinaryOperator, left: Value, right: Value) -> ExpressionResult<Value> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
        (Value::Integer(_) | Value::Decimal(_), Value::Integer(_) | Value::Decimal(_)) => {
            decimal_arithmetic(op, to_decimal(&left), to_decimal(&right))
        }
        _ => Err(mismatch(op, &left, &right)),
    }
}

fn integer_arithmetic(op: BinaryOperator, a: i64, b: i64) -> ExpressionResult<Value> {
    if matches!(op, BinaryOperator::Divide | BinaryOperator::Modulo) && b == 0 {
        return Err(ExpressionError::DivisionByZero);
    }
    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Subtract => a.checked_sub(b),
        BinaryOperator::Multiply => a.checked_mul(b),
        BinaryOperator::Divide => a.checked_div(b),
        BinaryOperator::Modulo => a.checked_rem(b),
        _ => return Err(mismatch(op, &Value::Integer(a), &Value::Integer(b))),
    };
    result.map(Value::Integer).ok_or_else(|| overflow(op.symbol()))
}

fn decimal_arithmetic(op: BinaryOperator, a: Decimal, b: Decimal) -> ExpressionResult<Value> {
    if matches!(op, BinaryOperator::Divide | BinaryOperator::Modulo) && b.is_zero() {
        return Err(ExpressionError::DivisionByZero);
    }
    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Subtract => a.checked_sub(b),
        BinaryOperator::Multiply => a.checked_mul(b),
        BinaryOperator::Divide => a.checked_div(b),
        BinaryOperator::Modulo => a.checked_rem(b),
        _ => return Err(mismatch(op, &Value::Decimal(a), &Value::Decimal(b))),
    };
    result
        .map(|d| Value::Decimal(d.normalize()))
        .ok_or_else(|| overflow(op.symbol()))
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Integer(_) | Value::Decimal(_), Value::Integer(_) | Value::Decimal(_)) => {
            Some(to_decimal(left).cmp(&to_decimal(right)))
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn to_decimal(value: &Value) -> Decimal {
    match value {
        Value::Integer(i) => Decimal::from(*i),
        Value::Decimal(d) => *d,
        _ => Decimal::ZERO,
    }
}

fn mismatch(op: BinaryOperator, left: &Value, right: &Value) -> ExpressionError {
    ExpressionError::TypeMismatch {
        operation: op.symbol().to_string(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

fn overflow(operation: &str) -> ExpressionError {
    ExpressionError::Overflow {
        operation: operation.to_string(),
    }
}
