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

//! Pratt parser for binding expressions

use rust_decimal::Decimal;
use std::str::FromStr;

use super::ast::{BinaryOperator, ExpressionNode, UnaryOperator};
use super::error::{ExpressionError, ExpressionResult};
use super::tokenizer::{Token, Tokenizer};
use crate::model::Value;

/// Operator precedence levels, lowest first
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// `||`, `or`
    Or = 1,
    /// `&&`, `and`
    And = 2,
    /// `==`, `!=`
    Equality = 3,
    /// `<`, `<=`, `>`, `>=`
    Comparison = 4,
    /// `+`, `-`
    Additive = 5,
    /// `*`, `/`, `%`
    Multiplicative = 6,
    /// Prefix `-`, `!`
    Unary = 7,
}

impl Precedence {
    /// Next higher level, used for left associativity
    pub const fn next_level(self) -> Self {
        match self {
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative | Precedence::Unary => Precedence::Unary,
        }
    }
}

fn binary_operator(token: &Token<'_>) -> Option<(BinaryOperator, Precedence)> {
    let entry = match token {
        Token::Equal => (BinaryOperator::Equal, Precedence::Equality),
        Token::NotEqual => (BinaryOperator::NotEqual, Precedence::Equality),
        Token::Plus => (BinaryOperator::Add, Precedence::Additive),
        Token::Minus => (BinaryOperator::Subtract, Precedence::Additive),
        Token::And => (BinaryOperator::And, Precedence::And),
        Token::Or => (BinaryOperator::Or, Precedence::Or),
        Token::LessThan => (BinaryOperator::LessThan, Precedence::Comparison),
        Token::LessThanOrEqual => (BinaryOperator::LessThanOrEqual, Precedence::Comparison),
        Token::GreaterThan => (BinaryOperator::GreaterThan, Precedence::Comparison),
        Token::GreaterThanOrEqual => (BinaryOperator::GreaterThanOrEqual, Precedence::Comparison),
        Token::Multiply => (BinaryOperator::Multiply, Precedence::Multiplicative),
        Token::Divide => (BinaryOperator::Divide, Precedence::Multiplicative),
        Token::Modulo => (BinaryOperator::Modulo, Precedence::Multiplicative),
        _ => return None,
    };
    Some(entry)
}

/// Parser over a single expression
pub struct PrattParser<'input> {
    tokenizer: Tokenizer<'input>,
    current_token: Option<Token<'input>>,
    token_start: usize,
}

impl<'input> PrattParser<'input> {
    /// Create a parser for `input`
    pub fn new(input: &'input str) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            current_token: None,
            token_start: 0,
        }
    }

    /// Parse the whole input, including an optional top-level assignment
    pub fn parse(mut self) -> ExpressionResult<ExpressionNode> {
        self.advance()?;
        let node = self.parse_statement()?;
        match self.current_token {
            None => Ok(node),
            Some(token) => Err(ExpressionError::parse(
                format!("Unexpected token {token:?}"),
                self.token_start,
            )),
        }
    }

    fn advance(&mut self) -> ExpressionResult<()> {
        self.current_token = self.tokenizer.next_token()?;
        self.token_start = self.tokenizer.token_start();
        Ok(())
    }

    fn expect(&mut self, expected: Token<'input>) -> ExpressionResult<()> {
        if self.current_token.as_ref() == Some(&expected) {
            self.advance()
        } else {
            Err(ExpressionError::parse(
                format!("Expected {expected:?}, found {:?}", self.current_token),
                self.token_start,
            ))
        }
    }

    fn parse_statement(&mut self) -> ExpressionResult<ExpressionNode> {
        let node = self.parse_expression(Precedence::Or)?;
        if self.current_token != Some(Token::Assign) {
            return Ok(node);
        }
        let ExpressionNode::Identifier(name) = node else {
            return Err(ExpressionError::parse(
                "Left side of '=' must be a variable name",
                self.token_start,
            ));
        };
        self.advance()?;
        let value = self.parse_expression(Precedence::Or)?;
        Ok(ExpressionNode::Assign {
            name,
            value: Box::new(value),
        })
    }

    fn parse_expression(&mut self, min_precedence: Precedence) -> ExpressionResult<ExpressionNode> {
        let mut left = self.parse_unary()?;

        while let Some((op, precedence)) = self.current_token.as_ref().and_then(binary_operator) {
            if precedence < min_precedence {
                break;
            }
            self.advance()?;
            let right = self.parse_expression(precedence.next_level())?;
            left = ExpressionNode::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ExpressionResult<ExpressionNode> {
        let op = match self.current_token {
            Some(Token::Minus) => UnaryOperator::Negate,
            Some(Token::Not) => UnaryOperator::Not,
            _ => return self.parse_postfix(),
        };
        self.advance()?;
        let operand = self.parse_unary()?;
        Ok(ExpressionNode::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> ExpressionResult<ExpressionNode> {
        let mut node = self.parse_primary()?;
        loop {
            match self.current_token {
                Some(Token::Dot) => {
                    self.advance()?;
                    let Some(Token::Identifier(name)) = self.current_token else {
                        return Err(ExpressionError::parse(
                            "Expected property name after '.'",
                            self.token_start,
                        ));
                    };
                    self.advance()?;
                    node = ExpressionNode::Property {
                        base: Box::new(node),
                        name: name.to_string(),
                    };
                }
                Some(Token::LeftBracket) => {
                    self.advance()?;
                    let index = self.parse_expression(Precedence::Or)?;
                    self.expect(Token::RightBracket)?;
                    node = ExpressionNode::Index {
                        base: Box::new(node),
                        index: Box::new(index),
                    };
                }
                _ => return Ok(node),
            }
        }
    }

    fn parse_primary(&mut self) -> ExpressionResult<ExpressionNode> {
        let start = self.token_start;
        let Some(token) = self.current_token.take() else {
            return Err(ExpressionError::parse("Unexpected end of expression", start));
        };

        let node = match token {
            Token::Integer(i) => ExpressionNode::Literal(Value::Integer(i)),
            Token::Decimal(text) => {
                let d = Decimal::from_str(text).map_err(|e| {
                    ExpressionError::parse(format!("Invalid decimal '{text}': {e}"), start)
                })?;
                ExpressionNode::Literal(Value::Decimal(d))
            }
            Token::String(s) => ExpressionNode::Literal(Value::String(s)),
            Token::Boolean(b) => ExpressionNode::Literal(Value::Boolean(b)),
            Token::Null => ExpressionNode::Literal(Value::Null),
            Token::Identifier(name) => ExpressionNode::Identifier(name.to_string()),
            Token::LeftParen => {
                self.advance()?;
                let inner = self.parse_expression(Precedence::Or)?;
                if self.current_token != Some(Token::RightParen) {
                    return Err(ExpressionError::parse("Expected ')'", self.token_start));
                }
                inner
            }
            other => {
                return Err(ExpressionError::parse(
                    format!("Unexpected token {other:?}"),
                    start,
                ));
            }
        };
        self.advance()?;
        Ok(node)
    }
}

/// Parse `input` into an expression tree
pub fn parse_expression(input: &str) -> ExpressionResult<ExpressionNode> {
    PrattParser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ident(name: &str) -> ExpressionNode {
        ExpressionNode::Identifier(name.to_string())
    }

    fn int(i: i64) -> ExpressionNode {
        ExpressionNode::Literal(Value::Integer(i))
    }

    #[test]
    fn test_multiplicative_binds_tighter() {
        let node = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            node,
            ExpressionNode::binary(
                BinaryOperator::Add,
                int(1),
                ExpressionNode::binary(BinaryOperator::Multiply, int(2), int(3)),
            )
        );
    }

    #[test]
    fn test_left_associative() {
        let node = parse_expression("10 - 4 - 3").unwrap();
        assert_eq!(
            node,
            ExpressionNode::binary(
                BinaryOperator::Subtract,
                ExpressionNode::binary(BinaryOperator::Subtract, int(10), int(4)),
                int(3),
            )
        );
    }

    #[test]
    fn test_postfix_navigation() {
        let node = parse_expression("order.lines[0].sku").unwrap();
        let expected = ExpressionNode::Property {
            base: Box::new(ExpressionNode::Index {
                base: Box::new(ExpressionNode::Property {
                    base: Box::new(ident("order")),
                    name: "lines".to_string(),
                }),
                index: Box::new(int(0)),
            }),
            name: "sku".to_string(),
        };
        assert_eq!(node, expected);
    }

    #[test]
    fn test_assignment_at_top_level() {
        let node = parse_expression("x = y + 1").unwrap();
        assert_eq!(
            node,
            ExpressionNode::Assign {
                name: "x".to_string(),
                value: Box::new(ExpressionNode::binary(BinaryOperator::Add, ident("y"), int(1))),
            }
        );
        assert!(parse_expression("a.b = 1").is_err());
    }

    #[test]
    fn test_parentheses_and_unary() {
        let node = parse_expression("!(a && b)").unwrap();
        assert_eq!(
            node,
            ExpressionNode::Unary {
                op: UnaryOperator::Not,
                operand: Box::new(ExpressionNode::binary(BinaryOperator::And, ident("a"), ident("b"))),
            }
        );
    }

    #[test]
    fn test_reports_trailing_tokens() {
        let err = parse_expression("a b").unwrap_err();
        assert!(matches!(err, ExpressionError::Parse { position: 2, .. }));
        assert!(parse_expression("(1 + 2").is_err());
        assert!(parse_expression("").is_err());
    }
}
