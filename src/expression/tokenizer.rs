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

//! Tokenizer for binding expressions

use super::error::{ExpressionError, ExpressionResult};

/// Check if a character can start an identifier
pub fn is_identifier_start(c: char) -> bool {
    unicode_xid::UnicodeXID::is_xid_start(c) || c == '_' || c == '$'
}

/// Check if a character can continue an identifier
pub fn is_identifier_continue(c: char) -> bool {
    unicode_xid::UnicodeXID::is_xid_continue(c) || c == '$'
}

/// Lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'input> {
    /// Integer literal (e.g., 42)
    Integer(i64),
    /// Decimal literal as string slice, parsed on demand (e.g., 3.14)
    Decimal(&'input str),
    /// String literal with escapes processed
    String(String),
    /// Identifier
    Identifier(&'input str),
    /// `true` or `false`
    Boolean(bool),
    /// `null`
    Null,
    /// +
    Plus,
    /// -
    Minus,
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
    /// && or `and`
    And,
    /// || or `or`
    Or,
    /// ! or `not`
    Not,
    /// = (assignment)
    Assign,
    /// .
    Dot,
    /// (
    LeftParen,
    /// )
    RightParen,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
}

/// Streaming tokenizer over an expression
pub struct Tokenizer<'input> {
    input: &'input str,
    position: usize,
    token_start: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a tokenizer at the start of `input`
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            position: 0,
            token_start: 0,
        }
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.position
    }

    /// Byte offset where the most recently read token starts
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.position..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Next token, or `None` at end of input
    pub fn next_token(&mut self) -> ExpressionResult<Option<Token<'input>>> {
        self.skip_whitespace();
        let start = self.position;
        self.token_start = start;
        let Some(c) = self.bump() else {
            return Ok(None);
        };

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Multiply,
            '/' => Token::Divide,
            '%' => Token::Modulo,
            '.' => Token::Dot,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            '=' => self.follow('=', Token::Equal, Token::Assign),
            '!' => self.follow('=', Token::NotEqual, Token::Not),
            '<' => self.follow('=', Token::LessThanOrEqual, Token::LessThan),
            '>' => self.follow('=', Token::GreaterThanOrEqual, Token::GreaterThan),
            '&' if self.peek_char() == Some('&') => {
                self.bump();
                Token::And
            }
            '|' if self.peek_char() == Some('|') => {
                self.bump();
                Token::Or
            }
            '\'' | '"' => Token::String(self.string_literal(c, start)?),
            c if c.is_ascii_digit() => self.number(start)?,
            c if is_identifier_start(c) => {
                while self.peek_char().is_some_and(is_identifier_continue) {
                    self.bump();
                }
                match &self.input[start..self.position] {
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" => Token::Null,
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    ident => Token::Identifier(ident),
                }
            }
            other => {
                return Err(ExpressionError::parse(
                    format!("Unexpected character '{other}'"),
                    start,
                ));
            }
        };
        Ok(Some(token))
    }

    fn follow(&mut self, next: char, matched: Token<'input>, otherwise: Token<'input>) -> Token<'input> {
        if self.peek_char() == Some(next) {
            self.bump();
            matched
        } else {
            otherwise
        }
    }

    fn number(&mut self, start: usize) -> ExpressionResult<Token<'input>> {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let is_decimal =
            self.peek_char() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit());
        if is_decimal {
            self.bump();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
            return Ok(Token::Decimal(&self.input[start..self.position]));
        }
        let text = &self.input[start..self.position];
        text.parse::<i64>()
            .map(Token::Integer)
            .map_err(|_| ExpressionError::parse(format!("Integer literal '{text}' out of range"), start))
    }

    fn string_literal(&mut self, quote: char, start: usize) -> ExpressionResult<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ExpressionError::parse("Unterminated string literal", start)),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(other) => out.push(other),
                    None => {
                        return Err(ExpressionError::parse("Unterminated string literal", start));
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    /// Tokenize the whole input
    pub fn tokenize_all(&mut self) -> ExpressionResult<Vec<Token<'input>>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}
