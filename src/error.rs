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

//! Error types for template rendering
//!
//! Property access and expression failures keep their own error types; this
//! module wraps them for callers working at the template level.

use thiserror::Error;

use crate::expression::ExpressionError;
use crate::reflection::ReflectionError;

/// Result type alias for template operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for template operations
#[derive(Error, Debug)]
pub enum Error {
    /// Property metamodel or path navigation failure
    #[error(transparent)]
    Reflection(#[from] ReflectionError),

    /// Expression parse or evaluation failure
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed JSON input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}
