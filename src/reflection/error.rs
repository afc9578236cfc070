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

//! Error types for property metamodels and navigation

use thiserror::Error;

/// Result type for reflection operations
pub type ReflectionResult<T> = Result<T, ReflectionError>;

/// Errors raised while reading, writing or constructing host objects
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReflectionError {
    /// Default construction was requested on a type that has no such constructor
    #[error("There is no default constructor for {class}")]
    NoDefaultConstructor {
        /// Class name
        class: String,
    },

    /// No readable property with this name
    #[error("There is no getter for property named '{property}' in '{class}'")]
    NoSuchReadableProperty {
        /// Property name
        property: String,
        /// Class name
        class: String,
    },

    /// No writable property with this name
    #[error("There is no setter for property named '{property}' in '{class}'")]
    NoSuchWritableProperty {
        /// Property name
        property: String,
        /// Class name
        class: String,
    },

    /// The property resolved to conflicting accessors
    #[error("{message}")]
    AmbiguousAccessor {
        /// Property name
        property: String,
        /// Class declaring the conflicting accessors
        class: String,
        /// Declaration identities of the conflicting candidates
        candidates: Vec<String>,
        /// Human readable explanation
        message: String,
    },

    /// An intermediate path step is not traversable
    #[error("Cannot navigate into '{property}' while resolving '{path}': value is not traversable")]
    TraversalDeadEnd {
        /// Full path being resolved
        path: String,
        /// Step that could not be traversed
        property: String,
    },

    /// Index missing, malformed or out of range
    #[error("Invalid index '{index}' for property '{property}'")]
    InvalidIndex {
        /// Index text
        index: String,
        /// Property being indexed
        property: String,
    },

    /// A value could not be converted to the accessor's type
    #[error("Expected a value of type {expected}, got {found}")]
    ValueMismatch {
        /// Expected type
        expected: String,
        /// Actual value kind
        found: String,
    },

    /// An accessor was invoked on an instance of the wrong Rust type
    #[error("Accessor declared for {expected} invoked on {found}")]
    TargetMismatch {
        /// Type the accessor was declared for
        expected: String,
        /// Type it was invoked on
        found: String,
    },

    /// Accessor invoked in the wrong direction (e.g. reading through a setter)
    #[error("Accessor for '{property}' does not support {operation}")]
    UnsupportedOperation {
        /// Property name
        property: String,
        /// Operation attempted ("read" or "write")
        operation: &'static str,
    },

    /// Name could not be turned into a property name
    #[error("Error parsing property name '{name}'. Didn't start with 'is', 'get' or 'set'.")]
    InvalidPropertyName {
        /// Method name
        name: String,
    },
}

impl ReflectionError {
    /// Whether the error was caused by an ambiguous accessor
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ReflectionError::AmbiguousAccessor { .. })
    }
}
