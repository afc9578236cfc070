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

//! Per-invocation evaluation context

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::config::Configuration;
use crate::error::Result;
use crate::expression::{ExpressionResult, VariableScope};
use crate::model::Value;
use crate::reflection::{MetaObject, ReflectionResult, ReflectorFactory};

/// Binding that holds the original parameter object
pub const PARAMETER_OBJECT_KEY: &str = "_parameter";

/// Binding that holds the configured database id
pub const DATABASE_ID_KEY: &str = "_databaseId";

/// Property access into a non-mapping parameter object
#[derive(Debug, Clone)]
struct ParameterFallback {
    meta: MetaObject,
    has_coder: bool,
}

/// Explicit bindings backed by a parameter object
///
/// A name that was never bound is looked up on the parameter object. When the
/// parameter has no property of that name and no custom coder, the whole
/// parameter is the answer: a single scalar argument can be referenced by any
/// name.
#[derive(Debug, Clone, Default)]
pub struct ContextMap {
    entries: IndexMap<String, Value>,
    fallback: Option<ParameterFallback>,
}

impl ContextMap {
    /// Bindings without a parameter fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings that fall back to `parameter` for unbound names
    pub fn with_parameter(parameter: MetaObject, has_coder: bool) -> Self {
        Self {
            entries: IndexMap::new(),
            fallback: Some(ParameterFallback {
                meta: parameter,
                has_coder,
            }),
        }
    }

    /// Look up `name` without modifying the bindings
    pub fn get(&self, name: &str) -> ReflectionResult<Value> {
        if let Some(value) = self.entries.get(name) {
            return Ok(value.clone());
        }
        let Some(fallback) = &self.fallback else {
            return Ok(Value::Null);
        };
        if !fallback.has_coder && !fallback.meta.has_getter(name) {
            return Ok(fallback.meta.original_object().clone());
        }
        fallback.meta.get_value(name)
    }

    /// Bind `name`, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    /// Whether `name` is explicitly bound
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Explicit bindings in insertion order
    pub fn entries(&self) -> &IndexMap<String, Value> {
        &self.entries
    }

    /// Number of explicit bindings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is explicitly bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VariableScope for ContextMap {
    fn resolve(&self, name: &str) -> ExpressionResult<Value> {
        let value = self.get(name)?;
        if !value.is_null() || self.contains_key(name) {
            return Ok(value);
        }
        match self.entries.get(PARAMETER_OBJECT_KEY) {
            Some(Value::Map(parameter)) => Ok(parameter.get(name).cloned().unwrap_or_default()),
            _ => Ok(Value::Null),
        }
    }

    fn assign(&mut self, name: &str, value: Value) {
        log::trace!("Assigning '{name}' from expression");
        self.insert(name, value);
    }
}

/// SQL text and bindings produced by rendering a fragment tree
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSql {
    /// Assembled SQL text
    pub sql: String,
    /// Every binding visible at the end of rendering
    pub bindings: IndexMap<String, Value>,
}

impl BoundSql {
    /// Render as `{"sql": ..., "bindings": {...}}`
    pub fn to_json(&self, reflectors: &ReflectorFactory) -> ReflectionResult<JsonValue> {
        let mut bindings = serde_json::Map::new();
        for (name, value) in &self.bindings {
            bindings.insert(name.clone(), value.to_json(reflectors)?);
        }
        Ok(serde_json::json!({
            "sql": self.sql,
            "bindings": bindings,
        }))
    }
}

/// Mutable state threaded through one traversal of a fragment tree
pub struct DynamicContext<'c> {
    configuration: &'c Configuration,
    bindings: ContextMap,
    sql: Vec<String>,
    unique_number: usize,
}

impl<'c> DynamicContext<'c> {
    /// Create a context for `parameter`
    ///
    /// Mapping parameters are copied into the bindings; other non-null
    /// parameters become the fallback for unbound names. Either way the
    /// parameter is bound as `_parameter` and the database id as `_databaseId`.
    pub fn new(configuration: &'c Configuration, parameter: Value) -> Self {
        let mut bindings = match &parameter {
            Value::Map(entries) => {
                let mut bindings = ContextMap::new();
                for (name, value) in entries {
                    bindings.insert(name.clone(), value.clone());
                }
                bindings
            }
            Value::Null => ContextMap::new(),
            other => {
                let has_coder = configuration.coders().has_coder_for(other);
                let meta = configuration.new_meta_object(other.clone());
                ContextMap::with_parameter(meta, has_coder)
            }
        };

        log::debug!(
            "Created dynamic context for {} parameter",
            parameter.type_name()
        );
        bindings.insert(PARAMETER_OBJECT_KEY, parameter);
        bindings.insert(
            DATABASE_ID_KEY,
            configuration.database_id().map(Value::from).unwrap_or_default(),
        );

        Self {
            configuration,
            bindings,
            sql: Vec::new(),
            unique_number: 0,
        }
    }

    /// Configuration this context renders with
    pub fn configuration(&self) -> &'c Configuration {
        self.configuration
    }

    /// Bind `name`, shadowing any property of the parameter object
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        log::trace!("Binding '{name}'");
        self.bindings.insert(name, value);
    }

    /// Value visible under `name`
    pub fn lookup(&self, name: &str) -> Result<Value> {
        Ok(self.bindings.get(name)?)
    }

    /// Append a SQL fragment
    pub fn append_sql(&mut self, sql: impl Into<String>) {
        self.sql.push(sql.into());
    }

    /// Fragments joined by single spaces, trimmed
    pub fn sql(&self) -> String {
        self.sql.join(" ").trim().to_string()
    }

    /// Next number from a counter that starts at zero
    pub fn unique_number(&mut self) -> usize {
        let number = self.unique_number;
        self.unique_number += 1;
        number
    }

    /// Current bindings
    pub fn bindings(&self) -> &ContextMap {
        &self.bindings
    }

    /// Evaluate `expression` against the current bindings
    pub fn evaluate(&mut self, expression: &str) -> Result<Value> {
        let evaluator = self.configuration.evaluator();
        Ok(evaluator.evaluate(expression, &mut self.bindings)?)
    }

    /// Finish rendering
    pub fn into_bound_sql(self) -> BoundSql {
        BoundSql {
            sql: self.sql(),
            bindings: self.bindings.entries,
        }
    }
}

impl std::fmt::Debug for DynamicContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicContext")
            .field("bindings", &self.bindings)
            .field("sql", &self.sql)
            .field("unique_number", &self.unique_number)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::Error;
    use crate::model::{Describe, HostObject};
    use crate::reflection::{ClassDescriptor, ReflectionError, TypeDescriptor};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Default)]
    struct Author {
        id: i64,
    }

    impl Describe for Author {
        fn describe() -> ClassDescriptor {
            ClassDescriptor::builder::<Author>("Author")
                .getter("getId", TypeDescriptor::Long, |a: &Author| a.id)
                .build()
        }
    }

    #[test]
    fn test_reserved_bindings() {
        let configuration = Configuration::new(EngineConfig::default().with_database_id("h2"));
        let context = DynamicContext::new(&configuration, Value::from(5));
        assert_eq!(context.lookup(PARAMETER_OBJECT_KEY).unwrap(), Value::Integer(5));
        assert_eq!(context.lookup(DATABASE_ID_KEY).unwrap(), Value::from("h2"));

        let configuration = Configuration::default();
        let context = DynamicContext::new(&configuration, Value::Null);
        assert_eq!(context.lookup(DATABASE_ID_KEY).unwrap(), Value::Null);
        assert_eq!(context.lookup("anything").unwrap(), Value::Null);
    }

    #[test]
    fn test_map_parameter_entries_are_bound() {
        let configuration = Configuration::default();
        let parameter = Value::map([("id", Value::from(3)), ("name", Value::from("x"))]);
        let context = DynamicContext::new(&configuration, parameter.clone());

        assert_eq!(context.lookup("id").unwrap(), Value::Integer(3));
        assert_eq!(context.lookup("missing").unwrap(), Value::Null);
        assert_eq!(context.lookup(PARAMETER_OBJECT_KEY).unwrap(), parameter);
    }

    #[test]
    fn test_object_parameter_fallback() {
        let configuration = Configuration::default();
        let author = Value::object(Author { id: 9 });
        let context = DynamicContext::new(&configuration, author.clone());

        assert_eq!(context.lookup("id").unwrap(), Value::Integer(9));
        // No property and no coder: the parameter itself
        assert_eq!(context.lookup("foo").unwrap(), author);
        assert_eq!(context.bindings().len(), 2);
    }

    #[test]
    fn test_scalar_parameter_answers_any_name() {
        let configuration = Configuration::default();
        let context = DynamicContext::new(&configuration, Value::from("abc"));
        assert_eq!(context.lookup("whatever").unwrap(), Value::from("abc"));
    }

    #[test]
    fn test_parameter_with_coder_is_navigated() {
        let configuration = Configuration::default();
        configuration
            .coders()
            .register::<Author>(|value: &Value| -> ReflectionResult<Value> { Ok(value.clone()) });
        let context = DynamicContext::new(&configuration, Value::object(Author { id: 1 }));

        assert_eq!(context.lookup("id").unwrap(), Value::Integer(1));
        assert!(matches!(
            context.lookup("foo"),
            Err(Error::Reflection(ReflectionError::NoSuchReadableProperty { .. }))
        ));
    }

    #[test]
    fn test_explicit_binding_shadows_parameter() {
        let configuration = Configuration::default();
        let author = HostObject::new(Author { id: 1 });
        let mut context = DynamicContext::new(&configuration, Value::Object(author));
        context.bind("id", Value::from(100));
        assert_eq!(context.lookup("id").unwrap(), Value::Integer(100));
    }

    #[test]
    fn test_sql_fragments_and_counter() {
        let configuration = Configuration::default();
        let mut context = DynamicContext::new(&configuration, Value::Null);
        context.append_sql("  SELECT");
        context.append_sql("* FROM t ");
        assert_eq!(context.sql(), "SELECT * FROM t");

        let numbers: Vec<usize> = (0..3).map(|_| context.unique_number()).collect();
        assert_eq!(numbers, [0, 1, 2]);
    }

    #[test]
    fn test_scope_delegates_to_mapping_parameter() {
        let configuration = Configuration::default();
        let mut context = DynamicContext::new(&configuration, Value::Null);
        context.bind(PARAMETER_OBJECT_KEY, Value::map([("late", 7)]));
        context.bind("present", Value::Null);

        let scope = context.bindings();
        assert_eq!(scope.resolve("late").unwrap(), Value::Integer(7));
        assert_eq!(scope.resolve("present").unwrap(), Value::Null);
        assert_eq!(scope.resolve("absent").unwrap(), Value::Null);
    }

    #[test]
    fn test_evaluate_assigns_into_bindings() {
        let configuration = Configuration::default();
        let mut context = DynamicContext::new(&configuration, Value::map([("n", 4)]));
        assert_eq!(context.evaluate("m = n * 2").unwrap(), Value::Integer(8));
        assert_eq!(context.lookup("m").unwrap(), Value::Integer(8));

        let bound = context.into_bound_sql();
        assert_eq!(bound.sql, "");
        assert_eq!(bound.bindings.get("m"), Some(&Value::Integer(8)));
    }
}
