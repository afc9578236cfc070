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

//! Engine configuration
//!
//! [`EngineConfig`] holds the serializable settings; [`Configuration`] wires
//! them to the shared services every rendering needs: the reflector cache,
//! the value coders and the expression evaluator.

pub mod coder;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::expression::{DEFAULT_CACHE_SIZE, ExpressionEvaluator, SimpleEvaluator};
use crate::model::Value;
use crate::reflection::{MetaObject, ReflectorFactory};

pub use coder::{CoderRegistry, ValueCoder};

/// Serializable engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Identifier of the target database, exposed to templates as `_databaseId`
    pub database_id: Option<String>,
    /// Cache property metamodels per type
    pub class_cache_enabled: bool,
    /// Maximum number of parsed expressions kept by the reference evaluator
    pub expression_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_id: None,
            class_cache_enabled: true,
            expression_cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    /// Set the database id
    pub fn with_database_id(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = Some(database_id.into());
        self
    }

    /// Enable or disable the metamodel cache
    pub fn with_class_cache(mut self, enabled: bool) -> Self {
        self.class_cache_enabled = enabled;
        self
    }

    /// Set the parsed-expression cache size
    pub fn with_expression_cache_size(mut self, size: usize) -> Self {
        self.expression_cache_size = size;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.expression_cache_size == 0 {
            return Err(Error::config("expression_cache_size must be > 0"));
        }
        if self.database_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(Error::config("database_id must not be blank"));
        }
        Ok(())
    }
}

/// Settings plus the shared services used while rendering
#[derive(Clone)]
pub struct Configuration {
    config: EngineConfig,
    reflectors: Arc<ReflectorFactory>,
    coders: Arc<CoderRegistry>,
    evaluator: Arc<dyn ExpressionEvaluator>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Configuration {
    /// Build the services described by `config`
    pub fn new(config: EngineConfig) -> Self {
        let reflectors = Arc::new(ReflectorFactory::with_class_cache(config.class_cache_enabled));
        let evaluator = Arc::new(SimpleEvaluator::with_cache_size(
            Arc::clone(&reflectors),
            config.expression_cache_size,
        ));
        Self {
            config,
            reflectors,
            coders: Arc::new(CoderRegistry::new()),
            evaluator,
        }
    }

    /// Replace the expression evaluator
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Replace the coder registry
    pub fn with_coders(mut self, coders: Arc<CoderRegistry>) -> Self {
        self.coders = coders;
        self
    }

    /// Engine settings
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Configured database id
    pub fn database_id(&self) -> Option<&str> {
        self.config.database_id.as_deref()
    }

    /// Shared metamodel cache
    pub fn reflectors(&self) -> &Arc<ReflectorFactory> {
        &self.reflectors
    }

    /// Registered value coders
    pub fn coders(&self) -> &CoderRegistry {
        &self.coders
    }

    /// Expression evaluator used by bind nodes
    pub fn evaluator(&self) -> &dyn ExpressionEvaluator {
        self.evaluator.as_ref()
    }

    /// Path navigator over `value` sharing this configuration's metamodel cache
    pub fn new_meta_object(&self, value: Value) -> MetaObject {
        MetaObject::for_object(value, Arc::clone(&self.reflectors))
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("config", &self.config)
            .field("reflectors", &self.reflectors)
            .field("coders", &self.coders)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = EngineConfig::from_json_str(r#"{"database_id": "postgres"}"#).unwrap();
        assert_eq!(config.database_id.as_deref(), Some("postgres"));
        assert!(config.class_cache_enabled);
        assert_eq!(config.expression_cache_size, DEFAULT_CACHE_SIZE);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"expression_cache_size": 0}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"database_id": " "}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str("{"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_configuration_wires_settings() {
        let configuration = Configuration::new(
            EngineConfig::default()
                .with_database_id("mysql")
                .with_class_cache(false),
        );
        assert_eq!(configuration.database_id(), Some("mysql"));
        assert!(!configuration.reflectors().is_class_cache_enabled());

        let meta = configuration.new_meta_object(Value::map([("a", 1)]));
        assert_eq!(meta.get_value("a").unwrap(), Value::Integer(1));
    }
}
