/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Engine builder for fluent configuration.
//!
//! This module provides a builder API that assembles an [`Orchestrator`] from
//! a validator registry, a configuration and global dictionaries.

use crate::config::{ValidationConfig, ValidationMode};
use crate::orchestrator::Orchestrator;
use ironcheck_dictionary::DataDictionary;
use ironcheck_validation::{SchemaResolver, ValidationMatcher, Validator, ValidatorRegistry};
use std::sync::Arc;

/// Builder for configuring a validation engine.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    /// Validators, matchers and schema resolvers.
    registry: ValidatorRegistry,
    /// Validation options.
    config: ValidationConfig,
    /// Dictionaries applied to every message.
    dictionaries: Vec<DataDictionary>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Creates a builder with the built-in validators and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: ValidatorRegistry::with_defaults(),
            config: ValidationConfig::new(),
            dictionaries: Vec::new(),
        }
    }

    /// Replaces the validator registry.
    #[must_use]
    pub fn with_registry(mut self, registry: ValidatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the validation mode.
    #[must_use]
    pub const fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.config.validation_mode = mode;
        self
    }

    /// Registers a validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.registry.register(validator);
        self
    }

    /// Registers a custom matcher.
    #[must_use]
    pub fn with_matcher(
        mut self,
        name: impl Into<String>,
        matcher: impl ValidationMatcher + 'static,
    ) -> Self {
        self.registry.register_matcher(name, matcher);
        self
    }

    /// Registers a schema resolver.
    #[must_use]
    pub fn with_schema_resolver(mut self, resolver: Arc<dyn SchemaResolver>) -> Self {
        self.registry.add_schema_resolver(resolver);
        self
    }

    /// Adds a global dictionary.
    #[must_use]
    pub fn with_global_dictionary(mut self, dictionary: DataDictionary) -> Self {
        self.dictionaries.push(dictionary);
        self
    }

    /// Returns the validator registry.
    #[must_use]
    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Returns the global dictionaries.
    #[must_use]
    pub fn dictionaries(&self) -> &[DataDictionary] {
        &self.dictionaries
    }

    /// Builds the orchestrator.
    #[must_use]
    pub fn build(self) -> Orchestrator {
        self.dictionaries.into_iter().fold(
            Orchestrator::new(self.registry, self.config),
            Orchestrator::with_global_dictionary,
        )
    }
}
