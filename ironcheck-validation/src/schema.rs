/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Schema validation capability.

use ironcheck_core::error::SchemaError;
use ironcheck_core::message::MessageType;
use serde_json::Value;
use std::collections::HashMap;

/// External schema validation capability.
///
/// Calls are synchronous and expected to be free of side effects.
pub trait SchemaResolver: Send + Sync {
    /// Returns true if the resolver validates payloads of the given type.
    fn supports(&self, message_type: &MessageType) -> bool;

    /// Validates a payload against a schema reference.
    ///
    /// # Errors
    /// Returns `SchemaError` if the schema is unknown, cannot be loaded, or
    /// the payload violates it.
    fn validate(&self, payload: &str, schema: &str) -> Result<(), SchemaError>;
}

/// JSON schemas registered by name.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaRepository {
    schemas: HashMap<String, Value>,
}

impl JsonSchemaRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a parsed schema.
    #[must_use]
    pub fn with_schema(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }

    /// Registers a schema given as JSON text.
    ///
    /// # Errors
    /// Returns `SchemaError::Load` if the text is not JSON.
    pub fn add_schema_str(
        &mut self,
        name: impl Into<String>,
        schema: &str,
    ) -> Result<(), SchemaError> {
        let name = name.into();
        let value = serde_json::from_str(schema).map_err(|err| SchemaError::Load {
            schema: name.clone(),
            reason: err.to_string(),
        })?;
        self.schemas.insert(name, value);
        Ok(())
    }

    /// Returns true if a schema is registered under the name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }
}

impl SchemaResolver for JsonSchemaRepository {
    fn supports(&self, message_type: &MessageType) -> bool {
        *message_type == MessageType::Json
    }

    fn validate(&self, payload: &str, schema: &str) -> Result<(), SchemaError> {
        let definition = self
            .schemas
            .get(schema)
            .ok_or_else(|| SchemaError::UnknownSchema {
                schema: schema.to_string(),
            })?;
        let validator = jsonschema::validator_for(definition).map_err(|err| SchemaError::Load {
            schema: schema.to_string(),
            reason: err.to_string(),
        })?;
        let instance: Value = serde_json::from_str(payload).map_err(|err| SchemaError::Violation {
            schema: schema.to_string(),
            violations: vec![format!("payload is not JSON: {err}")],
        })?;

        let violations: Vec<String> = validator
            .iter_errors(&instance)
            .map(|err| format!("{}: {err}", err.instance_path))
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Violation {
                schema: schema.to_string(),
                violations,
            })
        }
    }
}
