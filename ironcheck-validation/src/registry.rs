/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Validator registry.
//!
//! Validators are a closed set of kinds, each backed by a comparator
//! function. The registry is an explicit value handed to the orchestrator, so
//! every test can build an isolated one.

use crate::contexts::ValidationContext;
use crate::matcher::{MatchOutcome, MatcherLibrary, ValidationMatcher};
use crate::schema::SchemaResolver;
use crate::{header, json, path, script, text, xml};
use ironcheck_context::TestContext;
use ironcheck_core::error::{CheckError, Result, SchemaError};
use ironcheck_core::message::{Message, MessageType};
use ironcheck_core::types::{Mismatch, MismatchKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Kind of validator, one per validation context variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidatorKind {
    /// Header map check.
    Header,
    /// Structural XML comparison.
    Xml,
    /// Structural JSON comparison.
    Json,
    /// Whole-payload text comparison.
    PlainText,
    /// XPath expression checks.
    XPath,
    /// JSONPath expression checks.
    JsonPath,
    /// Script check.
    Script,
}

impl ValidatorKind {
    /// Returns the kind that handles a validation context.
    #[must_use]
    pub const fn of(context: &ValidationContext) -> Self {
        match context {
            ValidationContext::Header(_) => Self::Header,
            ValidationContext::Xml(_) => Self::Xml,
            ValidationContext::Json(_) => Self::Json,
            ValidationContext::XPath(_) => Self::XPath,
            ValidationContext::JsonPath(_) => Self::JsonPath,
            ValidationContext::Script(_) => Self::Script,
            ValidationContext::PlainText(_) => Self::PlainText,
        }
    }
}

/// Comparison flags taken from the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    /// Header keys compared case-insensitively.
    pub header_name_ignore_case: bool,
    /// Run schema checks when a context names a schema.
    pub schema_validation: bool,
    /// Unknown matchers are errors rather than literals.
    pub fail_on_unknown_matcher: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            header_name_ignore_case: false,
            schema_validation: true,
            fail_on_unknown_matcher: true,
        }
    }
}

/// Everything a comparator needs for one validation context.
pub struct CompareInput<'a> {
    /// Received message.
    pub actual: &'a Message,
    /// Resolved control message.
    pub control: &'a Message,
    /// Resolved message type of the exchange.
    pub message_type: &'a MessageType,
    /// Validation context being checked.
    pub context: &'a ValidationContext,
    /// Registered matchers.
    pub matchers: &'a MatcherLibrary,
    /// Registered schema resolvers.
    pub schemas: &'a [Arc<dyn SchemaResolver>],
    /// Comparison flags.
    pub options: CompareOptions,
}

impl CompareInput<'_> {
    /// Compares one value, honoring matchers in the control value.
    ///
    /// # Errors
    /// Returns an error for unknown matchers when configured to fail on them.
    pub fn compare_value(
        &self,
        path: &str,
        field: &str,
        control: &str,
        actual: &str,
        test_context: &mut TestContext,
    ) -> Result<Option<Mismatch>> {
        let outcome = self.matchers.evaluate(
            field,
            control,
            actual,
            test_context,
            self.options.fail_on_unknown_matcher,
        )?;
        Ok(match outcome {
            Some(MatchOutcome::Ignored | MatchOutcome::Passed) => None,
            Some(MatchOutcome::Failed(reason)) => {
                debug!(path, %reason, "matcher rejected value");
                Some(Mismatch::new(path, control, actual, MismatchKind::Matcher))
            }
            None if control == actual => None,
            None => Some(Mismatch::new(path, control, actual, MismatchKind::Value)),
        })
    }

    /// Runs the schema check of the context, if any.
    ///
    /// # Errors
    /// Returns `SchemaError` if no resolver supports the message type or the
    /// payload violates the schema.
    pub fn check_schema(&self, payload: &str) -> Result<()> {
        let Some(schema) = self.context.schema() else {
            return Ok(());
        };
        if !self.options.schema_validation {
            warn!(schema, "schema validation disabled, skipping schema check");
            return Ok(());
        }
        let resolver = self
            .schemas
            .iter()
            .find(|resolver| resolver.supports(self.message_type))
            .ok_or_else(|| SchemaError::UnknownSchema {
                schema: schema.to_string(),
            })?;
        debug!(schema, "validating payload against schema");
        resolver.validate(payload, schema)?;
        Ok(())
    }
}

/// Comparator function: returns the mismatches found for one context.
pub type CompareFn = fn(&CompareInput<'_>, &mut TestContext) -> Result<Vec<Mismatch>>;

/// A named comparator of one kind.
#[derive(Clone)]
pub struct Validator {
    name: String,
    kind: ValidatorKind,
    message_types: Vec<MessageType>,
    compare: CompareFn,
}

impl Validator {
    /// Creates a validator supporting every message type.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ValidatorKind, compare: CompareFn) -> Self {
        Self {
            name: name.into(),
            kind,
            message_types: Vec::new(),
            compare,
        }
    }

    /// Restricts the validator to a message type. May be called repeatedly.
    #[must_use]
    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_types.push(message_type);
        self
    }

    /// Returns the validator name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the validator kind.
    #[must_use]
    pub fn kind(&self) -> ValidatorKind {
        self.kind
    }

    /// Returns true if the validator handles the message type.
    #[must_use]
    pub fn supports(&self, message_type: &MessageType) -> bool {
        self.message_types.is_empty() || self.message_types.contains(message_type)
    }

    /// Runs the comparator.
    ///
    /// # Errors
    /// Propagates comparator errors.
    pub fn compare(
        &self,
        input: &CompareInput<'_>,
        context: &mut TestContext,
    ) -> Result<Vec<Mismatch>> {
        (self.compare)(input, context)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("message_types", &self.message_types)
            .finish()
    }
}

/// Registered validators, default validators per type, matchers and schemas.
#[derive(Clone)]
pub struct ValidatorRegistry {
    validators: Vec<Validator>,
    defaults: HashMap<MessageType, String>,
    matchers: MatcherLibrary,
    schemas: Vec<Arc<dyn SchemaResolver>>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ValidatorRegistry {
    /// Creates a registry without validators and with the built-in matchers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
            defaults: HashMap::new(),
            matchers: MatcherLibrary::builtins(),
            schemas: Vec::new(),
        }
    }

    /// Creates a registry with the built-in validators.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Validator::new("header", ValidatorKind::Header, header::compare_headers));
        registry.register(
            Validator::new("xml", ValidatorKind::Xml, xml::compare_xml)
                .with_message_type(MessageType::Xml),
        );
        registry.register(
            Validator::new("json", ValidatorKind::Json, json::compare_json)
                .with_message_type(MessageType::Json),
        );
        registry.register(
            Validator::new("plaintext", ValidatorKind::PlainText, text::compare_text)
                .with_message_type(MessageType::Plaintext)
                .with_message_type(MessageType::Binary),
        );
        registry.register(
            Validator::new("xpath", ValidatorKind::XPath, path::compare_xpath)
                .with_message_type(MessageType::Xml),
        );
        registry.register(
            Validator::new("jsonpath", ValidatorKind::JsonPath, path::compare_jsonpath)
                .with_message_type(MessageType::Json),
        );
        registry.register(Validator::new("script", ValidatorKind::Script, script::compare_script));
        registry.set_default(MessageType::Xml, "xml");
        registry.set_default(MessageType::Json, "json");
        registry.set_default(MessageType::Plaintext, "plaintext");
        registry.set_default(MessageType::Binary, "plaintext");
        registry
    }

    /// Registers a validator. A validator with the same name is replaced.
    pub fn register(&mut self, validator: Validator) {
        match self.validators.iter_mut().find(|v| v.name == validator.name) {
            Some(existing) => *existing = validator,
            None => self.validators.push(validator),
        }
    }

    /// Sets the default validator used for a message type.
    pub fn set_default(&mut self, message_type: MessageType, validator: impl Into<String>) {
        self.defaults.insert(message_type, validator.into());
    }

    /// Registers a custom matcher.
    pub fn register_matcher(
        &mut self,
        name: impl Into<String>,
        matcher: impl ValidationMatcher + 'static,
    ) {
        self.matchers.register(name, matcher);
    }

    /// Registers a schema resolver.
    pub fn add_schema_resolver(&mut self, resolver: Arc<dyn SchemaResolver>) {
        self.schemas.push(resolver);
    }

    /// Gets a validator by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Validator> {
        self.validators.iter().find(|v| v.name == name)
    }

    /// Returns the matcher library.
    #[must_use]
    pub fn matchers(&self) -> &MatcherLibrary {
        &self.matchers
    }

    /// Returns the schema resolvers.
    #[must_use]
    pub fn schemas(&self) -> &[Arc<dyn SchemaResolver>] {
        &self.schemas
    }

    /// Selects the validators for a context and message type.
    ///
    /// Explicitly named validators that support the context and type win;
    /// otherwise every registered validator of the context's kind supporting
    /// the type is used; otherwise the default validator of the type.
    ///
    /// # Errors
    /// Returns `CheckError::UnsupportedMessageType` if nothing applies.
    pub fn select(
        &self,
        context: &ValidationContext,
        message_type: &MessageType,
        explicit: &[String],
    ) -> Result<Vec<&Validator>> {
        let kind = ValidatorKind::of(context);
        let applies =
            |validator: &&Validator| validator.kind == kind && validator.supports(message_type);

        let chosen: Vec<&Validator> = explicit
            .iter()
            .filter_map(|name| {
                let found = self.get(name);
                if found.is_none() {
                    warn!(validator = %name, "explicit validator is not registered");
                }
                found
            })
            .filter(applies)
            .collect();
        if !chosen.is_empty() {
            return Ok(chosen);
        }

        let candidates: Vec<&Validator> = self.validators.iter().filter(applies).collect();
        if !candidates.is_empty() {
            return Ok(candidates);
        }

        self.defaults
            .get(message_type)
            .and_then(|name| self.get(name))
            .map(|validator| vec![validator])
            .ok_or_else(|| CheckError::UnsupportedMessageType {
                message_type: message_type.to_string(),
            })
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("validators", &self.validators)
            .field("defaults", &self.defaults)
            .field("matchers", &self.matchers)
            .field("schemas", &self.schemas.len())
            .finish()
    }
}
