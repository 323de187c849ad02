/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Validation orchestrator.
//!
//! A validation run moves through a fixed sequence of states:
//!
//! ```text
//! BuildControl -> ResolveDynamic -> ApplyDictionary -> SelectValidators
//!     -> Compare (once per context) -> ExtractVariables -> Done
//! ```
//!
//! Any failure aborts the run. Comparison is fail-fast: the first context
//! reporting mismatches raises a `ValidationError` carrying only its own
//! mismatches, and no variables are extracted. Variables written by matchers
//! or the callback are committed to the context only once every context has
//! passed.

use crate::config::{ValidationConfig, ValidationMode};
use crate::control::ControlMessageBuilder;
use crate::request::ValidationRequest;
use ironcheck_context::{MessageProcessor, TestContext};
use ironcheck_core::error::{CheckError, Result, ValidationError};
use ironcheck_core::message::{Message, MessageType};
use ironcheck_core::types::MessageDirection;
use ironcheck_dictionary::{DataDictionary, DictionaryScope};
use ironcheck_validation::{
    CompareInput, HeaderValidationContext, ValidationContext, ValidatorRegistry,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// States of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Building the control message from its template.
    BuildControl,
    /// Resolving dynamic content of the control message.
    ResolveDynamic,
    /// Applying global and local dictionaries.
    ApplyDictionary,
    /// Choosing validators for the message type.
    SelectValidators,
    /// Comparing one validation context.
    Compare,
    /// Writing extracted values into the context.
    ExtractVariables,
    /// The run passed.
    Done,
}

impl OrchestratorState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BuildControl => "BuildControl",
            Self::ResolveDynamic => "ResolveDynamic",
            Self::ApplyDictionary => "ApplyDictionary",
            Self::SelectValidators => "SelectValidators",
            Self::Compare => "Compare",
            Self::ExtractVariables => "ExtractVariables",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives validation of received messages and preparation of sent ones.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    registry: ValidatorRegistry,
    config: ValidationConfig,
    global_dictionaries: Vec<Arc<DataDictionary>>,
}

impl Orchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(registry: ValidatorRegistry, config: ValidationConfig) -> Self {
        Self {
            registry,
            config,
            global_dictionaries: Vec::new(),
        }
    }

    /// Adds a global dictionary installed into every context created by
    /// [`Orchestrator::create_context`].
    #[must_use]
    pub fn with_global_dictionary(mut self, dictionary: DataDictionary) -> Self {
        self.global_dictionaries
            .push(Arc::new(dictionary.with_scope(DictionaryScope::Global)));
        self
    }

    /// Returns the validator registry.
    #[must_use]
    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Returns the global dictionaries.
    #[must_use]
    pub fn global_dictionaries(&self) -> &[Arc<DataDictionary>] {
        &self.global_dictionaries
    }

    /// Creates a test context with the global dictionaries installed as
    /// message processors.
    #[must_use]
    pub fn create_context(&self) -> TestContext {
        let mut context = TestContext::new();
        for dictionary in &self.global_dictionaries {
            context.add_message_processor(Arc::clone(dictionary) as Arc<dyn MessageProcessor>);
        }
        context
    }

    /// Validates a received message.
    ///
    /// # Arguments
    /// * `actual` - The received message
    /// * `request` - Control template, contexts, extractors and callback
    /// * `context` - The test context; extracted variables are written here
    ///
    /// # Errors
    /// - `ContextError` if dynamic content cannot be resolved
    /// - `ValidationError` naming the first failing context and its mismatches
    /// - `PathError` for missing or invalid paths
    /// - `UnsupportedMessageType` if no validator applies
    /// - `ParseError` / `SchemaError` for malformed or invalid payloads
    pub fn validate(
        &self,
        actual: &Message,
        request: &ValidationRequest,
        context: &mut TestContext,
    ) -> Result<()> {
        trace_state(OrchestratorState::BuildControl);
        trace_state(OrchestratorState::ResolveDynamic);
        let mut control = request.control().build(context)?;
        let message_type = self.resolve_message_type(actual, &control);
        if control.message_type().is_none() {
            control = control.with_type(message_type.clone());
        }

        trace_state(OrchestratorState::ApplyDictionary);
        context.process_message(&mut control, MessageDirection::Inbound)?;
        if let Some(dictionary) = request.dictionary() {
            control = dictionary.apply(control, MessageDirection::Inbound, context)?;
        }

        trace_state(OrchestratorState::SelectValidators);
        let contexts = self.plan_contexts(request, &control, &message_type)?;
        let input_options = self.config.compare_options();

        // Matchers such as `@variable()@` write during compare; stage them.
        let mut scratch = context.clone();
        for validation in &contexts {
            trace_state(OrchestratorState::Compare);
            let validators = self.registry.select(validation, &message_type, request.validators())?;
            let input = CompareInput {
                actual,
                control: &control,
                message_type: &message_type,
                context: validation,
                matchers: self.registry.matchers(),
                schemas: self.registry.schemas(),
                options: input_options,
            };
            for validator in validators {
                debug!(context = validation.name(), validator = validator.name(), "comparing");
                let mismatches = validator.compare(&input, &mut scratch)?;
                if !mismatches.is_empty() {
                    info!(
                        context = validation.name(),
                        validator = validator.name(),
                        mismatches = mismatches.len(),
                        "validation failed"
                    );
                    return Err(ValidationError::new(validation.name(), mismatches).into());
                }
            }
        }

        if let Some(callback) = request.callback() {
            debug!(mode = ?self.config.validation_mode, "running validation callback");
            callback.validate(actual, &mut scratch)?;
        }
        *context = scratch;

        trace_state(OrchestratorState::ExtractVariables);
        for extractor in request.extractors() {
            extractor.extract(actual, context)?;
        }

        trace_state(OrchestratorState::Done);
        info!(
            message_type = %message_type,
            contexts = contexts.len(),
            "validation passed"
        );
        Ok(())
    }

    /// Builds an outbound message and applies outbound dictionaries.
    ///
    /// Global dictionaries run first, then the local one.
    ///
    /// # Errors
    /// Returns `ContextError` if dynamic content cannot be resolved, or
    /// `ParseError` if a dictionary cannot parse the payload.
    pub fn prepare_outbound(
        &self,
        control: &ControlMessageBuilder,
        dictionary: Option<&DataDictionary>,
        context: &TestContext,
    ) -> Result<Message> {
        let mut message = control.build(context)?;
        if message.message_type().is_none() {
            if let Some(message_type) = &self.config.default_message_type {
                message = message.with_type(message_type.clone());
            }
        }
        context.process_message(&mut message, MessageDirection::Outbound)?;
        if let Some(dictionary) = dictionary {
            message = dictionary.apply(message, MessageDirection::Outbound, context)?;
        }
        debug!(message_type = %message.effective_type(), "outbound message prepared");
        Ok(message)
    }

    /// Resolves the message type of an exchange.
    ///
    /// An explicit type on the control or actual message wins, then the
    /// configured default, then inference from the actual payload, then from
    /// the control payload. XML is assumed when both payloads are empty.
    #[must_use]
    pub fn resolve_message_type(&self, actual: &Message, control: &Message) -> MessageType {
        if let Some(message_type) = control
            .message_type()
            .or_else(|| actual.message_type())
            .or(self.config.default_message_type.as_ref())
        {
            return message_type.clone();
        }
        if !actual.is_payload_empty() {
            return actual.effective_type();
        }
        if !control.is_payload_empty() {
            return control.effective_type();
        }
        MessageType::Xml
    }

    /// Orders the contexts of a run: header contexts first, then the
    /// remaining ones in declaration order, then the default payload context
    /// if none was declared.
    fn plan_contexts(
        &self,
        request: &ValidationRequest,
        control: &Message,
        message_type: &MessageType,
    ) -> Result<Vec<ValidationContext>> {
        let (mut contexts, others): (Vec<ValidationContext>, Vec<ValidationContext>) = request
            .contexts()
            .iter()
            .cloned()
            .partition(ValidationContext::is_header);
        if contexts.is_empty() {
            contexts.push(ValidationContext::Header(HeaderValidationContext::new()));
        }

        let exclusive = self.config.validation_mode == ValidationMode::Exclusive;
        if request.callback().is_some() && exclusive {
            debug!("exclusive callback, skipping structural validators");
            return Ok(contexts);
        }

        let declares_payload = others.iter().any(ValidationContext::is_payload);
        contexts.extend(others);
        if !declares_payload && !control.is_payload_empty() {
            let default = ValidationContext::default_for(message_type).ok_or_else(|| {
                CheckError::UnsupportedMessageType {
                    message_type: message_type.to_string(),
                }
            })?;
            contexts.push(default);
        }
        Ok(contexts)
    }
}

fn trace_state(state: OrchestratorState) {
    trace!(%state, "orchestrator state");
}
