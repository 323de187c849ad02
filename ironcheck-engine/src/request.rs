/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Validation requests.
//!
//! A request bundles everything one receive action asks the orchestrator to
//! check: the control template, validation contexts, extractors, an optional
//! callback and an optional local dictionary.

use crate::control::ControlMessageBuilder;
use ironcheck_dictionary::DataDictionary;
use ironcheck_path::VariableExtractor;
use ironcheck_validation::{ValidationCallback, ValidationContext};
use std::fmt;
use std::sync::Arc;

/// Immutable description of one validation run.
#[derive(Clone, Default)]
pub struct ValidationRequest {
    control: ControlMessageBuilder,
    contexts: Vec<ValidationContext>,
    extractors: Vec<VariableExtractor>,
    callback: Option<Arc<dyn ValidationCallback>>,
    dictionary: Option<DataDictionary>,
    validators: Vec<String>,
}

impl ValidationRequest {
    /// Starts building a request.
    #[must_use]
    pub fn builder() -> ValidationRequestBuilder {
        ValidationRequestBuilder::new()
    }

    /// Returns the control message template.
    #[must_use]
    pub fn control(&self) -> &ControlMessageBuilder {
        &self.control
    }

    /// Returns the validation contexts in declaration order.
    #[must_use]
    pub fn contexts(&self) -> &[ValidationContext] {
        &self.contexts
    }

    /// Returns the variable extractors in declaration order.
    #[must_use]
    pub fn extractors(&self) -> &[VariableExtractor] {
        &self.extractors
    }

    /// Returns the custom validation callback.
    #[must_use]
    pub fn callback(&self) -> Option<&Arc<dyn ValidationCallback>> {
        self.callback.as_ref()
    }

    /// Returns the local dictionary.
    #[must_use]
    pub fn dictionary(&self) -> Option<&DataDictionary> {
        self.dictionary.as_ref()
    }

    /// Returns the explicitly selected validator names.
    #[must_use]
    pub fn validators(&self) -> &[String] {
        &self.validators
    }
}

impl fmt::Debug for ValidationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRequest")
            .field("control", &self.control)
            .field("contexts", &self.contexts)
            .field("extractors", &self.extractors)
            .field("callback", &self.callback.is_some())
            .field("dictionary", &self.dictionary.as_ref().map(|d| d.name.as_str()))
            .field("validators", &self.validators)
            .finish()
    }
}

/// Builder for [`ValidationRequest`].
#[derive(Default)]
pub struct ValidationRequestBuilder {
    request: ValidationRequest,
}

impl ValidationRequestBuilder {
    /// Creates a builder for an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the control message template.
    #[must_use]
    pub fn control(mut self, control: ControlMessageBuilder) -> Self {
        self.request.control = control;
        self
    }

    /// Sets the control payload template.
    #[must_use]
    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.request.control = self.request.control.with_payload(payload);
        self
    }

    /// Adds a control header template.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.control = self.request.control.with_header(name, value);
        self
    }

    /// Adds a validation context.
    #[must_use]
    pub fn context(mut self, context: impl Into<ValidationContext>) -> Self {
        self.request.contexts.push(context.into());
        self
    }

    /// Adds a variable extractor.
    #[must_use]
    pub fn extract(mut self, extractor: VariableExtractor) -> Self {
        self.request.extractors.push(extractor);
        self
    }

    /// Sets the custom validation callback.
    #[must_use]
    pub fn callback(mut self, callback: impl ValidationCallback + 'static) -> Self {
        self.request.callback = Some(Arc::new(callback));
        self
    }

    /// Attaches a local dictionary.
    #[must_use]
    pub fn dictionary(mut self, dictionary: DataDictionary) -> Self {
        self.request.dictionary = Some(dictionary);
        self
    }

    /// Selects a validator by name. May be called repeatedly.
    #[must_use]
    pub fn validator(mut self, name: impl Into<String>) -> Self {
        self.request.validators.push(name.into());
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> ValidationRequest {
        self.request
    }
}

impl fmt::Debug for ValidationRequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRequestBuilder")
            .field("request", &self.request)
            .finish()
    }
}
