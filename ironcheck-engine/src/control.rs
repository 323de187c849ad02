/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Control message templates.

use ironcheck_context::TestContext;
use ironcheck_core::error::Result;
use ironcheck_core::message::{Message, MessageType};
use std::collections::BTreeMap;
use tracing::trace;

/// Template of the expected message.
///
/// Payload and header values may contain dynamic content, which is resolved
/// against the test context when the control message is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlMessageBuilder {
    payload: Option<String>,
    headers: BTreeMap<String, String>,
    name: Option<String>,
    message_type: Option<MessageType>,
}

impl ControlMessageBuilder {
    /// Creates an empty template.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the payload template.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Adds a header template.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the message name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declares the message type.
    #[must_use]
    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = Some(message_type);
        self
    }

    /// Returns the payload template.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Returns the header templates.
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Returns the declared message type.
    #[must_use]
    pub fn message_type(&self) -> Option<&MessageType> {
        self.message_type.as_ref()
    }

    /// Builds the control message, resolving all dynamic content.
    ///
    /// # Errors
    /// Returns `ContextError` if a variable, function or script cannot be
    /// resolved.
    pub fn build(&self, context: &TestContext) -> Result<Message> {
        let payload = match &self.payload {
            Some(template) => context.resolve_content(template)?,
            None => String::new(),
        };
        let mut message = Message::new(payload);
        for (name, value) in context.resolve_map(&self.headers)? {
            message.set_header(name, value);
        }
        if let Some(name) = &self.name {
            message = message.with_name(name.clone());
        }
        if let Some(message_type) = &self.message_type {
            message = message.with_type(message_type.clone());
        }
        trace!(headers = message.headers().len(), "control message built");
        Ok(message)
    }
}
