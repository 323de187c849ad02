/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message types for validation.
//!
//! This module provides:
//! - [`MessageType`]: Enumeration of payload formats
//! - [`Message`]: Owned message with payload bytes and headers

use crate::error::ParseError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix of framework-internal header names.
///
/// Control headers with this prefix are never compared.
pub const INTERNAL_HEADER_PREFIX: &str = "citrus_";

/// Payload formats understood by the engine.
///
/// Formats without a dedicated validator can be represented as `Custom(String)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MessageType {
    /// XML payload.
    #[default]
    Xml,
    /// JSON payload.
    Json,
    /// Plain text payload.
    Plaintext,
    /// Opaque binary payload.
    Binary,
    /// Custom or unknown payload type.
    Custom(String),
}

impl std::str::FromStr for MessageType {
    type Err = std::convert::Infallible;

    /// Creates a MessageType from its name.
    ///
    /// # Arguments
    /// * `s` - The type name (case-insensitive, e.g. "xml", "JSON")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "XML" | "XHTML" => Self::Xml,
            "JSON" => Self::Json,
            "PLAINTEXT" | "TEXT" => Self::Plaintext,
            "BINARY" | "BINARY_BASE64" => Self::Binary,
            _ => Self::Custom(s.to_string()),
        })
    }
}

impl MessageType {
    /// Returns the canonical name of this message type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Xml => "XML",
            Self::Json => "JSON",
            Self::Plaintext => "PLAINTEXT",
            Self::Binary => "BINARY",
            Self::Custom(s) => s.as_str(),
        }
    }

    /// Infers the message type from a textual payload.
    ///
    /// The first non-whitespace character decides: `{` or `[` is JSON, `<` is
    /// XML, anything else is plaintext. Empty payloads are plaintext.
    ///
    /// # Arguments
    /// * `payload` - The payload text
    #[must_use]
    pub fn infer(payload: &str) -> Self {
        match payload.trim_start().chars().next() {
            Some('{') | Some('[') => Self::Json,
            Some('<') => Self::Xml,
            _ => Self::Plaintext,
        }
    }

    /// Returns true if payloads of this type are structured documents.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Xml | Self::Json)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Owned message for validation and dictionary processing.
///
/// A message is immutable for comparison purposes; dictionary processors
/// replace its payload while they own it exclusively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Optional message name, used in logs.
    name: Option<String>,
    /// The payload bytes.
    payload: Bytes,
    /// Message headers; keys are case-sensitive.
    headers: BTreeMap<String, String>,
    /// Declared payload format, if any.
    message_type: Option<MessageType>,
}

impl Message {
    /// Creates a new message with the given payload.
    ///
    /// # Arguments
    /// * `payload` - The payload bytes or text
    #[must_use]
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    /// Sets the message name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Declares the payload format.
    #[must_use]
    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = Some(message_type);
        self
    }

    /// Returns the message name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Returns the payload as text.
    ///
    /// # Errors
    /// Returns `ParseError::InvalidUtf8` if the payload is not valid UTF-8.
    pub fn payload_str(&self) -> Result<&str, ParseError> {
        std::str::from_utf8(&self.payload).map_err(ParseError::from)
    }

    /// Replaces the payload.
    pub fn set_payload(&mut self, payload: impl Into<Bytes>) {
        self.payload = payload.into();
    }

    /// Returns true if the payload is empty or whitespace only.
    #[must_use]
    pub fn is_payload_empty(&self) -> bool {
        self.payload.iter().all(u8::is_ascii_whitespace)
    }

    /// Returns all headers.
    #[inline]
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Gets a header value by exact name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Gets a header value, optionally ignoring the case of the name.
    ///
    /// # Arguments
    /// * `name` - The header name
    /// * `ignore_case` - Whether to compare names case-insensitively
    #[must_use]
    pub fn find_header(&self, name: &str, ignore_case: bool) -> Option<&str> {
        if !ignore_case {
            return self.header(name);
        }
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets a header, overwriting any previous value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Returns the declared payload format.
    #[inline]
    #[must_use]
    pub fn message_type(&self) -> Option<&MessageType> {
        self.message_type.as_ref()
    }

    /// Returns the declared format, or the format inferred from the payload.
    #[must_use]
    pub fn effective_type(&self) -> MessageType {
        if let Some(message_type) = &self.message_type {
            return message_type.clone();
        }
        match self.payload_str() {
            Ok(text) => MessageType::infer(text),
            Err(_) => MessageType::Binary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_from_str() {
        assert_eq!("xml".parse::<MessageType>().unwrap(), MessageType::Xml);
        assert_eq!("JSON".parse::<MessageType>().unwrap(), MessageType::Json);
        assert_eq!(
            "plaintext".parse::<MessageType>().unwrap(),
            MessageType::Plaintext
        );
    }

    #[test]
    fn test_message_type_custom() {
        let custom: MessageType = "csv".parse().unwrap();
        assert!(matches!(custom, MessageType::Custom(_)));
        assert_eq!(custom.as_str(), "csv");
    }

    #[test]
    fn test_message_type_infer() {
        assert_eq!(MessageType::infer("  {\"a\":1}"), MessageType::Json);
        assert_eq!(MessageType::infer("[1,2]"), MessageType::Json);
        assert_eq!(MessageType::infer("\n<a/>"), MessageType::Xml);
        assert_eq!(MessageType::infer("hello"), MessageType::Plaintext);
        assert_eq!(MessageType::infer("   "), MessageType::Plaintext);
        assert_eq!(MessageType::infer(""), MessageType::Plaintext);
    }

    #[test]
    fn test_message_headers() {
        let msg = Message::new("<a/>").with_header("Operation", "sayHello");
        assert_eq!(msg.header("Operation"), Some("sayHello"));
        assert_eq!(msg.header("operation"), None);
        assert_eq!(msg.find_header("operation", true), Some("sayHello"));
    }

    #[test]
    fn test_message_effective_type() {
        assert_eq!(Message::new("{}").effective_type(), MessageType::Json);
        assert_eq!(
            Message::new("{}")
                .with_type(MessageType::Plaintext)
                .effective_type(),
            MessageType::Plaintext
        );
        assert!(Message::new(" \n").is_payload_empty());
    }
}
