/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Parsed payload documents.
//!
//! A [`Document`] is the structured view of a message payload that comparators,
//! path expressions and data dictionaries operate on.

use crate::error::ParseError;
use crate::message::{Message, MessageType};
use crate::xml::XmlDocument;
use serde_json::Value;

/// Structured view of a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// XML tree.
    Xml(XmlDocument),
    /// JSON value tree.
    Json(Value),
    /// Plain text.
    Text(String),
}

impl Document {
    /// Parses payload text as the given message type.
    ///
    /// XML and JSON payloads are parsed into trees; every other type is kept
    /// as text.
    ///
    /// # Errors
    /// Returns `ParseError` if a structured payload is malformed.
    pub fn parse(text: &str, message_type: &MessageType) -> Result<Self, ParseError> {
        match message_type {
            MessageType::Xml => Ok(Self::Xml(XmlDocument::parse(text)?)),
            MessageType::Json => serde_json::from_str(text)
                .map(Self::Json)
                .map_err(|err| ParseError::Json {
                    reason: err.to_string(),
                }),
            _ => Ok(Self::Text(text.to_string())),
        }
    }

    /// Parses the payload of a message using its effective type.
    ///
    /// # Errors
    /// Returns `ParseError` if the payload is not UTF-8 or is malformed.
    pub fn from_message(message: &Message) -> Result<Self, ParseError> {
        Self::parse(message.payload_str()?, &message.effective_type())
    }

    /// Serializes the document back into payload text.
    #[must_use]
    pub fn to_payload(&self) -> String {
        match self {
            Self::Xml(doc) => doc.to_xml_string(),
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }

    /// Returns the message type that corresponds to this document.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Xml(_) => MessageType::Xml,
            Self::Json(_) => MessageType::Json,
            Self::Text(_) => MessageType::Plaintext,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_document() {
        let doc = Document::parse("{\"a\":1}", &MessageType::Json).unwrap();
        assert_eq!(doc, Document::Json(serde_json::json!({"a": 1})));
        assert_eq!(doc.to_payload(), "{\"a\":1}");
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = Document::parse("{\"a\":", &MessageType::Json).unwrap_err();
        assert!(matches!(err, ParseError::Json { .. }));
    }

    #[test]
    fn test_document_from_message() {
        let msg = Message::new("<a>1</a>");
        let doc = Document::from_message(&msg).unwrap();
        assert_eq!(doc.message_type(), MessageType::Xml);
        let text = Document::from_message(&Message::new("hello")).unwrap();
        assert_eq!(text, Document::Text("hello".to_string()));
    }
}
