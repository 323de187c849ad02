/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronCheck Core
//!
//! Core types and error definitions for the IronCheck message validation engine.
//!
//! This crate provides the fundamental building blocks used across all IronCheck crates:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Message types**: `Message`, `MessageType`, and type inference
//! - **Documents**: Parsed payload views (`Document`, `XmlDocument`, JSON values)
//! - **Core types**: `Mismatch`, `MismatchKind`, `MessageDirection`
//!
//! ## Owned Design
//!
//! Messages own their payload as [`bytes::Bytes`] so that they can be cloned cheaply
//! between the actions of a test case. Parsed documents are owned trees which can be
//! rewritten by data dictionaries and serialized back into a payload.

pub mod document;
pub mod error;
pub mod message;
pub mod types;
pub mod xml;

pub use document::Document;
pub use error::{
    CheckError, ContextError, ParseError, PathError, Result, SchemaError, ValidationError,
};
pub use message::{Message, MessageType};
pub use types::{MessageDirection, Mismatch, MismatchKind};
pub use xml::{QName, XmlAttribute, XmlDocument, XmlElement, XmlNode};
