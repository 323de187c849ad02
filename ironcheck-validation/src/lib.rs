/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronCheck Validation
//!
//! Structural comparators and validators for the IronCheck engine.
//!
//! This crate provides:
//! - **Validation contexts**: Header, XML, JSON, XPath, JSONPath, script and plain text
//! - **Comparators**: Recursive XML and JSON tree comparison, header and text checks
//! - **Matchers**: `@name(args)@` predicates inside control values, including `@ignore@`
//! - **Registry**: Validator selection by context kind and message type
//! - **Schemas**: Pluggable schema resolvers, with a JSON Schema repository
//!
//! Comparators never stop at the first difference: they return every
//! [`Mismatch`](ironcheck_core::Mismatch) found for a context, each qualified
//! by its path in the compared document.

pub mod callback;
pub mod contexts;
pub mod header;
pub mod json;
pub mod matcher;
pub mod path;
pub mod registry;
pub mod schema;
pub mod script;
pub mod text;
pub mod xml;

pub use callback::ValidationCallback;
pub use contexts::{
    HeaderValidationContext, JsonValidationContext, PathValidationContext,
    PlainTextValidationContext, ScriptValidationContext, ValidationContext, XmlValidationContext,
};
pub use matcher::{
    IGNORE_PLACEHOLDER, MatchOutcome, MatcherExpression, MatcherFailure, MatcherLibrary,
    ValidationMatcher, is_ignore, parse_matcher,
};
pub use registry::{
    CompareFn, CompareInput, CompareOptions, Validator, ValidatorKind, ValidatorRegistry,
};
pub use schema::{JsonSchemaRepository, SchemaResolver};
