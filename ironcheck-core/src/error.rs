/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the IronCheck validation engine.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across all IronCheck operations. Every error aborts the
//! current test action; there is no recoverable error category.

use crate::types::Mismatch;
use std::fmt;
use thiserror::Error;

/// Result type alias using [`CheckError`] as the error type.
pub type Result<T> = std::result::Result<T, CheckError>;

/// Top-level error type for all IronCheck operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// Error while resolving dynamic content against the test context.
    #[error("context error: {0}")]
    Context(#[from] ContextError),

    /// Error while parsing or evaluating a path expression.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// Structural comparison reported one or more mismatches.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Payload could not be parsed as the declared or inferred format.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Schema validation failed or could not be performed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// No validator is registered for the message type.
    #[error("unsupported message type: {message_type}")]
    UnsupportedMessageType {
        /// The declared or inferred message type.
        message_type: String,
    },
}

/// Errors raised while resolving variables, functions and scripts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A `${name}` placeholder references a variable that is not set.
    #[error("unresolved variable in expression: ${{{name}}}")]
    UnresolvedVariable {
        /// The variable name.
        name: String,
    },

    /// A direct variable lookup failed.
    #[error("unknown variable: {name}")]
    UnknownVariable {
        /// The variable name.
        name: String,
    },

    /// The function prefix or function name is not registered.
    #[error("unknown function: {name}")]
    UnknownFunction {
        /// The qualified function name (`prefix:name`).
        name: String,
    },

    /// A function failed while computing its result.
    #[error("function '{function}' failed: {reason}")]
    FunctionExecution {
        /// The qualified function name.
        function: String,
        /// Description of the underlying failure.
        reason: String,
    },

    /// A script could not be evaluated.
    #[error("script execution failed for engine '{engine}': {reason}")]
    ScriptExecution {
        /// The script engine name.
        engine: String,
        /// Description of the underlying failure.
        reason: String,
    },

    /// A dynamic expression is syntactically malformed.
    #[error("invalid expression '{expression}': {reason}")]
    InvalidExpression {
        /// The offending expression.
        expression: String,
        /// Why the expression is invalid.
        reason: String,
    },
}

/// Errors raised by the path language.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The address does not exist in the document.
    #[error("no element found for path: {path}")]
    NotFound {
        /// The path expression.
        path: String,
    },

    /// The expression could not be parsed.
    #[error("invalid path expression '{expression}': {reason}")]
    InvalidExpression {
        /// The path expression.
        expression: String,
        /// Why the expression is invalid.
        reason: String,
    },

    /// A namespace prefix in the expression is not bound to a URI.
    #[error("unbound namespace prefix '{prefix}' in path: {expression}")]
    UnboundPrefix {
        /// The unbound prefix.
        prefix: String,
        /// The path expression.
        expression: String,
    },
}

/// Errors raised while parsing a message payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The payload is not well-formed XML.
    #[error("malformed xml payload: {reason}")]
    Xml {
        /// Parser diagnostic.
        reason: String,
    },

    /// The payload is not well-formed JSON.
    #[error("malformed json payload: {reason}")]
    Json {
        /// Parser diagnostic.
        reason: String,
    },

    /// The payload is not valid UTF-8.
    #[error("invalid utf-8 in payload: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Errors raised by schema validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The payload violates the schema.
    #[error("payload violates schema '{schema}': {}", .violations.join("; "))]
    Violation {
        /// The schema reference.
        schema: String,
        /// Individual violation descriptions.
        violations: Vec<String>,
    },

    /// The schema reference is not known to any resolver.
    #[error("unknown schema: {schema}")]
    UnknownSchema {
        /// The schema reference.
        schema: String,
    },

    /// The schema itself could not be loaded or compiled.
    #[error("failed to load schema '{schema}': {reason}")]
    Load {
        /// The schema reference.
        schema: String,
        /// Reason for failure.
        reason: String,
    },
}

/// Structural comparison failure for one validation context.
///
/// Carries every mismatch reported by the first failing context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the validation context that failed.
    pub context: String,
    /// Path-qualified mismatches.
    pub mismatches: Vec<Mismatch>,
}

impl ValidationError {
    /// Creates a new validation error.
    ///
    /// # Arguments
    /// * `context` - Name of the failing validation context
    /// * `mismatches` - The reported mismatches
    #[must_use]
    pub fn new(context: impl Into<String>, mismatches: Vec<Mismatch>) -> Self {
        Self {
            context: context.into(),
            mismatches,
        }
    }

    /// Returns the first reported mismatch.
    #[must_use]
    pub fn first(&self) -> Option<&Mismatch> {
        self.mismatches.first()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} validation failed with {} mismatch(es): ",
            self.context,
            self.mismatches.len()
        )?;
        for (i, mismatch) in self.mismatches.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{mismatch}")?;
        }
        Ok(())
    }
}
