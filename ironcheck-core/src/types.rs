/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Core types for validation results and message flow.
//!
//! This module provides fundamental types used throughout the IronCheck engine:
//! - [`Mismatch`]: A single path-qualified comparison failure
//! - [`MismatchKind`]: Classification of comparison failures
//! - [`MessageDirection`]: Inbound/outbound qualifier for message processors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification of a structural comparison failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MismatchKind {
    /// Scalar or text values differ.
    Value,
    /// Values are of incompatible types (e.g. boolean vs string).
    Type,
    /// Element local names differ at the same position.
    ElementName,
    /// Namespace URIs differ, or a required namespace is not declared.
    Namespace,
    /// Number of child elements differs.
    ChildCount,
    /// A control attribute is missing in the actual element.
    MissingAttribute,
    /// The actual element carries an attribute absent in the control.
    UnexpectedAttribute,
    /// A control object member is missing in the actual object.
    MissingMember,
    /// The actual object carries a member absent in the control.
    UnexpectedMember,
    /// Array lengths differ.
    ArrayLength,
    /// A control header is missing in the actual message.
    MissingHeader,
    /// A validation matcher rejected the actual value.
    Matcher,
    /// A path expression in the control is absent in the actual document.
    MissingPath,
    /// A validation script reported failure.
    Script,
}

impl MismatchKind {
    /// Returns a short human-readable label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value mismatch",
            Self::Type => "type mismatch",
            Self::ElementName => "element name mismatch",
            Self::Namespace => "namespace mismatch",
            Self::ChildCount => "child element count mismatch",
            Self::MissingAttribute => "missing attribute",
            Self::UnexpectedAttribute => "unexpected attribute",
            Self::MissingMember => "missing member",
            Self::UnexpectedMember => "unexpected member",
            Self::ArrayLength => "array length mismatch",
            Self::MissingHeader => "missing header",
            Self::Matcher => "matcher rejected value",
            Self::MissingPath => "missing path",
            Self::Script => "script validation failed",
        }
    }
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single path-qualified comparison failure.
///
/// The path is rendered in the notation of the compared document: slash-separated
/// element names for XML (`TestRequest/Message/@id`), JSONPath for JSON
/// (`$.person.age`), and the header name for headers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mismatch {
    /// Location of the failure.
    pub path: String,
    /// The expected (control) value.
    pub expected: String,
    /// The actual value, or a marker such as `<absent>`.
    pub actual: String,
    /// Classification of the failure.
    pub kind: MismatchKind,
}

impl Mismatch {
    /// Marker used when the actual side has no value at the path.
    pub const ABSENT: &'static str = "<absent>";

    /// Creates a new mismatch.
    ///
    /// # Arguments
    /// * `path` - Location of the failure
    /// * `expected` - The control value
    /// * `actual` - The actual value
    /// * `kind` - Classification of the failure
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
        kind: MismatchKind,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
            kind,
        }
    }

    /// Creates a mismatch for a value that is absent in the actual document.
    #[must_use]
    pub fn absent(
        path: impl Into<String>,
        expected: impl Into<String>,
        kind: MismatchKind,
    ) -> Self {
        Self::new(path, expected, Self::ABSENT, kind)
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at '{}': expected '{}' but was '{}'",
            self.kind, self.path, self.expected, self.actual
        )
    }
}

/// Direction of a message relative to the test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageDirection {
    /// Messages received by the test (validation path).
    Inbound,
    /// Messages sent by the test (send path).
    Outbound,
}

impl MessageDirection {
    /// Returns the lowercase name of the direction.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl FromStr for MessageDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inbound" => Ok(Self::Inbound),
            "outbound" => Ok(Self::Outbound),
            other => Err(format!("unknown message direction: {other}")),
        }
    }
}

impl fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
