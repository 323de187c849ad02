/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Validation contexts.
//!
//! A validation context describes how one aspect of a received message is
//! checked. Several contexts may be attached to one receive; all must pass.

use ironcheck_core::message::MessageType;
use ironcheck_path::Namespaces;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderValidationContext {
    /// Overrides the configured header name case handling.
    pub header_name_ignore_case: Option<bool>,
}

impl HeaderValidationContext {
    /// Creates a context using the configured case handling.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides header name case handling.
    #[must_use]
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.header_name_ignore_case = Some(ignore_case);
        self
    }
}

/// XML payload validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlValidationContext {
    /// Paths whose subtrees are excluded from comparison.
    pub ignore_expressions: Vec<String>,
    /// Prefix to URI pairs that must be declared on the actual root element.
    ///
    /// The entry keyed `""` is the default namespace; it is also applied to
    /// unprefixed control elements.
    pub control_namespaces: BTreeMap<String, String>,
    /// Prefix bindings for XPath ignore expressions.
    pub namespaces: Namespaces,
    /// Schema reference checked before comparison.
    pub schema: Option<String>,
}

impl XmlValidationContext {
    /// Creates an empty XML context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an ignore expression.
    #[must_use]
    pub fn with_ignore(mut self, expression: impl Into<String>) -> Self {
        self.ignore_expressions.push(expression.into());
        self
    }

    /// Adds a control namespace. Use `""` as prefix for the default namespace.
    #[must_use]
    pub fn with_control_namespace(
        mut self,
        prefix: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        self.control_namespaces.insert(prefix.into(), uri.into());
        self
    }

    /// Binds a prefix for XPath ignore expressions.
    #[must_use]
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    /// Sets the schema reference.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// JSON payload validation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonValidationContext {
    /// Paths whose subtrees are excluded from comparison.
    pub ignore_expressions: Vec<String>,
    /// Schema reference checked before comparison.
    pub schema: Option<String>,
    /// Rejects actual members that the control does not declare.
    pub strict: bool,
}

impl Default for JsonValidationContext {
    fn default() -> Self {
        Self {
            ignore_expressions: Vec::new(),
            schema: None,
            strict: true,
        }
    }
}

impl JsonValidationContext {
    /// Creates a strict JSON context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an ignore expression.
    #[must_use]
    pub fn with_ignore(mut self, expression: impl Into<String>) -> Self {
        self.ignore_expressions.push(expression.into());
        self
    }

    /// Sets the schema reference.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets strict member checking.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Path expression validation settings, shared by XPath and JSONPath contexts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathValidationContext {
    /// Expression to expected value pairs, in declaration order.
    ///
    /// Expected values may contain dynamic content and matchers.
    pub expressions: Vec<(String, String)>,
    /// Prefix bindings, XPath only.
    pub namespaces: Namespaces,
}

impl PathValidationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an expression with its expected value.
    #[must_use]
    pub fn with_expression(
        mut self,
        expression: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        self.expressions.push((expression.into(), expected.into()));
        self
    }

    /// Binds a namespace prefix.
    #[must_use]
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }
}

/// Script validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptValidationContext {
    /// Script engine name.
    pub engine: String,
    /// Script text; may contain dynamic content.
    pub script: String,
}

impl ScriptValidationContext {
    /// Creates a script context.
    #[must_use]
    pub fn new(engine: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            script: script.into(),
        }
    }
}

/// Plain text validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainTextValidationContext {
    /// Collapses whitespace runs before comparing.
    pub ignore_whitespace: bool,
}

impl PlainTextValidationContext {
    /// Creates a plain text context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whitespace handling.
    #[must_use]
    pub fn with_ignore_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_whitespace = ignore;
        self
    }
}

/// One validation aspect of a received message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationContext {
    /// Header map check.
    Header(HeaderValidationContext),
    /// Structural XML comparison.
    Xml(XmlValidationContext),
    /// Structural JSON comparison.
    Json(JsonValidationContext),
    /// XPath expression checks.
    XPath(PathValidationContext),
    /// JSONPath expression checks.
    JsonPath(PathValidationContext),
    /// Script check.
    Script(ScriptValidationContext),
    /// Whole-payload text comparison.
    PlainText(PlainTextValidationContext),
}

impl ValidationContext {
    /// Returns the context name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Header(_) => "header",
            Self::Xml(_) => "xml",
            Self::Json(_) => "json",
            Self::XPath(_) => "xpath",
            Self::JsonPath(_) => "jsonpath",
            Self::Script(_) => "script",
            Self::PlainText(_) => "plaintext",
        }
    }

    /// Returns true for header contexts.
    #[must_use]
    pub const fn is_header(&self) -> bool {
        matches!(self, Self::Header(_))
    }

    /// Returns true for contexts that compare the whole payload structurally.
    #[must_use]
    pub const fn is_payload(&self) -> bool {
        matches!(self, Self::Xml(_) | Self::Json(_) | Self::PlainText(_))
    }

    /// Returns the ignore expressions of payload contexts.
    #[must_use]
    pub fn ignore_expressions(&self) -> &[String] {
        match self {
            Self::Xml(ctx) => &ctx.ignore_expressions,
            Self::Json(ctx) => &ctx.ignore_expressions,
            _ => &[],
        }
    }

    /// Returns the schema reference of payload contexts.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        match self {
            Self::Xml(ctx) => ctx.schema.as_deref(),
            Self::Json(ctx) => ctx.schema.as_deref(),
            _ => None,
        }
    }

    /// Creates the default payload context for a message type.
    ///
    /// Returns `None` for custom types, which have no built-in comparison.
    #[must_use]
    pub fn default_for(message_type: &MessageType) -> Option<Self> {
        match message_type {
            MessageType::Xml => Some(Self::Xml(XmlValidationContext::new())),
            MessageType::Json => Some(Self::Json(JsonValidationContext::new())),
            MessageType::Plaintext | MessageType::Binary => {
                Some(Self::PlainText(PlainTextValidationContext::new()))
            }
            MessageType::Custom(_) => None,
        }
    }
}

impl From<HeaderValidationContext> for ValidationContext {
    fn from(ctx: HeaderValidationContext) -> Self {
        Self::Header(ctx)
    }
}

impl From<XmlValidationContext> for ValidationContext {
    fn from(ctx: XmlValidationContext) -> Self {
        Self::Xml(ctx)
    }
}

impl From<JsonValidationContext> for ValidationContext {
    fn from(ctx: JsonValidationContext) -> Self {
        Self::Json(ctx)
    }
}

impl From<ScriptValidationContext> for ValidationContext {
    fn from(ctx: ScriptValidationContext) -> Self {
        Self::Script(ctx)
    }
}

impl From<PlainTextValidationContext> for ValidationContext {
    fn from(ctx: PlainTextValidationContext) -> Self {
        Self::PlainText(ctx)
    }
}
