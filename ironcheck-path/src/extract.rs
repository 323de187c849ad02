/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Variable extraction from received messages.

use crate::address::{Address, Namespaces};
use crate::select::evaluate;
use ironcheck_context::TestContext;
use ironcheck_core::document::Document;
use ironcheck_core::error::{PathError, Result};
use ironcheck_core::message::Message;
use tracing::debug;

/// Where a mapping reads its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractSource {
    /// Message header, addressed by name.
    Header,
    /// Message payload, addressed by a path expression.
    Payload,
}

/// One extraction rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableMapping {
    /// Value source.
    pub source: ExtractSource,
    /// Header name or path expression. Never `${}`-resolved.
    pub expression: String,
    /// Target variable name.
    pub variable: String,
}

/// Writes values read from a message into the test context.
///
/// Mappings run in declaration order; the first missing value aborts
/// extraction with `PathError::NotFound`.
#[derive(Debug, Clone, Default)]
pub struct VariableExtractor {
    mappings: Vec<VariableMapping>,
    namespaces: Namespaces,
    header_ignore_case: bool,
}

impl VariableExtractor {
    /// Creates an extractor without mappings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header mapping.
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>, variable: impl Into<String>) -> Self {
        self.mappings.push(VariableMapping {
            source: ExtractSource::Header,
            expression: header.into(),
            variable: variable.into(),
        });
        self
    }

    /// Adds a payload path mapping.
    #[must_use]
    pub fn with_path(mut self, expression: impl Into<String>, variable: impl Into<String>) -> Self {
        self.mappings.push(VariableMapping {
            source: ExtractSource::Payload,
            expression: expression.into(),
            variable: variable.into(),
        });
        self
    }

    /// Binds a namespace prefix for XML path expressions.
    #[must_use]
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    /// Sets whether header names are matched case-insensitively.
    #[must_use]
    pub fn with_header_ignore_case(mut self, ignore_case: bool) -> Self {
        self.header_ignore_case = ignore_case;
        self
    }

    /// Returns the mappings in declaration order.
    #[must_use]
    pub fn mappings(&self) -> &[VariableMapping] {
        &self.mappings
    }

    /// Returns true if there is nothing to extract.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Extracts all mapped values into the context.
    ///
    /// The payload is parsed once, and only if a payload mapping exists.
    ///
    /// # Errors
    /// - `PathError::NotFound` naming the header or path of a missing value
    /// - `PathError::InvalidExpression` for malformed path expressions
    /// - `ParseError` if the payload cannot be parsed
    pub fn extract(&self, message: &Message, context: &mut TestContext) -> Result<()> {
        let document = if self
            .mappings
            .iter()
            .any(|mapping| mapping.source == ExtractSource::Payload)
        {
            Some(Document::from_message(message)?)
        } else {
            None
        };

        for mapping in &self.mappings {
            let value = match (mapping.source, &document) {
                (ExtractSource::Payload, Some(document)) => {
                    let address = Address::parse(&mapping.expression, &document.message_type())?;
                    evaluate(&address, document, &self.namespaces)?.to_string()
                }
                _ => message
                    .find_header(&mapping.expression, self.header_ignore_case)
                    .map(str::to_string)
                    .ok_or_else(|| PathError::NotFound {
                        path: mapping.expression.clone(),
                    })?,
            };
            debug!(
                variable = %mapping.variable,
                source = ?mapping.source,
                expression = %mapping.expression,
                "extracted variable"
            );
            context.set_variable(mapping.variable.clone(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironcheck_core::error::CheckError;
    use ironcheck_core::message::MessageType;

    #[test]
    fn test_extract_xml_and_headers() {
        let message = Message::new(
            r#"<TestResponse id="7"><Message>Hello World!</Message></TestResponse>"#,
        )
        .with_header("Operation", "sayHello");
        let extractor = VariableExtractor::new()
            .with_header("Operation", "operation")
            .with_path("/TestResponse/Message", "text")
            .with_path("TestResponse.id", "id");

        let mut context = TestContext::new();
        extractor.extract(&message, &mut context).unwrap();
        assert_eq!(context.get_variable("operation").unwrap(), "sayHello");
        assert_eq!(context.get_variable("text").unwrap(), "Hello World!");
        assert_eq!(context.get_variable("id").unwrap(), "7");
    }

    #[test]
    fn test_extract_json() {
        let message =
            Message::new(r#"{"person":{"name":"Ada","age":36}}"#).with_type(MessageType::Json);
        let extractor = VariableExtractor::new()
            .with_path("$.person.name", "name")
            .with_path("person.age", "age");

        let mut context = TestContext::new();
        extractor.extract(&message, &mut context).unwrap();
        assert_eq!(context.get_variable("name").unwrap(), "Ada");
        assert_eq!(context.get_variable("age").unwrap(), "36");
    }

    #[test]
    fn test_extract_missing_path() {
        let message = Message::new("<a><b>1</b></a>");
        let extractor = VariableExtractor::new()
            .with_path("/a/b", "first")
            .with_path("/a/c", "second");

        let mut context = TestContext::new();
        let err = extractor.extract(&message, &mut context).unwrap_err();
        assert_eq!(
            err,
            CheckError::Path(PathError::NotFound {
                path: "/a/c".to_string()
            })
        );
        assert_eq!(context.get_variable("first").unwrap(), "1");
        assert!(!context.has_variable("second"));
    }

    #[test]
    fn test_extract_missing_header() {
        let message = Message::new("").with_header("operation", "x");
        let mut context = TestContext::new();

        let strict = VariableExtractor::new().with_header("Operation", "op");
        assert!(matches!(
            strict.extract(&message, &mut context),
            Err(CheckError::Path(PathError::NotFound { ref path })) if path == "Operation"
        ));

        let lenient = strict.with_header_ignore_case(true);
        lenient.extract(&message, &mut context).unwrap();
        assert_eq!(context.get_variable("op").unwrap(), "x");
    }

    #[test]
    fn test_expression_is_not_resolved() {
        let message = Message::new("").with_header("${name}", "literal");
        let mut context = TestContext::new();
        context.set_variable("name", "other");
        VariableExtractor::new()
            .with_header("${name}", "value")
            .extract(&message, &mut context)
            .unwrap();
        assert_eq!(context.get_variable("value").unwrap(), "literal");
    }
}
