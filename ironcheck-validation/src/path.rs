/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! XPath and JSONPath expression validation.
//!
//! Each expression is evaluated on the actual payload and its value compared
//! with the expected value. Both sides may contain dynamic content; the
//! expected value may be a matcher.

use crate::contexts::{PathValidationContext, ValidationContext};
use crate::matcher::is_ignore;
use crate::registry::CompareInput;
use ironcheck_context::TestContext;
use ironcheck_core::document::Document;
use ironcheck_core::error::{PathError, Result};
use ironcheck_core::message::MessageType;
use ironcheck_core::types::Mismatch;
use ironcheck_path::{Address, evaluate_optional};
use tracing::{debug, trace};

/// Validates XPath expressions against an XML payload.
///
/// # Errors
/// Returns an error if the payload is not XML, an expression is invalid or
/// cannot be resolved.
pub fn compare_xpath(
    input: &CompareInput<'_>,
    context: &mut TestContext,
) -> Result<Vec<Mismatch>> {
    match input.context {
        ValidationContext::XPath(settings) => {
            compare_expressions(input, settings, &MessageType::Xml, context)
        }
        _ => Ok(Vec::new()),
    }
}

/// Validates JSONPath expressions against a JSON payload.
///
/// # Errors
/// Returns an error if the payload is not JSON, an expression is invalid or
/// cannot be resolved.
pub fn compare_jsonpath(
    input: &CompareInput<'_>,
    context: &mut TestContext,
) -> Result<Vec<Mismatch>> {
    match input.context {
        ValidationContext::JsonPath(settings) => {
            compare_expressions(input, settings, &MessageType::Json, context)
        }
        _ => Ok(Vec::new()),
    }
}

fn compare_expressions(
    input: &CompareInput<'_>,
    settings: &PathValidationContext,
    message_type: &MessageType,
    context: &mut TestContext,
) -> Result<Vec<Mismatch>> {
    if settings.expressions.is_empty() {
        return Ok(Vec::new());
    }
    let document = Document::parse(input.actual.payload_str()?, message_type)?;

    let mut mismatches = Vec::new();
    for (raw_expression, raw_expected) in &settings.expressions {
        let expression = context.resolve(raw_expression)?;
        let expected = context.resolve_content(raw_expected)?;
        let address = Address::parse(&expression, message_type)?;

        let Some(value) = evaluate_optional(&address, &document, &settings.namespaces)? else {
            if is_ignore(&expected) {
                trace!(%expression, "absent path ignored");
                continue;
            }
            return Err(PathError::NotFound { path: expression }.into());
        };
        let actual = value.to_string();
        trace!(%expression, %actual, "path evaluated");
        if let Some(mismatch) =
            input.compare_value(&expression, &expression, &expected, &actual, context)?
        {
            mismatches.push(mismatch);
        }
    }
    debug!(
        expressions = settings.expressions.len(),
        mismatches = mismatches.len(),
        "path expressions validated"
    );
    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CompareOptions, ValidatorRegistry};
    use ironcheck_core::error::{CheckError, ContextError};
    use ironcheck_core::types::MismatchKind;
    use ironcheck_core::message::Message;

    fn run(
        validation: ValidationContext,
        message_type: MessageType,
        payload: &str,
        context: &mut TestContext,
    ) -> Result<Vec<Mismatch>> {
        let registry = ValidatorRegistry::with_defaults();
        let actual = Message::new(payload.to_string());
        let control = Message::default();
        let input = CompareInput {
            actual: &actual,
            control: &control,
            message_type: &message_type,
            context: &validation,
            matchers: registry.matchers(),
            schemas: registry.schemas(),
            options: CompareOptions::default(),
        };
        match message_type {
            MessageType::Xml => compare_xpath(&input, context),
            _ => compare_jsonpath(&input, context),
        }
    }

    fn xpath(settings: PathValidationContext, payload: &str) -> Result<Vec<Mismatch>> {
        let validation = ValidationContext::XPath(settings);
        run(validation, MessageType::Xml, payload, &mut TestContext::new())
    }

    const ORDER: &str =
        r#"<order id="7"><item>pen</item><item>ink</item><total>12.50</total></order>"#;

    #[test]
    fn test_xpath_values() {
        let settings = PathValidationContext::new()
            .with_expression("/order/@id", "7")
            .with_expression("/order/item[2]", "ink")
            .with_expression("count(/order/item)", "2")
            .with_expression("/order/total", "@greaterThan(10)@");
        assert!(xpath(settings, ORDER).unwrap().is_empty());
    }

    #[test]
    fn test_xpath_mismatch() {
        let settings = PathValidationContext::new()
            .with_expression("/order/item[1]", "ink")
            .with_expression("/order/coupon", "@ignore@");
        let found = xpath(settings, ORDER).unwrap();
        assert_eq!(
            found,
            vec![Mismatch::new("/order/item[1]", "ink", "pen", MismatchKind::Value)]
        );
    }

    #[test]
    fn test_xpath_absent_path() {
        let settings = PathValidationContext::new().with_expression("/order/discount", "0");
        let err = xpath(settings, ORDER).unwrap_err();
        assert_eq!(
            err,
            CheckError::Path(PathError::NotFound {
                path: "/order/discount".to_string()
            })
        );
    }

    #[test]
    fn test_xpath_namespaces() {
        let payload = r#"<o:order xmlns:o="urn:orders"><o:id>1</o:id></o:order>"#;
        let settings = PathValidationContext::new()
            .with_namespace("x", "urn:orders")
            .with_expression("/x:order/x:id", "1");
        assert!(xpath(settings, payload).unwrap().is_empty());

        let unbound = PathValidationContext::new().with_expression("/y:order", "1");
        let err = xpath(unbound, payload).unwrap_err();
        assert!(matches!(err, CheckError::Path(PathError::UnboundPrefix { .. })));
    }

    #[test]
    fn test_jsonpath_values() {
        let payload = r#"{"person":{"name":"Ada","tags":["a","b"]}}"#;
        let mut context = TestContext::new();
        context.set_variable("user", "Ada");
        let settings = PathValidationContext::new()
            .with_expression("$.person.name", "${user}")
            .with_expression("$.person.tags.size()", "2")
            .with_expression("$.person.tags[0]", "a");
        let validation = ValidationContext::JsonPath(settings);
        let found = run(validation, MessageType::Json, payload, &mut context);
        assert!(found.unwrap().is_empty());
    }

    #[test]
    fn test_unresolved_expected() {
        let settings = PathValidationContext::new().with_expression("$.a", "${missing}");
        let validation = ValidationContext::JsonPath(settings);
        let err = run(validation, MessageType::Json, r#"{"a":1}"#, &mut TestContext::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CheckError::Context(ContextError::UnresolvedVariable { .. })
        ));
    }
}
