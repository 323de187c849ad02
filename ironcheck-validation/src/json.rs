/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Structural JSON comparison.
//!
//! Object member order is irrelevant, array element order is significant.
//! Scalars are compared with type-aware coercion: a number equals a string
//! only if the string parses to the same numeric value, and booleans only
//! equal booleans.

use crate::contexts::ValidationContext;
use crate::matcher::{is_ignore, parse_matcher};
use crate::registry::CompareInput;
use ironcheck_context::TestContext;
use ironcheck_core::error::{ParseError, Result};
use ironcheck_core::message::{Message, MessageType};
use ironcheck_core::types::{Mismatch, MismatchKind};
use ironcheck_path::{Address, NodePath, Namespaces, PathStep};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, trace};

/// Compares the actual JSON payload with the control payload.
///
/// # Errors
/// Returns an error if a payload is not valid JSON, an ignore expression is
/// invalid, the schema check fails, or a matcher is unknown.
pub fn compare_json(input: &CompareInput<'_>, context: &mut TestContext) -> Result<Vec<Mismatch>> {
    let strict = match input.context {
        ValidationContext::Json(settings) => settings.strict,
        _ => true,
    };

    if !input.actual.is_payload_empty() {
        input.check_schema(input.actual.payload_str()?)?;
    }
    if input.control.is_payload_empty() {
        debug!("empty control payload, skipping JSON comparison");
        return Ok(Vec::new());
    }
    let control = parse(input.control)?;
    if input.actual.is_payload_empty() {
        return Ok(vec![Mismatch::absent(
            "$",
            control.to_string(),
            MismatchKind::MissingPath,
        )]);
    }
    let actual = parse(input.actual)?;

    let ignores = input
        .context
        .ignore_expressions()
        .iter()
        .map(|expression| Address::parse(expression, &MessageType::Json))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut comparison = JsonComparison {
        input,
        ignores,
        strict,
        mismatches: Vec::new(),
    };
    comparison.value(&control, &actual, &NodePath::new(), context)?;
    debug!(mismatches = comparison.mismatches.len(), "JSON comparison finished");
    Ok(comparison.mismatches)
}

fn parse(message: &Message) -> Result<Value> {
    serde_json::from_str(message.payload_str()?).map_err(|err| {
        ParseError::Json {
            reason: err.to_string(),
        }
        .into()
    })
}

fn decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Strings unquoted, everything else as JSON text.
fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn field_name(path: &NodePath) -> String {
    match path.steps().last() {
        Some(PathStep::Member(name)) => name.clone(),
        Some(PathStep::Index(index)) => index.to_string(),
        _ => "$".to_string(),
    }
}

struct JsonComparison<'a, 'i> {
    input: &'a CompareInput<'i>,
    ignores: Vec<Address>,
    strict: bool,
    mismatches: Vec<Mismatch>,
}

impl JsonComparison<'_, '_> {
    fn is_ignored(&self, path: &NodePath) -> bool {
        let namespaces = Namespaces::new();
        self.ignores
            .iter()
            .any(|address| address.matches(path, &namespaces))
    }

    fn push(&mut self, path: &NodePath, expected: &Value, actual: &Value, kind: MismatchKind) {
        self.mismatches
            .push(Mismatch::new(path.to_string(), display(expected), display(actual), kind));
    }

    fn value(
        &mut self,
        control: &Value,
        actual: &Value,
        path: &NodePath,
        context: &mut TestContext,
    ) -> Result<()> {
        if self.is_ignored(path) {
            trace!(%path, "value ignored");
            return Ok(());
        }
        match (control, actual) {
            (Value::String(expected), _) if parse_matcher(expected).is_some() => {
                if let Some(mismatch) = self.input.compare_value(
                    &path.to_string(),
                    &field_name(path),
                    expected,
                    &display(actual),
                    context,
                )? {
                    self.mismatches.push(mismatch);
                }
            }
            (Value::Object(expected), Value::Object(found)) => {
                for (key, expected_member) in expected {
                    let member_path = path.member(key);
                    match found.get(key) {
                        Some(found_member) => {
                            self.value(expected_member, found_member, &member_path, context)?;
                        }
                        None if self.is_ignored(&member_path) => {}
                        None if matches!(expected_member, Value::String(s) if is_ignore(s)) => {}
                        None => self.mismatches.push(Mismatch::absent(
                            member_path.to_string(),
                            display(expected_member),
                            MismatchKind::MissingMember,
                        )),
                    }
                }
                if self.strict {
                    for (key, found_member) in found {
                        let member_path = path.member(key);
                        if !expected.contains_key(key) && !self.is_ignored(&member_path) {
                            self.mismatches.push(Mismatch::new(
                                member_path.to_string(),
                                Mismatch::ABSENT,
                                display(found_member),
                                MismatchKind::UnexpectedMember,
                            ));
                        }
                    }
                }
            }
            (Value::Array(expected), Value::Array(found)) => {
                if expected.len() != found.len() {
                    self.mismatches.push(Mismatch::new(
                        path.to_string(),
                        expected.len().to_string(),
                        found.len().to_string(),
                        MismatchKind::ArrayLength,
                    ));
                    return Ok(());
                }
                for (index, (expected_item, found_item)) in expected.iter().zip(found).enumerate() {
                    self.value(expected_item, found_item, &path.index(index), context)?;
                }
            }
            (Value::Number(expected), Value::Number(found)) => {
                let equal = match (decimal(&expected.to_string()), decimal(&found.to_string())) {
                    (Some(left), Some(right)) => left == right,
                    _ => expected == found,
                };
                if !equal {
                    self.push(path, control, actual, MismatchKind::Value);
                }
            }
            (Value::Number(number), Value::String(text))
            | (Value::String(text), Value::Number(number)) => {
                match decimal(text) {
                    None => self.push(path, control, actual, MismatchKind::Type),
                    Some(parsed) if decimal(&number.to_string()) == Some(parsed) => {}
                    Some(_) => self.push(path, control, actual, MismatchKind::Value),
                }
            }
            (Value::String(expected), Value::String(found)) => {
                if expected != found {
                    self.push(path, control, actual, MismatchKind::Value);
                }
            }
            (Value::Bool(expected), Value::Bool(found)) => {
                if expected != found {
                    self.push(path, control, actual, MismatchKind::Value);
                }
            }
            (Value::Null, Value::Null) => {}
            _ => self.push(path, control, actual, MismatchKind::Type),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contexts::JsonValidationContext;
    use crate::registry::{CompareOptions, ValidatorRegistry};
    use crate::schema::JsonSchemaRepository;
    use ironcheck_core::error::{CheckError, SchemaError};
    use serde_json::json;
    use std::sync::Arc;

    fn compare_with(
        registry: &ValidatorRegistry,
        control: &str,
        actual: &str,
        settings: JsonValidationContext,
    ) -> Result<Vec<Mismatch>> {
        let control = Message::new(control.to_string());
        let actual = Message::new(actual.to_string());
        let validation = ValidationContext::Json(settings);
        let input = CompareInput {
            actual: &actual,
            control: &control,
            message_type: &MessageType::Json,
            context: &validation,
            matchers: registry.matchers(),
            schemas: registry.schemas(),
            options: CompareOptions::default(),
        };
        compare_json(&input, &mut TestContext::new())
    }

    fn compare(control: &str, actual: &str, settings: JsonValidationContext) -> Vec<Mismatch> {
        compare_with(&ValidatorRegistry::with_defaults(), control, actual, settings).unwrap()
    }

    fn mismatches(control: &str, actual: &str) -> Vec<Mismatch> {
        compare(control, actual, JsonValidationContext::new())
    }

    #[test]
    fn test_member_order_irrelevant() {
        assert!(mismatches(r#"{"a":1,"b":2}"#, r#"{"b":2,"a":1}"#).is_empty());
    }

    #[test]
    fn test_ignore_path() {
        let control = r#"{"person":{"name":"Ada","age":25}}"#;
        let actual = r#"{"person":{"name":"Ada","age":31}}"#;
        assert_eq!(
            mismatches(control, actual),
            vec![Mismatch::new("$.person.age", "25", "31", MismatchKind::Value)]
        );
        let settings = JsonValidationContext::new().with_ignore("$.person.age");
        assert!(compare(control, actual, settings).is_empty());
    }

    #[test]
    fn test_ignore_tolerates_any_value() {
        let settings = JsonValidationContext::new().with_ignore("$.id");
        assert!(compare(r#"{"id":1}"#, r#"{"id":{"nested":[1,2]}}"#, settings.clone()).is_empty());
        assert!(compare(r#"{"id":1}"#, r#"{}"#, settings).is_empty());
    }

    #[test]
    fn test_ignore_placeholder() {
        assert!(mismatches(r#"{"id":"@ignore@","n":1}"#, r#"{"id":"x-42","n":1}"#).is_empty());
        assert!(mismatches(r#"{"id":"@ignore@"}"#, r#"{}"#).is_empty());
    }

    #[test]
    fn test_numeric_coercion() {
        assert!(mismatches(r#"{"n":5}"#, r#"{"n":"5"}"#).is_empty());
        assert!(mismatches(r#"{"n":"5.0"}"#, r#"{"n":5}"#).is_empty());
        assert!(mismatches(r#"{"n":1.0}"#, r#"{"n":1}"#).is_empty());
        assert_eq!(mismatches(r#"{"n":5}"#, r#"{"n":"6"}"#)[0].kind, MismatchKind::Value);
        assert_eq!(mismatches(r#"{"n":5}"#, r#"{"n":"five"}"#)[0].kind, MismatchKind::Type);
    }

    #[test]
    fn test_boolean_strict() {
        assert!(mismatches(r#"{"ok":true}"#, r#"{"ok":true}"#).is_empty());
        assert_eq!(
            mismatches(r#"{"ok":true}"#, r#"{"ok":"true"}"#),
            vec![Mismatch::new("$.ok", "true", "true", MismatchKind::Type)]
        );
        assert_eq!(mismatches(r#"{"ok":true}"#, r#"{"ok":false}"#)[0].kind, MismatchKind::Value);
    }

    #[test]
    fn test_array_order_significant() {
        let found = mismatches(r#"{"items":[1,2]}"#, r#"{"items":[2,1]}"#);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, "$.items[0]");
        assert_eq!(
            mismatches(r#"[1,2]"#, r#"[1,2,3]"#),
            vec![Mismatch::new("$", "2", "3", MismatchKind::ArrayLength)]
        );
    }

    #[test]
    fn test_ignore_whole_array() {
        let settings = JsonValidationContext::new().with_ignore("$.items");
        assert!(compare(r#"{"items":[1,2]}"#, r#"{"items":[3]}"#, settings).is_empty());
    }

    #[test]
    fn test_members() {
        let found = mismatches(r#"{"a":1,"b":2}"#, r#"{"a":1,"c":3}"#);
        assert_eq!(found.len(), 2);
        assert!(found.contains(&Mismatch::absent("$.b", "2", MismatchKind::MissingMember)));
        assert!(found.contains(&Mismatch::new(
            "$.c",
            Mismatch::ABSENT,
            "3",
            MismatchKind::UnexpectedMember
        )));

        let lenient = compare(
            r#"{"a":1}"#,
            r#"{"a":1,"c":3}"#,
            JsonValidationContext::new().with_strict(false),
        );
        assert!(lenient.is_empty());
    }

    #[test]
    fn test_nested_path() {
        let found = mismatches(
            r#"{"items":[{"name":"a"},{"name":"b"}]}"#,
            r#"{"items":[{"name":"a"},{"name":"c"}]}"#,
        );
        assert_eq!(found, vec![Mismatch::new("$.items[1].name", "b", "c", MismatchKind::Value)]);
    }

    #[test]
    fn test_matchers() {
        assert!(mismatches(r#"{"id":"@matches('[0-9]+')@"}"#, r#"{"id":"123"}"#).is_empty());
        assert!(mismatches(r#"{"n":"@greaterThan(3)@"}"#, r#"{"n":5}"#).is_empty());
        let found = mismatches(r#"{"msg":"@contains('World')@"}"#, r#"{"msg":"Hello"}"#);
        assert_eq!(found[0].kind, MismatchKind::Matcher);
        assert_eq!(found[0].path, "$.msg");
    }

    #[test]
    fn test_type_mismatch() {
        let found = mismatches(r#"{"a":{"b":1}}"#, r#"{"a":[1]}"#);
        assert_eq!(found[0].kind, MismatchKind::Type);
        assert_eq!(mismatches(r#"{"a":null}"#, r#"{"a":0}"#)[0].kind, MismatchKind::Type);
    }

    #[test]
    fn test_schema_check() {
        let mut registry = ValidatorRegistry::with_defaults();
        registry.add_schema_resolver(Arc::new(JsonSchemaRepository::new().with_schema(
            "person",
            json!({"type": "object", "required": ["name"]}),
        )));
        let settings = JsonValidationContext::new().with_schema("person");

        let payload = r#"{"name":"Ada"}"#;
        let passed = compare_with(&registry, payload, payload, settings.clone());
        assert!(passed.unwrap().is_empty());

        let err = compare_with(&registry, "{}", r#"{"age":1}"#, settings).unwrap_err();
        assert!(matches!(err, CheckError::Schema(SchemaError::Violation { .. })));
    }

    #[test]
    fn test_schema_disabled() {
        let registry = ValidatorRegistry::with_defaults();
        let control = Message::new(r#"{"a":1}"#);
        let actual = Message::new(r#"{"a":1}"#);
        let validation =
            ValidationContext::Json(JsonValidationContext::new().with_schema("missing"));
        let mut input = CompareInput {
            actual: &actual,
            control: &control,
            message_type: &MessageType::Json,
            context: &validation,
            matchers: registry.matchers(),
            schemas: registry.schemas(),
            options: CompareOptions::default(),
        };
        assert!(compare_json(&input, &mut TestContext::new()).is_err());

        input.options.schema_validation = false;
        assert!(compare_json(&input, &mut TestContext::new()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed() {
        let registry = ValidatorRegistry::with_defaults();
        let result = compare_with(&registry, "{}", "{", JsonValidationContext::new());
        assert!(matches!(result, Err(CheckError::Parse(ParseError::Json { .. }))));
    }
}
