/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Validation matchers.
//!
//! A control value of the form `@name@` or `@name(args)@` is not compared
//! literally; the named matcher decides whether the actual value is accepted.

use ironcheck_context::TestContext;
use ironcheck_core::error::ContextError;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Delimiter around matcher expressions.
pub const MATCHER_DELIMITER: char = '@';

/// The ignore placeholder.
pub const IGNORE_PLACEHOLDER: &str = "@ignore@";

/// Reason a matcher rejected a value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct MatcherFailure(pub String);

/// Custom validation matcher.
pub trait ValidationMatcher: Send + Sync {
    /// Checks the actual value.
    ///
    /// # Arguments
    /// * `field` - Name of the compared field (element, member or header)
    /// * `actual` - The actual value
    /// * `args` - Unquoted matcher arguments
    /// * `context` - The test context
    ///
    /// # Errors
    /// Returns `MatcherFailure` if the value is rejected.
    fn validate(
        &self,
        field: &str,
        actual: &str,
        args: &[String],
        context: &mut TestContext,
    ) -> Result<(), MatcherFailure>;
}

impl<F> ValidationMatcher for F
where
    F: Fn(&str, &str, &[String], &mut TestContext) -> Result<(), MatcherFailure> + Send + Sync,
{
    fn validate(
        &self,
        field: &str,
        actual: &str,
        args: &[String],
        context: &mut TestContext,
    ) -> Result<(), MatcherFailure> {
        self(field, actual, args, context)
    }
}

/// Parsed matcher expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherExpression<'a> {
    /// Matcher name.
    pub name: &'a str,
    /// Unquoted arguments.
    pub args: Vec<String>,
}

impl MatcherExpression<'_> {
    /// Returns true for the ignore matcher.
    #[must_use]
    pub fn is_ignore(&self) -> bool {
        self.name == "ignore"
    }
}

/// Parses `@name@` / `@name(args)@`.
///
/// Returns `None` if the value is not a matcher expression.
#[must_use]
pub fn parse_matcher(value: &str) -> Option<MatcherExpression<'_>> {
    let inner = value
        .trim()
        .strip_prefix(MATCHER_DELIMITER)?
        .strip_suffix(MATCHER_DELIMITER)?;
    let (name, args) = match inner.find('(') {
        Some(open) => (&inner[..open], split_args(inner[open + 1..].strip_suffix(')')?)),
        None => (inner, Vec::new()),
    };
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(MatcherExpression { name, args })
}

/// Returns true if the value is the ignore matcher.
#[must_use]
pub fn is_ignore(value: &str) -> bool {
    parse_matcher(value).is_some_and(|matcher| matcher.is_ignore())
}

fn split_args(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in raw.chars() {
        match (c, quote) {
            ('\'' | '"', None) => quote = Some(c),
            (c, Some(open)) if c == open => quote = None,
            (',', None) => args.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    args.push(current.trim().to_string());
    args
}

/// Result of evaluating a matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The field is ignored.
    Ignored,
    /// The matcher accepted the value.
    Passed,
    /// The matcher rejected the value.
    Failed(String),
}

/// Registered matchers by name.
#[derive(Clone)]
pub struct MatcherLibrary {
    matchers: HashMap<String, Arc<dyn ValidationMatcher>>,
}

impl Default for MatcherLibrary {
    fn default() -> Self {
        Self::builtins()
    }
}

impl MatcherLibrary {
    /// Creates an empty library. Only `@ignore@` is understood.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            matchers: HashMap::new(),
        }
    }

    /// Creates the library of built-in matchers.
    #[must_use]
    pub fn builtins() -> Self {
        let mut library = Self::empty();
        library.register("matches", matches);
        library.register("contains", contains);
        library.register("startsWith", starts_with);
        library.register("endsWith", ends_with);
        library.register("equalsIgnoreCase", equals_ignore_case);
        library.register("isNumber", is_number);
        library.register("greaterThan", greater_than);
        library.register("lowerThan", lower_than);
        library.register("empty", empty);
        library.register("notEmpty", not_empty);
        library.register("variable", variable);
        library
    }

    /// Registers a matcher, replacing any matcher with the same name.
    pub fn register(&mut self, name: impl Into<String>, matcher: impl ValidationMatcher + 'static) {
        self.matchers.insert(name.into(), Arc::new(matcher));
    }

    /// Returns true if a matcher is registered under the name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        name == "ignore" || self.matchers.contains_key(name)
    }

    /// Evaluates a control value as a matcher.
    ///
    /// Returns `Ok(None)` if the control value is not a matcher expression, or
    /// names an unknown matcher while `fail_on_unknown` is false.
    ///
    /// # Errors
    /// Returns `ContextError::InvalidExpression` for an unknown matcher when
    /// `fail_on_unknown` is true.
    pub fn evaluate(
        &self,
        field: &str,
        control: &str,
        actual: &str,
        context: &mut TestContext,
        fail_on_unknown: bool,
    ) -> Result<Option<MatchOutcome>, ContextError> {
        let Some(expression) = parse_matcher(control) else {
            return Ok(None);
        };
        if expression.is_ignore() {
            return Ok(Some(MatchOutcome::Ignored));
        }
        let Some(matcher) = self.matchers.get(expression.name) else {
            if fail_on_unknown {
                return Err(ContextError::InvalidExpression {
                    expression: control.trim().to_string(),
                    reason: format!("unknown validation matcher '{}'", expression.name),
                });
            }
            return Ok(None);
        };
        trace!(field, matcher = expression.name, "evaluating matcher");
        Ok(Some(
            match matcher.validate(field, actual, &expression.args, context) {
                Ok(()) => MatchOutcome::Passed,
                Err(failure) => MatchOutcome::Failed(failure.0),
            },
        ))
    }
}

impl fmt::Debug for MatcherLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.matchers.keys().collect();
        names.sort();
        f.debug_struct("MatcherLibrary")
            .field("matchers", &names)
            .finish()
    }
}

fn arg<'a>(name: &str, args: &'a [String]) -> Result<&'a str, MatcherFailure> {
    args.first()
        .map(String::as_str)
        .ok_or_else(|| MatcherFailure(format!("{name} requires an argument")))
}

fn check(accepted: bool, reason: impl FnOnce() -> String) -> Result<(), MatcherFailure> {
    if accepted {
        Ok(())
    } else {
        Err(MatcherFailure(reason()))
    }
}

fn number(value: &str) -> Option<Decimal> {
    let value = value.trim();
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

fn matches(
    _: &str,
    actual: &str,
    args: &[String],
    _: &mut TestContext,
) -> Result<(), MatcherFailure> {
    let pattern = arg("matches", args)?;
    let regex = Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|err| MatcherFailure(format!("invalid pattern '{pattern}': {err}")))?;
    check(regex.is_match(actual), || {
        format!("'{actual}' does not match '{pattern}'")
    })
}

fn contains(
    _: &str,
    actual: &str,
    args: &[String],
    _: &mut TestContext,
) -> Result<(), MatcherFailure> {
    let part = arg("contains", args)?;
    check(actual.contains(part), || format!("'{actual}' does not contain '{part}'"))
}

fn starts_with(
    _: &str,
    actual: &str,
    args: &[String],
    _: &mut TestContext,
) -> Result<(), MatcherFailure> {
    let prefix = arg("startsWith", args)?;
    check(actual.starts_with(prefix), || {
        format!("'{actual}' does not start with '{prefix}'")
    })
}

fn ends_with(
    _: &str,
    actual: &str,
    args: &[String],
    _: &mut TestContext,
) -> Result<(), MatcherFailure> {
    let suffix = arg("endsWith", args)?;
    check(actual.ends_with(suffix), || {
        format!("'{actual}' does not end with '{suffix}'")
    })
}

fn equals_ignore_case(
    _: &str,
    actual: &str,
    args: &[String],
    _: &mut TestContext,
) -> Result<(), MatcherFailure> {
    let expected = arg("equalsIgnoreCase", args)?;
    check(actual.to_lowercase() == expected.to_lowercase(), || {
        format!("'{actual}' is not equal to '{expected}' ignoring case")
    })
}

fn is_number(
    _: &str,
    actual: &str,
    _: &[String],
    _: &mut TestContext,
) -> Result<(), MatcherFailure> {
    check(number(actual).is_some(), || format!("'{actual}' is not a number"))
}

fn compare_numbers(
    name: &str,
    actual: &str,
    args: &[String],
    accept: fn(Decimal, Decimal) -> bool,
) -> Result<(), MatcherFailure> {
    let raw = arg(name, args)?;
    let limit = number(raw)
        .ok_or_else(|| MatcherFailure(format!("{name} argument '{raw}' is not a number")))?;
    let value =
        number(actual).ok_or_else(|| MatcherFailure(format!("'{actual}' is not a number")))?;
    check(accept(value, limit), || format!("{name}({raw}) rejected '{actual}'"))
}

fn greater_than(
    _: &str,
    actual: &str,
    args: &[String],
    _: &mut TestContext,
) -> Result<(), MatcherFailure> {
    compare_numbers("greaterThan", actual, args, |value, limit| value > limit)
}

fn lower_than(
    _: &str,
    actual: &str,
    args: &[String],
    _: &mut TestContext,
) -> Result<(), MatcherFailure> {
    compare_numbers("lowerThan", actual, args, |value, limit| value < limit)
}

fn empty(_: &str, actual: &str, _: &[String], _: &mut TestContext) -> Result<(), MatcherFailure> {
    check(actual.is_empty(), || format!("'{actual}' is not empty"))
}

fn not_empty(
    _: &str,
    actual: &str,
    _: &[String],
    _: &mut TestContext,
) -> Result<(), MatcherFailure> {
    check(!actual.is_empty(), || "value is empty".to_string())
}

/// Stores the actual value in the context, under the argument or the field name.
fn variable(
    field: &str,
    actual: &str,
    args: &[String],
    context: &mut TestContext,
) -> Result<(), MatcherFailure> {
    let name = args.first().map_or(field, String::as_str);
    context.set_variable(name, actual);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(control: &str, actual: &str) -> Option<MatchOutcome> {
        let mut context = TestContext::new();
        MatcherLibrary::builtins()
            .evaluate("field", control, actual, &mut context, true)
            .unwrap()
    }

    #[test]
    fn test_parse_matcher() {
        let matcher = parse_matcher("@contains('a, b')@").unwrap();
        assert_eq!(matcher.name, "contains");
        assert_eq!(matcher.args, vec!["a, b".to_string()]);

        assert!(parse_matcher(" @ignore@ ").unwrap().is_ignore());
        assert!(parse_matcher("@greaterThan(5)@").is_some());
        assert!(parse_matcher("user@example.com").is_none());
        assert!(parse_matcher("@@").is_none());
        assert!(parse_matcher("literal").is_none());
    }

    #[test]
    fn test_builtin_matchers() {
        assert_eq!(eval("@ignore@", "x"), Some(MatchOutcome::Ignored));
        assert_eq!(eval("@matches('[0-9]+')@", "123"), Some(MatchOutcome::Passed));
        assert!(matches!(eval("@matches('[0-9]+')@", "12a"), Some(MatchOutcome::Failed(_))));
        assert_eq!(eval("@startsWith('He')@", "Hello"), Some(MatchOutcome::Passed));
        assert_eq!(eval("@endsWith('lo')@", "Hello"), Some(MatchOutcome::Passed));
        assert_eq!(eval("@equalsIgnoreCase('HELLO')@", "hello"), Some(MatchOutcome::Passed));
        assert_eq!(eval("@isNumber()@", "1.5e3"), Some(MatchOutcome::Passed));
        assert_eq!(eval("@greaterThan(5)@", "6"), Some(MatchOutcome::Passed));
        assert!(matches!(eval("@lowerThan(5)@", "6"), Some(MatchOutcome::Failed(_))));
        assert_eq!(eval("@empty()@", ""), Some(MatchOutcome::Passed));
        assert!(matches!(eval("@notEmpty()@", ""), Some(MatchOutcome::Failed(_))));
        assert_eq!(eval("literal", "literal"), None);
    }

    #[test]
    fn test_variable_matcher() {
        let library = MatcherLibrary::builtins();
        let mut context = TestContext::new();
        library
            .evaluate("OrderId", "@variable('order')@", "17", &mut context, true)
            .unwrap();
        library
            .evaluate("OrderId", "@variable()@", "18", &mut context, true)
            .unwrap();
        assert_eq!(context.get_variable("order").unwrap(), "17");
        assert_eq!(context.get_variable("OrderId").unwrap(), "18");
    }

    #[test]
    fn test_unknown_matcher() {
        let library = MatcherLibrary::builtins();
        let mut context = TestContext::new();
        assert!(matches!(
            library.evaluate("f", "@fuzzy()@", "x", &mut context, true),
            Err(ContextError::InvalidExpression { .. })
        ));
        assert_eq!(
            library
                .evaluate("f", "@fuzzy()@", "x", &mut context, false)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_custom_matcher() {
        let mut library = MatcherLibrary::empty();
        library.register(
            "even",
            |_: &str,
             actual: &str,
             _: &[String],
             _: &mut TestContext|
             -> Result<(), MatcherFailure> {
                let value: i64 = actual.parse().map_err(|_| MatcherFailure("nan".to_string()))?;
                check(value % 2 == 0, || format!("{value} is odd"))
            },
        );
        let mut context = TestContext::new();
        assert_eq!(
            library.evaluate("n", "@even()@", "4", &mut context, true).unwrap(),
            Some(MatchOutcome::Passed)
        );
        assert_eq!(
            library.evaluate("n", "@even()@", "3", &mut context, true).unwrap(),
            Some(MatchOutcome::Failed("3 is odd".to_string()))
        );
    }
}
