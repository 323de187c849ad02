/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Plain text payload comparison.

use crate::contexts::ValidationContext;
use crate::matcher::{IGNORE_PLACEHOLDER, parse_matcher};
use crate::registry::CompareInput;
use ironcheck_context::TestContext;
use ironcheck_core::error::{ContextError, Result};
use ironcheck_core::types::{Mismatch, MismatchKind};
use regex::Regex;
use tracing::debug;

const PAYLOAD_PATH: &str = "payload";

/// Compares the whole payload as text.
///
/// Both sides are trimmed. A control that is a single matcher expression is
/// evaluated against the actual text; inline `@ignore@` placeholders match
/// any run of characters. Payloads that are not UTF-8 are compared as bytes.
///
/// # Errors
/// Returns an error if the control names an unknown matcher.
pub fn compare_text(input: &CompareInput<'_>, context: &mut TestContext) -> Result<Vec<Mismatch>> {
    let ignore_whitespace = match input.context {
        ValidationContext::PlainText(settings) => settings.ignore_whitespace,
        _ => false,
    };

    let (Ok(control), Ok(actual)) = (input.control.payload_str(), input.actual.payload_str()) else {
        debug!("binary payload, comparing bytes");
        if input.control.payload() == input.actual.payload() {
            return Ok(Vec::new());
        }
        return Ok(vec![Mismatch::new(
            PAYLOAD_PATH,
            format!("{} bytes", input.control.payload().len()),
            format!("{} bytes", input.actual.payload().len()),
            MismatchKind::Value,
        )]);
    };

    let (control, actual) = if ignore_whitespace {
        (collapse_whitespace(control), collapse_whitespace(actual))
    } else {
        (control.trim().to_string(), actual.trim().to_string())
    };

    if parse_matcher(&control).is_some() {
        return Ok(input
            .compare_value(PAYLOAD_PATH, PAYLOAD_PATH, &control, &actual, context)?
            .into_iter()
            .collect());
    }

    let equal = if control.contains(IGNORE_PLACEHOLDER) {
        ignore_pattern(&control)?.is_match(&actual)
    } else {
        control == actual
    };
    if equal {
        Ok(Vec::new())
    } else {
        Ok(vec![Mismatch::new(PAYLOAD_PATH, control, actual, MismatchKind::Value)])
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds an anchored pattern where each `@ignore@` matches any text.
fn ignore_pattern(control: &str) -> Result<Regex> {
    let parts: Vec<String> = control.split(IGNORE_PLACEHOLDER).map(regex::escape).collect();
    let pattern = format!("(?s)^{}$", parts.join(".*?"));
    Regex::new(&pattern).map_err(|err| {
        ContextError::InvalidExpression {
            expression: control.to_string(),
            reason: err.to_string(),
        }
        .into()
    })
}
