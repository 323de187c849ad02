/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Header validation.

use crate::contexts::ValidationContext;
use crate::registry::CompareInput;
use ironcheck_context::TestContext;
use ironcheck_core::error::Result;
use ironcheck_core::message::INTERNAL_HEADER_PREFIX;
use ironcheck_core::types::{Mismatch, MismatchKind};
use tracing::debug;

/// Checks every control header against the actual message.
///
/// Only control headers are checked; extra actual headers are accepted.
/// Internal headers are skipped.
///
/// # Errors
/// Returns an error if a control value names an unknown matcher.
pub fn compare_headers(
    input: &CompareInput<'_>,
    context: &mut TestContext,
) -> Result<Vec<Mismatch>> {
    let ignore_case = match input.context {
        ValidationContext::Header(settings) => settings
            .header_name_ignore_case
            .unwrap_or(input.options.header_name_ignore_case),
        _ => input.options.header_name_ignore_case,
    };

    let mut mismatches = Vec::new();
    for (name, expected) in input.control.headers() {
        if name.starts_with(INTERNAL_HEADER_PREFIX) {
            continue;
        }
        match input.actual.find_header(name, ignore_case) {
            None => mismatches.push(Mismatch::absent(
                name.as_str(),
                expected.as_str(),
                MismatchKind::MissingHeader,
            )),
            Some(found) => {
                if let Some(mismatch) = input.compare_value(name, name, expected, found, context)? {
                    mismatches.push(mismatch);
                }
            }
        }
    }
    debug!(
        checked = input.control.headers().len(),
        mismatches = mismatches.len(),
        "headers validated"
    );
    Ok(mismatches)
}
