/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Script validation.

use crate::contexts::ValidationContext;
use crate::registry::CompareInput;
use ironcheck_context::TestContext;
use ironcheck_core::error::Result;
use ironcheck_core::types::{Mismatch, MismatchKind};
use tracing::debug;

/// Runs the validation script of the context.
///
/// The script passes when it yields `true` or nothing; any other result is
/// reported as a mismatch.
///
/// # Errors
/// Returns an error if the engine is unknown, the script fails, or its text
/// cannot be resolved.
pub fn compare_script(
    input: &CompareInput<'_>,
    context: &mut TestContext,
) -> Result<Vec<Mismatch>> {
    let ValidationContext::Script(settings) = input.context else {
        return Ok(Vec::new());
    };
    let result = context.evaluate_script(&settings.engine, &settings.script)?;
    let result = result.trim();
    debug!(engine = %settings.engine, result, "validation script finished");
    if result.is_empty() || result.eq_ignore_ascii_case("true") {
        Ok(Vec::new())
    } else {
        Ok(vec![Mismatch::new("script", "true", result, MismatchKind::Script)])
    }
}
