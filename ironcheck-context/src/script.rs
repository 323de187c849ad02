/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Script evaluation capability.
//!
//! Scripting engines are external collaborators. The context only knows them
//! through the [`ScriptEvaluator`] trait, registered per engine name.

use ironcheck_core::error::ContextError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Prefix marking a variable value as a script.
pub const SCRIPT_PREFIX: &str = "script:";

/// Failure reported by a script evaluator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ScriptError(pub String);

/// External script evaluation capability.
///
/// Evaluation is synchronous and expected to be free of side effects so that
/// test verification is repeatable.
pub trait ScriptEvaluator: Send + Sync {
    /// Evaluates an expression and returns its textual result.
    ///
    /// # Arguments
    /// * `engine` - The engine name (e.g. "groovy")
    /// * `expression` - The script text, with placeholders already resolved
    ///
    /// # Errors
    /// Returns `ScriptError` on syntax or runtime failures.
    fn evaluate(&self, engine: &str, expression: &str) -> Result<String, ScriptError>;
}

/// Script evaluators indexed by engine name.
#[derive(Clone, Default)]
pub struct ScriptEngines {
    engines: HashMap<String, Arc<dyn ScriptEvaluator>>,
}

impl ScriptEngines {
    /// Creates an empty set of engines.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an evaluator for an engine name.
    pub fn register(&mut self, engine: impl Into<String>, evaluator: Arc<dyn ScriptEvaluator>) {
        self.engines.insert(engine.into(), evaluator);
    }

    /// Returns true if an evaluator is registered for the engine.
    #[must_use]
    pub fn contains(&self, engine: &str) -> bool {
        self.engines.contains_key(engine)
    }

    /// Evaluates an expression with the named engine.
    ///
    /// # Errors
    /// Returns `ContextError::ScriptExecution` if the engine is not registered
    /// or the evaluator fails.
    pub fn evaluate(&self, engine: &str, expression: &str) -> Result<String, ContextError> {
        let evaluator = self
            .engines
            .get(engine)
            .ok_or_else(|| ContextError::ScriptExecution {
                engine: engine.to_string(),
                reason: "no script evaluator registered for engine".to_string(),
            })?;
        evaluator
            .evaluate(engine, expression)
            .map_err(|err| ContextError::ScriptExecution {
                engine: engine.to_string(),
                reason: err.0,
            })
    }
}

impl fmt::Debug for ScriptEngines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptEngines")
            .field("engines", &self.engines.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Splits a `script:<engine>expression` value into engine and expression.
///
/// Returns `None` if the value is not a script.
///
/// # Errors
/// Returns `ContextError::InvalidExpression` if the engine marker is malformed.
pub fn parse_script(value: &str) -> Option<Result<(&str, &str), ContextError>> {
    let rest = value.strip_prefix(SCRIPT_PREFIX)?;
    let parsed = rest
        .strip_prefix('<')
        .and_then(|rest| rest.split_once('>'))
        .filter(|(engine, _)| !engine.trim().is_empty())
        .map(|(engine, expression)| (engine.trim(), expression))
        .ok_or_else(|| ContextError::InvalidExpression {
            expression: value.to_string(),
            reason: "expected script:<engine>expression".to_string(),
        });
    Some(parsed)
}
