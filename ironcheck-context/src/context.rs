/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Test context and dynamic content resolution.
//!
//! Resolution is textual, single-pass and left-to-right: every `${name}`
//! placeholder is replaced by the current variable value and every
//! `prefix:function(params)` call by its result. Substituted text is never
//! resolved again, which rules out infinite expansion.

use crate::functions::{FunctionLibrary, FunctionRegistry, parse_call};
use crate::processor::MessageProcessor;
use crate::script::{ScriptEngines, ScriptEvaluator, parse_script};
use ironcheck_core::error::{ContextError, Result};
use ironcheck_core::message::Message;
use ironcheck_core::types::MessageDirection;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::{debug, trace};

/// Opening marker of a variable placeholder.
pub const VARIABLE_PREFIX: &str = "${";

/// Closing marker of a variable placeholder.
pub const VARIABLE_SUFFIX: char = '}';

static WHOLE_FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*([A-Za-z][A-Za-z0-9_-]*):([A-Za-z][A-Za-z0-9_]*)\(.*\)\s*$")
        .expect("function call pattern is valid")
});

/// Mutable runtime context of one test case.
///
/// Holds the variable store, the function registry, registered script engines
/// and the global message processor chain.
#[derive(Clone)]
pub struct TestContext {
    /// Variables; last write wins.
    variables: HashMap<String, String>,
    /// Function libraries available to dynamic content.
    functions: FunctionRegistry,
    /// Script evaluators indexed by engine name.
    scripts: ScriptEngines,
    /// Global message processors, in registration order.
    message_processors: Vec<Arc<dyn MessageProcessor>>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Creates a context with the built-in function library.
    #[must_use]
    pub fn new() -> Self {
        Self::with_functions(FunctionRegistry::with_builtins())
    }

    /// Creates a context with the given function registry.
    #[must_use]
    pub fn with_functions(functions: FunctionRegistry) -> Self {
        Self {
            variables: HashMap::new(),
            functions,
            scripts: ScriptEngines::new(),
            message_processors: Vec::new(),
        }
    }

    /// Registers a script evaluator for an engine name.
    #[must_use]
    pub fn with_script_engine(
        mut self,
        engine: impl Into<String>,
        evaluator: Arc<dyn ScriptEvaluator>,
    ) -> Self {
        self.scripts.register(engine, evaluator);
        self
    }

    /// Adds a function library.
    pub fn add_function_library(&mut self, library: FunctionLibrary) {
        self.functions.add_library(library);
    }

    /// Returns the function registry.
    #[must_use]
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Sets a variable, overwriting any previous value.
    ///
    /// The value is stored verbatim; see [`create_variable`](Self::create_variable)
    /// for values with dynamic content.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        trace!(variable = %name, "setting variable");
        self.variables.insert(name, value.into());
    }

    /// Resolves dynamic content in a value and stores the result.
    ///
    /// Values of the form `script:<engine>expression` are evaluated with the
    /// registered script engine after resolving placeholders in the expression.
    ///
    /// # Errors
    /// Returns `ContextError` if resolution or script evaluation fails.
    pub fn create_variable(&mut self, name: impl Into<String>, value: &str) -> Result<()> {
        let resolved = match parse_script(value) {
            Some(parsed) => {
                let (engine, expression) = parsed?;
                self.evaluate_script(engine, expression)?
            }
            None => self.resolve(value)?,
        };
        self.set_variable(name, resolved);
        Ok(())
    }

    /// Gets a variable value.
    ///
    /// The name may be given bare or as a `${name}` placeholder.
    ///
    /// # Errors
    /// Returns `ContextError::UnknownVariable` if the variable is not set.
    pub fn get_variable(&self, name: &str) -> Result<&str> {
        let name = strip_placeholder(name);
        self.variables
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| {
                ContextError::UnknownVariable {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Returns true if the variable is set.
    #[must_use]
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(strip_placeholder(name))
    }

    /// Removes a variable, returning its previous value.
    pub fn remove_variable(&mut self, name: &str) -> Option<String> {
        self.variables.remove(strip_placeholder(name))
    }

    /// Returns all variables.
    #[must_use]
    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    /// Resolves all dynamic content in a string.
    ///
    /// # Errors
    /// - `UnresolvedVariable` if a placeholder names an unset variable
    /// - `UnknownFunction` if a call names an unknown library or function
    /// - `FunctionExecution` if a function fails
    /// - `InvalidExpression` if a placeholder or call is malformed
    pub fn resolve(&self, text: &str) -> Result<String> {
        if let Some(captures) = WHOLE_FUNCTION_RE.captures(text) {
            let prefix = format!("{}:", &captures[1]);
            if self.functions.library(&prefix).is_none() {
                return Err(ContextError::UnknownFunction {
                    name: format!("{prefix}{}", &captures[2]),
                }
                .into());
            }
        }
        self.resolve_content(text)
    }

    /// Resolves dynamic content embedded in message content.
    ///
    /// Unlike [`resolve`](Self::resolve), a whole value shaped like a call
    /// with an unregistered prefix is kept as literal text. Used for control
    /// payloads and header values.
    ///
    /// # Errors
    /// Same as [`resolve`](Self::resolve), except for the unknown prefix case.
    pub fn resolve_content(&self, text: &str) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            if rest.starts_with(VARIABLE_PREFIX) {
                let end = rest.find(VARIABLE_SUFFIX).ok_or_else(|| {
                    ContextError::InvalidExpression {
                        expression: text.to_string(),
                        reason: "unterminated variable placeholder".to_string(),
                    }
                })?;
                let name = &rest[VARIABLE_PREFIX.len()..end];
                let value = self.variables.get(name).ok_or_else(|| {
                    ContextError::UnresolvedVariable {
                        name: name.to_string(),
                    }
                })?;
                out.push_str(value);
                pos += end + 1;
                continue;
            }
            if at_word_start(text, pos) {
                if let Some(consumed) = self.try_function(rest, &mut out)? {
                    pos += consumed;
                    continue;
                }
            }
            let Some(c) = rest.chars().next() else {
                break;
            };
            out.push(c);
            pos += c.len_utf8();
        }
        Ok(out)
    }

    /// Resolves dynamic content in every value of a map, as message content.
    ///
    /// # Errors
    /// Returns the first resolution error.
    pub fn resolve_map(&self, map: &BTreeMap<String, String>) -> Result<BTreeMap<String, String>> {
        map.iter()
            .map(|(key, value)| Ok((key.clone(), self.resolve_content(value)?)))
            .collect()
    }

    /// Evaluates a script with a registered engine.
    ///
    /// Placeholders in the expression are resolved first.
    ///
    /// # Errors
    /// Returns `ContextError::ScriptExecution` if the engine is unknown or fails,
    /// or a resolution error from the expression.
    pub fn evaluate_script(&self, engine: &str, expression: &str) -> Result<String> {
        let expression = self.resolve(expression)?;
        debug!(engine, "evaluating script");
        Ok(self.scripts.evaluate(engine, &expression)?)
    }

    /// Registers a global message processor.
    pub fn add_message_processor(&mut self, processor: Arc<dyn MessageProcessor>) {
        self.message_processors.push(processor);
    }

    /// Returns the global message processors.
    #[must_use]
    pub fn message_processors(&self) -> &[Arc<dyn MessageProcessor>] {
        &self.message_processors
    }

    /// Runs every global processor supporting the direction on the message.
    ///
    /// # Errors
    /// Returns the first processor error.
    pub fn process_message(
        &self,
        message: &mut Message,
        direction: MessageDirection,
    ) -> Result<()> {
        for processor in self.message_processors.iter().filter(|p| p.supports(direction)) {
            debug!(processor = processor.name(), %direction, "running global message processor");
            processor.process(message, direction, self)?;
        }
        Ok(())
    }

    /// Tries to evaluate a function call at the start of `rest`.
    ///
    /// Returns the number of consumed bytes, or `None` if `rest` is not a call.
    fn try_function(&self, rest: &str, out: &mut String) -> Result<Option<usize>> {
        let Some(library) = self.functions.library_at(rest) else {
            return Ok(None);
        };
        let Some(call) = parse_call(rest, library.prefix().len())? else {
            return Ok(None);
        };
        let qualified = format!("{}{}", library.prefix(), call.name);
        let function = library
            .get(call.name)
            .ok_or_else(|| ContextError::UnknownFunction {
                name: qualified.clone(),
            })?;

        let params = call
            .raw_params
            .iter()
            .map(|raw| self.resolve(unquote(raw)))
            .collect::<Result<Vec<_>>>()?;
        trace!(function = %qualified, ?params, "calling function");

        let value = function.execute(&params, self).map_err(|err| match err {
            ContextError::FunctionExecution { .. } => err,
            other => ContextError::FunctionExecution {
                function: qualified.clone(),
                reason: other.to_string(),
            },
        })?;
        out.push_str(&value);
        Ok(Some(call.consumed))
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("variables", &self.variables)
            .field("functions", &self.functions)
            .field("scripts", &self.scripts)
            .field(
                "message_processors",
                &self
                    .message_processors
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn strip_placeholder(name: &str) -> &str {
    name.strip_prefix(VARIABLE_PREFIX)
        .and_then(|inner| inner.strip_suffix(VARIABLE_SUFFIX))
        .unwrap_or(name)
}

fn unquote(raw: &str) -> &str {
    raw.strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(raw)
}

fn at_word_start(text: &str, pos: usize) -> bool {
    text[..pos]
        .chars()
        .next_back()
        .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptError;
    use ironcheck_core::error::CheckError;

    struct Calculator;

    impl ScriptEvaluator for Calculator {
        fn evaluate(
            &self,
            _engine: &str,
            expression: &str,
        ) -> std::result::Result<String, ScriptError> {
            let (a, b) = expression
                .split_once('+')
                .ok_or_else(|| ScriptError(format!("syntax error in '{expression}'")))?;
            let a: i64 = a.trim().parse().map_err(|_| ScriptError("nan".to_string()))?;
            let b: i64 = b.trim().parse().map_err(|_| ScriptError("nan".to_string()))?;
            Ok((a + b).to_string())
        }
    }

    fn context_error(err: CheckError) -> ContextError {
        match err {
            CheckError::Context(inner) => inner,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_variables() {
        let mut context = TestContext::new();
        context.set_variable("myText", "Hello World!");
        assert_eq!(
            context
                .resolve("<Message>${myText}</Message>")
                .unwrap(),
            "<Message>Hello World!</Message>"
        );
    }

    #[test]
    fn test_resolve_unresolved_variable() {
        let context = TestContext::new();
        let err = context_error(context.resolve("a ${myText} b").unwrap_err());
        assert_eq!(
            err,
            ContextError::UnresolvedVariable {
                name: "myText".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_is_single_pass() {
        let mut context = TestContext::new();
        context.set_variable("outer", "${inner}");
        context.set_variable("inner", "value");
        assert_eq!(context.resolve("${outer}").unwrap(), "${inner}");
    }

    #[test]
    fn test_resolve_idempotent_without_placeholders() {
        let mut context = TestContext::new();
        context.set_variable("a", "1");
        context.set_variable("b", "two");
        let once = context.resolve("x=${a}, y=${b}").unwrap();
        assert_eq!(context.resolve(&once).unwrap(), once);
    }

    #[test]
    fn test_resolve_unterminated_placeholder() {
        let context = TestContext::new();
        let err = context_error(context.resolve("${abc").unwrap_err());
        assert!(matches!(err, ContextError::InvalidExpression { .. }));
    }

    #[test]
    fn test_get_variable() {
        let mut context = TestContext::new();
        context.set_variable("x", "1");
        context.set_variable("x", "2");
        assert_eq!(context.get_variable("x").unwrap(), "2");
        assert_eq!(context.get_variable("${x}").unwrap(), "2");
        let err = context_error(context.get_variable("y").unwrap_err());
        assert_eq!(
            err,
            ContextError::UnknownVariable {
                name: "y".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_functions() {
        let mut context = TestContext::new();
        context.set_variable("name", "world");
        assert_eq!(
            context
                .resolve("Hello citrus:upperCase(${name})!")
                .unwrap(),
            "Hello WORLD!"
        );
        assert_eq!(
            context
                .resolve("citrus:concat('Hello, ', citrus:upperCase('x'), ${name})")
                .unwrap(),
            "Hello, Xworld"
        );
    }

    #[test]
    fn test_function_prefix_requires_word_boundary() {
        let context = TestContext::new();
        assert_eq!(
            context.resolve("xcitrus:upperCase('a')").unwrap(),
            "xcitrus:upperCase('a')"
        );
    }

    #[test]
    fn test_unknown_function_name() {
        let context = TestContext::new();
        let err = context_error(context.resolve("citrus:doesNotExist()").unwrap_err());
        assert_eq!(
            err,
            ContextError::UnknownFunction {
                name: "citrus:doesNotExist".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_function_namespace() {
        let context = TestContext::new();
        let err = context_error(context.resolve("foo:bar('x')").unwrap_err());
        assert_eq!(
            err,
            ContextError::UnknownFunction {
                name: "foo:bar".to_string()
            }
        );
        assert_eq!(
            context.resolve("http://localhost:8080/path").unwrap(),
            "http://localhost:8080/path"
        );
    }

    #[test]
    fn test_resolve_content_keeps_unknown_prefix() {
        let mut context = TestContext::new();
        context.set_variable("n", "42");
        assert_eq!(context.resolve_content("Status:Done(${n})").unwrap(), "Status:Done(42)");
        assert_eq!(
            context.resolve_content("citrus:upperCase('ok')").unwrap(),
            "OK"
        );
        let err = context_error(context.resolve_content("citrus:doesNotExist()").unwrap_err());
        assert!(matches!(err, ContextError::UnknownFunction { .. }));
    }

    #[test]
    fn test_function_failure_is_wrapped() {
        let mut context = TestContext::new();
        context.add_function_library(FunctionLibrary::new("custom", "my").with_function(
            "fail",
            |_params: &[String], _ctx: &TestContext| -> std::result::Result<String, ContextError> {
                Err(ContextError::UnknownVariable {
                    name: "inner".to_string(),
                })
            },
        ));
        let err = context_error(context.resolve("my:fail()").unwrap_err());
        assert!(matches!(
            err,
            ContextError::FunctionExecution { ref function, .. } if function == "my:fail"
        ));
    }

    #[test]
    fn test_create_variable_with_script() {
        let mut context = TestContext::new().with_script_engine("calc", Arc::new(Calculator));
        context.set_variable("a", "40");
        context
            .create_variable("answer", "script:<calc>${a} + 2")
            .unwrap();
        assert_eq!(context.get_variable("answer").unwrap(), "42");
    }

    #[test]
    fn test_create_variable_script_errors() {
        let mut context = TestContext::new().with_script_engine("calc", Arc::new(Calculator));
        let err = context_error(
            context
                .create_variable("x", "script:<groovy>1 + 1")
                .unwrap_err(),
        );
        assert!(matches!(
            err,
            ContextError::ScriptExecution { ref engine, .. } if engine == "groovy"
        ));

        let err = context_error(context.create_variable("x", "script:<calc>1 - 1").unwrap_err());
        assert!(matches!(
            err,
            ContextError::ScriptExecution { ref reason, .. } if reason.contains("syntax error")
        ));
    }

    #[test]
    fn test_resolve_map() {
        let mut context = TestContext::new();
        context.set_variable("op", "sayHello");
        let mut headers = BTreeMap::new();
        headers.insert("Operation".to_string(), "${op}".to_string());
        let resolved = context.resolve_map(&headers).unwrap();
        assert_eq!(resolved.get("Operation").map(String::as_str), Some("sayHello"));
    }
}
