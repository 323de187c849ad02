/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Function libraries for dynamic content.
//!
//! Functions are invoked from any resolvable string with the syntax
//! `prefix:name(param, 'quoted param', ...)`. Parameters are resolved before the
//! function runs, so they may contain `${}` placeholders and nested calls.
//!
//! The built-in library is registered under the `citrus:` prefix.

use crate::context::TestContext;
use chrono::Local;
use ironcheck_core::error::ContextError;
use rand::Rng;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

/// Prefix of the built-in function library.
pub const DEFAULT_PREFIX: &str = "citrus:";

/// A function callable from dynamic content.
pub trait Function: Send + Sync {
    /// Executes the function.
    ///
    /// # Arguments
    /// * `params` - The resolved parameters
    /// * `context` - The test context
    ///
    /// # Errors
    /// Returns `ContextError` if the parameters are invalid or the computation fails.
    fn execute(&self, params: &[String], context: &TestContext) -> Result<String, ContextError>;
}

impl<F> Function for F
where
    F: Fn(&[String], &TestContext) -> Result<String, ContextError> + Send + Sync,
{
    fn execute(&self, params: &[String], context: &TestContext) -> Result<String, ContextError> {
        self(params, context)
    }
}

/// A named set of functions sharing a prefix.
#[derive(Clone)]
pub struct FunctionLibrary {
    /// Library name.
    name: String,
    /// Prefix including the trailing colon (e.g. "citrus:").
    prefix: String,
    /// Functions indexed by name.
    functions: HashMap<String, Arc<dyn Function>>,
}

impl FunctionLibrary {
    /// Creates an empty library.
    ///
    /// # Arguments
    /// * `name` - The library name
    /// * `prefix` - The call prefix; a trailing colon is added if missing
    #[must_use]
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with(':') {
            prefix.push(':');
        }
        Self {
            name: name.into(),
            prefix,
            functions: HashMap::new(),
        }
    }

    /// Adds a function to the library.
    #[must_use]
    pub fn with_function(
        mut self,
        name: impl Into<String>,
        function: impl Function + 'static,
    ) -> Self {
        self.register(name, function);
        self
    }

    /// Registers a function, replacing any previous function with the same name.
    pub fn register(&mut self, name: impl Into<String>, function: impl Function + 'static) {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Returns the library name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the call prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Gets a function by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    /// Returns true if the library knows the function.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Creates the built-in library.
    #[must_use]
    pub fn builtins() -> Self {
        Self::new("citrusFunctionLibrary", DEFAULT_PREFIX)
            .with_function("concat", concat)
            .with_function("upperCase", upper_case)
            .with_function("lowerCase", lower_case)
            .with_function("substring", substring)
            .with_function("stringLength", string_length)
            .with_function("translate", translate)
            .with_function("randomNumber", random_number)
            .with_function("randomString", random_string)
            .with_function("randomUUID", random_uuid)
            .with_function("currentDate", current_date)
            .with_function("sum", sum)
            .with_function("max", max)
            .with_function("min", min)
            .with_function("abs", abs)
            .with_function("escapeXml", escape_xml)
    }
}

impl fmt::Debug for FunctionLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionLibrary")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("functions", &names)
            .finish()
    }
}

/// Registry of function libraries, searched in registration order.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    libraries: Vec<FunctionLibrary>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in library.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.add_library(FunctionLibrary::builtins());
        registry
    }

    /// Adds a library.
    pub fn add_library(&mut self, library: FunctionLibrary) {
        self.libraries.push(library);
    }

    /// Gets the library registered for a prefix (with trailing colon).
    #[must_use]
    pub fn library(&self, prefix: &str) -> Option<&FunctionLibrary> {
        self.libraries.iter().find(|lib| lib.prefix == prefix)
    }

    /// Returns an iterator over all libraries.
    pub fn libraries(&self) -> impl Iterator<Item = &FunctionLibrary> {
        self.libraries.iter()
    }

    /// Returns the library whose prefix starts `text`, if any.
    pub(crate) fn library_at(&self, text: &str) -> Option<&FunctionLibrary> {
        self.libraries
            .iter()
            .find(|lib| text.starts_with(lib.prefix.as_str()))
    }
}

/// A function invocation found in dynamic content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FunctionCall<'a> {
    /// Function name without prefix.
    pub name: &'a str,
    /// Raw, unresolved parameter list.
    pub raw_params: Vec<&'a str>,
    /// Number of bytes consumed from the input, including the prefix.
    pub consumed: usize,
}

/// Parses `name(params)` following a library prefix.
///
/// Returns `Ok(None)` when the text is not a call (no parenthesis after the name).
pub(crate) fn parse_call<'a>(
    text: &'a str,
    prefix_len: usize,
) -> Result<Option<FunctionCall<'a>>, ContextError> {
    let rest = &text[prefix_len..];
    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if name_len == 0 || !rest[name_len..].starts_with('(') {
        return Ok(None);
    }
    let name = &rest[..name_len];
    let params_start = name_len + 1;

    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut close = None;
    for (i, c) in rest[params_start..].char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes && depth == 0 => {
                close = Some(params_start + i);
                break;
            }
            ')' if !in_quotes => depth -= 1,
            _ => {}
        }
    }
    let close = close.ok_or_else(|| ContextError::InvalidExpression {
        expression: text.to_string(),
        reason: format!("unterminated parameter list for function '{name}'"),
    })?;

    Ok(Some(FunctionCall {
        name,
        raw_params: split_params(&rest[params_start..close]),
        consumed: prefix_len + close + 1,
    }))
}

/// Splits a raw parameter list on top-level commas.
fn split_params(raw: &str) -> Vec<&str> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth = depth.saturating_sub(1),
            ',' if !in_quotes && depth == 0 => {
                params.push(raw[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(raw[start..].trim());
    params
}

fn failure(function: &str, reason: impl Into<String>) -> ContextError {
    ContextError::FunctionExecution {
        function: format!("{DEFAULT_PREFIX}{function}"),
        reason: reason.into(),
    }
}

fn param<'a>(function: &str, params: &'a [String], index: usize) -> Result<&'a str, ContextError> {
    params
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| failure(function, format!("missing parameter #{}", index + 1)))
}

fn int_param(function: &str, params: &[String], index: usize) -> Result<usize, ContextError> {
    let raw = param(function, params, index)?;
    raw.trim()
        .parse()
        .map_err(|_| failure(function, format!("parameter '{raw}' is not a non-negative integer")))
}

fn decimal_params(function: &str, params: &[String]) -> Result<Vec<Decimal>, ContextError> {
    if params.is_empty() {
        return Err(failure(function, "at least one numeric parameter required"));
    }
    params
        .iter()
        .map(|raw| {
            Decimal::from_str(raw.trim())
                .map_err(|_| failure(function, format!("parameter '{raw}' is not a number")))
        })
        .collect()
}

fn concat(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    Ok(params.concat())
}

fn upper_case(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    Ok(param("upperCase", params, 0)?.to_uppercase())
}

fn lower_case(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    Ok(param("lowerCase", params, 0)?.to_lowercase())
}

fn substring(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    let value: Vec<char> = param("substring", params, 0)?.chars().collect();
    let begin = int_param("substring", params, 1)?;
    let end = if params.len() > 2 {
        int_param("substring", params, 2)?
    } else {
        value.len()
    };
    if begin > end || end > value.len() {
        return Err(failure(
            "substring",
            format!("range {begin}..{end} out of bounds for length {}", value.len()),
        ));
    }
    Ok(value[begin..end].iter().collect())
}

fn string_length(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    Ok(param("stringLength", params, 0)?.chars().count().to_string())
}

fn translate(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    let value = param("translate", params, 0)?;
    let pattern = param("translate", params, 1)?;
    let replacement = param("translate", params, 2)?;
    let regex = Regex::new(pattern).map_err(|err| failure("translate", err.to_string()))?;
    Ok(regex.replace_all(value, replacement).into_owned())
}

fn random_number(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    let length = int_param("randomNumber", params, 0)?;
    if length == 0 {
        return Err(failure("randomNumber", "length must be greater than zero"));
    }
    let mut rng = rand::thread_rng();
    let mut out = String::with_capacity(length);
    out.push(char::from(b'0' + rng.gen_range(1..=9u8)));
    for _ in 1..length {
        out.push(char::from(b'0' + rng.gen_range(0..=9u8)));
    }
    Ok(out)
}

fn random_string(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
    const DIGITS: &str = "0123456789";

    let length = int_param("randomString", params, 0)?;
    let mode = params.get(1).map(|m| m.to_ascii_uppercase());
    let mut alphabet = match mode.as_deref() {
        None | Some("MIXED") => format!("{UPPER}{LOWER}"),
        Some("UPPERCASE") => UPPER.to_string(),
        Some("LOWERCASE") => LOWER.to_string(),
        Some(other) => return Err(failure("randomString", format!("unknown mode '{other}'"))),
    };
    if params.get(2).is_some_and(|flag| flag.eq_ignore_ascii_case("true")) {
        alphabet.push_str(DIGITS);
    }
    let alphabet: Vec<char> = alphabet.chars().collect();
    let mut rng = rand::thread_rng();
    Ok((0..length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
        .collect())
}

fn random_uuid(_params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    Ok(uuid::Uuid::new_v4().to_string())
}

fn current_date(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    let format = params.first().map_or("%d.%m.%Y", String::as_str);
    let mut out = String::new();
    write!(out, "{}", Local::now().format(format))
        .map_err(|_| failure("currentDate", format!("invalid date format '{format}'")))?;
    Ok(out)
}

fn sum(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    let total: Decimal = decimal_params("sum", params)?.into_iter().sum();
    Ok(total.normalize().to_string())
}

fn max(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    let values = decimal_params("max", params)?;
    let max = values.into_iter().max().unwrap_or_default();
    Ok(max.normalize().to_string())
}

fn min(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    let values = decimal_params("min", params)?;
    let min = values.into_iter().min().unwrap_or_default();
    Ok(min.normalize().to_string())
}

fn abs(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    let values = decimal_params("abs", params)?;
    Ok(values[0].abs().normalize().to_string())
}

fn escape_xml(params: &[String], _context: &TestContext) -> Result<String, ContextError> {
    let value = param("escapeXml", params, 0)?;
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    Ok(out)
}
