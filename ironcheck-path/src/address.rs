/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Path expression parser.
//!
//! Three notations are accepted and parsed into the same [`Address`] form:
//! - XPath-like (`/a/b[2]/@id`, `//b`, `/a/*/text()`, `count(/a/b)`) for XML
//! - JSONPath-like (`$.a.b[0]`, `$..name`, `$.a[*]`, `$['key']`, `$.a.size()`) for JSON
//! - Dotted (`a.b[1].c`, `items[0].name`) for both
//!
//! Index conventions follow each document model: XML positions are 1-based,
//! JSON array indices are 0-based.

use crate::node_path::{NodePath, PathStep};
use ironcheck_core::error::PathError;
use ironcheck_core::message::MessageType;
use ironcheck_core::xml::QName;
use memchr::memchr;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Prefix to namespace URI bindings used to resolve prefixed name tests.
pub type Namespaces = BTreeMap<String, String>;

/// Name test of a location step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    /// Wildcard `*`.
    Any,
    /// Named test with optional namespace prefix.
    Name {
        /// Namespace prefix, XML only.
        prefix: Option<String>,
        /// Local name or JSON member name.
        local: String,
    },
}

impl NameTest {
    fn parse(raw: &str, qualified: bool) -> Self {
        if raw == "*" {
            return Self::Any;
        }
        match raw.split_once(':') {
            Some((prefix, local)) if qualified => Self::Name {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            _ => Self::Name {
                prefix: None,
                local: raw.to_string(),
            },
        }
    }

    /// Matches an XML name.
    ///
    /// Unprefixed tests match on the local name in any namespace. Prefixed
    /// tests compare namespace URIs when the prefix is bound, and fall back to
    /// the source prefix otherwise.
    #[must_use]
    pub fn matches_qname(&self, name: &QName, namespaces: &Namespaces) -> bool {
        match self {
            Self::Any => true,
            Self::Name {
                prefix: None,
                local,
            } => name.local == *local,
            Self::Name {
                prefix: Some(prefix),
                local,
            } => {
                name.local == *local
                    && match namespaces.get(prefix) {
                        Some(uri) => name.namespace.as_deref() == Some(uri.as_str()),
                        None => name.prefix.as_deref() == Some(prefix.as_str()),
                    }
            }
        }
    }

    /// Matches a JSON member name.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Name { local, .. } => local == name,
        }
    }

    fn prefix(&self) -> Option<&str> {
        match self {
            Self::Name {
                prefix: Some(prefix),
                ..
            } => Some(prefix.as_str()),
            _ => None,
        }
    }
}

/// One segment of an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Child element or member, with optional 1-based XML position.
    Child {
        /// Name test.
        test: NameTest,
        /// XML position predicate.
        position: Option<usize>,
    },
    /// Zero or more intermediate levels (`//` or `..`).
    AnyDepth,
    /// XML attribute.
    Attribute(NameTest),
    /// JSON array index, 0-based.
    Index(usize),
    /// Text content of the addressed element (`text()`).
    Text,
}

/// Function applied to the node set of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathFunction {
    /// XPath `count(...)`.
    Count,
    /// JSONPath `size()`.
    Size,
    /// JSONPath `keySet()`.
    KeySet,
}

impl PathFunction {
    /// Returns the function name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Size => "size",
            Self::KeySet => "keySet",
        }
    }
}

/// Notation an address was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// XPath-like.
    XPath,
    /// JSONPath-like.
    JsonPath,
    /// Dotted.
    Dotted,
}

/// Parsed structural address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    expression: String,
    syntax: Syntax,
    message_type: MessageType,
    segments: SmallVec<[Segment; 4]>,
    function: Option<PathFunction>,
}

impl Address {
    /// Parses a path expression for documents of the given type.
    ///
    /// JSON expressions starting with `$` are JSONPath, XML expressions
    /// containing `/` (or a `count(...)` call) are XPath; everything else is
    /// dotted notation.
    ///
    /// # Errors
    /// Returns `PathError::InvalidExpression` if the expression is malformed or
    /// the message type has no path language.
    pub fn parse(expression: &str, message_type: &MessageType) -> Result<Self, PathError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(invalid(expression, "empty path expression"));
        }
        let (syntax, segments, function) = match message_type {
            MessageType::Xml if trimmed.contains('/') || trimmed.starts_with("count(") => {
                let (segments, function) = parse_xpath(trimmed)?;
                (Syntax::XPath, segments, function)
            }
            MessageType::Xml => (Syntax::Dotted, parse_dotted(trimmed, true)?.0, None),
            MessageType::Json if trimmed.starts_with('$') => {
                let (segments, function) = parse_jsonpath(trimmed)?;
                (Syntax::JsonPath, segments, function)
            }
            MessageType::Json => {
                let (segments, function) = parse_dotted(trimmed, false)?;
                (Syntax::Dotted, segments, function)
            }
            other => {
                return Err(invalid(
                    expression,
                    format!("path expressions are not supported for {other} messages"),
                ));
            }
        };
        validate_order(trimmed, &segments)?;
        Ok(Self {
            expression: trimmed.to_string(),
            syntax,
            message_type: message_type.clone(),
            segments,
            function,
        })
    }

    /// Returns the source expression.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the notation the address was written in.
    #[must_use]
    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    /// Returns the document type the address applies to.
    #[must_use]
    pub fn message_type(&self) -> &MessageType {
        &self.message_type
    }

    /// Returns the segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the path function, if any.
    #[must_use]
    pub fn function(&self) -> Option<PathFunction> {
        self.function
    }

    /// Returns true if the address names at most one node.
    #[must_use]
    pub fn is_definite(&self) -> bool {
        self.segments.iter().all(|segment| {
            !matches!(
                segment,
                Segment::AnyDepth
                    | Segment::Child {
                        test: NameTest::Any,
                        ..
                    }
                    | Segment::Attribute(NameTest::Any)
            )
        })
    }

    /// Checks that every prefix used by the address is bound.
    ///
    /// # Errors
    /// Returns `PathError::UnboundPrefix` for the first unbound prefix.
    pub fn check_prefixes(&self, namespaces: &Namespaces) -> Result<(), PathError> {
        let unbound = self
            .segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Child { test, .. } | Segment::Attribute(test) => test.prefix(),
                _ => None,
            })
            .find(|prefix| !namespaces.contains_key(*prefix));
        match unbound {
            Some(prefix) => Err(PathError::UnboundPrefix {
                prefix: prefix.to_string(),
                expression: self.expression.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Returns true if the address matches the concrete node path.
    ///
    /// A trailing `text()` matches the element itself. In dotted XML notation a
    /// final name also matches an attribute.
    #[must_use]
    pub fn matches(&self, path: &NodePath, namespaces: &Namespaces) -> bool {
        self.match_from(0, path.steps(), namespaces)
    }

    fn match_from(&self, seg: usize, steps: &[PathStep], namespaces: &Namespaces) -> bool {
        let Some(segment) = self.segments.get(seg) else {
            return steps.is_empty();
        };
        match segment {
            Segment::AnyDepth => (0..=steps.len()).any(|skip| {
                steps[..skip].iter().all(PathStep::is_container)
                    && self.match_from(seg + 1, &steps[skip..], namespaces)
            }),
            Segment::Text => steps.is_empty() && self.match_from(seg + 1, steps, namespaces),
            _ => match steps.split_first() {
                Some((step, rest)) => {
                    self.match_step(segment, step, rest.is_empty(), namespaces)
                        && self.match_from(seg + 1, rest, namespaces)
                }
                None => false,
            },
        }
    }

    fn match_step(
        &self,
        segment: &Segment,
        step: &PathStep,
        last: bool,
        namespaces: &Namespaces,
    ) -> bool {
        match (segment, step) {
            (
                Segment::Child { test, position },
                PathStep::Element {
                    name,
                    position: actual,
                    index,
                },
            ) => {
                test.matches_qname(name, namespaces)
                    && match (position, test) {
                        (None, _) => true,
                        (Some(wanted), NameTest::Any) => index + 1 == *wanted,
                        (Some(wanted), NameTest::Name { .. }) => actual == wanted,
                    }
            }
            (
                Segment::Child {
                    test,
                    position: None,
                },
                PathStep::Attribute(name),
            ) => self.syntax == Syntax::Dotted && last && test.matches_qname(name, namespaces),
            (Segment::Child { test, .. }, PathStep::Member(name)) => test.matches_name(name),
            (
                Segment::Child {
                    test: NameTest::Any,
                    ..
                },
                PathStep::Index(_),
            ) => true,
            (Segment::Attribute(test), PathStep::Attribute(name)) => {
                test.matches_qname(name, namespaces)
            }
            (Segment::Index(wanted), PathStep::Index(actual)) => wanted == actual,
            _ => false,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

type Parsed = (SmallVec<[Segment; 4]>, Option<PathFunction>);

fn invalid(expression: &str, reason: impl Into<String>) -> PathError {
    PathError::InvalidExpression {
        expression: expression.to_string(),
        reason: reason.into(),
    }
}

fn is_name(raw: &str) -> bool {
    raw == "*"
        || (!raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
}

fn parse_xpath(expression: &str) -> Result<Parsed, PathError> {
    let (body, function) = match expression
        .strip_prefix("count(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (inner.trim(), Some(PathFunction::Count)),
        None => (expression, None),
    };

    let mut segments = SmallVec::new();
    let mut pos = 0;
    while pos < body.len() {
        let rest = &body[pos..];
        if rest.starts_with("//") {
            segments.push(Segment::AnyDepth);
            pos += 2;
        } else if rest.starts_with('/') {
            pos += 1;
        } else if pos > 0 {
            return Err(invalid(expression, "expected '/' between location steps"));
        }
        let end = memchr(b'/', &body.as_bytes()[pos..]).map_or(body.len(), |offset| pos + offset);
        let step = &body[pos..end];
        if step.is_empty() {
            return Err(invalid(expression, "empty location step"));
        }
        segments.push(parse_xpath_step(expression, step)?);
        pos = end;
    }
    if segments.is_empty() {
        return Err(invalid(expression, "empty location path"));
    }
    Ok((segments, function))
}

fn parse_xpath_step(expression: &str, step: &str) -> Result<Segment, PathError> {
    if step == "text()" {
        return Ok(Segment::Text);
    }
    if let Some(name) = step.strip_prefix('@') {
        if !is_name(name) {
            return Err(invalid(expression, format!("invalid attribute name '{name}'")));
        }
        return Ok(Segment::Attribute(NameTest::parse(name, true)));
    }
    let (name, position) = split_position(expression, step)?;
    if !is_name(name) {
        return Err(invalid(expression, format!("invalid location step '{step}'")));
    }
    Ok(Segment::Child {
        test: NameTest::parse(name, true),
        position,
    })
}

/// Splits `name[n]` into the name and its 1-based position.
fn split_position<'a>(
    expression: &str,
    step: &'a str,
) -> Result<(&'a str, Option<usize>), PathError> {
    let Some(open) = memchr(b'[', step.as_bytes()) else {
        return Ok((step, None));
    };
    let predicate = step[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| invalid(expression, format!("unterminated predicate in '{step}'")))?;
    let position = predicate
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|position| *position >= 1)
        .ok_or_else(|| {
            invalid(
                expression,
                format!("unsupported predicate '[{predicate}]', expected a position >= 1"),
            )
        })?;
    Ok((&step[..open], Some(position)))
}

fn parse_jsonpath(expression: &str) -> Result<Parsed, PathError> {
    let body = &expression[1..];
    let mut segments = SmallVec::new();
    let mut function = None;
    let mut pos = 0;
    while pos < body.len() {
        if function.is_some() {
            return Err(invalid(expression, "path function must be the last step"));
        }
        let rest = &body[pos..];
        if let Some(after) = rest.strip_prefix("..") {
            segments.push(Segment::AnyDepth);
            pos += 2;
            if after.starts_with('[') {
                continue;
            }
            let name = member_name(after);
            if name.is_empty() {
                return Err(invalid(expression, "expected a member name after '..'"));
            }
            segments.push(member_segment(name));
            pos += name.len();
        } else if let Some(after) = rest.strip_prefix('.') {
            pos += 1;
            let name = member_name(after);
            if name.is_empty() {
                return Err(invalid(expression, "expected a member name after '.'"));
            }
            pos += name.len();
            if body[pos..].starts_with("()") {
                function = Some(json_function(expression, name)?);
                pos += 2;
            } else {
                segments.push(member_segment(name));
            }
        } else if rest.starts_with('[') {
            let close = memchr(b']', rest.as_bytes())
                .ok_or_else(|| invalid(expression, "unterminated '['"))?;
            segments.push(bracket_segment(expression, rest[1..close].trim())?);
            pos += close + 1;
        } else {
            return Err(invalid(
                expression,
                format!("unexpected character at offset {}", pos + 1),
            ));
        }
    }
    Ok((segments, function))
}

fn member_name(rest: &str) -> &str {
    let end = rest.find(['.', '[', '(']).unwrap_or(rest.len());
    &rest[..end]
}

fn member_segment(name: &str) -> Segment {
    Segment::Child {
        test: NameTest::parse(name, false),
        position: None,
    }
}

fn json_function(expression: &str, name: &str) -> Result<PathFunction, PathError> {
    match name {
        "size" => Ok(PathFunction::Size),
        "keySet" => Ok(PathFunction::KeySet),
        other => Err(invalid(expression, format!("unknown path function '{other}()'"))),
    }
}

fn bracket_segment(expression: &str, inner: &str) -> Result<Segment, PathError> {
    if inner == "*" {
        return Ok(member_segment("*"));
    }
    for quote in ['\'', '"'] {
        if let Some(key) = inner
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Ok(Segment::Child {
                test: NameTest::Name {
                    prefix: None,
                    local: key.to_string(),
                },
                position: None,
            });
        }
    }
    inner
        .parse::<usize>()
        .map(Segment::Index)
        .map_err(|_| invalid(expression, format!("unsupported subscript '[{inner}]'")))
}

fn parse_dotted(expression: &str, xml: bool) -> Result<Parsed, PathError> {
    let mut segments = SmallVec::new();
    let mut function = None;
    let parts: Vec<&str> = expression.split('.').collect();
    let last = parts.len() - 1;
    for (i, part) in parts.into_iter().enumerate() {
        if part.is_empty() {
            return Err(invalid(expression, "empty path segment"));
        }
        if !xml && i == last {
            if let Some(name) = part.strip_suffix("()") {
                function = Some(json_function(expression, name)?);
                continue;
            }
        }
        if xml {
            if let Some(name) = part.strip_prefix('@') {
                if !is_name(name) {
                    return Err(invalid(expression, format!("invalid attribute name '{name}'")));
                }
                segments.push(Segment::Attribute(NameTest::parse(name, true)));
                continue;
            }
            let (name, position) = split_position(expression, part)?;
            if !is_name(name) {
                return Err(invalid(expression, format!("invalid path segment '{part}'")));
            }
            segments.push(Segment::Child {
                test: NameTest::parse(name, true),
                position,
            });
            continue;
        }

        let open = memchr(b'[', part.as_bytes()).unwrap_or(part.len());
        let name = &part[..open];
        if !name.is_empty() {
            segments.push(member_segment(name));
        }
        let mut subscripts = &part[open..];
        while !subscripts.is_empty() {
            let close = subscripts
                .strip_prefix('[')
                .and_then(|rest| memchr(b']', rest.as_bytes()))
                .ok_or_else(|| invalid(expression, format!("malformed subscript in '{part}'")))?;
            segments.push(bracket_segment(expression, subscripts[1..=close].trim())?);
            subscripts = &subscripts[close + 2..];
        }
    }
    Ok((segments, function))
}

fn validate_order(expression: &str, segments: &[Segment]) -> Result<(), PathError> {
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Attribute(_) | Segment::Text if i != last => {
                return Err(invalid(
                    expression,
                    "attribute and text() steps must be the last step",
                ));
            }
            Segment::AnyDepth if i == last => {
                return Err(invalid(expression, "descendant step without a target"));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_path::PathStep;

    fn xml(expression: &str) -> Address {
        Address::parse(expression, &MessageType::Xml).unwrap()
    }

    fn json(expression: &str) -> Address {
        Address::parse(expression, &MessageType::Json).unwrap()
    }

    fn xml_path(names: &[&str]) -> NodePath {
        let mut path = NodePath::new();
        for name in names {
            path = path.child(PathStep::element(QName::new(*name), 1, 0));
        }
        path
    }

    #[test]
    fn test_parse_xpath() {
        let address = xml("/a/b[2]/@id");
        assert_eq!(address.syntax(), Syntax::XPath);
        assert_eq!(
            address.segments(),
            &[
                Segment::Child {
                    test: NameTest::parse("a", true),
                    position: None
                },
                Segment::Child {
                    test: NameTest::parse("b", true),
                    position: Some(2)
                },
                Segment::Attribute(NameTest::parse("id", true)),
            ]
        );
        assert!(address.is_definite());
        assert!(!xml("//b").is_definite());
        assert_eq!(xml("count(/a/b)").function(), Some(PathFunction::Count));
    }

    #[test]
    fn test_parse_jsonpath() {
        let address = json("$.items[0].name");
        assert_eq!(address.syntax(), Syntax::JsonPath);
        assert_eq!(address.segments().len(), 3);
        assert_eq!(address.segments()[1], Segment::Index(0));

        assert_eq!(json("$['a b']").segments().len(), 1);
        assert_eq!(json("$.items.size()").function(), Some(PathFunction::Size));
        assert_eq!(json("$.obj.keySet()").function(), Some(PathFunction::KeySet));
        assert_eq!(json("$..name").segments()[0], Segment::AnyDepth);
    }

    #[test]
    fn test_parse_dotted() {
        let address = json("items[0].name");
        assert_eq!(address.syntax(), Syntax::Dotted);
        assert_eq!(address.segments()[1], Segment::Index(0));

        let address = xml("TestRequest.Message[2]");
        assert_eq!(address.syntax(), Syntax::Dotted);
        assert_eq!(
            address.segments()[1],
            Segment::Child {
                test: NameTest::parse("Message", true),
                position: Some(2)
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        for expression in [
            "",
            "/a//",
            "/a/b[x]",
            "/a/b[0]",
            "/a/@id/c",
            "$.a[",
            "$.a.unknown()",
            "a..b",
        ] {
            let message_type = if expression.starts_with('$') {
                MessageType::Json
            } else {
                MessageType::Xml
            };
            assert!(
                matches!(
                    Address::parse(expression, &message_type),
                    Err(PathError::InvalidExpression { .. })
                ),
                "expected '{expression}' to be rejected"
            );
        }
        assert!(Address::parse("a.b", &MessageType::Plaintext).is_err());
    }

    #[test]
    fn test_match_xml() {
        let ns = Namespaces::new();
        let path = xml_path(&["a", "b"]);
        assert!(xml("/a/b").matches(&path, &ns));
        assert!(xml("a/b").matches(&path, &ns));
        assert!(xml("a.b").matches(&path, &ns));
        assert!(xml("//b").matches(&path, &ns));
        assert!(xml("/a/*").matches(&path, &ns));
        assert!(xml("/a/b/text()").matches(&path, &ns));
        assert!(!xml("/a").matches(&path, &ns));
        assert!(!xml("/b").matches(&path, &ns));

        let attr = path.attribute(&QName::new("id"));
        assert!(xml("/a/b/@id").matches(&attr, &ns));
        assert!(xml("//@id").matches(&attr, &ns));
        assert!(xml("a.b.id").matches(&attr, &ns));
        assert!(!xml("/a/b/id").matches(&attr, &ns));
    }

    #[test]
    fn test_match_positions() {
        let ns = Namespaces::new();
        let path = NodePath::xml_root(&QName::new("a"))
            .child(PathStep::element(QName::new("b"), 2, 3));
        assert!(xml("/a/b[2]").matches(&path, &ns));
        assert!(!xml("/a/b[1]").matches(&path, &ns));
        assert!(xml("/a/*[4]").matches(&path, &ns));
    }

    #[test]
    fn test_match_namespaces() {
        let mut ns = Namespaces::new();
        ns.insert("x".to_string(), "urn:x".to_string());
        let path = NodePath::xml_root(&QName::qualified("a", Some("p".to_string()), "urn:x"));
        assert!(xml("/x:a").matches(&path, &ns));
        assert!(xml("/a").matches(&path, &ns));
        assert!(xml("/p:a").matches(&path, &ns));
        assert!(!xml("/y:a").matches(&path, &ns));

        let address = xml("/y:a");
        assert!(matches!(
            address.check_prefixes(&ns),
            Err(PathError::UnboundPrefix { ref prefix, .. }) if prefix == "y"
        ));
    }

    #[test]
    fn test_match_json() {
        let ns = Namespaces::new();
        let age = NodePath::new().member("person").member("age");
        assert!(json("$.person.age").matches(&age, &ns));
        assert!(json("person.age").matches(&age, &ns));
        assert!(json("$..age").matches(&age, &ns));
        assert!(json("$.person.*").matches(&age, &ns));
        assert!(!json("$.person").matches(&age, &ns));

        let item = NodePath::new().member("items").index(1).member("name");
        assert!(json("$.items[1].name").matches(&item, &ns));
        assert!(json("$.items[*].name").matches(&item, &ns));
        assert!(json("items[1].name").matches(&item, &ns));
        assert!(!json("$.items[0].name").matches(&item, &ns));
        assert!(json("$").matches(&NodePath::new(), &ns));
    }
}
