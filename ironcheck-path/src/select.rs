/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Address evaluation against parsed documents.

use crate::address::{Address, Namespaces, PathFunction};
use crate::node_path::{NodePath, child_steps};
use ironcheck_core::document::Document;
use ironcheck_core::error::PathError;
use ironcheck_core::message::MessageType;
use ironcheck_core::xml::{XmlAttribute, XmlDocument, XmlElement, XmlNode};
use serde_json::Value;
use std::fmt;

/// Value selected by an address.
#[derive(Debug, Clone, PartialEq)]
pub enum PathValue {
    /// XML text or attribute value, or a function result.
    Text(String),
    /// JSON value.
    Json(Value),
    /// Several selected values, in document order.
    List(Vec<PathValue>),
}

impl PathValue {
    /// Converts the value into JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Json(value) => value.clone(),
            Self::List(values) => Value::Array(values.iter().map(Self::to_json).collect()),
        }
    }
}

impl fmt::Display for PathValue {
    /// Strings render without quotes; lists are joined with commas.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Json(Value::String(text)) => f.write_str(text),
            Self::Json(value) => write!(f, "{value}"),
            Self::List(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Node selected in an XML document.
#[derive(Debug, Clone, Copy)]
pub enum XmlMatch<'a> {
    /// Element node.
    Element(&'a XmlElement),
    /// Attribute node.
    Attribute(&'a XmlAttribute),
}

impl XmlMatch<'_> {
    /// Returns the string value of the node.
    ///
    /// Elements yield their concatenated descendant text.
    #[must_use]
    pub fn string_value(&self) -> String {
        match self {
            Self::Element(element) => text_content(element),
            Self::Attribute(attribute) => attribute.value.clone(),
        }
    }
}

/// Concatenates all descendant text of an element.
#[must_use]
pub fn text_content(element: &XmlElement) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for node in &element.children {
        match node {
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Element(child) => collect_text(child, out),
        }
    }
}

/// Merges configured namespaces over the declarations of a document.
#[must_use]
pub fn effective_namespaces(document: &XmlDocument, configured: &Namespaces) -> Namespaces {
    let mut namespaces = document.declared_namespaces();
    namespaces.extend(configured.iter().map(|(k, v)| (k.clone(), v.clone())));
    namespaces
}

/// Selects all XML nodes matching the address, in document order.
///
/// # Errors
/// Returns `PathError::UnboundPrefix` if the address uses a prefix bound
/// neither in `namespaces` nor in the document.
pub fn select_xml<'a>(
    address: &Address,
    document: &'a XmlDocument,
    namespaces: &Namespaces,
) -> Result<Vec<XmlMatch<'a>>, PathError> {
    let namespaces = effective_namespaces(document, namespaces);
    address.check_prefixes(&namespaces)?;
    let mut out = Vec::new();
    walk_xml(
        document.root(),
        NodePath::xml_root(&document.root().name),
        address,
        &namespaces,
        &mut out,
    );
    Ok(out)
}

fn walk_xml<'a>(
    element: &'a XmlElement,
    path: NodePath,
    address: &Address,
    namespaces: &Namespaces,
    out: &mut Vec<XmlMatch<'a>>,
) {
    if address.matches(&path, namespaces) {
        out.push(XmlMatch::Element(element));
    }
    for attribute in &element.attributes {
        if address.matches(&path.attribute(&attribute.name), namespaces) {
            out.push(XmlMatch::Attribute(attribute));
        }
    }
    for (step, child) in child_steps(element).into_iter().zip(element.child_elements()) {
        walk_xml(child, path.child(step), address, namespaces, out);
    }
}

/// Selects all JSON values matching the address, in document order.
#[must_use]
pub fn select_json<'a>(address: &Address, document: &'a Value) -> Vec<&'a Value> {
    let mut out = Vec::new();
    walk_json(document, NodePath::new(), address, &mut out);
    out
}

fn walk_json<'a>(value: &'a Value, path: NodePath, address: &Address, out: &mut Vec<&'a Value>) {
    if address.matches(&path, &Namespaces::new()) {
        out.push(value);
    }
    match value {
        Value::Object(members) => {
            for (name, member) in members {
                walk_json(member, path.member(name), address, out);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                walk_json(item, path.index(index), address, out);
            }
        }
        _ => {}
    }
}

/// Evaluates an address against a document.
///
/// # Errors
/// - `PathError::NotFound` if nothing matches (except for `count()`, which yields `0`)
/// - `PathError::InvalidExpression` if the address does not apply to the document
///   type or a path function cannot be applied
/// - `PathError::UnboundPrefix` for unbound XML prefixes
pub fn evaluate(
    address: &Address,
    document: &Document,
    namespaces: &Namespaces,
) -> Result<PathValue, PathError> {
    evaluate_optional(address, document, namespaces)?.ok_or_else(|| PathError::NotFound {
        path: address.expression().to_string(),
    })
}

/// Evaluates an address, returning `None` when nothing matches.
///
/// # Errors
/// Same as [`evaluate`], without `NotFound`.
pub fn evaluate_optional(
    address: &Address,
    document: &Document,
    namespaces: &Namespaces,
) -> Result<Option<PathValue>, PathError> {
    match (document, address.message_type()) {
        (Document::Xml(xml), MessageType::Xml) => {
            let matches = select_xml(address, xml, namespaces)?;
            if address.function() == Some(PathFunction::Count) {
                return Ok(Some(PathValue::Text(matches.len().to_string())));
            }
            let mut values: Vec<PathValue> = matches
                .iter()
                .map(|node| PathValue::Text(node.string_value()))
                .collect();
            Ok(collapse(&mut values))
        }
        (Document::Json(json), MessageType::Json) => {
            let matches = select_json(address, json);
            if matches.is_empty() {
                return Ok(None);
            }
            match address.function() {
                Some(function) => apply_json_function(address, function, &matches).map(Some),
                None => {
                    let mut values: Vec<PathValue> = matches
                        .into_iter()
                        .map(|value| PathValue::Json(value.clone()))
                        .collect();
                    Ok(collapse(&mut values))
                }
            }
        }
        (document, _) => Err(PathError::InvalidExpression {
            expression: address.expression().to_string(),
            reason: format!(
                "{} address cannot be evaluated against a {} document",
                address.message_type(),
                document.message_type()
            ),
        }),
    }
}

fn collapse(values: &mut Vec<PathValue>) -> Option<PathValue> {
    match values.len() {
        0 => None,
        1 => values.pop(),
        _ => Some(PathValue::List(std::mem::take(values))),
    }
}

fn apply_json_function(
    address: &Address,
    function: PathFunction,
    matches: &[&Value],
) -> Result<PathValue, PathError> {
    let unsupported = |value: &Value| PathError::InvalidExpression {
        expression: address.expression().to_string(),
        reason: format!("{}() cannot be applied to {value}", function.as_str()),
    };
    let [value] = matches else {
        return match function {
            PathFunction::Size => Ok(PathValue::Text(matches.len().to_string())),
            _ => Err(PathError::InvalidExpression {
                expression: address.expression().to_string(),
                reason: format!("{}() requires a single value", function.as_str()),
            }),
        };
    };
    match (function, *value) {
        (PathFunction::Size, Value::Array(items)) => Ok(PathValue::Text(items.len().to_string())),
        (PathFunction::Size, Value::Object(members)) => {
            Ok(PathValue::Text(members.len().to_string()))
        }
        (PathFunction::Size, Value::String(text)) => {
            Ok(PathValue::Text(text.chars().count().to_string()))
        }
        (PathFunction::KeySet, Value::Object(members)) => Ok(PathValue::List(
            members.keys().map(|key| PathValue::Text(key.clone())).collect(),
        )),
        (_, other) => Err(unsupported(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn xml_doc(text: &str) -> Document {
        Document::Xml(XmlDocument::parse(text).unwrap())
    }

    fn eval_xml(expression: &str, doc: &Document) -> Result<PathValue, PathError> {
        let address = Address::parse(expression, &MessageType::Xml).unwrap();
        evaluate(&address, doc, &Namespaces::new())
    }

    fn eval_json(expression: &str, doc: &Document) -> Result<PathValue, PathError> {
        let address = Address::parse(expression, &MessageType::Json).unwrap();
        evaluate(&address, doc, &Namespaces::new())
    }

    #[test]
    fn test_evaluate_xml() {
        let doc = xml_doc(r#"<a id="1"><b>x</b><b>y</b><c><d>z</d></c></a>"#);
        assert_eq!(eval_xml("/a/b[2]", &doc).unwrap().to_string(), "y");
        assert_eq!(eval_xml("/a/@id", &doc).unwrap().to_string(), "1");
        assert_eq!(eval_xml("//d/text()", &doc).unwrap().to_string(), "z");
        assert_eq!(eval_xml("a.c.d", &doc).unwrap().to_string(), "z");
        assert_eq!(eval_xml("/a/b", &doc).unwrap().to_string(), "x,y");
        assert_eq!(eval_xml("count(/a/b)", &doc).unwrap().to_string(), "2");
        assert_eq!(eval_xml("count(/a/e)", &doc).unwrap().to_string(), "0");
    }

    #[test]
    fn test_evaluate_xml_not_found() {
        let doc = xml_doc("<a><b>x</b></a>");
        let err = eval_xml("/a/missing", &doc).unwrap_err();
        assert_eq!(
            err,
            PathError::NotFound {
                path: "/a/missing".to_string()
            }
        );
    }

    #[test]
    fn test_evaluate_xml_namespaces() {
        let doc = xml_doc(r#"<ns0:a xmlns:ns0="urn:test"><ns0:b>v</ns0:b></ns0:a>"#);
        let mut configured = Namespaces::new();
        configured.insert("t".to_string(), "urn:test".to_string());
        let address = Address::parse("/t:a/t:b", &MessageType::Xml).unwrap();
        assert_eq!(
            evaluate(&address, &doc, &configured).unwrap().to_string(),
            "v"
        );
        assert_eq!(eval_xml("/ns0:a/ns0:b", &doc).unwrap().to_string(), "v");
        assert!(matches!(
            eval_xml("/x:a", &doc),
            Err(PathError::UnboundPrefix { .. })
        ));
    }

    #[test]
    fn test_evaluate_json() {
        let doc = Document::Json(json!({
            "person": {"name": "Ada", "age": 36},
            "items": [{"id": 1}, {"id": 2}]
        }));
        assert_eq!(eval_json("$.person.name", &doc).unwrap().to_string(), "Ada");
        assert_eq!(
            eval_json("$.person.age", &doc).unwrap(),
            PathValue::Json(json!(36))
        );
        assert_eq!(eval_json("items[1].id", &doc).unwrap().to_string(), "2");
        assert_eq!(eval_json("$.items[*].id", &doc).unwrap().to_string(), "1,2");
        assert_eq!(eval_json("$..id", &doc).unwrap().to_string(), "1,2");
        assert_eq!(eval_json("$.items.size()", &doc).unwrap().to_string(), "2");
        let PathValue::List(keys) = eval_json("$.person.keySet()", &doc).unwrap() else {
            panic!("keySet() must yield a list");
        };
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&PathValue::Text("age".to_string())));
        assert!(matches!(
            eval_json("$.person.email", &doc),
            Err(PathError::NotFound { .. })
        ));
        assert!(matches!(
            eval_json("$.person.name.keySet()", &doc),
            Err(PathError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_evaluate_type_mismatch() {
        let doc = Document::Json(json!({"a": 1}));
        assert!(matches!(
            eval_xml("/a", &doc),
            Err(PathError::InvalidExpression { .. })
        ));
    }
}
