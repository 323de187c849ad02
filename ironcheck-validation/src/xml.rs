/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Structural XML comparison.
//!
//! Attributes are compared regardless of order, child elements in document
//! order. Names are compared by local part and resolved namespace URI, never
//! by prefix. Leaf text is trimmed before comparison.

use crate::contexts::{ValidationContext, XmlValidationContext};
use crate::matcher::is_ignore;
use crate::registry::CompareInput;
use ironcheck_context::TestContext;
use ironcheck_core::error::Result;
use ironcheck_core::message::MessageType;
use ironcheck_core::types::{Mismatch, MismatchKind};
use ironcheck_core::xml::{QName, XmlDocument, XmlElement};
use ironcheck_path::{Address, Namespaces, NodePath, child_steps, effective_namespaces};
use tracing::{debug, trace};

/// Compares the actual XML payload with the control payload.
///
/// # Errors
/// Returns an error if a payload is not well-formed XML, an ignore
/// expression is invalid, the schema check fails, or a matcher is unknown.
pub fn compare_xml(input: &CompareInput<'_>, context: &mut TestContext) -> Result<Vec<Mismatch>> {
    let fallback;
    let settings = match input.context {
        ValidationContext::Xml(settings) => settings,
        _ => {
            fallback = XmlValidationContext::new();
            &fallback
        }
    };

    if !input.actual.is_payload_empty() {
        input.check_schema(input.actual.payload_str()?)?;
    }
    if input.control.is_payload_empty() {
        debug!("empty control payload, skipping XML comparison");
        return Ok(Vec::new());
    }
    let control = XmlDocument::parse(input.control.payload_str()?)?;
    let root_path = NodePath::xml_root(&control.root().name);
    if input.actual.is_payload_empty() {
        return Ok(vec![Mismatch::absent(
            root_path.to_string(),
            control.root().name.to_string(),
            MismatchKind::MissingPath,
        )]);
    }
    let actual = XmlDocument::parse(input.actual.payload_str()?)?;

    let ignores = settings
        .ignore_expressions
        .iter()
        .map(|expression| Address::parse(expression, &MessageType::Xml))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut comparison = XmlComparison {
        input,
        ignores,
        namespaces: effective_namespaces(&control, &settings.namespaces),
        default_namespace: settings.control_namespaces.get("").cloned(),
        mismatches: Vec::new(),
    };
    comparison.declared_namespaces(settings, actual.root(), &root_path);

    if control.root().name.local != actual.root().name.local {
        comparison.mismatches.push(Mismatch::new(
            root_path.to_string(),
            control.root().name.to_string(),
            actual.root().name.to_string(),
            MismatchKind::ElementName,
        ));
    } else {
        comparison.element(control.root(), actual.root(), &root_path, context)?;
    }
    debug!(mismatches = comparison.mismatches.len(), "XML comparison finished");
    Ok(comparison.mismatches)
}

struct XmlComparison<'a, 'i> {
    input: &'a CompareInput<'i>,
    ignores: Vec<Address>,
    namespaces: Namespaces,
    default_namespace: Option<String>,
    mismatches: Vec<Mismatch>,
}

impl XmlComparison<'_, '_> {
    fn is_ignored(&self, path: &NodePath) -> bool {
        self.ignores
            .iter()
            .any(|address| address.matches(path, &self.namespaces))
    }

    /// Namespace the control element is expected to carry.
    fn expected_namespace(&self, name: &QName) -> Option<String> {
        match (&name.namespace, &name.prefix) {
            (Some(uri), _) => Some(uri.clone()),
            (None, None) => self.default_namespace.clone(),
            (None, Some(_)) => None,
        }
    }

    fn declared_namespaces(
        &mut self,
        settings: &XmlValidationContext,
        root: &XmlElement,
        path: &NodePath,
    ) {
        for (prefix, uri) in &settings.control_namespaces {
            let declared = root.namespaces.iter().find(|(declared, _)| {
                declared.as_deref().unwrap_or_default() == prefix.as_str()
            });
            let expected = if prefix.is_empty() {
                format!("xmlns=\"{uri}\"")
            } else {
                format!("xmlns:{prefix}=\"{uri}\"")
            };
            match declared {
                Some((_, found)) if found == uri => {}
                Some((_, found)) => self.mismatches.push(Mismatch::new(
                    path.to_string(),
                    expected,
                    found.clone(),
                    MismatchKind::Namespace,
                )),
                None => self.mismatches.push(Mismatch::absent(
                    path.to_string(),
                    expected,
                    MismatchKind::Namespace,
                )),
            }
        }
    }

    fn element(
        &mut self,
        control: &XmlElement,
        actual: &XmlElement,
        path: &NodePath,
        context: &mut TestContext,
    ) -> Result<()> {
        if self.is_ignored(path) {
            trace!(%path, "element ignored");
            return Ok(());
        }
        let expected = self.expected_namespace(&control.name);
        if expected != actual.name.namespace {
            self.mismatches.push(Mismatch::new(
                path.to_string(),
                expected.unwrap_or_else(|| Mismatch::ABSENT.to_string()),
                actual
                    .name
                    .namespace
                    .clone()
                    .unwrap_or_else(|| Mismatch::ABSENT.to_string()),
                MismatchKind::Namespace,
            ));
            return Ok(());
        }
        if !control.has_child_elements() && is_ignore(&control.text()) {
            trace!(%path, "element ignored by placeholder");
            return Ok(());
        }

        self.attributes(control, actual, path, context)?;
        if control.has_child_elements() {
            self.children(control, actual, path, context)
        } else {
            self.text(control, actual, path, context)
        }
    }

    fn attributes(
        &mut self,
        control: &XmlElement,
        actual: &XmlElement,
        path: &NodePath,
        context: &mut TestContext,
    ) -> Result<()> {
        for attribute in &control.attributes {
            let attribute_path = path.attribute(&attribute.name);
            if self.is_ignored(&attribute_path) {
                continue;
            }
            match actual
                .attributes
                .iter()
                .find(|found| same_attribute(&found.name, &attribute.name))
            {
                None => self.mismatches.push(Mismatch::absent(
                    attribute_path.to_string(),
                    attribute.value.clone(),
                    MismatchKind::MissingAttribute,
                )),
                Some(found) => {
                    if let Some(mismatch) = self.input.compare_value(
                        &attribute_path.to_string(),
                        &attribute.name.local,
                        &attribute.value,
                        &found.value,
                        context,
                    )? {
                        self.mismatches.push(mismatch);
                    }
                }
            }
        }

        for attribute in &actual.attributes {
            let attribute_path = path.attribute(&attribute.name);
            let declared = control
                .attributes
                .iter()
                .any(|expected| same_attribute(&expected.name, &attribute.name));
            if !declared && !self.is_ignored(&attribute_path) {
                self.mismatches.push(Mismatch::new(
                    attribute_path.to_string(),
                    Mismatch::ABSENT,
                    attribute.value.clone(),
                    MismatchKind::UnexpectedAttribute,
                ));
            }
        }
        Ok(())
    }

    fn children(
        &mut self,
        control: &XmlElement,
        actual: &XmlElement,
        path: &NodePath,
        context: &mut TestContext,
    ) -> Result<()> {
        let control_children = self.compared_children(control, path);
        let actual_children = self.compared_children(actual, path);

        for ((child_path, expected), (_, found)) in control_children.iter().zip(&actual_children) {
            if expected.name.local != found.name.local {
                self.mismatches.push(Mismatch::new(
                    child_path.to_string(),
                    expected.name.to_string(),
                    found.name.to_string(),
                    MismatchKind::ElementName,
                ));
                return Ok(());
            }
            self.element(expected, found, child_path, context)?;
        }

        if control_children.len() != actual_children.len() {
            self.mismatches.push(Mismatch::new(
                path.to_string(),
                control_children.len().to_string(),
                actual_children.len().to_string(),
                MismatchKind::ChildCount,
            ));
        }
        Ok(())
    }

    /// Child elements of `parent` not excluded by an ignore expression.
    fn compared_children<'e>(
        &self,
        parent: &'e XmlElement,
        path: &NodePath,
    ) -> Vec<(NodePath, &'e XmlElement)> {
        child_steps(parent)
            .into_iter()
            .zip(parent.child_elements())
            .map(|(step, child)| (path.child(step), child))
            .filter(|(child_path, _)| !self.is_ignored(child_path))
            .collect()
    }

    fn text(
        &mut self,
        control: &XmlElement,
        actual: &XmlElement,
        path: &NodePath,
        context: &mut TestContext,
    ) -> Result<()> {
        let found = actual.child_elements().count();
        if found > 0 {
            self.mismatches.push(Mismatch::new(
                path.to_string(),
                "0",
                found.to_string(),
                MismatchKind::ChildCount,
            ));
            return Ok(());
        }
        let expected = control.text();
        let actual_text = actual.text();
        if let Some(mismatch) = self.input.compare_value(
            &path.to_string(),
            &control.name.local,
            expected.trim(),
            actual_text.trim(),
            context,
        )? {
            self.mismatches.push(mismatch);
        }
        Ok(())
    }
}

/// Attributes match on local name and namespace URI; prefixes are irrelevant.
fn same_attribute(left: &QName, right: &QName) -> bool {
    left.local == right.local && left.namespace == right.namespace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CompareOptions, ValidatorRegistry};
    use ironcheck_core::error::{CheckError, PathError};
    use ironcheck_core::message::Message;

    fn compare(
        control: &str,
        actual: &str,
        settings: XmlValidationContext,
    ) -> Result<Vec<Mismatch>> {
        let registry = ValidatorRegistry::with_defaults();
        let control = Message::new(control.to_string());
        let actual = Message::new(actual.to_string());
        let validation = ValidationContext::Xml(settings);
        let input = CompareInput {
            actual: &actual,
            control: &control,
            message_type: &MessageType::Xml,
            context: &validation,
            matchers: registry.matchers(),
            schemas: registry.schemas(),
            options: CompareOptions::default(),
        };
        compare_xml(&input, &mut TestContext::new())
    }

    fn mismatches(control: &str, actual: &str) -> Vec<Mismatch> {
        compare(control, actual, XmlValidationContext::new()).unwrap()
    }

    #[test]
    fn test_equal_documents() {
        let payload = "<TestRequest><Message>Hello World!</Message></TestRequest>";
        assert!(mismatches(payload, payload).is_empty());
    }

    #[test]
    fn test_text_trimmed() {
        assert!(mismatches("<a><b>1</b></a>", "<a>\n  <b>  1\n</b>\n</a>").is_empty());
    }

    #[test]
    fn test_child_order_significant() {
        let found = mismatches("<a><b>1</b><c>2</c></a>", "<a><c>2</c><b>1</b></a>");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "a/b");
        assert_eq!(found[0].kind, MismatchKind::ElementName);
        assert_eq!(found[0].expected, "b");
        assert_eq!(found[0].actual, "c");
    }

    #[test]
    fn test_value_mismatch_path() {
        let found = mismatches("<a><b>1</b><b>2</b></a>", "<a><b>1</b><b>3</b></a>");
        assert_eq!(found, vec![Mismatch::new("a/b[2]", "2", "3", MismatchKind::Value)]);
    }

    #[test]
    fn test_child_count() {
        let found = mismatches("<a><b>1</b></a>", "<a><b>1</b><c>2</c></a>");
        assert_eq!(found, vec![Mismatch::new("a", "1", "2", MismatchKind::ChildCount)]);
    }

    #[test]
    fn test_attributes_any_order() {
        assert!(mismatches(r#"<a x="1" y="2"/>"#, r#"<a y="2" x="1"/>"#).is_empty());
    }

    #[test]
    fn test_attribute_mismatches() {
        let found = mismatches(r#"<a x="1" y="2"/>"#, r#"<a x="9" z="3"/>"#);
        assert_eq!(found.len(), 3);
        assert!(found.contains(&Mismatch::new("a/@x", "1", "9", MismatchKind::Value)));
        assert!(found.contains(&Mismatch::absent("a/@y", "2", MismatchKind::MissingAttribute)));
        assert!(found.contains(&Mismatch::new(
            "a/@z",
            Mismatch::ABSENT,
            "3",
            MismatchKind::UnexpectedAttribute
        )));
    }

    #[test]
    fn test_ignore_placeholder() {
        let control = "<a><id>@ignore@</id><b>1</b></a>";
        assert!(mismatches(control, "<a><id>42</id><b>1</b></a>").is_empty());
        assert!(mismatches(control, "<a><id><x/></id><b>1</b></a>").is_empty());
    }

    #[test]
    fn test_ignore_expressions() {
        let control = "<a><time>1</time><b>1</b></a>";
        let actual = "<a><time>2</time><b>1</b></a>";
        assert_eq!(mismatches(control, actual).len(), 1);

        let xpath = XmlValidationContext::new().with_ignore("//time");
        assert!(compare(control, actual, xpath).unwrap().is_empty());

        let dotted = XmlValidationContext::new().with_ignore("a.time");
        assert!(compare(control, actual, dotted).unwrap().is_empty());
    }

    #[test]
    fn test_ignore_attribute() {
        let settings = XmlValidationContext::new().with_ignore("/a/@stamp");
        let found = compare(r#"<a stamp="1">x</a>"#, r#"<a stamp="2">x</a>"#, settings).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_ignored_element_absent_in_actual() {
        let settings = XmlValidationContext::new().with_ignore("//ts");
        let control = "<a><ts>1</ts><b>1</b></a>";
        let found = compare(control, "<a><b>1</b></a>", settings.clone()).unwrap();
        assert!(found.is_empty());

        let found = compare(
            "<a><b>1</b><ts>1</ts><c>2</c></a>",
            "<a><b>1</b><c>3</c></a>",
            settings,
        )
        .unwrap();
        assert_eq!(found, vec![Mismatch::new("a/c", "2", "3", MismatchKind::Value)]);
    }

    #[test]
    fn test_attribute_namespace_significant() {
        let control = r#"<a xmlns:p="urn:x" p:id="1"/>"#;
        let found = mismatches(control, r#"<a id="1"/>"#);
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|m| m.kind == MismatchKind::MissingAttribute));
        assert!(found.iter().any(|m| m.kind == MismatchKind::UnexpectedAttribute));

        assert!(mismatches(control, r#"<a xmlns:q="urn:x" q:id="1"/>"#).is_empty());
    }

    #[test]
    fn test_invalid_ignore_expression() {
        let settings = XmlValidationContext::new().with_ignore("/a/@id/b");
        let err = compare("<a><b/></a>", "<a><b/></a>", settings).unwrap_err();
        assert!(matches!(err, CheckError::Path(PathError::InvalidExpression { .. })));
    }

    #[test]
    fn test_prefix_irrelevant() {
        let control = r#"<p:a xmlns:p="urn:x"><p:b>1</p:b></p:a>"#;
        let actual = r#"<q:a xmlns:q="urn:x"><q:b>1</q:b></q:a>"#;
        assert!(mismatches(control, actual).is_empty());
    }

    #[test]
    fn test_namespace_uri_differs() {
        let control = r#"<a xmlns="urn:x"><b>1</b></a>"#;
        let actual = r#"<a xmlns="urn:y"><b>1</b></a>"#;
        let found = mismatches(control, actual);
        assert_eq!(found, vec![Mismatch::new("a", "urn:x", "urn:y", MismatchKind::Namespace)]);
    }

    #[test]
    fn test_control_default_namespace() {
        let settings = XmlValidationContext::new().with_control_namespace("", "urn:x");
        let actual = r#"<a xmlns="urn:x"><b>1</b></a>"#;
        assert!(compare("<a><b>1</b></a>", actual, settings.clone()).unwrap().is_empty());

        let found = compare("<a><b>1</b></a>", "<a><b>1</b></a>", settings).unwrap();
        assert!(found.iter().all(|m| m.kind == MismatchKind::Namespace));
        assert!(!found.is_empty());
    }

    #[test]
    fn test_control_namespace_declared() {
        let settings = XmlValidationContext::new().with_control_namespace("ns", "urn:x");
        let found = compare("<a/>", r#"<a xmlns:ns="urn:other"/>"#, settings).unwrap();
        assert_eq!(
            found,
            vec![Mismatch::new(
                "a",
                "xmlns:ns=\"urn:x\"",
                "urn:other",
                MismatchKind::Namespace
            )]
        );
    }

    #[test]
    fn test_matcher_in_text() {
        assert!(mismatches("<a>@startsWith('Hello')@</a>", "<a>Hello World</a>").is_empty());
        let found = mismatches("<a>@startsWith('Bye')@</a>", "<a>Hello World</a>");
        assert_eq!(found[0].kind, MismatchKind::Matcher);
    }

    #[test]
    fn test_empty_payloads() {
        assert!(mismatches("", "<a/>").is_empty());
        let found = mismatches("<a/>", "");
        assert_eq!(found, vec![Mismatch::absent("a", "a", MismatchKind::MissingPath)]);
    }

    #[test]
    fn test_malformed_actual() {
        assert!(matches!(
            compare("<a/>", "<a>", XmlValidationContext::new()),
            Err(CheckError::Parse(_))
        ));
    }
}
