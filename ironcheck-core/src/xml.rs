/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Owned XML document model.
//!
//! Payloads are parsed with `roxmltree` into an owned, namespace-resolved tree so
//! that comparators can walk both control and actual documents independently of
//! their textual prefixes, and data dictionaries can rewrite leaf values and
//! serialize the result back into a payload.

use crate::error::ParseError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Namespace URI reserved for the `xml` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace-resolved element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Local part of the name.
    pub local: String,
    /// Prefix used in the source document, if any.
    pub prefix: Option<String>,
    /// Resolved namespace URI, if any.
    pub namespace: Option<String>,
}

impl QName {
    /// Creates an unqualified name without namespace.
    #[must_use]
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            prefix: None,
            namespace: None,
        }
    }

    /// Creates a namespaced name.
    ///
    /// # Arguments
    /// * `local` - The local name
    /// * `prefix` - The source prefix (`None` for the default namespace)
    /// * `namespace` - The namespace URI
    #[must_use]
    pub fn qualified(
        local: impl Into<String>,
        prefix: Option<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            local: local.into(),
            prefix,
            namespace: Some(namespace.into()),
        }
    }

    /// Returns true if both names have the same local part and namespace URI.
    ///
    /// Prefixes are ignored.
    #[must_use]
    pub fn same_as(&self, other: &QName) -> bool {
        self.local == other.local && self.namespace == other.namespace
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// An attribute of an XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Attribute name.
    pub name: QName,
    /// Attribute value.
    pub value: String,
}

/// A node in the XML tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// A child element.
    Element(XmlElement),
    /// Character data (text and CDATA sections).
    Text(String),
}

/// An XML element with attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Element name.
    pub name: QName,
    /// Attributes, in document order (namespace declarations excluded).
    pub attributes: Vec<XmlAttribute>,
    /// Namespace declarations introduced on this element: (prefix, uri).
    pub namespaces: Vec<(Option<String>, String)>,
    /// Child nodes in document order.
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates an empty element.
    #[must_use]
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            namespaces: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns an iterator over child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Returns a mutable iterator over child elements.
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Returns true if the element has at least one child element.
    #[must_use]
    pub fn has_child_elements(&self) -> bool {
        self.child_elements().next().is_some()
    }

    /// Returns the concatenated direct text content, untrimmed.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Replaces all direct text content with the given text.
    ///
    /// Child elements are kept.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|node| matches!(node, XmlNode::Element(_)));
        self.children.insert(0, XmlNode::Text(text.into()));
    }

    /// Gets an attribute by local name.
    #[must_use]
    pub fn attribute(&self, local: &str) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|attr| attr.name.local == local)
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name.to_string());
        for (prefix, uri) in &self.namespaces {
            match prefix {
                Some(prefix) => out.push_str(&format!(" xmlns:{prefix}=\"")),
                None => out.push_str(" xmlns=\""),
            }
            escape_into(uri, true, out);
            out.push('"');
        }
        for attr in &self.attributes {
            out.push(' ');
            out.push_str(&attr.name.to_string());
            out.push_str("=\"");
            escape_into(&attr.value, true, out);
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.write_to(out),
                XmlNode::Text(text) => escape_into(text, false, out),
            }
        }
        out.push_str("</");
        out.push_str(&self.name.to_string());
        out.push('>');
    }
}

/// Parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Creates a document from a root element.
    #[must_use]
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// Parses an XML payload.
    ///
    /// # Errors
    /// Returns `ParseError::Xml` if the text is not well-formed.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let document = roxmltree::Document::parse(text).map_err(|err| ParseError::Xml {
            reason: err.to_string(),
        })?;
        let root = convert_element(document.root_element(), &[]);
        Ok(Self { root })
    }

    /// Returns the root element.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Returns the root element mutably.
    #[inline]
    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    /// Collects all namespace declarations of the document as prefix to URI.
    ///
    /// The default namespace is keyed by the empty string. The first
    /// declaration of a prefix in document order wins.
    #[must_use]
    pub fn declared_namespaces(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        collect_namespaces(&self.root, &mut out);
        out
    }

    /// Serializes the document back into XML text.
    #[must_use]
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.root.write_to(&mut out);
        out
    }
}

impl FromStr for XmlDocument {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

fn collect_namespaces(element: &XmlElement, out: &mut BTreeMap<String, String>) {
    for (prefix, uri) in &element.namespaces {
        out.entry(prefix.clone().unwrap_or_default())
            .or_insert_with(|| uri.clone());
    }
    for child in element.child_elements() {
        collect_namespaces(child, out);
    }
}

fn convert_element(
    node: roxmltree::Node<'_, '_>,
    parent_scope: &[(Option<String>, String)],
) -> XmlElement {
    let scope: Vec<(Option<String>, String)> = node
        .namespaces()
        .filter(|ns| ns.uri() != XML_NAMESPACE)
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect();
    let declared = scope
        .iter()
        .filter(|binding| !parent_scope.contains(binding))
        .cloned()
        .collect();

    let tag = node.tag_name();
    let name = match tag.namespace() {
        Some(uri) => QName::qualified(
            tag.name(),
            node.lookup_prefix(uri).map(str::to_string),
            uri,
        ),
        None => QName::new(tag.name()),
    };

    let attributes = node
        .attributes()
        .map(|attr| {
            let name = match attr.namespace() {
                Some(uri) => QName::qualified(
                    attr.name(),
                    node.lookup_prefix(uri).map(str::to_string),
                    uri,
                ),
                None => QName::new(attr.name()),
            };
            XmlAttribute {
                name,
                value: attr.value().to_string(),
            }
        })
        .collect();

    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(XmlNode::Element(convert_element(child, &scope)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                match children.last_mut() {
                    Some(XmlNode::Text(previous)) => previous.push_str(text),
                    _ => children.push(XmlNode::Text(text.to_string())),
                }
            }
        }
    }

    XmlElement {
        name,
        attributes,
        namespaces: declared,
        children,
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
