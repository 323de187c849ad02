/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Concrete node paths.
//!
//! A [`NodePath`] names exactly one node of a parsed document. Comparators,
//! dictionaries and selection build node paths while walking a document and
//! match them against an [`Address`](crate::Address).

use ironcheck_core::xml::{QName, XmlElement};
use smallvec::SmallVec;
use std::fmt;

/// One step of a concrete node path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// XML element.
    Element {
        /// Element name.
        name: QName,
        /// 1-based position among siblings with the same name.
        position: usize,
        /// 0-based index among all sibling elements.
        index: usize,
    },
    /// XML attribute.
    Attribute(QName),
    /// JSON object member.
    Member(String),
    /// JSON array index, 0-based.
    Index(usize),
}

impl PathStep {
    /// Creates an element step.
    #[must_use]
    pub fn element(name: QName, position: usize, index: usize) -> Self {
        Self::Element {
            name,
            position,
            index,
        }
    }

    /// Returns true for element, member and index steps.
    #[inline]
    #[must_use]
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Attribute(_))
    }
}

/// Path from the document root to one node.
///
/// For XML the first step is the root element; for JSON the empty path is the
/// root value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath {
    steps: SmallVec<[PathStep; 8]>,
}

impl NodePath {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a path for an XML root element.
    #[must_use]
    pub fn xml_root(name: &QName) -> Self {
        Self::new().child(PathStep::element(name.clone(), 1, 0))
    }

    /// Returns a new path extended by one step.
    #[must_use]
    pub fn child(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    /// Returns a new path extended by a JSON member step.
    #[must_use]
    pub fn member(&self, name: &str) -> Self {
        self.child(PathStep::Member(name.to_string()))
    }

    /// Returns a new path extended by a JSON index step.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.child(PathStep::Index(index))
    }

    /// Returns a new path extended by an XML attribute step.
    #[must_use]
    pub fn attribute(&self, name: &QName) -> Self {
        self.child(PathStep::Attribute(name.clone()))
    }

    /// Returns the steps.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the path has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Renders the path in dotted notation.
    ///
    /// XML: `Root.Child.attr`; JSON: `items[0].name`. Element positions are
    /// not part of the dotted form.
    #[must_use]
    pub fn to_dotted(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            match step {
                PathStep::Element { name, .. } => push_dotted(&mut out, &name.local),
                PathStep::Attribute(name) => push_dotted(&mut out, &name.local),
                PathStep::Member(name) => push_dotted(&mut out, name),
                PathStep::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    fn is_json(&self) -> bool {
        !matches!(
            self.steps.first(),
            Some(PathStep::Element { .. } | PathStep::Attribute(_))
        )
    }
}

fn push_dotted(out: &mut String, name: &str) {
    if !out.is_empty() {
        out.push('.');
    }
    out.push_str(name);
}

impl fmt::Display for NodePath {
    /// XML paths render as `a/b[2]/@id`, JSON paths as `$.items[0].name`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_json() {
            f.write_str("$")?;
            for step in &self.steps {
                match step {
                    PathStep::Member(name) => write!(f, ".{name}")?,
                    PathStep::Index(index) => write!(f, "[{index}]")?,
                    PathStep::Element { name, .. } => write!(f, ".{name}")?,
                    PathStep::Attribute(name) => write!(f, ".@{name}")?,
                }
            }
            return Ok(());
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match step {
                PathStep::Element { name, position, .. } if *position > 1 => {
                    write!(f, "{name}[{position}]")?;
                }
                PathStep::Element { name, .. } => write!(f, "{name}")?,
                PathStep::Attribute(name) => write!(f, "@{name}")?,
                PathStep::Member(name) => f.write_str(name)?,
                PathStep::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Computes the 1-based same-name position of each child element.
///
/// The result is aligned with `parent.child_elements()`.
#[must_use]
pub fn sibling_positions(parent: &XmlElement) -> Vec<usize> {
    let mut seen: Vec<(&QName, usize)> = Vec::new();
    parent
        .child_elements()
        .map(|child| {
            match seen.iter_mut().find(|(name, _)| name.same_as(&child.name)) {
                Some((_, count)) => {
                    *count += 1;
                    *count
                }
                None => {
                    seen.push((&child.name, 1));
                    1
                }
            }
        })
        .collect()
}

/// Returns the element steps for every child element of `parent`, in order.
#[must_use]
pub fn child_steps(parent: &XmlElement) -> Vec<PathStep> {
    sibling_positions(parent)
        .into_iter()
        .zip(parent.child_elements())
        .enumerate()
        .map(|(index, (position, child))| PathStep::element(child.name.clone(), position, index))
        .collect()
}
