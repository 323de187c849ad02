/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Dictionary definitions.
//!
//! This module defines the structures that describe a data dictionary:
//! - [`PathMappingStrategy`]: How an entry key is compared with a leaf path
//! - [`DictionaryScope`]: Global (context-wide) or local (single action) entries
//! - [`DictionaryEntry`]: One path to value rewrite rule
//! - [`DataDictionary`]: Named, ordered set of entries

use ironcheck_core::message::MessageType;
use ironcheck_core::types::MessageDirection;
use ironcheck_path::Namespaces;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an entry key is compared with the dotted path of a leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathMappingStrategy {
    /// Full path equality.
    #[default]
    Exact,
    /// Leaf path starts with the key.
    StartsWith,
    /// Leaf path ends with the key.
    EndsWith,
}

impl PathMappingStrategy {
    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "EXACT",
            Self::StartsWith => "STARTS_WITH",
            Self::EndsWith => "ENDS_WITH",
        }
    }

    /// Compares a leaf path with an entry key.
    #[must_use]
    pub fn matches(&self, path: &str, key: &str) -> bool {
        match self {
            Self::Exact => path == key,
            Self::StartsWith => path.starts_with(key),
            Self::EndsWith => path.ends_with(key),
        }
    }
}

impl FromStr for PathMappingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "EXACT" => Ok(Self::Exact),
            "STARTS_WITH" => Ok(Self::StartsWith),
            "ENDS_WITH" => Ok(Self::EndsWith),
            other => Err(format!("unknown path mapping strategy: {other}")),
        }
    }
}

impl fmt::Display for PathMappingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope of a dictionary entry.
///
/// Global entries are applied before local ones, so a local entry overrides a
/// global rewrite of the same leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DictionaryScope {
    /// Shared by all actions of a test case.
    Global,
    /// Attached to a single action.
    #[default]
    Local,
}

/// One path to value rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Dotted leaf path, or an XPath / JSONPath expression.
    pub match_path: String,
    /// Replacement value; may contain dynamic content.
    pub replacement: String,
    /// Key comparison strategy, ignored for path expressions.
    #[serde(default)]
    pub strategy: PathMappingStrategy,
    /// Direction filter; `None` applies in both directions.
    #[serde(default)]
    pub direction: Option<MessageDirection>,
    /// Entry scope.
    #[serde(default)]
    pub scope: DictionaryScope,
}

impl DictionaryEntry {
    /// Creates an exact, local entry for both directions.
    ///
    /// # Arguments
    /// * `match_path` - The leaf path or path expression
    /// * `replacement` - The replacement value
    #[must_use]
    pub fn new(match_path: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            match_path: match_path.into(),
            replacement: replacement.into(),
            strategy: PathMappingStrategy::default(),
            direction: None,
            scope: DictionaryScope::default(),
        }
    }

    /// Sets the path mapping strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: PathMappingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Restricts the entry to one direction.
    #[must_use]
    pub fn with_direction(mut self, direction: MessageDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Sets the entry scope.
    #[must_use]
    pub fn with_scope(mut self, scope: DictionaryScope) -> Self {
        self.scope = scope;
        self
    }

    /// Returns true if the entry applies to messages in the given direction.
    #[inline]
    #[must_use]
    pub fn applies_to(&self, direction: MessageDirection) -> bool {
        self.direction.is_none_or(|own| own == direction)
    }
}

/// Named, ordered set of dictionary entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataDictionary {
    /// Dictionary name used in logs.
    pub name: String,
    /// Restricts the dictionary to one message type.
    #[serde(default)]
    pub message_type: Option<MessageType>,
    /// Restricts the dictionary to one direction.
    #[serde(default)]
    pub direction: Option<MessageDirection>,
    /// Entries in declaration order.
    #[serde(default)]
    pub entries: Vec<DictionaryEntry>,
    /// Prefix bindings for XPath keys.
    #[serde(default)]
    pub namespaces: Namespaces,
}

impl DataDictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Appends an entry.
    #[must_use]
    pub fn with_entry(mut self, entry: DictionaryEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Appends an exact entry.
    #[must_use]
    pub fn with_mapping(
        self,
        match_path: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.with_entry(DictionaryEntry::new(match_path, replacement))
    }

    /// Restricts the dictionary to one message type.
    #[must_use]
    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = Some(message_type);
        self
    }

    /// Restricts the dictionary to one direction.
    #[must_use]
    pub fn with_direction(mut self, direction: MessageDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Binds a namespace prefix used by XPath keys.
    #[must_use]
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    /// Marks every entry with the given scope.
    #[must_use]
    pub fn with_scope(mut self, scope: DictionaryScope) -> Self {
        for entry in &mut self.entries {
            entry.scope = scope;
        }
        self
    }

    /// Returns true if the dictionary applies to the direction.
    #[must_use]
    pub fn supports_direction(&self, direction: MessageDirection) -> bool {
        self.direction.is_none_or(|own| own == direction)
    }

    /// Returns true if the dictionary applies to the message type.
    #[must_use]
    pub fn supports_type(&self, message_type: &MessageType) -> bool {
        self.message_type
            .as_ref()
            .is_none_or(|own| own == message_type)
    }

    /// Returns true if the dictionary has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
