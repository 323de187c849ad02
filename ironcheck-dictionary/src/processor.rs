/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Dictionary application.
//!
//! Leaves are XML text-only elements and attributes, and JSON scalars. Each
//! leaf is matched against the entries in declaration order and rewritten by
//! the first entry that matches. Global entries are applied in a first pass
//! and local entries in a second one.

use crate::entry::{DataDictionary, DictionaryEntry, DictionaryScope};
use ironcheck_context::{MessageProcessor, TestContext};
use ironcheck_core::document::Document;
use ironcheck_core::error::Result;
use ironcheck_core::message::{Message, MessageType};
use ironcheck_core::types::MessageDirection;
use ironcheck_core::xml::XmlElement;
use ironcheck_path::{Address, Namespaces, NodePath, Syntax, child_steps};
use serde_json::Value;
use tracing::{debug, trace};

/// Entry prepared for one message type.
struct CompiledEntry<'a> {
    entry: &'a DictionaryEntry,
    address: Option<Address>,
}

impl CompiledEntry<'_> {
    fn matches(&self, path: &NodePath, namespaces: &Namespaces) -> bool {
        match &self.address {
            Some(address) => address.matches(path, namespaces),
            None => self
                .entry
                .strategy
                .matches(&path.to_dotted(), &self.entry.match_path),
        }
    }
}

fn compile<'a>(
    entries: &[&'a DictionaryEntry],
    message_type: &MessageType,
) -> Result<Vec<CompiledEntry<'a>>> {
    entries
        .iter()
        .copied()
        .map(|entry| -> Result<CompiledEntry<'a>> {
            let key = entry.match_path.trim();
            let is_expression = match message_type {
                MessageType::Xml => key.contains('/'),
                MessageType::Json => key.starts_with('$'),
                _ => false,
            };
            let address = if is_expression {
                Some(Address::parse(key, message_type)?).filter(|a| a.syntax() != Syntax::Dotted)
            } else {
                None
            };
            Ok(CompiledEntry { entry, address })
        })
        .collect()
}

/// Applies dictionary entries to a message.
///
/// Only entries whose direction matches (or is unset) are applied. Messages
/// that are neither XML nor JSON are returned unchanged.
///
/// # Arguments
/// * `message` - The message to rewrite
/// * `direction` - Direction of the message flow
/// * `entries` - Entries in declaration order
/// * `context` - Context used to resolve replacement values
///
/// # Errors
/// Returns `CheckError` if the payload cannot be parsed, a path expression key is
/// malformed or a replacement cannot be resolved.
pub fn apply_dictionary(
    message: Message,
    direction: MessageDirection,
    entries: &[DictionaryEntry],
    context: &TestContext,
) -> Result<Message> {
    apply_entries(message, direction, entries, &Namespaces::new(), context)
}

fn apply_entries(
    mut message: Message,
    direction: MessageDirection,
    entries: &[DictionaryEntry],
    namespaces: &Namespaces,
    context: &TestContext,
) -> Result<Message> {
    let applicable: Vec<&DictionaryEntry> =
        entries.iter().filter(|entry| entry.applies_to(direction)).collect();
    if applicable.is_empty() || message.is_payload_empty() {
        return Ok(message);
    }
    let message_type = message.effective_type();
    if !message_type.is_structured() {
        debug!(%message_type, "dictionary skipped for unstructured message");
        return Ok(message);
    }

    let mut document = Document::from_message(&message)?;
    let mut changed = 0;
    for scope in [DictionaryScope::Global, DictionaryScope::Local] {
        let pass: Vec<&DictionaryEntry> = applicable
            .iter()
            .copied()
            .filter(|entry| entry.scope == scope)
            .collect();
        if pass.is_empty() {
            continue;
        }
        let compiled = compile(&pass, &message_type)?;
        changed += match &mut document {
            Document::Xml(xml) => {
                let mut bindings = xml.declared_namespaces();
                bindings.extend(namespaces.iter().map(|(k, v)| (k.clone(), v.clone())));
                let path = NodePath::xml_root(&xml.root().name);
                rewrite_xml(xml.root_mut(), &path, &compiled, &bindings, context)?
            }
            Document::Json(json) => rewrite_json(json, &NodePath::new(), &compiled, context)?,
            Document::Text(_) => 0,
        };
    }

    debug!(%direction, %message_type, changed, "dictionary applied");
    if changed > 0 {
        message.set_payload(document.to_payload());
    }
    Ok(message)
}

fn first_match<'a>(
    compiled: &'a [CompiledEntry<'_>],
    path: &NodePath,
    namespaces: &Namespaces,
) -> Option<&'a DictionaryEntry> {
    compiled
        .iter()
        .find(|candidate| candidate.matches(path, namespaces))
        .map(|candidate| candidate.entry)
}

fn rewrite_xml(
    element: &mut XmlElement,
    path: &NodePath,
    compiled: &[CompiledEntry<'_>],
    namespaces: &Namespaces,
    context: &TestContext,
) -> Result<usize> {
    let mut changed = 0;
    for attribute in &mut element.attributes {
        let attribute_path = path.attribute(&attribute.name);
        if let Some(entry) = first_match(compiled, &attribute_path, namespaces) {
            trace!(path = %attribute_path, key = %entry.match_path, "rewriting attribute");
            attribute.value = context.resolve(&entry.replacement)?;
            changed += 1;
        }
    }

    if !element.has_child_elements() {
        if let Some(entry) = first_match(compiled, path, namespaces) {
            trace!(path = %path, key = %entry.match_path, "rewriting element");
            element.set_text(context.resolve(&entry.replacement)?);
            changed += 1;
        }
        return Ok(changed);
    }

    let steps = child_steps(element);
    for (step, child) in steps.into_iter().zip(element.child_elements_mut()) {
        changed += rewrite_xml(child, &path.child(step), compiled, namespaces, context)?;
    }
    Ok(changed)
}

fn rewrite_json(
    value: &mut Value,
    path: &NodePath,
    compiled: &[CompiledEntry<'_>],
    context: &TestContext,
) -> Result<usize> {
    let no_namespaces = Namespaces::new();
    match value {
        Value::Object(members) => {
            let mut changed = 0;
            for (name, member) in members.iter_mut() {
                changed += rewrite_json(member, &path.member(name), compiled, context)?;
            }
            Ok(changed)
        }
        Value::Array(items) => {
            let mut changed = 0;
            for (index, item) in items.iter_mut().enumerate() {
                changed += rewrite_json(item, &path.index(index), compiled, context)?;
            }
            Ok(changed)
        }
        scalar => match first_match(compiled, path, &no_namespaces) {
            Some(entry) => {
                trace!(path = %path, key = %entry.match_path, "rewriting value");
                let replacement = context.resolve(&entry.replacement)?;
                *scalar = typed_replacement(scalar, replacement);
                Ok(1)
            }
            None => Ok(0),
        },
    }
}

/// Keeps the JSON type of the original scalar when the replacement parses as one.
fn typed_replacement(original: &Value, replacement: String) -> Value {
    let keep_type = match original {
        Value::Number(_) => replacement.parse::<serde_json::Number>().ok().map(Value::Number),
        Value::Bool(_) => replacement.parse::<bool>().ok().map(Value::Bool),
        Value::Null if replacement == "null" => Some(Value::Null),
        _ => None,
    };
    keep_type.unwrap_or(Value::String(replacement))
}

impl MessageProcessor for DataDictionary {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, direction: MessageDirection) -> bool {
        self.supports_direction(direction)
    }

    fn process(
        &self,
        message: &mut Message,
        direction: MessageDirection,
        context: &TestContext,
    ) -> Result<()> {
        if !self.supports_type(&message.effective_type()) {
            return Ok(());
        }
        let rewritten = apply_entries(
            message.clone(),
            direction,
            &self.entries,
            &self.namespaces,
            context,
        )?;
        *message = rewritten;
        Ok(())
    }
}

impl DataDictionary {
    /// Applies this dictionary to a message.
    ///
    /// # Errors
    /// See [`apply_dictionary`].
    pub fn apply(
        &self,
        message: Message,
        direction: MessageDirection,
        context: &TestContext,
    ) -> Result<Message> {
        if !self.supports_direction(direction) || !self.supports_type(&message.effective_type()) {
            return Ok(message);
        }
        apply_entries(message, direction, &self.entries, &self.namespaces, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::PathMappingStrategy;
    use ironcheck_core::error::{CheckError, ContextError};
    use serde_json::json;
    use std::sync::Arc;

    fn payload(message: &Message) -> &str {
        message.payload_str().unwrap()
    }

    #[test]
    fn test_exact_xml() {
        let mut context = TestContext::new();
        context.set_variable("id", "42");
        let entries = vec![
            DictionaryEntry::new("Request.Id", "${id}"),
            DictionaryEntry::new("Request.Item.code", "X"),
        ];
        let message = Message::new(r#"<Request><Id>1</Id><Item code="a">v</Item></Request>"#);
        let out =
            apply_dictionary(message, MessageDirection::Outbound, &entries, &context).unwrap();
        assert_eq!(
            payload(&out),
            r#"<Request><Id>42</Id><Item code="X">v</Item></Request>"#
        );
    }

    #[test]
    fn test_xpath_key() {
        let context = TestContext::new();
        let entries = vec![DictionaryEntry::new("//Item", "changed")];
        let message =
            Message::new("<Request><Item>a</Item><Group><Item>b</Item></Group></Request>");
        let out = apply_dictionary(message, MessageDirection::Inbound, &entries, &context).unwrap();
        assert_eq!(
            payload(&out),
            "<Request><Item>changed</Item><Group><Item>changed</Item></Group></Request>"
        );
    }

    #[test]
    fn test_json_keeps_scalar_type() {
        let context = TestContext::new();
        let entries = vec![
            DictionaryEntry::new("person.age", "99"),
            DictionaryEntry::new("$.person.name", "Bob"),
            DictionaryEntry::new("flags[0]", "true"),
            DictionaryEntry::new("count", "not-a-number"),
        ];
        let message = Message::new(
            r#"{"person":{"name":"Ada","age":36},"flags":[false],"count":1}"#,
        )
        .with_type(MessageType::Json);
        let out = apply_dictionary(message, MessageDirection::Inbound, &entries, &context).unwrap();
        let value: Value = serde_json::from_str(payload(&out)).unwrap();
        assert_eq!(
            value,
            json!({"person": {"name": "Bob", "age": 99}, "flags": [true], "count": "not-a-number"})
        );
    }

    #[test]
    fn test_strategies_first_entry_wins() {
        let context = TestContext::new();
        let entries = vec![
            DictionaryEntry::new("Request", "first").with_strategy(PathMappingStrategy::StartsWith),
            DictionaryEntry::new("Request.Name", "second")
                .with_strategy(PathMappingStrategy::StartsWith),
            DictionaryEntry::new("Code", "third").with_strategy(PathMappingStrategy::EndsWith),
        ];
        let message = Message::new("<Request><Name>a</Name><Code>b</Code></Request>");
        let out = apply_dictionary(message, MessageDirection::Inbound, &entries, &context).unwrap();
        assert_eq!(
            payload(&out),
            "<Request><Name>first</Name><Code>first</Code></Request>"
        );
    }

    #[test]
    fn test_direction_filter() {
        let context = TestContext::new();
        let entries = vec![
            DictionaryEntry::new("a.b", "in").with_direction(MessageDirection::Inbound),
            DictionaryEntry::new("a.c", "out").with_direction(MessageDirection::Outbound),
        ];
        let message = Message::new("<a><b>1</b><c>2</c></a>");
        let out =
            apply_dictionary(message, MessageDirection::Outbound, &entries, &context).unwrap();
        assert_eq!(payload(&out), "<a><b>1</b><c>out</c></a>");
    }

    #[test]
    fn test_local_overrides_global() {
        let context = TestContext::new();
        let entries = vec![
            DictionaryEntry::new("a.b", "local"),
            DictionaryEntry::new("a.b", "global").with_scope(DictionaryScope::Global),
            DictionaryEntry::new("a.c", "global").with_scope(DictionaryScope::Global),
        ];
        let message = Message::new("<a><b>1</b><c>2</c></a>");
        let out = apply_dictionary(message, MessageDirection::Inbound, &entries, &context).unwrap();
        assert_eq!(payload(&out), "<a><b>local</b><c>global</c></a>");
    }

    #[test]
    fn test_idempotent_on_disjoint_paths() {
        let context = TestContext::new();
        let entries = vec![
            DictionaryEntry::new("a.b", "x"),
            DictionaryEntry::new("a.c.id", "y"),
        ];
        let message = Message::new(r#"<a><b>1</b><c id="2">3</c></a>"#);
        let once =
            apply_dictionary(message, MessageDirection::Inbound, &entries, &context).unwrap();
        let twice =
            apply_dictionary(once.clone(), MessageDirection::Inbound, &entries, &context).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unresolved_replacement() {
        let context = TestContext::new();
        let entries = vec![DictionaryEntry::new("a", "${missing}")];
        let err = apply_dictionary(
            Message::new("<a>1</a>"),
            MessageDirection::Inbound,
            &entries,
            &context,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CheckError::Context(ContextError::UnresolvedVariable {
                name: "missing".to_string()
            })
        );
    }

    #[test]
    fn test_plaintext_unchanged() {
        let context = TestContext::new();
        let entries = vec![DictionaryEntry::new("a", "b")];
        let message = Message::new("hello");
        let out = apply_dictionary(message.clone(), MessageDirection::Inbound, &entries, &context)
            .unwrap();
        assert_eq!(out, message);
    }

    #[test]
    fn test_dictionary_as_global_processor() {
        let mut context = TestContext::new();
        context.add_message_processor(Arc::new(
            DataDictionary::new("global")
                .with_direction(MessageDirection::Outbound)
                .with_mapping("a.b", "rewritten"),
        ));

        let mut inbound = Message::new("<a><b>1</b></a>");
        context
            .process_message(&mut inbound, MessageDirection::Inbound)
            .unwrap();
        assert_eq!(payload(&inbound), "<a><b>1</b></a>");

        let mut outbound = Message::new("<a><b>1</b></a>");
        context
            .process_message(&mut outbound, MessageDirection::Outbound)
            .unwrap();
        assert_eq!(payload(&outbound), "<a><b>rewritten</b></a>");
    }

    #[test]
    fn test_failed_processor_keeps_message() {
        let dictionary = DataDictionary::new("broken").with_mapping("a.b", "${missing}");
        let mut message = Message::new("<a><b>1</b></a>").with_header("Operation", "op");
        let original = message.clone();

        let err = dictionary
            .process(&mut message, MessageDirection::Inbound, &TestContext::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CheckError::Context(ContextError::UnresolvedVariable { .. })
        ));
        assert_eq!(message, original);
    }
}
