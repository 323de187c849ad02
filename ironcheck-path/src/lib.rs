/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronCheck Path
//!
//! Path language for the IronCheck validation engine.
//!
//! This crate provides:
//! - **Addresses**: XPath-like, JSONPath-like and dotted expressions parsed into [`Address`]
//! - **Node paths**: Concrete [`NodePath`]s built while walking a document
//! - **Selection**: [`evaluate`] an address against a parsed [`Document`](ironcheck_core::Document)
//! - **Extraction**: [`VariableExtractor`] writes selected values into the test context
//!
//! One matching routine, [`Address::matches`], serves selection, ignore
//! expressions and dictionary keys, so every consumer agrees on what an
//! expression addresses.

pub mod address;
pub mod extract;
pub mod node_path;
pub mod select;

pub use address::{Address, NameTest, Namespaces, PathFunction, Segment, Syntax};
pub use extract::{ExtractSource, VariableExtractor, VariableMapping};
pub use node_path::{NodePath, PathStep, child_steps, sibling_positions};
pub use select::{
    PathValue, XmlMatch, effective_namespaces, evaluate, evaluate_optional, select_json,
    select_xml, text_content,
};
