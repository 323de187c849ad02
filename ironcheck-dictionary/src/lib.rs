/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronCheck Dictionary
//!
//! Data dictionaries for the IronCheck validation engine.
//!
//! This crate provides:
//! - **Dictionary definitions**: Entries, strategies, scopes and named dictionaries
//! - **Leaf rewriting**: XML text and attribute values, JSON scalars
//! - **Message processing**: Dictionaries plug into the context processor chain
//!
//! Entries are matched in declaration order; the first matching entry rewrites
//! a leaf. Global entries run before local ones.

pub mod entry;
pub mod processor;

pub use entry::{DataDictionary, DictionaryEntry, DictionaryScope, PathMappingStrategy};
pub use processor::apply_dictionary;
