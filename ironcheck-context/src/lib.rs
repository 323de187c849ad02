/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronCheck Context
//!
//! Runtime test context for the IronCheck validation engine.
//!
//! This crate provides:
//! - **Test context**: Mutable variable store owned by one test case
//! - **Dynamic content**: `${name}` placeholder and `prefix:function(args)` resolution
//! - **Function libraries**: Built-in `citrus:` functions and custom libraries
//! - **Scripts**: `script:<engine>` variables evaluated through a pluggable evaluator
//! - **Message processors**: Ordered processor chain shared by all actions of a test
//!
//! ## Ownership
//!
//! A [`TestContext`] is owned exclusively by the test case executing it and has no
//! internal locking. Concurrent branches must use their own context.

pub mod context;
pub mod functions;
pub mod processor;
pub mod script;

pub use context::TestContext;
pub use functions::{Function, FunctionLibrary, FunctionRegistry};
pub use processor::MessageProcessor;
pub use script::{ScriptEngines, ScriptError, ScriptEvaluator};
