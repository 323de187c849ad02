/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronCheck
//!
//! Message validation and dynamic test context for integration testing.
//!
//! IronCheck compares a received message against an expected control message,
//! resolves dynamic content (`${variables}`, `citrus:` functions, scripts)
//! in the control message, and extracts values from received messages into
//! the test context for later steps.
//!
//! ## Features
//!
//! - **Structural comparison**: XML, JSON, plaintext and header comparators
//!   with path-qualified mismatches
//! - **Path language**: XPath and JSONPath subsets for ignores, extraction,
//!   dictionaries and expression validation
//! - **Validation matchers**: `@ignore@`, `@matches('re')@`, `@variable('x')@`
//!   and custom matchers inside control values
//! - **Data dictionaries**: Path-keyed rewriting of inbound and outbound
//!   messages
//! - **Async endpoints**: Producer/consumer interfaces built on Tokio
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ironcheck::prelude::*;
//!
//! let orchestrator = EngineBuilder::new().build();
//! let mut context = orchestrator.create_context();
//! context.set_variable("myText", "Hello World!");
//!
//! let request = ValidationRequest::builder()
//!     .payload("<TestRequest><Message>${myText}</Message></TestRequest>")
//!     .header("Operation", "sayHello")
//!     .build();
//! orchestrator.validate(&received, &request, &mut context)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Message model, mismatch types and error definitions
//! - [`context`]: Test context, variables, functions and scripts
//! - [`path`]: Path language and variable extraction
//! - [`dictionary`]: Data dictionaries
//! - [`validation`]: Comparators, matchers and the validator registry
//! - [`engine`]: Orchestrator, builder and endpoints

pub mod core {
    //! Message model, mismatch types and error definitions.
    pub use ironcheck_core::*;
}

pub mod context {
    //! Test context, variables, functions and scripts.
    pub use ironcheck_context::*;
}

pub mod path {
    //! Path language and variable extraction.
    pub use ironcheck_path::*;
}

pub mod dictionary {
    //! Data dictionaries.
    pub use ironcheck_dictionary::*;
}

pub mod validation {
    //! Comparators, matchers and the validator registry.
    pub use ironcheck_validation::*;
}

pub mod engine {
    //! Orchestrator, builder and endpoints.
    pub use ironcheck_engine::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use ironcheck_core::{
        CheckError, ContextError, Message, MessageDirection, MessageType, Mismatch, MismatchKind,
        ParseError, PathError, Result, SchemaError, ValidationError,
    };

    // Context
    pub use ironcheck_context::{
        FunctionLibrary, MessageProcessor, ScriptError, ScriptEvaluator, TestContext,
    };

    // Path
    pub use ironcheck_path::{Address, VariableExtractor};

    // Dictionary
    pub use ironcheck_dictionary::{
        DataDictionary, DictionaryEntry, DictionaryScope, PathMappingStrategy,
    };

    // Validation
    pub use ironcheck_validation::{
        HeaderValidationContext, JsonSchemaRepository, JsonValidationContext, MatcherFailure,
        PathValidationContext, PlainTextValidationContext, ScriptValidationContext,
        SchemaResolver, ValidationCallback, ValidationContext, ValidationMatcher,
        ValidatorRegistry, XmlValidationContext,
    };

    // Engine
    pub use ironcheck_engine::{
        ControlMessageBuilder, Consumer, DirectEndpoint, EndpointError, EngineBuilder,
        Orchestrator, Producer, ValidationConfig, ValidationMode, ValidationRequest,
        receive_and_validate, send_message,
    };
}
