/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronCheck Engine
//!
//! Validation orchestration for the IronCheck message validation toolkit.
//!
//! This crate provides:
//! - **Orchestrator**: Builds control messages, selects validators and runs
//!   extraction after a successful comparison
//! - **Validation requests**: Control templates, contexts, extractors and
//!   callbacks for one receive action
//! - **Endpoints**: Async producer/consumer interfaces and an in-memory
//!   endpoint
//! - **Builder API**: Fluent configuration for engine setup

pub mod builder;
pub mod config;
pub mod control;
pub mod endpoint;
pub mod orchestrator;
pub mod request;

pub use builder::EngineBuilder;
pub use config::{ValidationConfig, ValidationMode};
pub use control::ControlMessageBuilder;
pub use endpoint::{
    Consumer, DirectEndpoint, EndpointError, Producer, receive_and_validate, send_message,
};
pub use orchestrator::{Orchestrator, OrchestratorState};
pub use request::{ValidationRequest, ValidationRequestBuilder};
