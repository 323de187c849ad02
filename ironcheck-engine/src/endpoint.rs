/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message endpoints.
//!
//! This module defines the async producer and consumer interfaces used by
//! send and receive actions, an in-memory [`DirectEndpoint`], and helpers
//! that connect endpoints to the [`Orchestrator`].

use crate::control::ControlMessageBuilder;
use crate::orchestrator::Orchestrator;
use crate::request::ValidationRequest;
use async_trait::async_trait;
use ironcheck_context::TestContext;
use ironcheck_core::error::CheckError;
use ironcheck_core::message::Message;
use ironcheck_dictionary::DataDictionary;
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tracing::{debug, trace};

/// Errors raised by endpoints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// No matching message arrived in time.
    #[error("no message received within {0:?}")]
    Timeout(Duration),

    /// The endpoint is closed.
    #[error("endpoint closed")]
    Closed,

    /// The message selector could not be parsed.
    #[error("invalid message selector: {0}")]
    InvalidSelector(String),

    /// Building or validating a message failed.
    #[error(transparent)]
    Validation(#[from] CheckError),
}

/// Sends messages to a destination.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Sends a message.
    ///
    /// # Errors
    /// Returns `EndpointError::Closed` if the destination no longer accepts
    /// messages.
    async fn send(&self, message: Message) -> Result<(), EndpointError>;
}

/// Receives messages from a destination.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Receives the next message matching `selector`.
    ///
    /// # Arguments
    /// * `selector` - Optional header selector, e.g. `Operation = 'sayHello'`
    /// * `timeout` - Maximum time to wait
    ///
    /// # Errors
    /// Returns `EndpointError::Timeout` if no matching message arrives in
    /// time.
    async fn receive(
        &self,
        selector: Option<&str>,
        timeout: Duration,
    ) -> Result<Message, EndpointError>;
}

/// Header selector of the form `key = 'value' AND key2 = 'value2'`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selector {
    conditions: Vec<(String, String)>,
}

impl Selector {
    fn parse(expression: &str) -> Result<Self, EndpointError> {
        let invalid = || EndpointError::InvalidSelector(expression.to_string());
        let mut conditions = Vec::new();
        for condition in expression.split(" AND ") {
            let (key, value) = condition.split_once('=').ok_or_else(invalid)?;
            let key = key.trim();
            let value = value
                .trim()
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .ok_or_else(invalid)?;
            if key.is_empty() {
                return Err(invalid());
            }
            conditions.push((key.to_string(), value.to_string()));
        }
        Ok(Self { conditions })
    }

    fn matches(&self, message: &Message) -> bool {
        self.conditions
            .iter()
            .all(|(key, value)| message.header(key) == Some(value.as_str()))
    }
}

#[derive(Debug)]
struct Inbox {
    receiver: mpsc::UnboundedReceiver<Message>,
    backlog: VecDeque<Message>,
}

/// In-memory endpoint that is both producer and consumer.
///
/// Messages skipped by a selector stay queued for later receives.
#[derive(Debug)]
pub struct DirectEndpoint {
    name: String,
    sender: mpsc::UnboundedSender<Message>,
    inbox: Mutex<Inbox>,
}

impl DirectEndpoint {
    /// Creates a new endpoint.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            name: name.into(),
            sender,
            inbox: Mutex::new(Inbox {
                receiver,
                backlog: VecDeque::new(),
            }),
        }
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Closes the endpoint.
    ///
    /// Queued messages can still be received; further sends fail.
    pub async fn close(&self) {
        self.inbox.lock().await.receiver.close();
        debug!(endpoint = %self.name, "endpoint closed");
    }
}

#[async_trait]
impl Producer for DirectEndpoint {
    async fn send(&self, message: Message) -> Result<(), EndpointError> {
        self.sender.send(message).map_err(|_| EndpointError::Closed)?;
        trace!(endpoint = %self.name, "message sent");
        Ok(())
    }
}

#[async_trait]
impl Consumer for DirectEndpoint {
    async fn receive(
        &self,
        selector: Option<&str>,
        timeout: Duration,
    ) -> Result<Message, EndpointError> {
        let selector = selector.map(Selector::parse).transpose()?;
        let accepts = |message: &Message| selector.as_ref().is_none_or(|s| s.matches(message));

        let mut guard = self.inbox.lock().await;
        let inbox = &mut *guard;
        let queued = inbox.backlog.iter().position(|m| accepts(m));
        if let Some(message) = queued.and_then(|index| inbox.backlog.remove(index)) {
            trace!(endpoint = %self.name, "message taken from backlog");
            return Ok(message);
        }

        let deadline = Instant::now() + timeout;
        loop {
            let received = tokio::time::timeout_at(deadline, inbox.receiver.recv()).await;
            match received {
                Err(_) => return Err(EndpointError::Timeout(timeout)),
                Ok(None) => return Err(EndpointError::Closed),
                Ok(Some(message)) if accepts(&message) => {
                    trace!(endpoint = %self.name, "message received");
                    return Ok(message);
                }
                Ok(Some(message)) => inbox.backlog.push_back(message),
            }
        }
    }
}

/// Receives a message and validates it.
///
/// The selector may contain dynamic content and is resolved against the
/// context first.
///
/// # Errors
/// Returns an `EndpointError` if receiving fails, or wraps the `CheckError`
/// raised by validation.
pub async fn receive_and_validate<C>(
    consumer: &C,
    selector: Option<&str>,
    timeout: Duration,
    orchestrator: &Orchestrator,
    request: &ValidationRequest,
    context: &mut TestContext,
) -> Result<Message, EndpointError>
where
    C: Consumer + ?Sized,
{
    let selector = selector.map(|s| context.resolve(s)).transpose()?;
    let message = consumer.receive(selector.as_deref(), timeout).await?;
    orchestrator.validate(&message, request, context)?;
    Ok(message)
}

/// Builds an outbound message and sends it.
///
/// Returns the message as sent.
///
/// # Errors
/// Returns an `EndpointError` if the message cannot be built or sent.
pub async fn send_message<P>(
    producer: &P,
    orchestrator: &Orchestrator,
    control: &ControlMessageBuilder,
    dictionary: Option<&DataDictionary>,
    context: &TestContext,
) -> Result<Message, EndpointError>
where
    P: Producer + ?Sized,
{
    let message = orchestrator.prepare_outbound(control, dictionary, context)?;
    producer.send(message.clone()).await?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EngineBuilder;
    use ironcheck_core::error::{ContextError, ValidationError};
    use ironcheck_core::types::{Mismatch, MismatchKind};

    #[test]
    fn test_selector_parse() {
        let selector = Selector::parse("Operation = 'sayHello' AND Id='1'").unwrap();
        assert_eq!(selector.conditions.len(), 2);
        assert_eq!(selector.conditions[0], ("Operation".to_string(), "sayHello".to_string()));

        let message = Message::new("").with_header("Operation", "sayHello").with_header("Id", "1");
        assert!(selector.matches(&message));
        assert!(!selector.matches(&Message::new("").with_header("Operation", "sayHello")));

        assert!(matches!(Selector::parse("Operation"), Err(EndpointError::InvalidSelector(_))));
        assert!(matches!(
            Selector::parse("Operation = sayHello"),
            Err(EndpointError::InvalidSelector(_))
        ));
        assert!(matches!(Selector::parse(" = 'x'"), Err(EndpointError::InvalidSelector(_))));
    }

    #[tokio::test]
    async fn test_direct_endpoint_send_receive() {
        let endpoint = DirectEndpoint::new("direct:hello");
        endpoint.send(Message::new("<a>1</a>")).await.unwrap();
        let message = endpoint.receive(None, Duration::from_millis(100)).await.unwrap();
        assert_eq!(message.payload_str().unwrap(), "<a>1</a>");
        assert_eq!(endpoint.name(), "direct:hello");
    }

    #[tokio::test]
    async fn test_direct_endpoint_timeout() {
        let endpoint = DirectEndpoint::new("direct:empty");
        let err = endpoint.receive(None, Duration::from_millis(20)).await.unwrap_err();
        assert_eq!(err, EndpointError::Timeout(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_direct_endpoint_selector_keeps_skipped() {
        let endpoint = DirectEndpoint::new("direct:select");
        endpoint.send(Message::new("first").with_header("Id", "1")).await.unwrap();
        endpoint.send(Message::new("second").with_header("Id", "2")).await.unwrap();

        let second = endpoint
            .receive(Some("Id = '2'"), Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(second.payload_str().unwrap(), "second");

        let first = endpoint.receive(None, Duration::from_millis(100)).await.unwrap();
        assert_eq!(first.payload_str().unwrap(), "first");

        let err = endpoint
            .receive(Some("Id = '3'"), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, EndpointError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_direct_endpoint_closed() {
        let endpoint = DirectEndpoint::new("direct:closed");
        endpoint.send(Message::new("queued")).await.unwrap();
        endpoint.close().await;

        assert_eq!(endpoint.send(Message::new("late")).await, Err(EndpointError::Closed));
        let queued = endpoint.receive(None, Duration::from_millis(100)).await.unwrap();
        assert_eq!(queued.payload_str().unwrap(), "queued");
        assert_eq!(
            endpoint.receive(None, Duration::from_millis(100)).await,
            Err(EndpointError::Closed)
        );
    }

    #[tokio::test]
    async fn test_receive_and_validate() {
        let endpoint = DirectEndpoint::new("direct:validate");
        let orchestrator = EngineBuilder::new().build();
        let mut context = orchestrator.create_context();
        context.set_variable("operation", "sayHello");
        context.set_variable("myText", "Hello World!");

        let control = ControlMessageBuilder::new()
            .with_payload("<TestRequest><Message>${myText}</Message></TestRequest>")
            .with_header("Operation", "${operation}");
        send_message(&endpoint, &orchestrator, &control, None, &context)
            .await
            .unwrap();

        let request = ValidationRequest::builder().control(control).build();
        let message = receive_and_validate(
            &endpoint,
            Some("Operation = '${operation}'"),
            Duration::from_millis(100),
            &orchestrator,
            &request,
            &mut context,
        )
        .await
        .unwrap();
        assert_eq!(message.header("Operation"), Some("sayHello"));
    }

    #[tokio::test]
    async fn test_receive_and_validate_mismatch() {
        let endpoint = DirectEndpoint::new("direct:mismatch");
        let orchestrator = EngineBuilder::new().build();
        let mut context = orchestrator.create_context();
        endpoint.send(Message::new("<a><b>c</b></a>")).await.unwrap();

        let request = ValidationRequest::builder().payload("<a><b>b</b></a>").build();
        let err = receive_and_validate(
            &endpoint,
            None,
            Duration::from_millis(100),
            &orchestrator,
            &request,
            &mut context,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            EndpointError::Validation(CheckError::Validation(ValidationError::new(
                "xml",
                vec![Mismatch::new("a/b", "b", "c", MismatchKind::Value)]
            )))
        );
    }

    #[tokio::test]
    async fn test_receive_and_validate_unresolved_selector() {
        let endpoint = DirectEndpoint::new("direct:unresolved");
        let orchestrator = EngineBuilder::new().build();
        let mut context = orchestrator.create_context();
        let err = receive_and_validate(
            &endpoint,
            Some("Id = '${missing}'"),
            Duration::from_millis(20),
            &orchestrator,
            &ValidationRequest::default(),
            &mut context,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            EndpointError::Validation(CheckError::Context(ContextError::UnresolvedVariable {
                name: "missing".to_string()
            }))
        );
    }
}
