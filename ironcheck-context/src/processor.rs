/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message processor interface.
//!
//! Processors rewrite a message before it is sent or before it is compared.
//! Processors registered on the [`TestContext`](crate::TestContext) form the
//! global chain and run before any processor attached to a single action.

use ironcheck_core::error::Result;
use ironcheck_core::message::Message;
use ironcheck_core::types::MessageDirection;

use crate::context::TestContext;

/// Rewrites messages flowing in one or both directions.
pub trait MessageProcessor: Send + Sync {
    /// Returns the processor name used in logs.
    fn name(&self) -> &str;

    /// Returns true if the processor applies to messages in the given direction.
    fn supports(&self, direction: MessageDirection) -> bool;

    /// Processes the message in place.
    ///
    /// # Arguments
    /// * `message` - The message to rewrite
    /// * `direction` - Direction of the message flow
    /// * `context` - The test context used to resolve dynamic values
    ///
    /// # Errors
    /// Returns `CheckError` if the payload cannot be parsed or a value cannot
    /// be resolved.
    fn process(
        &self,
        message: &mut Message,
        direction: MessageDirection,
        context: &TestContext,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Stamp;

    impl MessageProcessor for Stamp {
        fn name(&self) -> &str {
            "stamp"
        }

        fn supports(&self, direction: MessageDirection) -> bool {
            direction == MessageDirection::Outbound
        }

        fn process(
            &self,
            message: &mut Message,
            _direction: MessageDirection,
            context: &TestContext,
        ) -> Result<()> {
            message.set_header("stamp", context.resolve("${stamp}")?);
            Ok(())
        }
    }

    #[test]
    fn test_processor_chain_on_context() {
        let mut context = TestContext::new();
        context.set_variable("stamp", "42");
        context.add_message_processor(Arc::new(Stamp));

        let mut message = Message::new("payload");
        context
            .process_message(&mut message, MessageDirection::Inbound)
            .unwrap();
        assert_eq!(message.header("stamp"), None);

        context
            .process_message(&mut message, MessageDirection::Outbound)
            .unwrap();
        assert_eq!(message.header("stamp"), Some("42"));
    }
}
