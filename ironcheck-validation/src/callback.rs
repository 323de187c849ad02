/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! User-supplied validation callbacks.

use ironcheck_context::TestContext;
use ironcheck_core::error::Result;
use ironcheck_core::message::Message;

/// Custom validation of a received message.
///
/// Depending on the validation mode the callback replaces or complements the
/// structural payload validators. Header validation always runs.
pub trait ValidationCallback: Send + Sync {
    /// Validates the received message.
    ///
    /// # Errors
    /// Returns `CheckError` (typically `ValidationError`) if the message is rejected.
    fn validate(&self, message: &Message, context: &mut TestContext) -> Result<()>;
}

impl<F> ValidationCallback for F
where
    F: Fn(&Message, &mut TestContext) -> Result<()> + Send + Sync,
{
    fn validate(&self, message: &Message, context: &mut TestContext) -> Result<()> {
        self(message, context)
    }
}
