//! The consumer side of message delivery.

use crate::error::RunnerResult;
use crate::message::Message;
use std::sync::Arc;

/// Something that consumes messages one at a time.
///
/// Implemented by `ModelRunner` and by the event queue, so a runner can be
/// fed through a queue and either can serve as an actor's inbox.
pub trait MessageHandler: Send + Sync {
    /// Consume a message and return the reply, if any
    fn handle(&self, message: Box<dyn Message>) -> RunnerResult<Option<Box<dyn Message>>>;
}

impl<T: MessageHandler + ?Sized> MessageHandler for Arc<T> {
    fn handle(&self, message: Box<dyn Message>) -> RunnerResult<Option<Box<dyn Message>>> {
        (**self).handle(message)
    }
}
