use crate::handler::MessageHandler;
use std::fmt;
use std::sync::Arc;

/// Name of the default actor for steps that react to external messages
pub const USER: &str = "user";

/// Name of the default actor for system-initiated and exception handling steps
pub const SYSTEM: &str = "system";

/// A named participant that may trigger steps or receive published messages
#[derive(Clone)]
pub struct Actor {
    name: String,
    handler: Option<Arc<dyn MessageHandler>>,
}

impl Actor {
    /// Create an actor without an inbox
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: None,
        }
    }

    /// Give the actor an inbox for messages published to it
    pub fn with_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Actor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The actor's inbox, if any
    pub fn handler(&self) -> Option<&Arc<dyn MessageHandler>> {
        self.handler.as_ref()
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}
