//! Messages and helpers shared by the runner integration tests
#![allow(dead_code)]

use casemodel_core::message::{Message, MessageType, ERROR};
use casemodel_core::{MessageHandler, RunnerResult};
use parking_lot::Mutex;

pub static ENTER_NAME: MessageType = MessageType::root("EnterName");
pub static ADD_ITEM: MessageType = MessageType::root("AddItem");
pub static PING: MessageType = MessageType::root("Ping");
pub static GREETING: MessageType = MessageType::root("Greeting");
pub static RANGE_ERROR: MessageType = MessageType::extends("RangeError", &ERROR);
pub static TIMEOUT: MessageType = MessageType::extends("Timeout", &ERROR);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterName(pub String);

impl Message for EnterName {
    fn message_type(&self) -> &'static MessageType {
        &ENTER_NAME
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddItem;

impl Message for AddItem {
    fn message_type(&self) -> &'static MessageType {
        &ADD_ITEM
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping;

impl Message for Ping {
    fn message_type(&self) -> &'static MessageType {
        &PING
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting(pub String);

impl Message for Greeting {
    fn message_type(&self) -> &'static MessageType {
        &GREETING
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeError(pub usize);

impl Message for RangeError {
    fn message_type(&self) -> &'static MessageType {
        &RANGE_ERROR
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout;

impl Message for Timeout {
    fn message_type(&self) -> &'static MessageType {
        &TIMEOUT
    }
}

/// Inbox that keeps the greetings it receives
#[derive(Debug, Default)]
pub struct GreetingInbox {
    pub received: Mutex<Vec<String>>,
}

impl MessageHandler for GreetingInbox {
    fn handle(&self, message: Box<dyn Message>) -> RunnerResult<Option<Box<dyn Message>>> {
        if let Some(greeting) = message.downcast_ref::<Greeting>() {
            self.received.lock().push(greeting.0.clone());
        }
        Ok(None)
    }
}

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("casemodel_core=debug")
        .with_test_writer()
        .try_init();
}
