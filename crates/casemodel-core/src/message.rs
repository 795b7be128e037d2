//! Messages and their type tags.
//!
//! Steps declare the message type they react to as a `&'static MessageType`.
//! Each type tag optionally names a parent, which gives the runner a small,
//! explicit type hierarchy for polymorphic dispatch: a step expecting
//! [`ERROR`] reacts to every failure whose tag descends from it.

use std::any::Any;
use std::fmt;

/// Static type tag of a message kind.
///
/// Declare tags as `static` items so every message of a kind reports the
/// same tag:
///
/// ```
/// use casemodel_core::message::{MessageType, ERROR};
///
/// static RANGE_ERROR: MessageType = MessageType::extends("RangeError", &ERROR);
/// assert!(RANGE_ERROR.is_a(&ERROR));
/// ```
///
/// Tags are compared by name, so names must be unique within a model.
#[derive(Debug)]
pub struct MessageType {
    name: &'static str,
    parent: Option<&'static MessageType>,
}

impl MessageType {
    /// Create a tag without a parent
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Create a tag that descends from `parent`
    pub const fn extends(name: &'static str, parent: &'static MessageType) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// Name of the tag
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Parent tag, if any
    pub fn parent(&self) -> Option<&'static MessageType> {
        self.parent
    }

    /// True if this tag equals `ancestor` or descends from it.
    pub fn is_a(&self, ancestor: &MessageType) -> bool {
        if self == ancestor {
            return true;
        }
        let mut current = self.parent;
        while let Some(tag) = current {
            if tag == ancestor {
                return true;
            }
            current = tag.parent;
        }
        false
    }

    /// This tag followed by all its ancestors, nearest first
    pub fn ancestry(&'static self) -> impl Iterator<Item = &'static MessageType> {
        std::iter::successors(Some(self), |tag| tag.parent)
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for MessageType {}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Root of all failure types raised by reactions.
pub static ERROR: MessageType = MessageType::root("Error");

/// Tag of the synthetic trigger handed to system-initiated steps.
pub static SYSTEM_EVENT: MessageType = MessageType::root("SystemEvent");

/// Object-safe access to `Any` for message downcasting.
pub trait AsAny {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A command or event the runner can react to.
pub trait Message: AsAny + fmt::Debug + Send + Sync + 'static {
    /// The type tag used for step resolution
    fn message_type(&self) -> &'static MessageType;
}

impl dyn Message {
    /// Downcast to a concrete message
    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// True if the concrete message is a `T`
    pub fn is<T: Message>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Synthetic trigger for system-initiated steps during auto-continuation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemEvent;

impl Message for SystemEvent {
    fn message_type(&self) -> &'static MessageType {
        &SYSTEM_EVENT
    }
}

/// A failure raised by a reaction.
///
/// The wrapped message's type tag is what exception routing matches
/// against. Any [`Message`] converts into a `Failure`, so reactions can
/// use `?` on results whose error type is a message.
pub struct Failure {
    condition: Box<dyn Message>,
}

impl Failure {
    /// Wrap a message as a failure
    pub fn new<M: Message>(condition: M) -> Self {
        Self {
            condition: Box::new(condition),
        }
    }

    /// Wrap an already boxed message
    pub fn from_boxed(condition: Box<dyn Message>) -> Self {
        Self { condition }
    }

    /// Type tag of the failure
    pub fn message_type(&self) -> &'static MessageType {
        self.condition.message_type()
    }

    /// The failure as a message
    pub fn condition(&self) -> &dyn Message {
        self.condition.as_ref()
    }

    /// Unwrap the boxed message
    pub fn into_condition(self) -> Box<dyn Message> {
        self.condition
    }
}

impl<M: Message> From<M> for Failure {
    fn from(condition: M) -> Self {
        Failure::new(condition)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Failure").field(&self.condition).finish()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.message_type(), self.condition)
    }
}

impl std::error::Error for Failure {}

#[cfg(test)]
mod tests {
    use super::*;

    static RANGE_ERROR: MessageType = MessageType::extends("RangeError", &ERROR);
    static INDEX_ERROR: MessageType = MessageType::extends("IndexError", &RANGE_ERROR);
    static ENTER_NAME: MessageType = MessageType::root("EnterName");

    #[derive(Debug)]
    struct EnterName(String);

    impl Message for EnterName {
        fn message_type(&self) -> &'static MessageType {
            &ENTER_NAME
        }
    }

    #[derive(Debug)]
    struct IndexOutOfRange;

    impl Message for IndexOutOfRange {
        fn message_type(&self) -> &'static MessageType {
            &INDEX_ERROR
        }
    }

    #[test]
    fn test_is_a_walks_the_parent_chain() {
        assert!(INDEX_ERROR.is_a(&INDEX_ERROR));
        assert!(INDEX_ERROR.is_a(&RANGE_ERROR));
        assert!(INDEX_ERROR.is_a(&ERROR));
        assert!(!ERROR.is_a(&RANGE_ERROR));
        assert!(!ENTER_NAME.is_a(&ERROR));
    }

    #[test]
    fn test_ancestry_nearest_first() {
        let names: Vec<_> = INDEX_ERROR.ancestry().map(|t| t.name()).collect();
        assert_eq!(names, vec!["IndexError", "RangeError", "Error"]);
    }

    #[test]
    fn test_downcast_boxed_message() {
        let boxed: Box<dyn Message> = Box::new(EnterName("Joe".to_string()));
        assert!(boxed.is::<EnterName>());
        assert!(!boxed.is::<SystemEvent>());
        assert_eq!(boxed.downcast_ref::<EnterName>().unwrap().0, "Joe");
    }

    #[test]
    fn test_failure_keeps_type_tag() {
        fn fails() -> Result<(), Failure> {
            let lookup: Result<(), IndexOutOfRange> = Err(IndexOutOfRange);
            lookup?;
            Ok(())
        }

        let failure = fails().unwrap_err();
        assert_eq!(failure.message_type(), &INDEX_ERROR);
        assert!(failure.condition().is::<IndexOutOfRange>());
        assert_eq!(failure.to_string(), "IndexError: IndexOutOfRange");
    }
}
