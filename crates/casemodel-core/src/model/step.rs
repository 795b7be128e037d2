use super::position::NamedStep;
use super::{FlowId, StepId, UseCaseId};
use crate::message::{Failure, Message, MessageType};
use std::fmt;
use std::sync::Arc;

/// Result of running a reaction: an optional published message, or a failure
pub type ReactionOutput = Result<Option<Box<dyn Message>>, Failure>;

/// A user supplied reaction function
pub type ReactionFn = Arc<dyn Fn(&dyn Message) -> ReactionOutput + Send + Sync>;

/// A boolean over application state, evaluated during resolution
pub type Condition = Arc<dyn Fn() -> bool + Send + Sync>;

/// What a step does when it reacts
#[derive(Clone)]
pub enum Reaction {
    /// Run a function on the message
    Function(ReactionFn),
    /// Transfer resolution scope into the named use case
    IncludeUseCase(String),
    /// Make the named step the next one to react
    ContinueAt(Arc<NamedStep>),
    /// Continue as if the named step had just reacted
    ContinueAfter(Arc<NamedStep>),
}

impl Reaction {
    /// A reaction that does nothing and publishes nothing
    pub fn noop() -> Self {
        Reaction::Function(Arc::new(|_| Ok(None)))
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reaction::Function(_) => f.write_str("Function"),
            Reaction::IncludeUseCase(name) => write!(f, "IncludeUseCase({})", name),
            Reaction::ContinueAt(step) => write!(f, "ContinueAt({})", step.name()),
            Reaction::ContinueAfter(step) => write!(f, "ContinueAfter({})", step.name()),
        }
    }
}

/// The atomic dispatch unit of a model
pub struct Step {
    pub(crate) id: StepId,
    pub(crate) name: String,
    pub(crate) use_case: UseCaseId,
    pub(crate) flow: FlowId,
    pub(crate) previous: Option<StepId>,
    pub(crate) actors: Vec<String>,
    pub(crate) message_type: Option<&'static MessageType>,
    pub(crate) reaction: Reaction,
    pub(crate) condition: Option<Condition>,
    pub(crate) react_while: Option<Condition>,
    pub(crate) publish_to: Option<String>,
    pub(crate) handles_exception: bool,
}

impl Step {
    /// Position of the step in the model
    pub fn id(&self) -> StepId {
        self.id
    }

    /// Unique step name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning use case
    pub fn use_case(&self) -> UseCaseId {
        self.use_case
    }

    /// Owning flow
    pub fn flow(&self) -> FlowId {
        self.flow
    }

    /// The step before this one in the same flow
    pub fn previous(&self) -> Option<StepId> {
        self.previous
    }

    /// Actors allowed to trigger the step
    pub fn actors(&self) -> &[String] {
        &self.actors
    }

    /// Expected message type; `None` for system-initiated steps
    pub fn message_type(&self) -> Option<&'static MessageType> {
        self.message_type
    }

    /// True if the step fires without external input
    pub fn is_system_initiated(&self) -> bool {
        self.message_type.is_none()
    }

    /// True if the step only takes part in exception routing
    pub fn handles_exception(&self) -> bool {
        self.handles_exception
    }

    /// Actor that receives the step's published message
    pub fn publish_to(&self) -> Option<&str> {
        self.publish_to.as_deref()
    }

    /// The step's reaction
    pub fn reaction(&self) -> &Reaction {
        &self.reaction
    }

    /// True if the step has a react-while condition
    pub fn repeats(&self) -> bool {
        self.react_while.is_some()
    }

    /// True if `actor` may trigger the step
    pub fn is_bound_to(&self, actor: &str) -> bool {
        self.actors.iter().any(|a| a == actor)
    }

    /// True if the step's react-while condition currently holds
    pub(crate) fn is_looping(&self) -> bool {
        self.react_while.as_ref().map_or(false, |c| c())
    }

    /// True if the step's own guard holds (or it has none)
    pub(crate) fn guard_holds(&self) -> bool {
        self.condition.as_ref().map_or(true, |c| c())
    }

    /// Run the reaction. Include and continue reactions are applied by the
    /// runner, so they publish nothing here.
    pub(crate) fn react(&self, message: &dyn Message) -> ReactionOutput {
        match &self.reaction {
            Reaction::Function(f) => f(message),
            _ => Ok(None),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("actors", &self.actors)
            .field("message_type", &self.message_type.map(MessageType::name))
            .field("reaction", &self.reaction)
            .field("repeats", &self.repeats())
            .field("handles_exception", &self.handles_exception)
            .finish()
    }
}
