use super::position::FlowPosition;
use super::step::Condition;
use super::{FlowId, StepId, UseCaseId};
use std::fmt;

/// An ordered sequence of steps within a use case
pub struct Flow {
    pub(crate) id: FlowId,
    pub(crate) name: String,
    pub(crate) use_case: UseCaseId,
    pub(crate) steps: Vec<StepId>,
    pub(crate) position: Option<FlowPosition>,
    pub(crate) condition: Option<Condition>,
}

impl Flow {
    /// Position of the flow in the model
    pub fn id(&self) -> FlowId {
        self.id
    }

    /// Flow name, unique within its use case
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning use case
    pub fn use_case(&self) -> UseCaseId {
        self.use_case
    }

    /// Steps in declaration order
    pub fn steps(&self) -> &[StepId] {
        &self.steps
    }

    /// Explicit entry position, if any
    pub fn position(&self) -> Option<&FlowPosition> {
        self.position.as_ref()
    }

    /// First step of the flow
    pub fn first_step(&self) -> Option<StepId> {
        self.steps.first().copied()
    }

    /// Last step of the flow
    pub fn last_step(&self) -> Option<StepId> {
        self.steps.last().copied()
    }

    /// True if the flow has an entry guard
    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    pub(crate) fn guard_holds(&self) -> bool {
        self.condition.as_ref().map_or(true, |c| c())
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("steps", &self.steps)
            .field("position", &self.position)
            .field("has_condition", &self.condition.is_some())
            .finish()
    }
}

/// A use case: ordered flows, the first being the basic flow
#[derive(Debug)]
pub struct UseCase {
    pub(crate) id: UseCaseId,
    pub(crate) name: String,
    pub(crate) flows: Vec<FlowId>,
    pub(crate) steps: Vec<StepId>,
}

impl UseCase {
    /// Position of the use case in the model
    pub fn id(&self) -> UseCaseId {
        self.id
    }

    /// Use case name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flows in declaration order
    pub fn flows(&self) -> &[FlowId] {
        &self.flows
    }

    /// The basic flow
    pub fn basic_flow(&self) -> Option<FlowId> {
        self.flows.first().copied()
    }

    /// Steps of all flows, in insertion order
    pub fn steps(&self) -> &[StepId] {
        &self.steps
    }
}
