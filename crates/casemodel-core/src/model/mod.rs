//! The static use case model consumed by the runner.
//!
//! A [`Model`] owns actors, use cases, flows and steps. Once built it is
//! never mutated, so it can be shared as `Arc<Model>` between any number of
//! runners without locking.

/// Actors
pub mod actor;

/// Structural constructor API
pub mod builder;

/// Flows and use cases
pub mod flow;

/// Flow positions and named step references
pub mod position;

/// Steps and reactions
pub mod step;

pub use actor::{Actor, SYSTEM, USER};
pub use builder::{FlowSpec, ModelBuilder, StepSpec, UseCaseSpec};
pub use flow::{Flow, UseCase};
pub use position::{FlowPosition, NamedStep, NamedSteps};
pub use step::{Condition, Reaction, ReactionFn, ReactionOutput, Step};

use std::collections::{HashMap, HashSet};

/// Index of a step in its model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub(crate) usize);

/// Index of a flow in its model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowId(pub(crate) usize);

/// Index of a use case in its model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UseCaseId(pub(crate) usize);

/// An immutable use case model
#[derive(Debug)]
pub struct Model {
    pub(crate) name: String,
    pub(crate) actors: Vec<Actor>,
    pub(crate) use_cases: Vec<UseCase>,
    pub(crate) flows: Vec<Flow>,
    pub(crate) steps: Vec<Step>,
    pub(crate) step_index: HashMap<String, StepId>,
    pub(crate) use_case_index: HashMap<String, UseCaseId>,
    pub(crate) included: HashSet<UseCaseId>,
}

impl Model {
    /// Start assembling a model
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(name)
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All actors, including the implicit user and system actors
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Look up an actor by name
    pub fn actor(&self, name: &str) -> Option<&Actor> {
        self.actors.iter().find(|a| a.name() == name)
    }

    /// All use cases in declaration order
    pub fn use_cases(&self) -> &[UseCase] {
        &self.use_cases
    }

    /// All steps in insertion order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// All flows in declaration order
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// A step by id
    pub fn step(&self, id: StepId) -> &Step {
        &self.steps[id.0]
    }

    /// A flow by id
    pub fn flow(&self, id: FlowId) -> &Flow {
        &self.flows[id.0]
    }

    /// A use case by id
    pub fn use_case(&self, id: UseCaseId) -> &UseCase {
        &self.use_cases[id.0]
    }

    /// Look up a step id by name
    pub fn step_id(&self, name: &str) -> Option<StepId> {
        self.step_index.get(name).copied()
    }

    /// Look up a step by name
    pub fn step_named(&self, name: &str) -> Option<&Step> {
        self.step_id(name).map(|id| self.step(id))
    }

    /// Look up a use case id by name
    pub fn use_case_id(&self, name: &str) -> Option<UseCaseId> {
        self.use_case_index.get(name).copied()
    }

    /// Look up a use case by name
    pub fn use_case_named(&self, name: &str) -> Option<&UseCase> {
        self.use_case_id(name).map(|id| self.use_case(id))
    }

    /// True if some step includes the use case, which makes its basic
    /// flow enterable only through inclusion
    pub fn is_included(&self, id: UseCaseId) -> bool {
        self.included.contains(&id)
    }

    /// True if `flow` is the basic flow of its use case
    pub fn is_basic_flow(&self, flow: FlowId) -> bool {
        let use_case = self.flow(flow).use_case;
        self.use_case(use_case).basic_flow() == Some(flow)
    }

    /// The flow declared right before `flow` in the same use case
    pub fn preceding_flow(&self, flow: FlowId) -> Option<FlowId> {
        let flows = self.use_case(self.flow(flow).use_case).flows();
        let position = flows.iter().position(|f| *f == flow)?;
        position.checked_sub(1).map(|p| flows[p])
    }

    /// True if `step` is the entry step of its flow
    pub fn is_entry_step(&self, step: StepId) -> bool {
        self.step(step).previous.is_none()
    }

    /// True if `step` is the last step of its flow
    pub fn is_last_step(&self, step: StepId) -> bool {
        self.flow(self.step(step).flow).last_step() == Some(step)
    }
}
