//! Structural assembly of a [`Model`].
//!
//! The specs in this module are plain data: use cases own flows, flows own
//! steps. [`ModelBuilder::build`] assigns ids, links each step to its
//! predecessor, indexes names and checks that names are unique.

use super::position::{FlowPosition, NamedStep};
use super::step::{Condition, Reaction, ReactionOutput};
use super::{Actor, Flow, FlowId, Model, Step, StepId, UseCase, UseCaseId, SYSTEM, USER};
use crate::error::ModelError;
use crate::message::{Message, MessageType};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Name given to flows created with [`FlowSpec::basic`]
pub const BASIC_FLOW: &str = "Basic flow";

/// Assembles actors and use cases into a [`Model`]
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    actors: Vec<Actor>,
    use_cases: Vec<UseCaseSpec>,
}

impl ModelBuilder {
    /// Create an empty builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actors: Vec::new(),
            use_cases: Vec::new(),
        }
    }

    /// Add an actor
    pub fn actor(mut self, actor: Actor) -> Self {
        self.actors.push(actor);
        self
    }

    /// Add a use case
    pub fn use_case(mut self, use_case: UseCaseSpec) -> Self {
        self.use_cases.push(use_case);
        self
    }

    /// Freeze the model
    pub fn build(self) -> Result<Model, ModelError> {
        let mut actors = Vec::with_capacity(self.actors.len() + 2);
        let mut actor_names = HashSet::new();
        for actor in self.actors {
            if !actor_names.insert(actor.name().to_string()) {
                return Err(ModelError::DuplicateActor(actor.name().to_string()));
            }
            actors.push(actor);
        }
        for implicit in [USER, SYSTEM] {
            if actor_names.insert(implicit.to_string()) {
                actors.push(Actor::new(implicit));
            }
        }

        let mut use_cases = Vec::with_capacity(self.use_cases.len());
        let mut flows = Vec::new();
        let mut steps: Vec<Step> = Vec::new();
        let mut step_index = HashMap::new();
        let mut use_case_index = HashMap::new();
        let mut include_targets = Vec::new();

        for spec in self.use_cases {
            let use_case_id = UseCaseId(use_cases.len());
            if use_case_index
                .insert(spec.name.clone(), use_case_id)
                .is_some()
            {
                return Err(ModelError::DuplicateUseCase(spec.name));
            }

            let mut use_case = UseCase {
                id: use_case_id,
                name: spec.name,
                flows: Vec::with_capacity(spec.flows.len()),
                steps: Vec::new(),
            };
            let mut flow_names = HashSet::new();

            for flow_spec in spec.flows {
                if !flow_names.insert(flow_spec.name.clone()) {
                    return Err(ModelError::DuplicateFlow {
                        use_case: use_case.name.clone(),
                        flow: flow_spec.name,
                    });
                }
                if flow_spec.steps.is_empty() {
                    return Err(ModelError::EmptyFlow {
                        use_case: use_case.name.clone(),
                        flow: flow_spec.name,
                    });
                }

                let flow_id = FlowId(flows.len());
                let mut flow = Flow {
                    id: flow_id,
                    name: flow_spec.name,
                    use_case: use_case_id,
                    steps: Vec::with_capacity(flow_spec.steps.len()),
                    position: flow_spec.position,
                    condition: flow_spec.condition,
                };

                let mut previous = None;
                for step_spec in flow_spec.steps {
                    let step_id = StepId(steps.len());
                    if step_index.insert(step_spec.name.clone(), step_id).is_some() {
                        return Err(ModelError::DuplicateStep(step_spec.name));
                    }
                    let step = step_spec.into_step(step_id, use_case_id, flow_id, previous);
                    for actor in step.actors.iter().chain(step.publish_to.iter()) {
                        if !actor_names.contains(actor) {
                            return Err(ModelError::UnknownActor {
                                step: step.name.clone(),
                                actor: actor.clone(),
                            });
                        }
                    }
                    if let Reaction::IncludeUseCase(target) = &step.reaction {
                        include_targets.push(target.clone());
                    }

                    flow.steps.push(step_id);
                    use_case.steps.push(step_id);
                    steps.push(step);
                    previous = Some(step_id);
                }

                use_case.flows.push(flow_id);
                flows.push(flow);
            }

            use_cases.push(use_case);
        }

        // Unknown include targets are reported when the include step runs.
        let included = include_targets
            .iter()
            .filter_map(|name| use_case_index.get(name).copied())
            .collect();

        debug!(
            model = %self.name,
            use_cases = use_cases.len(),
            steps = steps.len(),
            "Model built"
        );

        Ok(Model {
            name: self.name,
            actors,
            use_cases,
            flows,
            steps,
            step_index,
            use_case_index,
            included,
        })
    }
}

/// A use case under construction
#[derive(Debug)]
pub struct UseCaseSpec {
    name: String,
    flows: Vec<FlowSpec>,
}

impl UseCaseSpec {
    /// Create a use case without flows
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flows: Vec::new(),
        }
    }

    /// Add a flow. The first flow added is the basic flow.
    pub fn flow(mut self, flow: FlowSpec) -> Self {
        self.flows.push(flow);
        self
    }
}

/// A flow under construction
pub struct FlowSpec {
    name: String,
    position: Option<FlowPosition>,
    condition: Option<Condition>,
    steps: Vec<StepSpec>,
}

impl FlowSpec {
    /// Create a flow without position, guard or steps
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
            condition: None,
            steps: Vec::new(),
        }
    }

    /// Create a flow named [`BASIC_FLOW`]
    pub fn basic() -> Self {
        Self::new(BASIC_FLOW)
    }

    /// Make the flow enterable at any time
    pub fn anytime(mut self) -> Self {
        self.position = Some(FlowPosition::Anytime);
        self
    }

    /// Make the flow enterable right after one of the named steps
    pub fn after<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.position = Some(FlowPosition::after(steps));
        self
    }

    /// Make the flow preempt the named step
    pub fn instead_of(mut self, step: impl Into<String>) -> Self {
        self.position = Some(FlowPosition::instead_of(step));
        self
    }

    /// Guard entry into the flow
    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Append a step
    pub fn step(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }
}

impl std::fmt::Debug for FlowSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowSpec")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("steps", &self.steps)
            .finish()
    }
}

/// A step under construction
pub struct StepSpec {
    name: String,
    actors: Vec<String>,
    message_type: Option<&'static MessageType>,
    reaction: Reaction,
    condition: Option<Condition>,
    react_while: Option<Condition>,
    publish_to: Option<String>,
    handles_exception: bool,
}

impl StepSpec {
    fn with_defaults(
        name: impl Into<String>,
        message_type: Option<&'static MessageType>,
        actor: &str,
        handles_exception: bool,
    ) -> Self {
        Self {
            name: name.into(),
            actors: vec![actor.to_string()],
            message_type,
            reaction: Reaction::noop(),
            condition: None,
            react_while: None,
            publish_to: None,
            handles_exception,
        }
    }

    /// A system-initiated step, bound to the system actor
    pub fn system(name: impl Into<String>) -> Self {
        Self::with_defaults(name, None, SYSTEM, false)
    }

    /// A step reacting to messages of `message_type`, bound to the user actor
    pub fn on(name: impl Into<String>, message_type: &'static MessageType) -> Self {
        Self::with_defaults(name, Some(message_type), USER, false)
    }

    /// An exception handling step for failures of `failure_type` or its
    /// descendants, bound to the system actor
    pub fn on_exception(name: impl Into<String>, failure_type: &'static MessageType) -> Self {
        Self::with_defaults(name, Some(failure_type), SYSTEM, true)
    }

    /// Bind the step to `actor`. The first call replaces the default actor.
    pub fn as_actor(mut self, actor: impl Into<String>) -> Self {
        let default = if self.handles_exception || self.message_type.is_none() {
            SYSTEM
        } else {
            USER
        };
        if self.actors.len() == 1 && self.actors[0] == default {
            self.actors.clear();
        }
        self.actors.push(actor.into());
        self
    }

    /// React with a function that may publish a message or fail
    pub fn reacting<F>(mut self, reaction: F) -> Self
    where
        F: Fn(&dyn Message) -> ReactionOutput + Send + Sync + 'static,
    {
        self.reaction = Reaction::Function(Arc::new(reaction));
        self
    }

    /// React with a function that publishes nothing and cannot fail
    pub fn consuming<F>(mut self, reaction: F) -> Self
    where
        F: Fn(&dyn Message) + Send + Sync + 'static,
    {
        self.reaction = Reaction::Function(Arc::new(move |message: &dyn Message| {
            reaction(message);
            Ok(None)
        }));
        self
    }

    /// Transfer scope into the named use case
    pub fn includes_use_case(mut self, use_case: impl Into<String>) -> Self {
        self.reaction = Reaction::IncludeUseCase(use_case.into());
        self
    }

    /// Continue at the named step
    pub fn continues_at(mut self, step: impl Into<String>) -> Self {
        self.reaction = Reaction::ContinueAt(Arc::new(NamedStep::new(step)));
        self
    }

    /// Continue after the named step
    pub fn continues_after(mut self, step: impl Into<String>) -> Self {
        self.reaction = Reaction::ContinueAfter(Arc::new(NamedStep::new(step)));
        self
    }

    /// Guard the step
    pub fn condition<F>(mut self, condition: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Keep the step reachable for repeated messages while `condition` holds
    pub fn react_while<F>(mut self, condition: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.react_while = Some(Arc::new(condition));
        self
    }

    /// Deliver the published message to `actor` instead of the caller
    pub fn publish_to(mut self, actor: impl Into<String>) -> Self {
        self.publish_to = Some(actor.into());
        self
    }

    fn into_step(
        self,
        id: StepId,
        use_case: UseCaseId,
        flow: FlowId,
        previous: Option<StepId>,
    ) -> Step {
        Step {
            id,
            name: self.name,
            use_case,
            flow,
            previous,
            actors: self.actors,
            message_type: self.message_type,
            reaction: self.reaction,
            condition: self.condition,
            react_while: self.react_while,
            publish_to: self.publish_to,
            handles_exception: self.handles_exception,
        }
    }
}

impl std::fmt::Debug for StepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepSpec")
            .field("name", &self.name)
            .field("actors", &self.actors)
            .field("message_type", &self.message_type.map(MessageType::name))
            .field("reaction", &self.reaction)
            .finish()
    }
}
