//! Step resolution: which single step, if any, reacts to a message.

use super::predicate::Positions;
use super::Cursor;
use crate::error::{RunnerError, RunnerResult};
use crate::message::MessageType;
use crate::model::{FlowPosition, Model, Step, StepId, SYSTEM};
use tracing::{debug, trace};

/// Which steps take part in a resolution pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Steps reacting to ordinary messages
    Normal,
    /// Steps handling failures of other reactions
    Exception,
}

/// Resolves steps of one model for one acting actor and cursor snapshot
pub(crate) struct Resolver<'a> {
    model: &'a Model,
    cursor: &'a Cursor,
    actor: &'a str,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(model: &'a Model, cursor: &'a Cursor, actor: &'a str) -> Self {
        Self {
            model,
            cursor,
            actor,
        }
    }

    /// The single step that may react to a message of `message_type`.
    ///
    /// `Ok(None)` if no step can react; `AmbiguousReaction` if several can.
    pub(crate) fn resolve(
        &self,
        message_type: &'static MessageType,
        scope: Scope,
    ) -> RunnerResult<Option<StepId>> {
        let candidates = self.candidates(message_type, scope)?;
        match candidates.as_slice() {
            [] => {
                trace!(message_type = %message_type, ?scope, "No step can react");
                Ok(None)
            }
            [step] => {
                debug!(
                    message_type = %message_type,
                    step = %self.model.step(*step).name(),
                    ?scope,
                    "Resolved step"
                );
                Ok(Some(*step))
            }
            _ => Err(RunnerError::AmbiguousReaction {
                message_type: message_type.name().to_string(),
                steps: candidates
                    .iter()
                    .map(|&id| self.model.step(id).name().to_string())
                    .collect(),
            }),
        }
    }

    /// All steps that may react, in model order, after preemption
    pub(crate) fn candidates(
        &self,
        message_type: &'static MessageType,
        scope: Scope,
    ) -> RunnerResult<Vec<StepId>> {
        let positions = Positions::new(self.model, self.cursor);
        let mut candidates = Vec::new();
        for step in self.model.steps() {
            if self.in_scope(step, scope)
                && self.is_acting(step)
                && expects(step, message_type)
                && self.is_reachable(&positions, step)?
            {
                candidates.push(step.id());
            }
        }

        let preempted = self.preempted(&candidates)?;
        candidates.retain(|id| !preempted.contains(id));
        Ok(candidates)
    }

    fn in_scope(&self, step: &Step, scope: Scope) -> bool {
        match scope {
            Scope::Exception => step.handles_exception(),
            Scope::Normal => {
                !step.handles_exception()
                    && self
                        .cursor
                        .top_frame()
                        .map_or(true, |frame| frame.included == step.use_case())
            }
        }
    }

    fn is_acting(&self, step: &Step) -> bool {
        step.is_bound_to(self.actor) || step.is_bound_to(SYSTEM)
    }

    fn is_reachable(&self, positions: &Positions<'_>, step: &Step) -> RunnerResult<bool> {
        let repeating = positions.repeating(step);
        if !repeating && !positions.step_holds(step)? {
            return Ok(false);
        }
        if !repeating && self.model.is_entry_step(step.id()) {
            let flow = self.model.flow(step.flow());
            if !flow.guard_holds() {
                return Ok(false);
            }
        }
        if !step.guard_holds() {
            return Ok(false);
        }
        Ok(!step.repeats() || step.is_looping())
    }

    /// Steps replaced by entry steps of InsteadOf flows among `candidates`
    fn preempted(&self, candidates: &[StepId]) -> RunnerResult<Vec<StepId>> {
        let mut preempted = Vec::new();
        for &id in candidates {
            if !self.model.is_entry_step(id) {
                continue;
            }
            let flow = self.model.flow(self.model.step(id).flow());
            if let Some(FlowPosition::InsteadOf(replaced)) = flow.position() {
                preempted.push(replaced.resolve(self.model)?);
            }
        }
        Ok(preempted)
    }
}

fn expects(step: &Step, message_type: &MessageType) -> bool {
    step.message_type()
        .map_or(true, |expected| message_type.is_a(expected))
}
