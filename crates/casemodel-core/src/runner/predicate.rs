//! Position predicates over the runner's cursor.
//!
//! A step's position holds when the cursor stands where the step may react:
//! right after its predecessor for later steps, or wherever its flow's
//! position allows for entry steps.

use super::Cursor;
use crate::error::RunnerResult;
use crate::model::{FlowId, FlowPosition, Model, Step, StepId};

/// Evaluates positions of one model against one cursor snapshot
pub(crate) struct Positions<'a> {
    model: &'a Model,
    cursor: &'a Cursor,
}

impl<'a> Positions<'a> {
    pub(crate) fn new(model: &'a Model, cursor: &'a Cursor) -> Self {
        Self { model, cursor }
    }

    /// True if the latest step is `step` and it is done repeating
    pub(crate) fn after(&self, step: StepId) -> bool {
        self.cursor.latest == Some(step) && !self.model.step(step).is_looping()
    }

    /// True if `step` is repeating and was the latest to react
    pub(crate) fn repeating(&self, step: &Step) -> bool {
        self.cursor.latest == Some(step.id()) && step.is_looping()
    }

    /// True if the cursor stands where `step` may react
    pub(crate) fn step_holds(&self, step: &Step) -> RunnerResult<bool> {
        self.step_holds_within(step, self.model.flows().len())
    }

    // `budget` bounds chains of InsteadOf positions, which may form cycles.
    fn step_holds_within(&self, step: &Step, budget: usize) -> RunnerResult<bool> {
        if self.cursor.continue_at == Some(step.id()) {
            return Ok(true);
        }
        match step.previous() {
            Some(previous) => Ok(self.after(previous)),
            None => self.flow_holds_within(step.flow(), budget),
        }
    }

    fn flow_holds_within(&self, flow: FlowId, budget: usize) -> RunnerResult<bool> {
        match self.model.flow(flow).position() {
            Some(FlowPosition::Anytime) => Ok(true),
            Some(FlowPosition::After(steps)) => {
                let steps = steps.resolve(self.model)?;
                Ok(steps.iter().any(|&step| self.after(step)))
            }
            Some(FlowPosition::InsteadOf(step)) => {
                let replaced = step.resolve(self.model)?;
                match budget.checked_sub(1) {
                    Some(budget) => self.step_holds_within(self.model.step(replaced), budget),
                    None => Ok(false),
                }
            }
            // A guarded flow without a position is entered whenever its guard holds.
            None if self.model.flow(flow).has_condition() => Ok(true),
            None => Ok(self.default_flow_holds(flow)),
        }
    }

    fn default_flow_holds(&self, flow: FlowId) -> bool {
        if !self.model.is_basic_flow(flow) {
            return self
                .model
                .preceding_flow(flow)
                .and_then(|preceding| self.model.flow(preceding).last_step())
                .map_or(false, |last| self.after(last));
        }

        let use_case = self.model.flow(flow).use_case();
        if self.model.is_included(use_case) {
            self.cursor.top_frame().map_or(false, |frame| {
                frame.included == use_case && self.cursor.latest == Some(frame.include_step)
            })
        } else {
            self.cursor.latest.is_none()
        }
    }
}
