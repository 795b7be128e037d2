//! Use case inclusion and continuation.
//!
//! Including a use case pushes a frame on the cursor's include stack. While
//! frames are stacked, normal resolution only looks at the steps of the
//! topmost included use case. Continuation reactions and finishing a flow of
//! the included use case hand scope back to the including use case.

use super::Cursor;
use crate::error::{RunnerError, RunnerResult};
use crate::model::{Model, Step, StepId, UseCaseId};
use tracing::debug;

/// A use case entered through an include step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IncludeFrame {
    /// The step that performed the inclusion
    pub(crate) include_step: StepId,
    /// The included use case
    pub(crate) included: UseCaseId,
}

impl Cursor {
    /// The innermost included use case, if any
    pub(crate) fn top_frame(&self) -> Option<&IncludeFrame> {
        self.includes.last()
    }

    /// Enter the use case named `name`
    pub(crate) fn include(&mut self, model: &Model, step: &Step, name: &str) -> RunnerResult<()> {
        let included = model
            .use_case_id(name)
            .ok_or_else(|| RunnerError::UnknownUseCase(name.to_string()))?;
        self.includes.push(IncludeFrame {
            include_step: step.id(),
            included,
        });
        debug!(step = %step.name(), use_case = %name, depth = self.includes.len(), "Included use case");
        Ok(())
    }

    /// Make `target` the next step to react.
    ///
    /// When `target` starts its flow there is no step to stand in front of
    /// it, so `target` is marked as reachable until the next step executes.
    pub(crate) fn continue_at(&mut self, model: &Model, from: &Step, target: StepId) {
        let target_step = model.step(target);
        self.unwind_to(target_step.use_case());
        match target_step.previous() {
            Some(previous) => self.latest = Some(previous),
            None => {
                self.latest = Some(from.id());
                self.continue_at = Some(target);
            }
        }
        debug!(from = %from.name(), target = %target_step.name(), "Continuing at step");
    }

    /// Continue as if `target` had just reacted
    pub(crate) fn continue_after(&mut self, model: &Model, from: &Step, target: StepId) {
        let target_step = model.step(target);
        self.unwind_to(target_step.use_case());
        self.latest = Some(target);
        debug!(from = %from.name(), target = %target_step.name(), "Continuing after step");
    }

    /// Pop frames until the top one is `use_case` or the stack is empty
    fn unwind_to(&mut self, use_case: UseCaseId) {
        while let Some(frame) = self.includes.last() {
            if frame.included == use_case {
                break;
            }
            self.includes.pop();
        }
    }

    /// Return to the including flow after `step` finished a flow of the
    /// included use case. Any flow counts, the basic flow included.
    pub(crate) fn settle(&mut self, model: &Model, step: &Step) {
        let mut finished = step;
        while let Some(frame) = self.includes.last().copied() {
            let done = finished.use_case() == frame.included
                && model.is_last_step(finished.id())
                && !finished.is_looping();
            if !done {
                break;
            }
            self.includes.pop();
            self.latest = Some(frame.include_step);
            finished = model.step(frame.include_step);
            debug!(
                step = %step.name(),
                resume_after = %finished.name(),
                depth = self.includes.len(),
                "Included use case finished"
            );
        }
    }
}
