//! Executing resolved steps and continuing automatically.

use super::hook::StepTrigger;
use super::resolver::Scope;
use super::Session;
use crate::error::{RunnerError, RunnerResult};
use crate::message::{Message, SystemEvent, SYSTEM_EVENT};
use crate::model::{Actor, Model, Reaction, Step, StepId};
use std::sync::Arc;
use tracing::{debug, error};

/// What became of a resolved step
pub(crate) enum Outcome {
    /// The hook did not call through
    Suppressed,
    /// The step ran, publishing the message if any
    Executed(Option<Box<dyn Message>>),
}

impl Session<'_> {
    /// Resolve, execute and continue automatically
    pub(crate) fn react(&mut self, message: &dyn Message) -> RunnerResult<Option<Box<dyn Message>>> {
        let step = match self.resolve(message.message_type(), Scope::Normal)? {
            Some(step) => step,
            None => return Ok(None),
        };
        match self.execute(step, message)? {
            Outcome::Suppressed => Ok(None),
            Outcome::Executed(publish) => self.continue_automatically(publish),
        }
    }

    /// Run system-initiated steps until none is reachable.
    ///
    /// `pending` is the publish of the step executed before; it is returned
    /// if nothing else runs and handed to the publisher otherwise.
    pub(crate) fn continue_automatically(
        &mut self,
        mut pending: Option<Box<dyn Message>>,
    ) -> RunnerResult<Option<Box<dyn Message>>> {
        let limit = self.runner.config.max_auto_continuations;
        let mut rounds = 0;

        while let Some(step) = self.resolve(&SYSTEM_EVENT, Scope::Normal)? {
            rounds += 1;
            if rounds > limit {
                let step = self.model.step(step).name().to_string();
                error!(step = %step, limit, "Auto-continuation did not settle");
                return Err(RunnerError::InfiniteRepetition { step, limit });
            }

            match self.execute(step, &SystemEvent)? {
                Outcome::Suppressed => break,
                Outcome::Executed(publish) => {
                    if let Some(previous) = pending.take() {
                        self.runner.publish(previous);
                    }
                    pending = publish;
                }
            }
        }

        if rounds > 0 {
            debug!(rounds, "Auto-continuation settled");
        }
        Ok(pending)
    }

    /// Run one step through the hook and move the cursor past it.
    ///
    /// A failed step still counts as executed before its failure is routed.
    pub(crate) fn execute(&mut self, id: StepId, message: &dyn Message) -> RunnerResult<Outcome> {
        let model = Arc::clone(&self.model);
        let step = model.step(id);
        self.runner.mark_reacting(step.name());

        let mut fired = false;
        let output = self.hook.around(StepTrigger::new(step, message, &mut fired));
        if !fired {
            debug!(step = %step.name(), "Reaction suppressed by hook");
            return Ok(Outcome::Suppressed);
        }

        self.cursor.latest = Some(id);
        self.cursor.continue_at = None;
        self.runner.record(step.name(), message.message_type());

        match output {
            Ok(publish) => {
                let applied = self.apply_reaction(&model, step);
                self.commit();
                applied?;
                let publish = self.deliver(&model, step, publish)?;
                Ok(Outcome::Executed(publish))
            }
            Err(failure) => {
                self.commit();
                if step.handles_exception() {
                    error!(step = %step.name(), %failure, "Exception handler failed");
                    return Err(RunnerError::UncaughtReaction {
                        step: step.name().to_string(),
                        failure,
                    });
                }
                self.route_exception(step, failure)
            }
        }
    }

    fn apply_reaction(&mut self, model: &Model, step: &Step) -> RunnerResult<()> {
        match step.reaction() {
            Reaction::Function(_) => self.cursor.settle(model, step),
            Reaction::IncludeUseCase(use_case) => self.cursor.include(model, step, use_case)?,
            Reaction::ContinueAt(target) => {
                let target = target.resolve(model)?;
                self.cursor.continue_at(model, step, target);
            }
            Reaction::ContinueAfter(target) => {
                let target = target.resolve(model)?;
                self.cursor.continue_after(model, step, target);
            }
        }
        Ok(())
    }

    /// Hand a publish to the step's target actor, if it has an inbox
    fn deliver(
        &self,
        model: &Model,
        step: &Step,
        publish: Option<Box<dyn Message>>,
    ) -> RunnerResult<Option<Box<dyn Message>>> {
        let message = match publish {
            Some(message) => message,
            None => return Ok(None),
        };
        let target = match step.publish_to() {
            Some(target) => target,
            None => return Ok(Some(message)),
        };

        match model.actor(target).and_then(Actor::handler) {
            Some(handler) => {
                debug!(step = %step.name(), actor = %target, message_type = %message.message_type(), "Publishing to actor");
                if let Some(reply) = handler.handle(message)? {
                    debug!(actor = %target, message_type = %reply.message_type(), "Dropping reply from actor");
                }
                Ok(None)
            }
            None => {
                debug!(step = %step.name(), actor = %target, "Actor has no inbox, returning publish to caller");
                Ok(Some(message))
            }
        }
    }
}
