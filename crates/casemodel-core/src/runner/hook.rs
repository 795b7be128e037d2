//! Interception of reaction invocations.
//!
//! Every reaction runs inside the runner's [`ReactionHook`]. The hook gets a
//! [`StepTrigger`] and decides whether to call through. Dropping the trigger
//! without calling [`StepTrigger::trigger`] suppresses the step entirely:
//! the runner does not move past it and does not record it.

use crate::message::Message;
use crate::model::{ReactionOutput, Step};

/// A pending reaction handed to a [`ReactionHook`]
pub struct StepTrigger<'a> {
    step: &'a Step,
    message: &'a dyn Message,
    fired: &'a mut bool,
}

impl<'a> StepTrigger<'a> {
    pub(crate) fn new(step: &'a Step, message: &'a dyn Message, fired: &'a mut bool) -> Self {
        Self {
            step,
            message,
            fired,
        }
    }

    /// The step about to react
    pub fn step(&self) -> &Step {
        self.step
    }

    /// The message it reacts to
    pub fn message(&self) -> &dyn Message {
        self.message
    }

    /// Run the reaction
    pub fn trigger(self) -> ReactionOutput {
        *self.fired = true;
        self.step.react(self.message)
    }
}

/// Wraps every reaction the runner executes
pub trait ReactionHook: Send + Sync {
    /// Handle one pending reaction
    fn around(&self, trigger: StepTrigger<'_>) -> ReactionOutput;
}

impl<F> ReactionHook for F
where
    F: Fn(StepTrigger<'_>) -> ReactionOutput + Send + Sync,
{
    fn around(&self, trigger: StepTrigger<'_>) -> ReactionOutput {
        self(trigger)
    }
}

/// The default hook: calls straight through
#[derive(Debug, Clone, Copy, Default)]
pub struct CallThrough;

impl ReactionHook for CallThrough {
    fn around(&self, trigger: StepTrigger<'_>) -> ReactionOutput {
        trigger.trigger()
    }
}
