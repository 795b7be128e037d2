//! Routing failed reactions to exception handling steps.

use super::executor::Outcome;
use super::resolver::Scope;
use super::Session;
use crate::error::{RunnerError, RunnerResult};
use crate::message::Failure;
use crate::model::Step;
use tracing::{debug, error};

impl Session<'_> {
    /// Let the single exception handler reachable for `failure` react to it.
    ///
    /// Without a handler, or when the hook suppresses the handler, the
    /// failure surfaces as `UncaughtReaction`.
    pub(crate) fn route_exception(&mut self, failed: &Step, failure: Failure) -> RunnerResult<Outcome> {
        let handler = match self.resolve(failure.message_type(), Scope::Exception)? {
            Some(handler) => handler,
            None => {
                error!(step = %failed.name(), %failure, "Uncaught failure");
                return Err(RunnerError::UncaughtReaction {
                    step: failed.name().to_string(),
                    failure,
                });
            }
        };

        debug!(
            step = %failed.name(),
            handler = %self.model.step(handler).name(),
            failure_type = %failure.message_type(),
            "Routing failure"
        );
        let outcome = self.execute(handler, failure.condition())?;
        match outcome {
            Outcome::Suppressed => {
                error!(step = %failed.name(), %failure, "Exception handler suppressed, failure uncaught");
                Err(RunnerError::UncaughtReaction {
                    step: failed.name().to_string(),
                    failure,
                })
            }
            executed => Ok(executed),
        }
    }
}
