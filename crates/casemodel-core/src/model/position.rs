//! Flow positions and lazily resolved step references.
//!
//! Flows may name steps that are declared later, so references are stored
//! by name and resolved against the frozen model the first time a
//! predicate needs them. The result is cached for the model's lifetime.

use super::{Model, StepId};
use crate::error::{RunnerError, RunnerResult};
use once_cell::sync::OnceCell;

/// A step referenced by name, resolved on first use
#[derive(Debug)]
pub struct NamedStep {
    name: String,
    resolved: OnceCell<StepId>,
}

impl NamedStep {
    /// Reference a step by name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolved: OnceCell::new(),
        }
    }

    /// The referenced name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve against `model`, memoizing the first successful lookup
    pub fn resolve(&self, model: &Model) -> RunnerResult<StepId> {
        self.resolved
            .get_or_try_init(|| {
                model
                    .step_id(&self.name)
                    .ok_or_else(|| RunnerError::UnknownStep(self.name.clone()))
            })
            .copied()
    }
}

/// Several steps referenced by name, resolved together on first use
#[derive(Debug)]
pub struct NamedSteps {
    names: Vec<String>,
    resolved: OnceCell<Vec<StepId>>,
}

impl NamedSteps {
    /// Reference steps by name
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            resolved: OnceCell::new(),
        }
    }

    /// The referenced names
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolve all names against `model`, memoizing the first successful lookup
    pub fn resolve(&self, model: &Model) -> RunnerResult<&[StepId]> {
        self.resolved
            .get_or_try_init(|| {
                self.names
                    .iter()
                    .map(|name| {
                        model
                            .step_id(name)
                            .ok_or_else(|| RunnerError::UnknownStep(name.clone()))
                    })
                    .collect()
            })
            .map(Vec::as_slice)
    }
}

/// Structural precondition gating entry into a flow
#[derive(Debug)]
pub enum FlowPosition {
    /// Always enterable
    Anytime,
    /// Enterable right after one of the named steps ran
    After(NamedSteps),
    /// Enterable whenever the named step is; preempts that step
    InsteadOf(NamedStep),
}

impl FlowPosition {
    /// Position after the given steps
    pub fn after<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FlowPosition::After(NamedSteps::new(names))
    }

    /// Position replacing the given step
    pub fn instead_of(name: impl Into<String>) -> Self {
        FlowPosition::InsteadOf(NamedStep::new(name))
    }
}
