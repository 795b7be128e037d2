//! The model runner.
//!
//! A [`ModelRunner`] binds an immutable [`Model`], keeps the cursor of the
//! latest executed step and reacts to messages one at a time. Calls from
//! several threads are serialized; a call made from inside a running
//! reaction on the same thread fails with [`RunnerError::NestedCall`].

mod exception;
mod executor;
/// Reaction interception
pub mod hook;
mod inclusion;
mod predicate;
mod recording;
mod resolver;

pub use hook::{CallThrough, ReactionHook, StepTrigger};

use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::handler::MessageHandler;
use crate::message::{Message, MessageType};
use crate::model::{Model, ReactionOutput, StepId, USER};
use inclusion::IncludeFrame;
use parking_lot::{Mutex, MutexGuard, RwLock};
use recording::Recording;
use resolver::{Resolver, Scope};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, info};

/// Sink for messages published by steps other than the last one of a call
pub type Publisher = Arc<dyn Fn(Box<dyn Message>) + Send + Sync>;

/// Where the runner stands in the model
#[derive(Debug, Clone, Default)]
pub(crate) struct Cursor {
    /// The latest executed step
    pub(crate) latest: Option<StepId>,
    /// A flow-entry step made reachable by a continuation
    pub(crate) continue_at: Option<StepId>,
    /// Included use cases, innermost last
    pub(crate) includes: Vec<IncludeFrame>,
}

#[derive(Debug)]
struct RunnerState {
    cursor: Cursor,
    acting_actor: String,
    running: bool,
    recording: Recording,
}

impl Default for RunnerState {
    fn default() -> Self {
        Self {
            cursor: Cursor::default(),
            acting_actor: USER.to_string(),
            running: false,
            recording: Recording::default(),
        }
    }
}

/// The thread currently inside `run` or `react_to`, and the step it executes
#[derive(Debug)]
struct Reacting {
    thread: ThreadId,
    step: Option<String>,
}

/// Reacts to messages according to a model
pub struct ModelRunner {
    config: RunnerConfig,
    model: RwLock<Option<Arc<Model>>>,
    state: Mutex<RunnerState>,
    hook: RwLock<Arc<dyn ReactionHook>>,
    publisher: RwLock<Option<Publisher>>,
    gate: Mutex<()>,
    reacting: Mutex<Option<Reacting>>,
}

impl ModelRunner {
    /// Create a runner with the default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a runner with `config`
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            config,
            model: RwLock::new(None),
            state: Mutex::new(RunnerState::default()),
            hook: RwLock::new(Arc::new(CallThrough)),
            publisher: RwLock::new(None),
            gate: Mutex::new(()),
            reacting: Mutex::new(None),
        }
    }

    /// Start configuring a runner
    pub fn builder() -> ModelRunnerBuilder {
        ModelRunnerBuilder::default()
    }

    /// The runner's configuration
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// The bound model, if any
    pub fn model(&self) -> Option<Arc<Model>> {
        self.model.read().clone()
    }

    /// Bind `model`, reset the cursor and run every system-initiated step
    /// that becomes reachable.
    pub fn run(&self, model: impl Into<Arc<Model>>) -> RunnerResult<()> {
        let model = model.into();
        let gate = self.enter()?;

        *self.model.write() = Some(Arc::clone(&model));
        {
            let mut state = self.state.lock();
            state.cursor = Cursor::default();
            state.running = true;
            if self.config.record_from_start {
                state.recording.start();
            }
        }
        info!(model = %model.name(), "Running model");

        let mut session = Session::new(self, model, gate);
        if let Some(publish) = session.continue_automatically(None)? {
            self.publish(publish);
        }
        Ok(())
    }

    /// Stop reacting. Subsequent messages are ignored until the next `run`.
    pub fn stop(&self) {
        self.state.lock().running = false;
        info!("Runner stopped");
    }

    /// True between `run` and `stop`
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// React to one message.
    ///
    /// Returns the message published by the last step executed, or `None`
    /// when no step reacts or the runner is not running.
    pub fn react_to(&self, message: &dyn Message) -> RunnerResult<Option<Box<dyn Message>>> {
        let gate = self.enter()?;
        let model = match self.running_model() {
            Some(model) => model,
            None => {
                debug!(message_type = %message.message_type(), "Runner not running, ignoring message");
                return Ok(None);
            }
        };
        Session::new(self, model, gate).react(message)
    }

    /// React to each message in turn, stopping at the first error
    pub fn react_to_all<I>(&self, messages: I) -> RunnerResult<Vec<Option<Box<dyn Message>>>>
    where
        I: IntoIterator,
        I::Item: AsRef<dyn Message>,
    {
        messages
            .into_iter()
            .map(|message| self.react_to(message.as_ref()))
            .collect()
    }

    /// Scope resolution to steps bound to `actor` (and the system)
    pub fn set_acting_actor(&self, actor: impl Into<String>) {
        self.state.lock().acting_actor = actor.into();
    }

    /// The acting actor
    pub fn acting_actor(&self) -> String {
        self.state.lock().acting_actor.clone()
    }

    /// Name of the latest executed step
    pub fn latest_step(&self) -> Option<String> {
        let model = self.model()?;
        let latest = self.state.lock().cursor.latest?;
        Some(model.step(latest).name().to_string())
    }

    /// True if at least one step could react to a message of `message_type` now
    pub fn can_react_to(&self, message_type: &'static MessageType) -> RunnerResult<bool> {
        Ok(!self.steps_that_can_react_to(message_type)?.is_empty())
    }

    /// Names of the steps that could react to a message of `message_type`
    /// now, in model order. Nothing is executed.
    pub fn steps_that_can_react_to(
        &self,
        message_type: &'static MessageType,
    ) -> RunnerResult<Vec<String>> {
        let model = match self.model() {
            Some(model) => model,
            None => return Ok(Vec::new()),
        };
        let (cursor, actor) = {
            let state = self.state.lock();
            (state.cursor.clone(), state.acting_actor.clone())
        };
        let candidates =
            Resolver::new(&model, &cursor, &actor).candidates(message_type, Scope::Normal)?;
        Ok(candidates
            .into_iter()
            .map(|id| model.step(id).name().to_string())
            .collect())
    }

    /// Wrap every reaction in `hook`
    pub fn adapt_system_reaction<F>(&self, hook: F)
    where
        F: Fn(StepTrigger<'_>) -> ReactionOutput + Send + Sync + 'static,
    {
        self.set_reaction_hook(Arc::new(hook));
    }

    /// Replace the reaction hook
    pub fn set_reaction_hook(&self, hook: Arc<dyn ReactionHook>) {
        *self.hook.write() = hook;
    }

    /// Send intermediate publishes to `publisher` instead of dropping them
    pub fn publish_with<F>(&self, publisher: F)
    where
        F: Fn(Box<dyn Message>) + Send + Sync + 'static,
    {
        *self.publisher.write() = Some(Arc::new(publisher));
    }

    /// Clear the log and record every executed step from now on
    pub fn start_recording(&self) {
        self.state.lock().recording.start();
    }

    /// Stop recording, keeping the log
    pub fn stop_recording(&self) {
        self.state.lock().recording.stop();
    }

    /// Names of the recorded steps, in execution order
    pub fn recorded_step_names(&self) -> Vec<String> {
        self.state.lock().recording.step_names().to_vec()
    }

    /// Types of the messages the recorded steps reacted to
    pub fn recorded_message_types(&self) -> Vec<&'static str> {
        self.state.lock().recording.message_types().to_vec()
    }

    fn running_model(&self) -> Option<Arc<Model>> {
        if self.is_running() {
            self.model()
        } else {
            None
        }
    }

    /// Serialize with other callers, failing fast on re-entry from the
    /// reacting thread.
    fn enter(&self) -> RunnerResult<Gate<'_>> {
        let current = thread::current().id();
        if let Some(reacting) = self.reacting.lock().as_ref() {
            if reacting.thread == current {
                return Err(RunnerError::NestedCall {
                    step: reacting
                        .step
                        .clone()
                        .unwrap_or_else(|| "(resolving)".to_string()),
                });
            }
        }

        let guard = self.gate.lock();
        *self.reacting.lock() = Some(Reacting {
            thread: current,
            step: None,
        });
        Ok(Gate {
            runner: self,
            _guard: guard,
        })
    }

    fn mark_reacting(&self, step: &str) {
        if let Some(reacting) = self.reacting.lock().as_mut() {
            reacting.step = Some(step.to_string());
        }
    }

    fn acting(&self) -> String {
        self.state.lock().acting_actor.clone()
    }

    fn record(&self, step: &str, message_type: &'static MessageType) {
        self.state.lock().recording.record(step, message_type.name());
    }

    fn store_cursor(&self, cursor: &Cursor) {
        self.state.lock().cursor = cursor.clone();
    }

    fn publish(&self, message: Box<dyn Message>) {
        let publisher = self.publisher.read().clone();
        match publisher {
            Some(publisher) => publisher(message),
            None => debug!(message_type = %message.message_type(), "Dropping intermediate publish"),
        }
    }
}

impl Default for ModelRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModelRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRunner")
            .field("config", &self.config)
            .field("model", &self.model.read().as_ref().map(|m| m.name().to_string()))
            .field("running", &self.is_running())
            .finish()
    }
}

impl MessageHandler for ModelRunner {
    fn handle(&self, message: Box<dyn Message>) -> RunnerResult<Option<Box<dyn Message>>> {
        self.react_to(message.as_ref())
    }
}

/// Builder for [`ModelRunner`]
#[derive(Default)]
pub struct ModelRunnerBuilder {
    config: RunnerConfig,
    hook: Option<Arc<dyn ReactionHook>>,
    publisher: Option<Publisher>,
    acting_actor: Option<String>,
}

impl ModelRunnerBuilder {
    /// Use `config`
    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Wrap every reaction in `hook`
    pub fn hook(mut self, hook: impl ReactionHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Send intermediate publishes to `publisher`
    pub fn publisher<F>(mut self, publisher: F) -> Self
    where
        F: Fn(Box<dyn Message>) + Send + Sync + 'static,
    {
        self.publisher = Some(Arc::new(publisher));
        self
    }

    /// Initial acting actor
    pub fn acting_actor(mut self, actor: impl Into<String>) -> Self {
        self.acting_actor = Some(actor.into());
        self
    }

    /// Create the runner
    pub fn build(self) -> ModelRunner {
        let runner = ModelRunner::with_config(self.config);
        if let Some(hook) = self.hook {
            runner.set_reaction_hook(hook);
        }
        *runner.publisher.write() = self.publisher;
        if let Some(actor) = self.acting_actor {
            runner.set_acting_actor(actor);
        }
        runner
    }
}

/// Exclusive access to a runner for one `run` or `react_to` call
struct Gate<'r> {
    runner: &'r ModelRunner,
    _guard: MutexGuard<'r, ()>,
}

impl Drop for Gate<'_> {
    fn drop(&mut self) {
        *self.runner.reacting.lock() = None;
    }
}

/// One serialized call into the runner, working on its own cursor copy
pub(crate) struct Session<'r> {
    runner: &'r ModelRunner,
    model: Arc<Model>,
    hook: Arc<dyn ReactionHook>,
    cursor: Cursor,
    _gate: Gate<'r>,
}

impl<'r> Session<'r> {
    fn new(runner: &'r ModelRunner, model: Arc<Model>, gate: Gate<'r>) -> Self {
        let hook = runner.hook.read().clone();
        let cursor = runner.state.lock().cursor.clone();
        Self {
            runner,
            model,
            hook,
            cursor,
            _gate: gate,
        }
    }

    fn resolve(
        &self,
        message_type: &'static MessageType,
        scope: Scope,
    ) -> RunnerResult<Option<StepId>> {
        let actor = self.runner.acting();
        Resolver::new(&self.model, &self.cursor, &actor).resolve(message_type, scope)
    }

    fn commit(&self) {
        self.runner.store_cursor(&self.cursor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FlowSpec, StepSpec, UseCaseSpec};

    static PING: MessageType = MessageType::root("Ping");

    #[derive(Debug)]
    struct Ping;

    impl Message for Ping {
        fn message_type(&self) -> &'static MessageType {
            &PING
        }
    }

    fn model() -> Model {
        Model::builder("m")
            .use_case(UseCaseSpec::new("Main").flow(
                FlowSpec::basic()
                    .step(StepSpec::on("A", &PING))
                    .step(StepSpec::on("B", &PING)),
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn test_not_running_ignores_messages() {
        let runner = ModelRunner::new();
        assert!(runner.react_to(&Ping).unwrap().is_none());

        runner.run(model()).unwrap();
        runner.stop();
        assert!(!runner.is_running());
        assert!(runner.react_to(&Ping).unwrap().is_none());
        assert_eq!(runner.latest_step(), None);
    }

    #[test]
    fn test_run_resets_cursor() {
        let runner = ModelRunner::new();
        let model = Arc::new(model());
        runner.run(Arc::clone(&model)).unwrap();
        runner.react_to(&Ping).unwrap();
        assert_eq!(runner.latest_step().as_deref(), Some("A"));

        runner.run(model).unwrap();
        assert_eq!(runner.latest_step(), None);
        assert_eq!(runner.steps_that_can_react_to(&PING).unwrap(), vec!["A".to_string()]);
    }

    #[test]
    fn test_builder_applies_settings() {
        let runner = ModelRunner::builder()
            .config(RunnerConfig {
                record_from_start: true,
                ..RunnerConfig::default()
            })
            .acting_actor("Clerk")
            .build();
        assert_eq!(runner.acting_actor(), "Clerk");
        assert!(runner.config().record_from_start);

        runner.set_acting_actor(USER);
        runner.run(model()).unwrap();
        runner.react_to(&Ping).unwrap();
        assert_eq!(runner.recorded_step_names(), vec!["A".to_string()]);
        assert_eq!(runner.recorded_message_types(), vec!["Ping"]);
    }

    #[test]
    fn test_gate_is_released_after_errors() {
        let runner = ModelRunner::new();
        let model = Model::builder("m")
            .use_case(
                UseCaseSpec::new("Main")
                    .flow(FlowSpec::basic().step(StepSpec::on("A", &PING)))
                    .flow(FlowSpec::new("Also").anytime().step(StepSpec::on("B", &PING))),
            )
            .build()
            .unwrap();
        runner.run(model).unwrap();
        assert!(runner.react_to(&Ping).is_err());
        // A second call on the same thread must not be reported as nested.
        assert!(matches!(
            runner.react_to(&Ping),
            Err(RunnerError::AmbiguousReaction { .. })
        ));
    }
}
