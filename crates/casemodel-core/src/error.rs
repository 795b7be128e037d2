use crate::message::Failure;
use thiserror::Error;

/// Errors surfaced by the model runner
#[derive(Error, Debug)]
pub enum RunnerError {
    /// More than one step can react to the same message
    #[error("More than one step can react to {message_type}: {}", steps.join(", "))]
    AmbiguousReaction {
        /// Type of the message being resolved
        message_type: String,
        /// Names of all candidate steps, in model order
        steps: Vec<String>,
    },

    /// Auto-continuation did not settle within the configured limit
    #[error("Step {step} repeated more than {limit} times without external input; check for an always-true condition")]
    InfiniteRepetition {
        /// The step that was still resolving when the limit was hit
        step: String,
        /// The configured limit
        limit: usize,
    },

    /// A reaction failed and no exception handling step could react
    #[error("Uncaught failure in step {step}: {failure}")]
    UncaughtReaction {
        /// The step whose reaction failed
        step: String,
        /// The original failure
        #[source]
        failure: Failure,
    },

    /// `react_to` was called from inside a reaction
    #[error("Nested call to react_to from inside the reaction of step {step}")]
    NestedCall {
        /// The step whose reaction is currently running
        step: String,
    },

    /// A flow position or continuation names a step that does not exist
    #[error("Unknown step: {0}")]
    UnknownStep(String),

    /// A step includes a use case that does not exist
    #[error("Unknown use case: {0}")]
    UnknownUseCase(String),

    /// A published message could not be delivered to an actor
    #[error("Delivery error: {0}")]
    Delivery(String),
}

/// Errors raised while assembling a model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Two actors share a name
    #[error("Duplicate actor: {0}")]
    DuplicateActor(String),

    /// Two use cases share a name
    #[error("Duplicate use case: {0}")]
    DuplicateUseCase(String),

    /// Two steps share a name
    #[error("Duplicate step: {0}")]
    DuplicateStep(String),

    /// Two flows of a use case share a name
    #[error("Duplicate flow {flow} in use case {use_case}")]
    DuplicateFlow {
        /// Owning use case
        use_case: String,
        /// Flow name
        flow: String,
    },

    /// A step is bound to, or publishes to, an actor the model does not own
    #[error("Step {step} references unknown actor: {actor}")]
    UnknownActor {
        /// Step name
        step: String,
        /// Actor name
        actor: String,
    },

    /// A flow without steps
    #[error("Flow {flow} in use case {use_case} has no steps")]
    EmptyFlow {
        /// Owning use case
        use_case: String,
        /// Flow name
        flow: String,
    },
}

/// Errors raised while loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value is out of its allowed range
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue {
        /// Configuration key
        key: String,
        /// Offending value
        value: String,
    },
}

/// Result type for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, MessageType, ERROR};

    static TIMEOUT: MessageType = MessageType::extends("Timeout", &ERROR);

    #[derive(Debug)]
    struct Timeout;

    impl Message for Timeout {
        fn message_type(&self) -> &'static MessageType {
            &TIMEOUT
        }
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                RunnerError::AmbiguousReaction {
                    message_type: "EnterName".to_string(),
                    steps: vec!["S2".to_string(), "S3".to_string()],
                },
                "More than one step can react to EnterName: S2, S3",
            ),
            (
                RunnerError::InfiniteRepetition {
                    step: "Poll".to_string(),
                    limit: 100,
                },
                "Step Poll repeated more than 100 times without external input; check for an always-true condition",
            ),
            (
                RunnerError::NestedCall {
                    step: "S1".to_string(),
                },
                "Nested call to react_to from inside the reaction of step S1",
            ),
            (RunnerError::UnknownStep("S9".to_string()), "Unknown step: S9"),
            (
                RunnerError::UnknownUseCase("Pay".to_string()),
                "Unknown use case: Pay",
            ),
            (
                RunnerError::Delivery("queue stopped".to_string()),
                "Delivery error: queue stopped",
            ),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_uncaught_reaction_keeps_source() {
        use std::error::Error as _;

        let error = RunnerError::UncaughtReaction {
            step: "X".to_string(),
            failure: Failure::new(Timeout),
        };
        assert_eq!(error.to_string(), "Uncaught failure in step X: Timeout: Timeout");
        assert!(error.source().is_some());
    }

    #[test]
    fn test_model_error_display() {
        assert_eq!(
            ModelError::UnknownActor {
                step: "S1".to_string(),
                actor: "Clerk".to_string()
            }
            .to_string(),
            "Step S1 references unknown actor: Clerk"
        );
        assert_eq!(
            ModelError::EmptyFlow {
                use_case: "Greet".to_string(),
                flow: "Basic flow".to_string()
            }
            .to_string(),
            "Flow Basic flow in use case Greet has no steps"
        );
    }
}
