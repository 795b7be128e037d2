//!
//! Casemodel Core - runtime for use case models
//!
//! A model groups steps into flows of use cases. The [`ModelRunner`]
//! accepts messages one at a time, decides which single step may react,
//! runs its reaction and moves on. Failures are routed to exception
//! handling steps, system-initiated steps continue automatically, and
//! use cases can include other use cases.
//!
//! ```
//! use casemodel_core::message::{Message, MessageType};
//! use casemodel_core::{FlowSpec, Model, ModelRunner, StepSpec, UseCaseSpec};
//!
//! static ENTER_NAME: MessageType = MessageType::root("EnterName");
//!
//! #[derive(Debug)]
//! struct EnterName(String);
//!
//! impl Message for EnterName {
//!     fn message_type(&self) -> &'static MessageType {
//!         &ENTER_NAME
//!     }
//! }
//!
//! let model = Model::builder("greeter")
//!     .use_case(UseCaseSpec::new("Greet").flow(
//!         FlowSpec::basic()
//!             .step(StepSpec::system("S1"))
//!             .step(StepSpec::on("S2", &ENTER_NAME)),
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let runner = ModelRunner::new();
//! runner.start_recording();
//! runner.run(model).unwrap();
//! runner.react_to(&EnterName("Joe".to_string())).unwrap();
//! assert_eq!(runner.recorded_step_names(), vec!["S1", "S2"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Runner configuration
pub mod config;

/// Error types
pub mod error;

/// Message consumers
pub mod handler;

/// Messages and type tags
pub mod message;

/// The use case model
pub mod model;

/// The model runner
pub mod runner;

// Re-export key types
pub use config::RunnerConfig;
pub use error::{ConfigError, ModelError, RunnerError, RunnerResult};
pub use handler::MessageHandler;
pub use message::{Failure, Message, MessageType, SystemEvent, ERROR, SYSTEM_EVENT};
pub use model::{
    Actor, FlowPosition, FlowSpec, Model, ModelBuilder, Reaction, ReactionOutput, Step, StepSpec,
    UseCaseSpec, SYSTEM, USER,
};
pub use runner::{CallThrough, ModelRunner, ModelRunnerBuilder, Publisher, ReactionHook, StepTrigger};
