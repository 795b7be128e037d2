mod common;

use casemodel_core::message::{Failure, Message, ERROR};
use casemodel_core::{
    Actor, FlowSpec, Model, ModelRunner, RunnerError, StepSpec, UseCaseSpec,
};
use common::*;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn greet_model(greetings: Arc<Mutex<Vec<String>>>) -> Model {
    let hello = greetings.clone();
    Model::builder("greeter")
        .use_case(
            UseCaseSpec::new("Greet").flow(
                FlowSpec::basic()
                    .step(StepSpec::system("S1").consuming(move |_| {
                        hello.lock().push("hello".to_string());
                    }))
                    .step(StepSpec::on("S2", &ENTER_NAME).consuming(move |message| {
                        if let Some(EnterName(name)) = message.downcast_ref::<EnterName>() {
                            greetings.lock().push(format!("hello, {}", name));
                        }
                    })),
            ),
        )
        .build()
        .unwrap()
}

fn cart_model(cart: Arc<AtomicUsize>, with_next_flow: bool) -> Model {
    let size = cart.clone();
    let mut shop = UseCaseSpec::new("Shop").flow(
        FlowSpec::basic().step(
            StepSpec::on("S3", &ADD_ITEM)
                .react_while(move || size.load(Ordering::SeqCst) < 10)
                .consuming(move |_| {
                    cart.fetch_add(1, Ordering::SeqCst);
                }),
        ),
    );
    if with_next_flow {
        shop = shop.flow(
            FlowSpec::new("Checkout")
                .step(StepSpec::on("S4", &ADD_ITEM))
                .step(StepSpec::on("S5", &ADD_ITEM)),
        );
    }
    Model::builder("cart").use_case(shop).build().unwrap()
}

fn add_items(count: usize) -> Vec<Box<dyn Message>> {
    (0..count).map(|_| Box::new(AddItem) as Box<dyn Message>).collect()
}

#[test]
fn test_greet_runs_system_step_then_reacts_to_name() {
    init_tracing();
    let greetings = Arc::new(Mutex::new(Vec::new()));
    let runner = ModelRunner::new();
    runner.start_recording();

    runner.run(greet_model(greetings.clone())).unwrap();
    assert_eq!(runner.latest_step().as_deref(), Some("S1"));

    let published = runner.react_to(&EnterName("Joe".to_string())).unwrap();
    assert!(published.is_none());

    assert_eq!(runner.recorded_step_names(), vec!["S1", "S2"]);
    assert_eq!(runner.recorded_message_types(), vec!["SystemEvent", "EnterName"]);
    assert_eq!(*greetings.lock(), vec!["hello", "hello, Joe"]);
}

#[test]
fn test_react_while_repeats_exactly_while_condition_holds() {
    let cart = Arc::new(AtomicUsize::new(0));
    let runner = ModelRunner::new();
    runner.start_recording();
    runner.run(cart_model(cart.clone(), true)).unwrap();

    runner.react_to_all(add_items(12)).unwrap();

    let mut expected = vec!["S3"; 10];
    expected.extend(["S4", "S5"]);
    assert_eq!(runner.recorded_step_names(), expected);
    assert_eq!(cart.load(Ordering::SeqCst), 10);
}

#[test]
fn test_react_while_without_next_flow_leaves_messages_unhandled() {
    let cart = Arc::new(AtomicUsize::new(0));
    let runner = ModelRunner::new();
    runner.start_recording();
    runner.run(cart_model(cart, false)).unwrap();

    let published = runner.react_to_all(add_items(12)).unwrap();

    assert_eq!(published.len(), 12);
    assert_eq!(runner.recorded_step_names(), vec!["S3"; 10]);
    assert!(!runner.can_react_to(&ADD_ITEM).unwrap());
}

#[test]
fn test_failure_is_routed_to_exception_handler() {
    init_tracing();
    let handled = Arc::new(Mutex::new(None));
    let seen = handled.clone();
    let model = Model::builder("calc")
        .use_case(
            UseCaseSpec::new("Compute")
                .flow(FlowSpec::basic().step(
                    StepSpec::on("X", &PING).reacting(|_| Err(Failure::new(RangeError(11)))),
                ))
                .flow(FlowSpec::new("Handle errors").anytime().step(
                    StepSpec::on_exception("EX", &ERROR).consuming(move |failure| {
                        *seen.lock() = failure.downcast_ref::<RangeError>().cloned();
                    }),
                )),
        )
        .build()
        .unwrap();

    let runner = ModelRunner::new();
    runner.start_recording();
    runner.run(model).unwrap();

    let published = runner.react_to(&Ping).unwrap();

    assert!(published.is_none());
    assert_eq!(runner.recorded_step_names(), vec!["X", "EX"]);
    assert_eq!(runner.recorded_message_types(), vec!["Ping", "RangeError"]);
    assert_eq!(*handled.lock(), Some(RangeError(11)));
    assert_eq!(runner.latest_step().as_deref(), Some("EX"));
}

#[test]
fn test_question_mark_in_reaction_raises_failure() {
    fn lookup(index: usize) -> Result<usize, RangeError> {
        if index < 3 {
            Ok(index)
        } else {
            Err(RangeError(index))
        }
    }

    let model = Model::builder("calc")
        .use_case(UseCaseSpec::new("Compute").flow(FlowSpec::basic().step(
            StepSpec::on("X", &PING).reacting(|_| {
                lookup(7)?;
                Ok(None)
            }),
        )))
        .build()
        .unwrap();

    let runner = ModelRunner::new();
    runner.run(model).unwrap();

    match runner.react_to(&Ping) {
        Err(RunnerError::UncaughtReaction { step, failure }) => {
            assert_eq!(step, "X");
            assert_eq!(failure.message_type(), &RANGE_ERROR);
            assert_eq!(failure.condition().downcast_ref::<RangeError>(), Some(&RangeError(7)));
        }
        other => panic!("expected uncaught failure, got {:?}", other),
    }
    // The failed step still counts as executed.
    assert_eq!(runner.latest_step().as_deref(), Some("X"));
}

#[test]
fn test_handler_for_unrelated_type_does_not_catch() {
    let model = Model::builder("calc")
        .use_case(
            UseCaseSpec::new("Compute")
                .flow(FlowSpec::basic().step(
                    StepSpec::on("X", &PING).reacting(|_| Err(Timeout.into())),
                ))
                .flow(
                    FlowSpec::new("Handle range errors")
                        .anytime()
                        .step(StepSpec::on_exception("EX", &RANGE_ERROR)),
                ),
        )
        .build()
        .unwrap();

    let runner = ModelRunner::new();
    runner.start_recording();
    runner.run(model).unwrap();

    let error = runner.react_to(&Ping).unwrap_err();
    assert_eq!(error.to_string(), "Uncaught failure in step X: Timeout: Timeout");
    assert_eq!(runner.recorded_step_names(), vec!["X"]);
}

#[test]
fn test_failing_handler_is_uncaught() {
    let model = Model::builder("calc")
        .use_case(
            UseCaseSpec::new("Compute")
                .flow(FlowSpec::basic().step(
                    StepSpec::on("X", &PING).reacting(|_| Err(RangeError(1).into())),
                ))
                .flow(FlowSpec::new("Handle").anytime().step(
                    StepSpec::on_exception("EX", &ERROR).reacting(|_| Err(Timeout.into())),
                )),
        )
        .build()
        .unwrap();

    let runner = ModelRunner::new();
    runner.run(model).unwrap();

    match runner.react_to(&Ping) {
        Err(RunnerError::UncaughtReaction { step, failure }) => {
            assert_eq!(step, "EX");
            assert_eq!(failure.message_type(), &TIMEOUT);
        }
        other => panic!("expected uncaught failure, got {:?}", other),
    }
}

#[test]
fn test_two_reachable_handlers_are_ambiguous() {
    let model = Model::builder("calc")
        .use_case(
            UseCaseSpec::new("Compute")
                .flow(FlowSpec::basic().step(
                    StepSpec::on("X", &PING).reacting(|_| Err(RangeError(1).into())),
                ))
                .flow(FlowSpec::new("Any error").anytime().step(StepSpec::on_exception("EX1", &ERROR)))
                .flow(
                    FlowSpec::new("Range errors")
                        .anytime()
                        .step(StepSpec::on_exception("EX2", &RANGE_ERROR)),
                ),
        )
        .build()
        .unwrap();

    let runner = ModelRunner::new();
    runner.run(model).unwrap();

    match runner.react_to(&Ping) {
        Err(RunnerError::AmbiguousReaction { message_type, steps }) => {
            assert_eq!(message_type, "RangeError");
            assert_eq!(steps, vec!["EX1", "EX2"]);
        }
        other => panic!("expected ambiguity, got {:?}", other),
    }
}

#[test]
fn test_ambiguity_is_raised_on_first_message_and_every_time() {
    let model = Model::builder("greeter")
        .use_case(
            UseCaseSpec::new("Greet")
                .flow(FlowSpec::basic().step(StepSpec::on("S2", &ENTER_NAME)))
                .flow(FlowSpec::new("Shortcut").anytime().step(StepSpec::on("S3", &ENTER_NAME))),
        )
        .build()
        .unwrap();

    let runner = ModelRunner::new();
    runner.start_recording();
    runner.run(model).unwrap();

    for _ in 0..5 {
        let error = runner.react_to(&EnterName("Joe".to_string())).unwrap_err();
        assert_eq!(error.to_string(), "More than one step can react to EnterName: S2, S3");
    }
    assert!(runner.recorded_step_names().is_empty());
    assert_eq!(runner.latest_step(), None);
}

#[test]
fn test_resolution_is_deterministic_across_models() {
    fn build() -> Model {
        let mut builder = Model::builder("many");
        for i in 0..20 {
            builder = builder.use_case(
                UseCaseSpec::new(format!("UC{}", i)).flow(
                    FlowSpec::basic()
                        .anytime()
                        .step(StepSpec::on(format!("Step{}", i), &PING)),
                ),
            );
        }
        builder.build().unwrap()
    }

    let expected: Vec<String> = (0..20).map(|i| format!("Step{}", i)).collect();
    for _ in 0..10 {
        let runner = ModelRunner::new();
        runner.run(build()).unwrap();
        assert_eq!(runner.steps_that_can_react_to(&PING).unwrap(), expected);
        match runner.react_to(&Ping) {
            Err(RunnerError::AmbiguousReaction { steps, .. }) => assert_eq!(steps, expected),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }
}

#[test]
fn test_unhandled_message_is_not_an_error() {
    let runner = ModelRunner::new();
    runner.start_recording();
    runner
        .run(greet_model(Arc::new(Mutex::new(Vec::new()))))
        .unwrap();

    assert!(runner.react_to(&Ping).unwrap().is_none());
    assert!(!runner.can_react_to(&PING).unwrap());
    assert!(runner.can_react_to(&ENTER_NAME).unwrap());
    assert_eq!(runner.recorded_step_names(), vec!["S1"]);
}

#[test]
fn test_acting_actor_scopes_resolution() {
    let model = Model::builder("desk")
        .actor(Actor::new("Clerk"))
        .use_case(UseCaseSpec::new("Serve").flow(
            FlowSpec::basic()
                .step(StepSpec::on("Register", &ENTER_NAME).as_actor("Clerk"))
                .step(StepSpec::system("Confirm")),
        ))
        .build()
        .unwrap();

    let runner = ModelRunner::new();
    runner.start_recording();
    runner.run(model).unwrap();

    assert!(runner.react_to(&EnterName("Ann".to_string())).unwrap().is_none());
    runner.set_acting_actor("Clerk");
    runner.react_to(&EnterName("Ann".to_string())).unwrap();

    // System steps stay reachable whoever acts.
    assert_eq!(runner.recorded_step_names(), vec!["Register", "Confirm"]);
}

#[test]
fn test_last_publish_is_returned_and_earlier_ones_go_to_publisher() {
    let sink = Arc::new(Mutex::new(Vec::new()));
    let collected = sink.clone();
    let model = Model::builder("greeter")
        .use_case(UseCaseSpec::new("Greet").flow(
            FlowSpec::basic()
                .step(StepSpec::on("Ask", &ENTER_NAME).reacting(|message| {
                    let name = message
                        .downcast_ref::<EnterName>()
                        .map(|n| n.0.clone())
                        .unwrap_or_default();
                    Ok(Some(Box::new(Greeting(format!("hi {}", name)))))
                }))
                .step(StepSpec::system("Farewell").reacting(|_| {
                    Ok(Some(Box::new(Greeting("bye".to_string()))))
                })),
        ))
        .build()
        .unwrap();

    let runner = ModelRunner::new();
    runner.publish_with(move |message| {
        if let Some(greeting) = message.downcast_ref::<Greeting>() {
            collected.lock().push(greeting.0.clone());
        }
    });
    runner.run(model).unwrap();

    let published = runner.react_to(&EnterName("Joe".to_string())).unwrap().unwrap();
    assert_eq!(published.downcast_ref::<Greeting>(), Some(&Greeting("bye".to_string())));
    assert_eq!(*sink.lock(), vec!["hi Joe"]);
}

#[test]
fn test_publish_to_actor_inbox() {
    let inbox = Arc::new(GreetingInbox::default());
    let model = Model::builder("greeter")
        .actor(Actor::new("Printer").with_handler(inbox.clone()))
        .use_case(UseCaseSpec::new("Greet").flow(
            FlowSpec::basic().step(
                StepSpec::on("S2", &ENTER_NAME)
                    .publish_to("Printer")
                    .reacting(|_| Ok(Some(Box::new(Greeting("hello".to_string()))))),
            ),
        ))
        .build()
        .unwrap();

    let runner = ModelRunner::new();
    runner.run(model).unwrap();

    let published = runner.react_to(&EnterName("Joe".to_string())).unwrap();
    assert!(published.is_none());
    assert_eq!(*inbox.received.lock(), vec!["hello"]);
}

#[test]
fn test_guarded_flow_reacts_from_the_start() {
    let model = Model::builder("guarded")
        .use_case(
            UseCaseSpec::new("Main")
                .flow(FlowSpec::basic().step(StepSpec::on("A", &PING)))
                .flow(
                    FlowSpec::new("Guarded")
                        .when(|| true)
                        .step(StepSpec::on("G", &ENTER_NAME)),
                ),
        )
        .build()
        .unwrap();

    let runner = ModelRunner::new();
    runner.start_recording();
    runner.run(model).unwrap();

    runner.react_to(&EnterName("Ann".to_string())).unwrap();
    assert_eq!(runner.recorded_step_names(), vec!["G"]);

    // The basic flow is only entered from the start.
    assert!(!runner.can_react_to(&PING).unwrap());
    runner.react_to(&EnterName("Bob".to_string())).unwrap();
    assert_eq!(runner.recorded_step_names(), vec!["G", "G"]);
}
