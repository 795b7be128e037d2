//! Models and messages driven by the demo.

use casemodel_core::message::{Failure, Message, MessageType, ERROR};
use casemodel_core::{Actor, FlowSpec, MessageHandler, Model, ModelError, StepSpec, UseCaseSpec};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Name of the actor greetings are published to
pub const PRINTER: &str = "Printer";

/// Items a cart takes before checkout
pub const CART_CAPACITY: usize = 10;

pub static ENTER_NAME: MessageType = MessageType::root("EnterName");
pub static GREETING: MessageType = MessageType::root("Greeting");
pub static ADD_ITEM: MessageType = MessageType::root("AddItem");
pub static CHECKOUT: MessageType = MessageType::root("Checkout");
pub static INVALID_ITEM: MessageType = MessageType::extends("InvalidItem", &ERROR);

#[derive(Debug, Clone)]
pub struct EnterName(pub String);

impl Message for EnterName {
    fn message_type(&self) -> &'static MessageType {
        &ENTER_NAME
    }
}

#[derive(Debug, Clone)]
pub struct Greeting(pub String);

impl Message for Greeting {
    fn message_type(&self) -> &'static MessageType {
        &GREETING
    }
}

#[derive(Debug, Clone)]
pub struct AddItem(pub String);

impl Message for AddItem {
    fn message_type(&self) -> &'static MessageType {
        &ADD_ITEM
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Checkout;

impl Message for Checkout {
    fn message_type(&self) -> &'static MessageType {
        &CHECKOUT
    }
}

#[derive(Debug, Clone)]
pub struct InvalidItem(pub String);

impl Message for InvalidItem {
    fn message_type(&self) -> &'static MessageType {
        &INVALID_ITEM
    }
}

/// Greets the user, then greets them by name through the printer actor
pub fn greeter(printer: Arc<dyn MessageHandler>) -> Result<Model, ModelError> {
    Model::builder("greeter")
        .actor(Actor::new(PRINTER).with_handler(printer))
        .use_case(
            UseCaseSpec::new("Greet").flow(
                FlowSpec::basic()
                    .step(StepSpec::system("Say hello").consuming(|_| info!("hello")))
                    .step(
                        StepSpec::on("Greet by name", &ENTER_NAME)
                            .publish_to(PRINTER)
                            .reacting(|message| {
                                let name = message
                                    .downcast_ref::<EnterName>()
                                    .map(|n| n.0.as_str())
                                    .unwrap_or("stranger");
                                Ok(Some(Box::new(Greeting(format!("hello, {}", name)))))
                            }),
                    ),
            ),
        )
        .build()
}

/// Contents of a shopping cart shared with the cart model's reactions
#[derive(Debug, Default)]
pub struct Cart {
    items: Mutex<Vec<String>>,
    rejected: Mutex<Vec<String>>,
}

impl Cart {
    pub fn items(&self) -> Vec<String> {
        self.items.lock().clone()
    }

    pub fn rejected(&self) -> Vec<String> {
        self.rejected.lock().clone()
    }

    fn len(&self) -> usize {
        self.items.lock().len()
    }

    fn add(&self, message: &dyn Message) -> Result<(), Failure> {
        let item = message
            .downcast_ref::<AddItem>()
            .map(|i| i.0.clone())
            .unwrap_or_default();
        if item.trim().is_empty() {
            return Err(InvalidItem(item).into());
        }
        self.items.lock().push(item);
        Ok(())
    }

    fn reject(&self, failure: &dyn Message) {
        if let Some(InvalidItem(item)) = failure.downcast_ref::<InvalidItem>() {
            self.rejected.lock().push(item.clone());
        }
    }
}

/// Fills a cart until it is full, then checks out
pub fn shopping_cart(cart: Arc<Cart>) -> Result<Model, ModelError> {
    let has_room = cart.clone();
    let adding = cart.clone();
    let rejecting = cart.clone();
    Model::builder("cart")
        .use_case(
            UseCaseSpec::new("Shop")
                .flow(
                    FlowSpec::basic().step(
                        StepSpec::on("Add item", &ADD_ITEM)
                            .react_while(move || has_room.len() < CART_CAPACITY)
                            .reacting(move |message| {
                                adding.add(message)?;
                                Ok(None)
                            }),
                    ),
                )
                .flow(
                    FlowSpec::new("Checkout")
                        .step(StepSpec::on("Pay", &CHECKOUT).consuming(move |_| {
                            info!(items = cart.len(), "Paid");
                        }))
                        .step(StepSpec::system("Say thanks").consuming(|_| info!("thank you"))),
                )
                .flow(
                    FlowSpec::new("Reject invalid items")
                        .anytime()
                        .step(StepSpec::on_exception("Reject item", &INVALID_ITEM).consuming(
                            move |failure| rejecting.reject(failure),
                        ))
                        .step(StepSpec::system("Keep shopping").continues_after("Add item")),
                ),
        )
        .build()
}
