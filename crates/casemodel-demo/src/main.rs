//! Drives two small use case models: a greeter whose greetings are printed
//! through an event queue, and a shopping cart filled from several threads.

mod models;

use anyhow::{bail, Context, Result};
use casemodel_core::{Message, MessageHandler, ModelRunner, RunnerConfig, RunnerResult};
use casemodel_monitoring::reaction::REACTIONS_TOTAL;
use casemodel_monitoring::{init_logging, InMemoryMetrics, MonitoringConfig, TracedReaction};
use casemodel_queue::EventQueue;
use models::{AddItem, Cart, Checkout, EnterName, Greeting, CART_CAPACITY};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const PRODUCERS: usize = 2;
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Logs every greeting it receives
struct Printer;

impl MessageHandler for Printer {
    fn handle(&self, message: Box<dyn Message>) -> RunnerResult<Option<Box<dyn Message>>> {
        match message.downcast_ref::<Greeting>() {
            Some(Greeting(text)) => info!(greeting = %text, "Printed"),
            None => warn!(message_type = %message.message_type(), "Printer ignored message"),
        }
        Ok(None)
    }
}

fn main() -> Result<()> {
    init_logging(&MonitoringConfig::from_env().with_service_name("casemodel-demo"))?;
    let config = RunnerConfig::from_env().context("Invalid runner configuration")?;
    let metrics = Arc::new(InMemoryMetrics::new());

    greet(config.clone(), metrics.clone())?;
    shop(config, metrics.clone())?;

    info!(
        published = metrics.counter_total(REACTIONS_TOTAL, ("outcome", "published")),
        completed = metrics.counter_total(REACTIONS_TOTAL, ("outcome", "completed")),
        failed = metrics.counter_total(REACTIONS_TOTAL, ("outcome", "failed")),
        "Reactions"
    );
    Ok(())
}

fn greet(config: RunnerConfig, metrics: Arc<InMemoryMetrics>) -> Result<()> {
    let printer = Arc::new(EventQueue::start_named("printer", Printer)?);
    let model = models::greeter(printer.clone()).context("Failed to build greeter model")?;

    let runner = ModelRunner::builder()
        .config(config)
        .hook(TracedReaction::new("greeter").with_metrics(metrics))
        .build();
    runner.start_recording();
    runner.run(model)?;
    runner.react_to(&EnterName("Ada".to_string()))?;

    wait_until_empty(&printer)?;
    printer.stop()?;
    info!(steps = ?runner.recorded_step_names(), "Greeter finished");
    Ok(())
}

fn shop(config: RunnerConfig, metrics: Arc<InMemoryMetrics>) -> Result<()> {
    let cart = Arc::new(Cart::default());
    let model = models::shopping_cart(cart.clone()).context("Failed to build cart model")?;

    let runner = Arc::new(
        ModelRunner::builder()
            .config(config)
            .hook(TracedReaction::new("cart").with_metrics(metrics))
            .build(),
    );
    runner.start_recording();
    runner.run(model)?;

    let queue = Arc::new(EventQueue::start_named("cart", runner.clone())?);
    queue.put(Box::new(AddItem("  ".to_string())))?;

    let per_producer = CART_CAPACITY / PRODUCERS;
    thread::scope(|scope| {
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|producer| {
                let queue = queue.clone();
                scope.spawn(move || {
                    (0..per_producer).try_for_each(|n| {
                        queue.put(Box::new(AddItem(format!("item-{}-{}", producer, n))))
                    })
                })
            })
            .collect();
        producers.into_iter().try_for_each(|producer| match producer.join() {
            Ok(result) => result.map_err(anyhow::Error::from),
            Err(_) => bail!("Producer thread panicked"),
        })
    })?;
    queue.put(Box::new(Checkout))?;

    wait_until_empty(&queue)?;
    queue.stop()?;
    info!(
        items = cart.items().len(),
        rejected = cart.rejected().len(),
        steps = ?runner.recorded_step_names(),
        "Cart finished"
    );
    Ok(())
}

fn wait_until_empty(queue: &EventQueue) -> Result<()> {
    let started = Instant::now();
    while !queue.is_empty() {
        if started.elapsed() > DRAIN_TIMEOUT {
            bail!("Queue {} still holds {} messages", queue.name(), queue.size());
        }
        thread::sleep(Duration::from_millis(10));
    }
    Ok(())
}
