use casemodel_core::{Message, MessageHandler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, trace};

/// Receiving half of a queue, owned by its worker thread
pub(crate) struct Worker {
    pub(crate) name: String,
    pub(crate) receiver: mpsc::UnboundedReceiver<Box<dyn Message>>,
    pub(crate) stop: watch::Receiver<bool>,
    pub(crate) handler: Arc<dyn MessageHandler>,
    pub(crate) pending: Arc<AtomicUsize>,
}

impl Worker {
    /// Hand messages to the handler in arrival order until stopped
    pub(crate) async fn drain(mut self) {
        debug!(queue = %self.name, "Worker started");
        loop {
            tokio::select! {
                // Stop requests win over queued messages
                biased;

                changed = self.stop.changed() => {
                    if changed.is_err() || *self.stop.borrow() {
                        break;
                    }
                }

                message = self.receiver.recv() => {
                    let message = match message {
                        Some(message) => message,
                        None => break,
                    };
                    if *self.stop.borrow() {
                        break;
                    }
                    self.pending.fetch_sub(1, Ordering::SeqCst);
                    self.dispatch(message);
                }
            }
        }
        debug!(queue = %self.name, pending = self.pending.load(Ordering::SeqCst), "Worker finished");
    }

    fn dispatch(&self, message: Box<dyn Message>) {
        let message_type = message.message_type();
        trace!(queue = %self.name, %message_type, "Dispatching message");
        match self.handler.handle(message) {
            Ok(Some(reply)) => {
                debug!(queue = %self.name, %message_type, reply = %reply.message_type(), "Dropping reply");
            }
            Ok(None) => {}
            Err(e) => {
                error!(queue = %self.name, %message_type, error = %e, "Handler failed");
            }
        }
    }
}
