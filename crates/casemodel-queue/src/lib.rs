//!
//! Casemodel Queue - ordered, single-consumer delivery to a message handler
//!
//! An [`EventQueue`] accepts messages from any number of producers and hands
//! them, one at a time and in arrival order, to a single handler running on
//! a dedicated worker thread. Feeding a `ModelRunner` through a queue is the
//! way to react to messages from several threads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Error types
pub mod error;

mod worker;

pub use error::{QueueError, QueueResult};

use casemodel_core::{Message, MessageHandler, RunnerResult};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use worker::Worker;

/// Name used by [`EventQueue::start`]
pub const DEFAULT_QUEUE_NAME: &str = "casemodel-queue";

/// Unbounded FIFO queue drained by one worker thread
pub struct EventQueue {
    name: String,
    sender: mpsc::UnboundedSender<Box<dyn Message>>,
    stop: watch::Sender<bool>,
    stopped: AtomicBool,
    pending: Arc<AtomicUsize>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EventQueue {
    /// Start a queue named [`DEFAULT_QUEUE_NAME`] delivering to `handler`
    pub fn start(handler: impl MessageHandler + 'static) -> QueueResult<Self> {
        Self::start_named(DEFAULT_QUEUE_NAME, handler)
    }

    /// Start a queue delivering to `handler`. The worker thread carries
    /// the queue's name.
    pub fn start_named(
        name: impl Into<String>,
        handler: impl MessageHandler + 'static,
    ) -> QueueResult<Self> {
        let name = name.into();
        let spawn_error = |e: std::io::Error| QueueError::WorkerSpawn {
            queue: name.clone(),
            reason: e.to_string(),
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(spawn_error)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let (stop, stop_receiver) = watch::channel(false);
        let pending = Arc::new(AtomicUsize::new(0));
        let worker = Worker {
            name: name.clone(),
            receiver,
            stop: stop_receiver,
            handler: Arc::new(handler),
            pending: pending.clone(),
        };

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || runtime.block_on(worker.drain()))
            .map_err(spawn_error)?;

        info!(queue = %name, "Event queue started");
        Ok(Self {
            name,
            sender,
            stop,
            stopped: AtomicBool::new(false),
            pending,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Queue name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue a message without blocking
    pub fn put(&self, message: Box<dyn Message>) -> QueueResult<()> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(QueueError::Stopped(self.name.clone()));
        }
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(message).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::Stopped(self.name.clone()));
        }
        Ok(())
    }

    /// Number of messages waiting for the worker
    pub fn size(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// True if no message is waiting
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// True once `stop` was called
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Stop the worker and wait for it to finish.
    ///
    /// A message being handled when `stop` is called is handled to the end;
    /// no message is handled after `stop` returns. Messages still waiting
    /// are dropped. Calling `stop` again is a no-op.
    pub fn stop(&self) -> QueueResult<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        // The worker may already be gone, in which case there is nothing to signal.
        let _ = self.stop.send(true);

        let handle = match self.worker.lock().take() {
            Some(handle) => handle,
            None => return Ok(()),
        };
        if handle.thread().id() == thread::current().id() {
            warn!(queue = %self.name, "Queue stopped from its own worker, not joining");
            return Ok(());
        }
        handle
            .join()
            .map_err(|_| QueueError::WorkerPanicked(self.name.clone()))?;

        info!(queue = %self.name, dropped = self.size(), "Event queue stopped");
        Ok(())
    }
}

impl MessageHandler for EventQueue {
    fn handle(&self, message: Box<dyn Message>) -> RunnerResult<Option<Box<dyn Message>>> {
        self.put(message)?;
        Ok(None)
    }
}

impl Drop for EventQueue {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(queue = %self.name, error = %e, "Event queue did not stop cleanly");
        }
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("name", &self.name)
            .field("size", &self.size())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
