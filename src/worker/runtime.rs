//! Worker event loop
//!
//! A single consumer receives events from a bounded queue, dispatches them
//! through the registry and keeps each event's pending work alive until it
//! resolves. Events of different types progress concurrently. On shutdown
//! the queue is drained and in-flight work is awaited before returning.

use flume::{Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::errors::{AppError, AppResult};
use super::registry::EventRegistry;
use super::types::{HandlerOutcome, WorkerContext, WorkerEvent};

/// Producer side of the runtime
#[derive(Clone)]
pub struct WorkerHandle {
    event_sender: Sender<WorkerEvent>,
    shutdown_sender: Sender<()>,
    queue_size: Arc<AtomicUsize>,
    capacity: usize,
}

impl WorkerHandle {
    /// Queue an event; fails fast when the queue is full
    pub fn submit(&self, event: WorkerEvent) -> AppResult<()> {
        // Counted before sending so the consumer never decrements first
        self.queue_size.fetch_add(1, Ordering::Relaxed);
        match self.event_sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.queue_size.fetch_sub(1, Ordering::Relaxed);
                match e {
                    TrySendError::Full(_) => Err(AppError::QueueFull {
                        capacity: self.capacity,
                    }),
                    TrySendError::Disconnected(_) => Err(AppError::WorkerStopped),
                }
            }
        }
    }

    /// Ask the runtime to stop after draining queued events
    pub fn shutdown(&self) -> AppResult<()> {
        self.shutdown_sender
            .send(())
            .map_err(|_| AppError::WorkerStopped)
    }

    /// Events queued but not yet dispatched
    pub fn queue_len(&self) -> usize {
        self.queue_size.load(Ordering::Relaxed)
    }
}

/// Outcome of a completed event, tagged with its channel
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedEvent {
    pub channel: &'static str,
    pub outcome: HandlerOutcome,
}

/// Everything the runtime processed before it stopped
#[derive(Debug, Default)]
pub struct RuntimeReport {
    pub completed: Vec<CompletedEvent>,
}

impl RuntimeReport {
    pub fn failures(&self) -> usize {
        self.completed.iter().filter(|c| c.outcome.is_failure()).count()
    }
}

pub struct WorkerRuntime {
    ctx: WorkerContext,
    registry: EventRegistry,
    event_receiver: Receiver<WorkerEvent>,
    shutdown_receiver: Receiver<()>,
    queue_size: Arc<AtomicUsize>,
}

impl WorkerRuntime {
    /// Create a runtime with the standard handlers and a bounded queue
    pub fn new(ctx: WorkerContext, max_queue_size: usize) -> (Self, WorkerHandle) {
        Self::with_registry(ctx, EventRegistry::standard(), max_queue_size)
    }

    pub fn with_registry(
        ctx: WorkerContext,
        registry: EventRegistry,
        max_queue_size: usize,
    ) -> (Self, WorkerHandle) {
        let capacity = max_queue_size.max(1);
        let (event_sender, event_receiver) = flume::bounded(capacity);
        let (shutdown_sender, shutdown_receiver) = flume::bounded(1);
        let queue_size = Arc::new(AtomicUsize::new(0));

        let runtime = Self {
            ctx,
            registry,
            event_receiver,
            shutdown_receiver,
            queue_size: queue_size.clone(),
        };
        let handle = WorkerHandle {
            event_sender,
            shutdown_sender,
            queue_size,
            capacity,
        };
        (runtime, handle)
    }

    /// Run until shutdown is requested or every handle is dropped
    pub async fn run(self) -> AppResult<RuntimeReport> {
        info!("Push worker started with channels {:?}", self.registry.channels());

        let mut in_flight: JoinSet<CompletedEvent> = JoinSet::new();
        let mut report = RuntimeReport::default();

        loop {
            tokio::select! {
                event = self.event_receiver.recv_async() => {
                    match event {
                        Ok(event) => {
                            self.queue_size.fetch_sub(1, Ordering::Relaxed);
                            self.start(&mut in_flight, event);
                        }
                        Err(_) => {
                            debug!("All worker handles dropped");
                            break;
                        }
                    }
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    Self::collect(&mut report, joined);
                }

                _ = self.shutdown_receiver.recv_async() => {
                    info!("Received shutdown signal, draining worker queue");
                    break;
                }
            }
        }

        self.drain(&mut in_flight);

        while let Some(joined) = in_flight.join_next().await {
            Self::collect(&mut report, joined);
        }

        info!(
            "Push worker stopped after {} events ({} failed)",
            report.completed.len(),
            report.failures()
        );
        Ok(report)
    }

    fn start(&self, in_flight: &mut JoinSet<CompletedEvent>, event: WorkerEvent) {
        let channel = event.channel();
        match self.registry.dispatch(self.ctx.clone(), event) {
            Ok(work) => {
                in_flight.spawn(async move {
                    CompletedEvent {
                        channel,
                        outcome: work.await,
                    }
                });
            }
            Err(e) => {
                warn!("Dropping event: {}", e);
                in_flight.spawn(async move {
                    CompletedEvent {
                        channel,
                        outcome: HandlerOutcome::rejected(e),
                    }
                });
            }
        }
    }

    fn drain(&self, in_flight: &mut JoinSet<CompletedEvent>) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.queue_size.fetch_sub(1, Ordering::Relaxed);
            self.start(in_flight, event);
        }
    }

    fn collect(report: &mut RuntimeReport, joined: Result<CompletedEvent, tokio::task::JoinError>) {
        match joined {
            Ok(completed) => {
                debug!("Event on '{}' completed: {:?}", completed.channel, completed.outcome);
                report.completed.push(completed);
            }
            Err(e) => error!("Event task aborted: {}", e),
        }
    }
}

/// Run a batch of events through a fresh runtime and return their outcomes
pub async fn run_events(ctx: WorkerContext, events: Vec<WorkerEvent>) -> AppResult<RuntimeReport> {
    let (runtime, handle) = WorkerRuntime::new(ctx, events.len());
    for event in events {
        handle.submit(event)?;
    }
    handle.shutdown()?;
    runtime.run().await
}
