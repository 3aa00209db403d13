//! Named background jobs.
//!
//! Handlers register under a job name; producers enqueue a [`Job`] with an
//! opaque JSON payload. `InProcessQueue` is the in-process implementation:
//! it drains jobs in FIFO order and enqueues follow-up jobs that handlers
//! return. Retries are not its concern.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::types::errors::QueueError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub handler: String,
    pub payload: Value,
}

impl Job {
    pub fn new<T: Serialize>(handler: &str, payload: &T) -> Result<Self, QueueError> {
        let payload =
            serde_json::to_value(payload).map_err(|e| QueueError::InvalidPayload(e.to_string()))?;
        Ok(Self {
            handler: handler.to_string(),
            payload,
        })
    }

    /// Decodes the payload into the handler's job type.
    pub fn decode<T: for<'de> Deserialize<'de>>(payload: &Value) -> Result<T, QueueError> {
        serde_json::from_value(payload.clone()).map_err(|e| QueueError::InvalidPayload(e.to_string()))
    }
}

/// Processes jobs delivered under one name. Returned jobs are enqueued.
pub trait QueueHandler {
    fn handle(&self, payload: &Value) -> Result<Vec<Job>, QueueError>;
}

/// Registration and submission interface of a queue.
pub trait QueueManager {
    fn connect(&mut self, name: &str, handler: Box<dyn QueueHandler>);
    fn enqueue(&mut self, job: Job) -> Result<(), QueueError>;
}

/// Outcome of draining the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueReport {
    pub processed: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct InProcessQueue {
    handlers: HashMap<String, Box<dyn QueueHandler>>,
    pending: VecDeque<Job>,
}

impl InProcessQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn handler_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Runs jobs until the queue is empty. A failing job is logged and
    /// counted; it does not stop the rest.
    pub fn run_pending(&mut self) -> QueueReport {
        let mut report = QueueReport::default();
        while let Some(job) = self.pending.pop_front() {
            let Some(handler) = self.handlers.get(&job.handler) else {
                error!(handler = %job.handler, "dropping job for unregistered handler");
                report.failed += 1;
                continue;
            };
            match handler.handle(&job.payload) {
                Ok(follow_ups) => {
                    debug!(handler = %job.handler, follow_ups = follow_ups.len(), "job done");
                    report.processed += 1;
                    self.pending.extend(follow_ups);
                }
                Err(e) => {
                    error!(handler = %job.handler, error = %e, "job failed");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

impl QueueManager for InProcessQueue {
    fn connect(&mut self, name: &str, handler: Box<dyn QueueHandler>) {
        self.handlers.insert(name.to_string(), handler);
    }

    fn enqueue(&mut self, job: Job) -> Result<(), QueueError> {
        if !self.handlers.contains_key(&job.handler) {
            return Err(QueueError::UnknownHandler(job.handler));
        }
        self.pending.push_back(job);
        Ok(())
    }
}
