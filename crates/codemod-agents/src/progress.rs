//! Progress events for observers of a running session.
//!
//! One event per state transition, delivered in transition order. Sinks
//! are synchronous and never block the loop; the channel sink hands
//! events to an unbounded queue drained by the observer.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
    InProgress,
    Finished,
    Error,
}

/// Wire shape: `{status, message, codemod?, error?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub message: String,
    /// Final transform text, only on `finished`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codemod: Option<String>,
    /// Failure detail, only on `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn in_progress(message: impl Into<String>) -> Self {
        Self {
            status: ProgressStatus::InProgress,
            message: message.into(),
            codemod: None,
            error: None,
        }
    }

    pub fn finished(message: impl Into<String>, codemod: impl Into<String>) -> Self {
        Self {
            status: ProgressStatus::Finished,
            message: message.into(),
            codemod: Some(codemod.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: ProgressStatus::Error,
            message: message.into(),
            codemod: None,
            error: Some(error.into()),
        }
    }
}

/// Receives progress events in order.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Forwards events into an unbounded channel.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver the observer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        if self.sender.send(event).is_err() {
            // Observer went away; the session keeps running.
            debug!("progress receiver dropped");
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
