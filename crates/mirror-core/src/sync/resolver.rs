//! Conflict decisions under the `ask` policy

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::{Error, Result};

/// Terminal outcome for one conflicting file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDecision {
    /// Overwrite the host with local content
    UseLocal,
    /// Leave the host file as it is
    #[default]
    KeepHost,
}

/// A file whose local and host content both moved since the last sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConflict {
    /// Project-relative path
    pub path: String,
    pub local: String,
    pub host: String,
    /// Host content at the last decision
    pub known: Option<String>,
}

/// Source of decisions for conflicting files.
///
/// The engine awaits each decision in turn and bounds the wait with the
/// configured timeout.
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    async fn resolve(&self, conflict: &SyncConflict) -> Result<ConflictDecision>;
}

/// Answers every conflict the same way. Used for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedResolver(pub ConflictDecision);

#[async_trait]
impl ConflictResolver for FixedResolver {
    async fn resolve(&self, _conflict: &SyncConflict) -> Result<ConflictDecision> {
        Ok(self.0)
    }
}

/// A pending decision handed to whoever owns the receiving end.
#[derive(Debug)]
pub struct ConflictRequest {
    pub conflict: SyncConflict,
    reply: oneshot::Sender<ConflictDecision>,
}

impl ConflictRequest {
    /// Answer the request. A dropped engine is not an error.
    pub fn decide(self, decision: ConflictDecision) {
        if self.reply.send(decision).is_err() {
            tracing::debug!(path = %self.conflict.path, "conflict decision arrived after the run moved on");
        }
    }
}

/// Forwards conflicts over a channel, typically to a UI task.
#[derive(Debug, Clone)]
pub struct ChannelResolver {
    requests: mpsc::Sender<ConflictRequest>,
}

impl ChannelResolver {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ConflictRequest>) {
        let (requests, receiver) = mpsc::channel(buffer.max(1));
        (Self { requests }, receiver)
    }
}

#[async_trait]
impl ConflictResolver for ChannelResolver {
    async fn resolve(&self, conflict: &SyncConflict) -> Result<ConflictDecision> {
        let unresolved = || Error::SyncConflict {
            path: conflict.path.clone(),
        };
        let (reply, response) = oneshot::channel();
        self.requests
            .send(ConflictRequest {
                conflict: conflict.clone(),
                reply,
            })
            .await
            .map_err(|_| unresolved())?;
        response.await.map_err(|_| unresolved())
    }
}
