//! Cognitive collaborator over a persistent channel pair.
//!
//! ```text
//!  ChannelCognitiveClient                         worker (any task)
//!  ──────────────────────                         ─────────────────
//!  process(req) ──► pending[req.id] = oneshot
//!               ──► requests.send(req) ─────────► CognitiveWorker::requests
//!                                                        │
//!  reply pump   ◄── replies.recv() ◄───────────── CognitiveWorker::replies
//!     │
//!     └─► pending.remove(reply.request_id).send(response)
//! ```
//!
//! Replies are correlated by [`RequestId`]. A request without a reply
//! inside the client timeout fails with [`CollaboratorError::Timeout`];
//! a reply that arrives afterwards is dropped.

use super::{CognitiveCollaborator, CognitiveRequest, CognitiveResponse, CollaboratorError};
use async_trait::async_trait;
use fieldshell_types::RequestId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

const COLLABORATOR: &str = "cognitive";

type PendingMap = HashMap<RequestId, oneshot::Sender<Result<CognitiveResponse, String>>>;

/// A worker's answer to one request.
#[derive(Debug, Clone)]
pub struct CognitiveReply {
    pub request_id: RequestId,
    /// `Err` carries the worker's error message.
    pub response: Result<CognitiveResponse, String>,
}

/// The worker's end of the channel pair.
#[derive(Debug)]
pub struct CognitiveWorker {
    pub requests: mpsc::Receiver<CognitiveRequest>,
    pub replies: mpsc::Sender<CognitiveReply>,
}

/// [`CognitiveCollaborator`] that forwards requests to a worker task.
pub struct ChannelCognitiveClient {
    requests: mpsc::Sender<CognitiveRequest>,
    pending: Arc<Mutex<PendingMap>>,
    timeout: Duration,
    pump: JoinHandle<()>,
}

impl ChannelCognitiveClient {
    /// Creates a connected client/worker pair and starts the reply pump.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn connect(buffer: usize, timeout: Duration) -> (Self, CognitiveWorker) {
        let (request_tx, request_rx) = mpsc::channel(buffer);
        let (reply_tx, mut reply_rx) = mpsc::channel::<CognitiveReply>(buffer);
        let pending: Arc<Mutex<PendingMap>> = Arc::new(Mutex::new(HashMap::new()));

        let routes = Arc::clone(&pending);
        let pump = tokio::spawn(async move {
            while let Some(reply) = reply_rx.recv().await {
                let waiter = routes.lock().remove(&reply.request_id);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(reply.response);
                    }
                    None => {
                        debug!(request_id = %reply.request_id, "Dropping late cognitive reply");
                    }
                }
            }
            // worker hung up: fail everything still waiting
            routes.lock().clear();
        });

        let client = Self {
            requests: request_tx,
            pending,
            timeout,
            pump,
        };
        let worker = CognitiveWorker {
            requests: request_rx,
            replies: reply_tx,
        };
        (client, worker)
    }

    /// Requests waiting for a reply.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Drop for ChannelCognitiveClient {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Removes a request's waiter when the call ends, however it ends.
///
/// Covers the caller dropping the `process` future mid-await, e.g. when a
/// shorter step timeout wraps the call.
struct PendingSlot<'a> {
    pending: &'a Mutex<PendingMap>,
    request_id: RequestId,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.request_id);
    }
}

#[async_trait]
impl CognitiveCollaborator for ChannelCognitiveClient {
    async fn process(
        &self,
        request: CognitiveRequest,
    ) -> Result<CognitiveResponse, CollaboratorError> {
        let request_id = request.id;
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(request_id, tx);
        let _slot = PendingSlot {
            pending: &self.pending,
            request_id,
        };

        if self.requests.send(request).await.is_err() {
            return Err(CollaboratorError::Unavailable(COLLABORATOR.into()));
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Ok(response))) => Ok(response),
            Ok(Ok(Err(message))) => Err(CollaboratorError::Failed(message)),
            Ok(Err(_)) => Err(CollaboratorError::Unavailable(COLLABORATOR.into())),
            Err(_) => Err(CollaboratorError::Timeout {
                collaborator: COLLABORATOR.into(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, FieldSeed};
    use fieldshell_types::FieldId;
    use serde_json::{json, Map};

    fn request(operation: &str) -> CognitiveRequest {
        CognitiveRequest {
            id: RequestId::new(),
            operation: operation.into(),
            params: Map::new(),
            field_snapshot: Field::from_seed(FieldId::new(), FieldSeed::new()),
        }
    }

    #[tokio::test]
    async fn replies_are_correlated_out_of_order() {
        let (client, mut worker) = ChannelCognitiveClient::connect(8, Duration::from_secs(5));
        let client = Arc::new(client);

        let first = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.process(request("first")).await }
        });
        let second = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.process(request("second")).await }
        });

        let a = worker.requests.recv().await.unwrap();
        let b = worker.requests.recv().await.unwrap();
        // answer in reverse order
        for req in [b, a] {
            let response = CognitiveResponse::ok(json!({"echo": req.operation}), "w-1");
            worker
                .replies
                .send(CognitiveReply {
                    request_id: req.id,
                    response: Ok(response),
                })
                .await
                .unwrap();
        }

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(first.result["echo"], "first");
        assert_eq!(second.result["echo"], "second");
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_worker_times_out() {
        let (client, _worker) = ChannelCognitiveClient::connect(8, Duration::from_millis(100));

        let err = client.process(request("ignored")).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Timeout { timeout_ms: 100, .. }));
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_call_releases_its_slot() {
        let (client, mut worker) = ChannelCognitiveClient::connect(8, Duration::from_secs(30));

        let outer = tokio::time::timeout(Duration::from_millis(20), client.process(request("slow")));
        assert!(outer.await.is_err());
        // the worker did receive it, but the caller gave up first
        assert!(worker.requests.try_recv().is_ok());
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn closed_worker_is_unavailable() {
        let (client, worker) = ChannelCognitiveClient::connect(8, Duration::from_secs(5));
        drop(worker);

        let err = client.process(request("nobody")).await.unwrap_err();
        assert_eq!(err, CollaboratorError::Unavailable("cognitive".into()));
    }

    #[tokio::test]
    async fn worker_error_is_failure() {
        let (client, mut worker) = ChannelCognitiveClient::connect(8, Duration::from_secs(5));

        let call = tokio::spawn(async move { client.process(request("bad")).await });
        let req = worker.requests.recv().await.unwrap();
        worker
            .replies
            .send(CognitiveReply {
                request_id: req.id,
                response: Err("model crashed".into()),
            })
            .await
            .unwrap();

        let err = call.await.unwrap().unwrap_err();
        assert_eq!(err, CollaboratorError::Failed("model crashed".into()));
    }
}
