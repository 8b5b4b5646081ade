//! Request/response on top of fire-and-forget messaging.
//!
//! A call publishes a request envelope tagged with a fresh
//! [`RequestId`] and a reply destination, then parks the calling task on a
//! one-shot channel until the correlated reply, a fault, or the deadline
//! arrives. At most one outcome is ever delivered per request ID: the
//! waiter is removed the moment an outcome is chosen, so duplicate or late
//! replies find no slot and are dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::RequestId;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{RpcError, TransportError};
use crate::fault::Fault;

/// An outbound request envelope.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    pub request_id: RequestId,
    pub kind: String,
    pub payload: serde_json::Value,
    /// Destination queue for the reply.
    pub reply_to: String,
}

/// An inbound reply envelope, success and fault channels kept distinct.
#[derive(Debug, Clone)]
pub enum Reply {
    Success {
        request_id: RequestId,
        payload: serde_json::Value,
    },
    Fault {
        request_id: RequestId,
        fault: Fault,
    },
}

impl Reply {
    /// Returns the request ID this reply is tagged with.
    pub fn request_id(&self) -> RequestId {
        match self {
            Reply::Success { request_id, .. } | Reply::Fault { request_id, .. } => *request_id,
        }
    }
}

/// Capability to hand a request envelope to the transport.
///
/// Sending is fire-and-forget; replies come back through a
/// [`ReplyRouter`].
#[async_trait]
pub trait RequestTransport: Send + Sync {
    async fn send_request(&self, request: RpcRequest) -> Result<(), TransportError>;
}

enum ReplyOutcome {
    Success(serde_json::Value),
    Fault(Fault),
}

type PendingCalls = Mutex<HashMap<RequestId, tokio::sync::oneshot::Sender<ReplyOutcome>>>;

/// Issues correlated request/response calls over a messaging transport.
///
/// The pending-call table is private to the client and only ever touched
/// under its lock; no transactional store is involved. Cloning the client
/// shares the table, so replies routed to any clone resolve calls issued
/// by any other.
#[derive(Clone)]
pub struct RpcClient<T> {
    transport: T,
    pending: Arc<PendingCalls>,
    reply_to: String,
}

impl<T: RequestTransport> RpcClient<T> {
    /// Creates a client over the given transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            pending: Arc::new(Mutex::new(HashMap::new())),
            reply_to: format!("reply-{}", RequestId::new()),
        }
    }

    /// Returns a router that resolves replies against this client's
    /// pending calls. The transport's reply consumer holds one.
    pub fn router(&self) -> ReplyRouter {
        ReplyRouter {
            pending: Arc::clone(&self.pending),
        }
    }

    /// Number of calls currently awaiting an outcome.
    pub fn pending_calls(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Issues a request and awaits its single outcome.
    ///
    /// Resolves to the deserialized reply on success, to
    /// [`RpcError::Fault`] when the remote rejects the request, and to
    /// [`RpcError::Timeout`] when no reply arrives within `timeout`. After
    /// a timeout the waiter is gone: a reply that arrives later is dropped,
    /// never surfaced. There is no retry; callers that want one must
    /// re-issue the call themselves, and only for idempotent requests.
    #[tracing::instrument(skip(self, request))]
    pub async fn call<Req, Resp>(
        &self,
        kind: &str,
        request: &Req,
        timeout: Duration,
    ) -> Result<Resp, RpcError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let request_id = RequestId::new();
        let payload = serde_json::to_value(request)?;

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.pending.lock().unwrap().insert(request_id, tx);
        metrics::counter!("rpc_requests_total").increment(1);

        let envelope = RpcRequest {
            request_id,
            kind: kind.to_string(),
            payload,
            reply_to: self.reply_to.clone(),
        };
        if let Err(e) = self.transport.send_request(envelope).await {
            self.pending.lock().unwrap().remove(&request_id);
            return Err(e.into());
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(ReplyOutcome::Success(value))) => Ok(serde_json::from_value(value)?),
            Ok(Ok(ReplyOutcome::Fault(fault))) => {
                metrics::counter!("rpc_faults_total").increment(1);
                tracing::warn!(%request_id, kind, %fault, "request faulted");
                Err(RpcError::Fault {
                    kind: kind.to_string(),
                    fault,
                })
            }
            Ok(Err(_)) => {
                // The sender was dropped without resolving; only happens if
                // the transport tore down the pending table.
                self.pending.lock().unwrap().remove(&request_id);
                Err(TransportError::new("reply channel closed").into())
            }
            Err(_) => {
                // Remove the waiter first so a reply racing the deadline is
                // dropped rather than surfaced after TimedOut was chosen.
                self.pending.lock().unwrap().remove(&request_id);
                metrics::counter!("rpc_timeouts_total").increment(1);
                tracing::warn!(%request_id, kind, ?timeout, "request timed out");
                Err(RpcError::Timeout {
                    kind: kind.to_string(),
                    timeout,
                })
            }
        }
    }
}

/// Resolves inbound replies against a client's pending-call table.
#[derive(Clone)]
pub struct ReplyRouter {
    pending: Arc<PendingCalls>,
}

impl ReplyRouter {
    /// Delivers a reply to its waiting call.
    ///
    /// Returns `true` if a pending call consumed the reply. Duplicate and
    /// late replies return `false` and are logged, not errors: at-least-once
    /// transports are allowed to redeliver.
    pub fn deliver(&self, reply: Reply) -> bool {
        let request_id = reply.request_id();
        let Some(tx) = self.pending.lock().unwrap().remove(&request_id) else {
            tracing::warn!(%request_id, "dropping reply with no pending call (late or duplicate)");
            metrics::counter!("rpc_replies_dropped_total").increment(1);
            return false;
        };

        let outcome = match reply {
            Reply::Success { payload, .. } => ReplyOutcome::Success(payload),
            Reply::Fault { fault, .. } => ReplyOutcome::Fault(fault),
        };
        if tx.send(outcome).is_err() {
            tracing::warn!(%request_id, "pending call went away before the reply landed");
            return false;
        }
        true
    }
}
