//! In-memory loopback bus.
//!
//! Stands in for the broker during tests and single-process wiring. It
//! implements both capabilities: [`Publisher`] for fire-and-forget
//! messages (recorded, then fanned out to subscribers) and
//! [`RequestTransport`] for RPC requests (routed to a registered
//! responder, whose reply is delivered back through the attached
//! [`ReplyRouter`]). A request whose kind has no responder goes nowhere,
//! exactly like a queue nobody consumes — the call times out.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::error::{PublishError, TransportError};
use crate::fault::Fault;
use crate::message::{Message, Publisher};
use crate::rpc::{Reply, ReplyRouter, RequestTransport, RpcRequest};

/// What a responder does with a request.
pub enum ResponderReply {
    /// Reply on the success channel.
    Success(serde_json::Value),
    /// Reply on the fault channel.
    Fault(Fault),
    /// Never answer; the caller's deadline decides.
    NoReply,
}

impl ResponderReply {
    /// Builds a success reply from a serializable body.
    ///
    /// Panics if the body fails to serialize; responders are test wiring.
    pub fn success<T: Serialize>(body: &T) -> Self {
        ResponderReply::Success(serde_json::to_value(body).expect("reply body must serialize"))
    }
}

type Responder = Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, ResponderReply> + Send + Sync>;
type Subscriber = Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
struct BusInner {
    responders: RwLock<HashMap<String, Responder>>,
    subscribers: RwLock<HashMap<String, Vec<Subscriber>>>,
    published: RwLock<Vec<Message>>,
    requests_sent: RwLock<Vec<String>>,
    router: RwLock<Option<ReplyRouter>>,
}

/// In-memory transport implementing [`Publisher`] and [`RequestTransport`].
#[derive(Clone, Default)]
pub struct InMemoryBus {
    inner: Arc<BusInner>,
}

impl InMemoryBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an RPC client over this bus with its reply routing attached.
    pub fn rpc_client(&self) -> crate::rpc::RpcClient<InMemoryBus> {
        let client = crate::rpc::RpcClient::new(self.clone());
        *self.inner.router.write().unwrap() = Some(client.router());
        client
    }

    /// Registers the responder for a request kind, replacing any previous
    /// one.
    pub fn on_request<F, Fut>(&self, kind: &str, handler: F)
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResponderReply> + Send + 'static,
    {
        let responder: Responder = Arc::new(move |payload| handler(payload).boxed());
        self.inner
            .responders
            .write()
            .unwrap()
            .insert(kind.to_string(), responder);
    }

    /// Subscribes a handler to a published message kind.
    pub fn on_publish<F, Fut>(&self, kind: &str, handler: F)
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let subscriber: Subscriber = Arc::new(move |payload| handler(payload).boxed());
        self.inner
            .subscribers
            .write()
            .unwrap()
            .entry(kind.to_string())
            .or_default()
            .push(subscriber);
    }

    /// Returns every message published so far.
    pub fn published(&self) -> Vec<Message> {
        self.inner.published.read().unwrap().clone()
    }

    /// Returns the payloads of published messages of one kind.
    pub fn published_of_kind(&self, kind: &str) -> Vec<serde_json::Value> {
        self.inner
            .published
            .read()
            .unwrap()
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.payload.clone())
            .collect()
    }

    /// Number of RPC requests sent for a kind.
    pub fn request_count(&self, kind: &str) -> usize {
        self.inner
            .requests_sent
            .read()
            .unwrap()
            .iter()
            .filter(|k| k.as_str() == kind)
            .count()
    }
}

#[async_trait]
impl Publisher for InMemoryBus {
    async fn publish(&self, message: Message) -> Result<(), PublishError> {
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .read()
            .unwrap()
            .get(&message.kind)
            .cloned()
            .unwrap_or_default();

        for subscriber in subscribers {
            let payload = message.payload.clone();
            tokio::spawn(async move {
                subscriber(payload).await;
            });
        }

        self.inner.published.write().unwrap().push(message);
        Ok(())
    }
}

#[async_trait]
impl RequestTransport for InMemoryBus {
    async fn send_request(&self, request: RpcRequest) -> Result<(), TransportError> {
        self.inner
            .requests_sent
            .write()
            .unwrap()
            .push(request.kind.clone());

        let responder = self
            .inner
            .responders
            .read()
            .unwrap()
            .get(&request.kind)
            .cloned();
        let Some(responder) = responder else {
            // No consumer bound to this kind; the request sits unanswered.
            return Ok(());
        };

        let router = self.inner.router.read().unwrap().clone();
        let request_id = request.request_id;
        let reply_future = responder(request.payload);
        tokio::spawn(async move {
            let reply = match reply_future.await {
                ResponderReply::Success(payload) => Reply::Success {
                    request_id,
                    payload,
                },
                ResponderReply::Fault(fault) => Reply::Fault { request_id, fault },
                ResponderReply::NoReply => return,
            };
            if let Some(router) = router {
                router.deliver(reply);
            }
        });
        Ok(())
    }
}
