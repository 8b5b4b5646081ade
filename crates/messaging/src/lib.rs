//! Transport abstractions for the onboarding platform.
//!
//! The broker itself is an external collaborator; this crate defines what
//! the rest of the workspace needs from it:
//!
//! - [`Publisher`] — fire-and-forget publication of [`Message`] envelopes.
//!   Components receive a publisher by injection so they stay testable
//!   against fakes.
//! - [`RpcClient`] — request/response on top of fire-and-forget messaging.
//!   Each call is correlated by a generated [`common::RequestId`] and
//!   resolves to exactly one of: a success reply, a [`Fault`], or a
//!   timeout.
//! - [`InMemoryBus`] — a loopback transport used for wiring and tests.

pub mod bus;
pub mod error;
pub mod fault;
pub mod message;
pub mod rpc;

pub use bus::{InMemoryBus, ResponderReply};
pub use error::{PublishError, RpcError, TransportError};
pub use fault::Fault;
pub use message::{Message, Publisher};
pub use rpc::{Reply, ReplyRouter, RequestTransport, RpcClient, RpcRequest};
