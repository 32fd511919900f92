//! # waygate-transport
//!
//! The Transport Client capability: everything the gateway needs from the
//! messaging-network library, behind traits.
//!
//! - [`client`]: [`TransportClient`] / [`TransportHandle`] traits and the
//!   per-session event channel
//! - [`events`]: the transport event union, disconnect classification, and
//!   the opaque credential bundle
//! - [`stub`]: a scriptable in-process transport used by tests and as the
//!   daemon's fallback backend
//!
//! The wire protocol itself is out of scope — a real backend implements
//! [`TransportClient`] on top of whatever client library speaks the network.
//!
//! [`TransportClient`]: client::TransportClient
//! [`TransportHandle`]: client::TransportHandle

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod events;
pub mod stub;

pub use client::{TransportClient, TransportHandle, TransportSession};
pub use errors::{TransportError, TransportResult};
pub use events::{ConnectionUpdate, Credentials, DisconnectReason, TransportEvent};
pub use stub::{ScriptedSession, StubTransport};
