//! # waygate-core
//!
//! Shared foundations for the Waygate gateway:
//!
//! - [`types`]: chat/group identifiers, inbound message and group-update
//!   shapes, protocol version, connection state
//! - [`errors`]: the gateway error taxonomy (`InvalidInput`, `Unavailable`,
//!   `Upstream`, `Persistence`, `TerminalAuth`)
//! - [`retry`]: exponential backoff with cap and jitter for reconnect spacing
//!
//! This crate is deliberately free of async machinery so every other crate
//! can depend on it without pulling in a runtime.

#![deny(unsafe_code)]

pub mod errors;
pub mod retry;
pub mod types;

pub use errors::GatewayError;
pub use retry::RetryPolicy;
pub use types::{
    ConnectionState, GroupId, GroupUpdate, InboundMessage, MessageContent, ParticipantAction,
    ProtocolVersion,
};
