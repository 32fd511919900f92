//! # waygate-server
//!
//! Axum HTTP surface for the gateway.
//!
//! - `GET /code?number=…` — pairing-code issuance over the lifecycle core
//! - `GET /` — landing page (`main.html` from the static dir)
//! - `GET /health` — liveness + connection state
//! - everything else — static assets via `ServeDir`
//! - graceful shutdown via `CancellationToken`
//!
//! The server holds no business logic: `/code` is a thin adapter over
//! [`waygate_runtime::GatewayService`], and error classification maps
//! one-to-one onto status codes and the fixed response bodies.

#![deny(unsafe_code)]

pub mod config;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use server::{AppState, router, serve};
pub use shutdown::Shutdown;
