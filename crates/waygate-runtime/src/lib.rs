//! # waygate-runtime
//!
//! The gateway's engine:
//!
//! - [`supervisor`]: owns the single transport session, classifies
//!   disconnects, reconnects with backoff, persists credential rotations,
//!   and serves pairing requests
//! - [`dispatch`]: converts transport event batches into ordered,
//!   failure-isolated handler invocations
//! - [`flush`]: the dirty-set tracker and the timed, non-overlapping flush
//!   of ranking state
//!
//! One supervisor run loop exists per process; restarts are serialized by
//! construction because only that loop ever calls `connect`.

#![deny(unsafe_code)]

pub mod dispatch;
pub mod flush;
pub mod supervisor;

pub use dispatch::{ActivityHandler, Dispatcher, GroupUpdateHandler, MessageHandler};
pub use flush::{DirtyTracker, FlushOutcome, Flusher, spawn_flush_task};
pub use supervisor::{ConnectionSupervisor, GatewayService, StopReason};
