//! # httpool-core - shared types for the httpool server
//!
//! Leaf crate of the workspace. Holds everything the scheduling
//! runtime and the HTTP layer both need:
//!
//! - [`Conn`] - an exclusively owned TCP endpoint. Closing is `Drop`;
//!   double-close and fd leaks are unrepresentable.
//! - [`Job`] - a unit of work: one connection plus scheduling metadata
//!   (estimated cost, priority, arrival timestamp).
//! - [`PoolError`] / [`PoolResult`] - error vocabulary of the pool.
//! - `hlog` - leveled stderr logging with worker context, configured
//!   from `HTTPOOL_*` environment variables.
//! - `metrics` - advisory atomic counters plus a background printer.
//!
//! No scheduling logic lives here; policies and the worker pool are in
//! `httpool-runtime`.

pub mod conn;
pub mod constants;
pub mod env;
pub mod error;
pub mod hlog;
pub mod job;
pub mod metrics;

pub use conn::Conn;
pub use error::{PoolError, PoolResult};
pub use job::{now_ms, Job};
