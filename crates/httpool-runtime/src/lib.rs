//! # httpool-runtime - the job-scheduling core
//!
//! Accepted connections arrive here as [`Job`]s, wait in a bounded
//! policy-governed queue, and are dispatched to a fixed pool of worker
//! threads.
//!
//! - [`SchedPolicy`] - the queue seam. Two implementations ship:
//!   [`FifoQueue`] (bounded ring buffer) and [`SjfQueue`] (bounded
//!   min-heap on estimated cost, arrival-time tie-break). Policies are
//!   strictly non-blocking; the pool provides all blocking.
//! - [`WorkerPool`] - one mutex, two condition variables, graceful
//!   draining shutdown, runtime policy hot-swap.
//! - [`PoolConfig`] - builder-style configuration with validation.
//!
//! [`Job`]: httpool_core::Job

pub mod config;
pub mod policy;
pub mod pool;

pub use config::PoolConfig;
pub use policy::{FifoQueue, PolicyKind, SchedPolicy, SjfQueue};
pub use pool::{Handler, MetricsHooks, PoolHooks, SubmitError, SwapError, WorkerPool};
