//! Queue policies for the worker pool.
//!
//! A policy is a value-semantics container of pending jobs with two
//! operations: push (fails when full, handing the job back) and pop
//! (`None` when empty). The pool holds its mutex around every call;
//! policies therefore never block, never allocate after construction,
//! and never call back into the pool.
//!
//! # Implementations
//! - [`FifoQueue`] - bounded ring buffer, O(1) per op
//! - [`SjfQueue`] - bounded min-heap on (est_cost, arrival_ms),
//!   O(log n) per op

mod fifo;
mod sjf;

pub use fifo::FifoQueue;
pub use sjf::SjfQueue;

use httpool_core::Job;

/// The scheduling seam. The pool owns exactly one policy instance
/// behind `Box<dyn SchedPolicy>` and swaps it at runtime without
/// losing resident jobs.
pub trait SchedPolicy: Send {
    /// Accept a job, or hand it back when the queue is at capacity.
    fn push(&mut self, job: Job) -> Result<(), Job>;

    /// Remove the next job according to this policy's order.
    fn pop(&mut self) -> Option<Job>;

    /// Jobs currently resident.
    fn len(&self) -> usize;

    /// Maximum number of resident jobs.
    fn capacity(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short policy name for logs and diagnostics.
    fn name(&self) -> &'static str;
}

/// Selectable policy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Fifo,
    Sjf,
}

impl PolicyKind {
    /// Parse a policy name as given on the CLI or in `SCHEDULER`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fifo" => Some(PolicyKind::Fifo),
            "sjf" => Some(PolicyKind::Sjf),
            _ => None,
        }
    }

    /// Build a boxed policy instance of this kind.
    pub fn create(self, capacity: usize) -> Box<dyn SchedPolicy> {
        match self {
            PolicyKind::Fifo => Box::new(FifoQueue::new(capacity)),
            PolicyKind::Sjf => Box::new(SjfQueue::new(capacity)),
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyKind::Fifo => write!(f, "fifo"),
            PolicyKind::Sjf => write!(f, "sjf"),
        }
    }
}
