//! Pool configuration.

use std::path::PathBuf;

use httpool_core::constants::{DEFAULT_DOCROOT, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};

use crate::policy::PolicyKind;

/// Configuration for the worker pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads spawned at create. May be 0: jobs
    /// then queue until `spawn_worker` is called.
    pub workers: usize,

    /// Bound of the scheduling queue.
    pub queue_capacity: usize,

    /// Document root handed to every handler invocation. Immutable
    /// after create.
    pub docroot: PathBuf,

    /// Initial scheduling policy.
    pub policy: PolicyKind,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            docroot: PathBuf::from(DEFAULT_DOCROOT),
            policy: PolicyKind::Fifo,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    /// Set the scheduling queue bound.
    pub fn queue_capacity(mut self, n: usize) -> Self {
        self.queue_capacity = n;
        self
    }

    /// Set the document root.
    pub fn docroot(mut self, path: impl Into<PathBuf>) -> Self {
        self.docroot = path.into();
        self
    }

    /// Set the initial scheduling policy.
    pub fn policy(mut self, kind: PolicyKind) -> Self {
        self.policy = kind;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be at least 1");
        }
        if self.docroot.as_os_str().is_empty() {
            return Err("docroot must not be empty");
        }
        Ok(())
    }
}
