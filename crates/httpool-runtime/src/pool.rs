//! Worker pool: bounded producer/consumer queue with a swappable
//! policy.
//!
//! One mutex serializes queue mutation and shutdown observation; two
//! condition variables (`not_empty` for workers, `not_full` for
//! submitters) provide the blocking, always in while-loops so spurious
//! wakeups are harmless. Handlers run with the mutex released.
//!
//! Shutdown drains: admission is the observable contract to clients,
//! so jobs resident at shutdown are still handled before workers exit.

use std::path::Path;
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use httpool_core::{hdebug, herror, hlog, metrics, Conn, Job, PoolError};

use crate::config::PoolConfig;
use crate::policy::SchedPolicy;

/// The per-job work function. Receives the client endpoint and the
/// pool's document root; must not close the endpoint (the worker drops
/// it after the call returns).
pub type Handler = Arc<dyn Fn(&mut Conn, &Path) + Send + Sync>;

/// Advisory observation points. Implementations must not block or
/// fail; the pool calls them outside its mutex.
pub trait PoolHooks: Send + Sync {
    fn on_submit(&self, _est: u64) {}
    fn on_pop(&self, _est: u64) {}
}

/// Default hooks: forward to the process-wide metrics counters.
pub struct MetricsHooks;

impl PoolHooks for MetricsHooks {
    fn on_submit(&self, est: u64) {
        metrics::global().on_submit(est);
    }

    fn on_pop(&self, est: u64) {
        metrics::global().on_pop(est);
    }
}

/// Submit observed shutdown. The job (and its endpoint) is handed back
/// to the caller, which must dispose of it.
#[derive(Debug)]
pub struct SubmitError(pub Job);

impl SubmitError {
    pub fn into_job(self) -> Job {
        self.0
    }

    pub fn kind(&self) -> PoolError {
        PoolError::ShuttingDown
    }
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", PoolError::ShuttingDown)
    }
}

impl std::error::Error for SubmitError {}

/// The replacement policy cannot hold the currently resident jobs; no
/// substitution was performed. The rejected policy is handed back.
pub struct SwapError {
    pub policy: Box<dyn SchedPolicy>,
    pub resident: usize,
}

impl SwapError {
    pub fn kind(&self) -> PoolError {
        PoolError::CapacityTooSmall
    }
}

impl std::fmt::Debug for SwapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapError")
            .field("policy", &self.policy.name())
            .field("capacity", &self.policy.capacity())
            .field("resident", &self.resident)
            .finish()
    }
}

impl std::fmt::Display for SwapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "replacement scheduler (capacity {}) cannot hold {} resident jobs",
            self.policy.capacity(),
            self.resident
        )
    }
}

impl std::error::Error for SwapError {}

/// Queue state guarded by the pool mutex.
struct PoolState {
    policy: Box<dyn SchedPolicy>,
    shutdown: bool,
}

/// State shared between the pool handle and its workers.
struct PoolShared {
    state: Mutex<PoolState>,
    not_empty: Condvar,
    not_full: Condvar,
    docroot: PathBuf,
    handler: Handler,
    hooks: Arc<dyn PoolHooks>,
}

/// Fixed pool of worker threads fed from one policy-governed bounded
/// queue.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    handles: Vec<JoinHandle<()>>,
    next_worker_id: u32,
}

impl WorkerPool {
    /// Create a pool per `config` with the default metrics hooks.
    ///
    /// Worker spawn is best-effort: a failed spawn is logged and the
    /// pool continues with the threads that started.
    pub fn new(config: PoolConfig, handler: Handler) -> Self {
        Self::with_hooks(config, handler, Arc::new(MetricsHooks))
    }

    /// Create a pool with caller-provided observation hooks.
    pub fn with_hooks(config: PoolConfig, handler: Handler, hooks: Arc<dyn PoolHooks>) -> Self {
        config.validate().expect("invalid pool configuration");

        let policy = config.policy.create(config.queue_capacity);
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                policy,
                shutdown: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            docroot: config.docroot,
            handler,
            hooks,
        });

        let mut pool = Self {
            shared,
            handles: Vec::with_capacity(config.workers),
            next_worker_id: 0,
        };
        for _ in 0..config.workers {
            if let Err(e) = pool.spawn_worker() {
                herror!(
                    "worker spawn failed ({}); continuing with {} workers",
                    e,
                    pool.handles.len()
                );
            }
        }
        pool
    }

    /// Spawn one additional worker thread.
    pub fn spawn_worker(&mut self) -> Result<(), PoolError> {
        let id = self.next_worker_id;
        let shared = self.shared.clone();
        let handle = thread::Builder::new()
            .name(format!("httpool-worker-{}", id))
            .spawn(move || worker_main(id, shared))
            .map_err(|_| PoolError::ResourceExhausted)?;
        self.handles.push(handle);
        self.next_worker_id += 1;
        Ok(())
    }

    /// Number of running workers.
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// The pool-owned document root.
    pub fn docroot(&self) -> &Path {
        &self.shared.docroot
    }

    /// Jobs currently resident in the queue (diagnostics).
    pub fn queued(&self) -> usize {
        self.shared.state.lock().unwrap().policy.len()
    }

    /// Submit a job. Blocks while the queue is full; on success the
    /// pool owns the job's endpoint. Fails only when shutdown is
    /// observed, handing the job back.
    pub fn submit(&self, mut job: Job) -> Result<(), SubmitError> {
        let est = job.est_cost;
        let mut st = self.shared.state.lock().unwrap();
        loop {
            if st.shutdown {
                drop(st);
                return Err(SubmitError(job));
            }
            match st.policy.push(job) {
                Ok(()) => {
                    self.shared.not_empty.notify_one();
                    drop(st);
                    self.shared.hooks.on_submit(est);
                    return Ok(());
                }
                Err(back) => {
                    // Full: wait for a worker to make space, then
                    // re-check shutdown before retrying.
                    job = back;
                    st = self.shared.not_full.wait(st).unwrap();
                }
            }
        }
    }

    /// Replace the scheduling policy at runtime.
    ///
    /// Resident jobs are drained into the replacement, which must be
    /// able to hold all of them; otherwise the swap is rejected
    /// atomically and the replacement handed back. Workers are
    /// re-woken because relative order may have changed, submitters
    /// because capacity may have grown.
    pub fn set_policy(&self, mut new: Box<dyn SchedPolicy>) -> Result<(), SwapError> {
        let mut st = self.shared.state.lock().unwrap();
        let resident = st.policy.len();
        if new.capacity() < resident {
            drop(st);
            return Err(SwapError {
                policy: new,
                resident,
            });
        }

        let name = new.name();
        while let Some(job) = st.policy.pop() {
            if new.push(job).is_err() {
                unreachable!("replacement capacity was checked under the same lock");
            }
        }
        let old = std::mem::replace(&mut st.policy, new);
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();
        drop(st);

        hdebug!("scheduler swapped to {} ({} jobs carried over)", name, resident);
        drop(old);
        Ok(())
    }

    /// Begin shutdown: no further submits succeed, workers drain the
    /// queue and exit. Does not wait; call `join` to block until all
    /// workers have exited.
    pub fn shutdown(&self) {
        let mut st = self.shared.state.lock().unwrap();
        st.shutdown = true;
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();
    }

    /// Wait for all workers to finish draining and exit.
    pub fn join(mut self) {
        self.join_workers();
    }

    fn join_workers(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.shutdown();
            self.join_workers();
        }
    }
}

/// Worker loop: pop under the mutex, handle with it released.
fn worker_main(id: u32, shared: Arc<PoolShared>) {
    hlog::set_worker_id(id);
    hdebug!("worker started");

    let mut st = shared.state.lock().unwrap();
    loop {
        if let Some(job) = st.policy.pop() {
            // Space opened up: unblock one submitter before handling.
            shared.not_full.notify_one();
            drop(st);

            shared.hooks.on_pop(job.est_cost);
            let Job { mut conn, .. } = job;
            (shared.handler)(&mut conn, &shared.docroot);
            drop(conn);

            st = shared.state.lock().unwrap();
            continue;
        }

        if st.shutdown {
            // Queue drained and shutdown requested.
            break;
        }
        st = shared.not_empty.wait(st).unwrap();
    }
    drop(st);

    hdebug!("worker exiting");
    hlog::clear_worker_id();
}
