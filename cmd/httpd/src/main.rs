//! # httpool httpd - static file server with a pluggable scheduler
//!
//! Accepted connections are not handled inline: the accept loop peeks
//! each request to estimate its cost (size of the file that will be
//! served), packages the connection as a job, and submits it to a
//! bounded queue feeding a fixed pool of worker threads. The queue
//! policy - FIFO or shortest-job-first - is chosen at startup and can
//! be swapped at runtime through the pool API.
//!
//! ## Usage
//!
//!     httpd [port] [workers] [docroot] [--scheduler=fifo|sjf]
//!
//! Defaults: port 8080, 4 workers, docroot ./www, scheduler sjf.
//! The `SCHEDULER` environment variable selects the policy too; the
//! command line wins.
//!
//! ## Shutdown
//!
//! SIGINT/SIGTERM stop the accept loop and close the listening socket;
//! jobs already admitted are drained to completion before exit.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

use httpool_core::constants::{
    DEFAULT_DOCROOT, DEFAULT_PORT, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, LISTEN_BACKLOG,
    METRICS_INTERVAL_SECS,
};
use httpool_core::{herror, hinfo, hlog, hwarn, metrics, Conn, Job};
use httpool_http::{estimate_cost, handle_client, Listener};
use httpool_runtime::{Handler, PolicyKind, PoolConfig, WorkerPool};

// ── Shutdown signalling ──

static RUNNING: AtomicBool = AtomicBool::new(true);

extern "C" fn handle_shutdown_signal(_sig: libc::c_int) {
    RUNNING.store(false, Ordering::Relaxed);
}

/// SIGINT/SIGTERM flip the running flag; installed without SA_RESTART
/// so a blocking accept returns EINTR and the loop can observe the
/// flag. SIGPIPE is ignored (write errors surface through errno).
fn install_signal_handlers() {
    let shutdown = SigAction::new(
        SigHandler::Handler(handle_shutdown_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    unsafe {
        for sig in [Signal::SIGINT, Signal::SIGTERM] {
            if let Err(e) = signal::sigaction(sig, &shutdown) {
                herror!("failed to install {:?} handler: {}", sig, e);
            }
        }
        if let Err(e) = signal::sigaction(Signal::SIGPIPE, &ignore) {
            herror!("failed to ignore SIGPIPE: {}", e);
        }
    }
}

// ── Configuration ──

struct ServerConfig {
    port: u16,
    workers: usize,
    docroot: PathBuf,
    policy: PolicyKind,
}

fn parse_policy(name: &str) -> PolicyKind {
    PolicyKind::parse(name).unwrap_or_else(|| {
        hwarn!("unknown scheduler {:?}, falling back to sjf", name);
        PolicyKind::Sjf
    })
}

/// Two-phase configuration: environment first, command line wins.
fn load_config() -> ServerConfig {
    let mut port = DEFAULT_PORT;
    let mut workers = DEFAULT_WORKERS;
    let mut docroot = PathBuf::from(DEFAULT_DOCROOT);
    let mut policy = PolicyKind::Sjf;

    // Phase 1: environment
    if let Ok(name) = std::env::var("SCHEDULER") {
        policy = parse_policy(&name);
    }

    // Phase 2: positionals port/workers/docroot plus --scheduler=
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        if let Some(name) = arg.strip_prefix("--scheduler=") {
            policy = parse_policy(name);
        } else if arg.starts_with("--") {
            hwarn!("ignoring unknown option {:?}", arg);
        } else {
            positional.push(arg);
        }
    }

    if let Some(arg) = positional.first() {
        match arg.parse() {
            Ok(p) => port = p,
            Err(_) => hwarn!("invalid port {:?}, using {}", arg, port),
        }
    }
    if let Some(arg) = positional.get(1) {
        match arg.parse() {
            Ok(n) if n >= 1 => workers = n,
            _ => hwarn!("invalid worker count {:?}, using {}", arg, workers),
        }
    }
    if let Some(arg) = positional.get(2) {
        docroot = PathBuf::from(arg);
    }

    ServerConfig {
        port,
        workers,
        docroot,
        policy,
    }
}

// ── Main ──

fn main() {
    hlog::init();
    let cfg = load_config();
    install_signal_handlers();

    let listener = match Listener::bind(cfg.port, LISTEN_BACKLOG) {
        Ok(l) => l,
        Err(e) => {
            herror!("failed to bind port {}: {}", cfg.port, e);
            std::process::exit(1);
        }
    };
    let port = listener.local_port().unwrap_or(cfg.port);

    let printer = metrics::MetricsPrinter::start(Duration::from_secs(METRICS_INTERVAL_SECS));

    let handler: Handler = Arc::new(|conn: &mut Conn, docroot: &Path| {
        handle_client(conn, docroot);
    });
    let pool = WorkerPool::new(
        PoolConfig::new()
            .workers(cfg.workers)
            .queue_capacity(DEFAULT_QUEUE_CAPACITY)
            .docroot(cfg.docroot.clone())
            .policy(cfg.policy),
        handler,
    );

    hinfo!(
        "httpd: listening on http://0.0.0.0:{}/ workers={} queue={} scheduler={} docroot={}",
        port,
        pool.worker_count(),
        DEFAULT_QUEUE_CAPACITY,
        cfg.policy,
        cfg.docroot.display(),
    );

    // Accept loop: estimate before enqueue, then hand off to the pool.
    while RUNNING.load(Ordering::Relaxed) {
        let conn = match listener.accept() {
            Ok(conn) => conn,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                herror!("accept failed: {}", e);
                break;
            }
        };

        let est = estimate_cost(&conn, &cfg.docroot);
        if let Err(rejected) = pool.submit(Job::new(conn, est, 0)) {
            // Shutting down: dropping the job closes the endpoint.
            drop(rejected.into_job());
            break;
        }
    }

    hinfo!("httpd: shutting down");
    drop(listener); // refuse new connections before draining
    pool.shutdown();
    pool.join();
    printer.shutdown();

    let m = metrics::global();
    hinfo!(
        "httpd: served {} requests, {} bytes, {} errors, avg latency {:.2} ms",
        m.requests(),
        m.bytes(),
        m.errors(),
        m.avg_latency_ms(),
    );
}
