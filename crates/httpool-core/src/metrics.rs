//! Advisory metrics: atomic counters plus a background printer.
//!
//! Hooks are side-effect-only and infallible; each is one relaxed
//! `fetch_add`, safe to call from any thread, under or outside any
//! lock. The printer thread reports deltas every few seconds and is
//! joined on shutdown.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::hinfo;

/// Counter set for the whole process.
pub struct Metrics {
    submits_total: AtomicU64,
    submits_est0: AtomicU64,
    pops_total: AtomicU64,
    requests_total: AtomicU64,
    bytes_total: AtomicU64,
    errors_total: AtomicU64,
    sum_latency_ms: AtomicU64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            submits_total: AtomicU64::new(0),
            submits_est0: AtomicU64::new(0),
            pops_total: AtomicU64::new(0),
            requests_total: AtomicU64::new(0),
            bytes_total: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
            sum_latency_ms: AtomicU64::new(0),
        }
    }

    /// A job was submitted with estimate `est` (0 = unknown).
    #[inline]
    pub fn on_submit(&self, est: u64) {
        self.submits_total.fetch_add(1, Ordering::Relaxed);
        if est == 0 {
            self.submits_est0.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A worker popped a job.
    #[inline]
    pub fn on_pop(&self, _est: u64) {
        self.pops_total.fetch_add(1, Ordering::Relaxed);
    }

    /// One request/response cycle completed.
    #[inline]
    pub fn record_request(&self, latency_ms: u64, bytes: u64, status: u16) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.bytes_total.fetch_add(bytes, Ordering::Relaxed);
        self.sum_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        if !(200..400).contains(&status) {
            self.errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn submits(&self) -> u64 {
        self.submits_total.load(Ordering::Relaxed)
    }

    pub fn submits_est0(&self) -> u64 {
        self.submits_est0.load(Ordering::Relaxed)
    }

    pub fn pops(&self) -> u64 {
        self.pops_total.load(Ordering::Relaxed)
    }

    pub fn requests(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes_total.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors_total.load(Ordering::Relaxed)
    }

    /// Average handling latency over all recorded requests.
    pub fn avg_latency_ms(&self) -> f64 {
        let reqs = self.requests();
        if reqs == 0 {
            return 0.0;
        }
        self.sum_latency_ms.load(Ordering::Relaxed) as f64 / reqs as f64
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: Metrics = Metrics::new();

/// Process-wide counter set.
#[inline]
pub fn global() -> &'static Metrics {
    &GLOBAL
}

/// Background thread printing rate/latency summaries.
pub struct MetricsPrinter {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl MetricsPrinter {
    /// Spawn the printer reporting every `interval`. Returns a handle
    /// whose `shutdown` joins the thread.
    pub fn start(interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::Builder::new()
            .name("httpool-metrics".into())
            .spawn(move || printer_loop(&flag, interval))
            .ok();
        if handle.is_none() {
            crate::herror!("failed to spawn metrics printer thread");
        }

        Self { handle, running }
    }

    /// Stop and join the printer.
    pub fn shutdown(mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn printer_loop(running: &AtomicBool, interval: Duration) {
    let m = global();
    let mut prev_reqs: u64 = 0;
    let mut prev_bytes: u64 = 0;
    let tick = Duration::from_millis(100);

    'outer: loop {
        // Sleep in short ticks so shutdown joins promptly.
        let mut slept = Duration::ZERO;
        while slept < interval {
            if !running.load(Ordering::Acquire) {
                break 'outer;
            }
            thread::sleep(tick);
            slept += tick;
        }

        let reqs = m.requests();
        let bytes = m.bytes();
        let secs = interval.as_secs_f64();
        let reqs_per_s = (reqs - prev_reqs) as f64 / secs;
        let mb_per_s = ((bytes - prev_bytes) as f64 / (1024.0 * 1024.0)) / secs;
        let subs = m.submits();
        let est0_frac = if subs > 0 {
            m.submits_est0() as f64 / subs as f64 * 100.0
        } else {
            0.0
        };

        hinfo!(
            "[metrics] reqs_total={} req/s={:.2} MB/s={:.2} avgLat={:.2}ms errors={} submits={} est0%={:.1} pops={}",
            reqs,
            reqs_per_s,
            mb_per_s,
            m.avg_latency_ms(),
            m.errors(),
            subs,
            est0_frac,
            m.pops(),
        );

        prev_reqs = reqs;
        prev_bytes = bytes;
    }
}
