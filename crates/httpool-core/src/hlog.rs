//! Leveled stderr logging with worker context.
//!
//! Workers register their id in a thread-local; every leveled log line
//! then carries a `[w<id>]` tag automatically, so interleaved output
//! from the pool is attributable without passing ids around.
//!
//! # Environment Variables
//!
//! - `HTTPOOL_LOG_LEVEL=<level>` - 0=off, 1=error, 2=warn, 3=info,
//!   4=debug, 5=trace (names also accepted). Default: info.
//! - `HTTPOOL_FLUSH_EPRINT=1` - flush stderr after each line.
//! - `HTTPOOL_LOG_TIME=1` - prefix lines with milliseconds since start.
//!
//! # Output Format
//!
//! Without timestamp: `[LEVEL] [w<worker>] message`
//! With timestamp:    `[LEVEL] [<ms>] [w<worker>] message`
//!
//! # Usage
//!
//! ```ignore
//! use httpool_core::{hinfo, hwarn, herror};
//!
//! hinfo!("listening on port {}", port);
//! hwarn!("unknown scheduler {:?}, falling back to sjf", name);
//! herror!("accept failed: {}", err);
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Instant;

use crate::env::env_get_bool;

/// Log levels, ordered by verbosity.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static TIME_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize logging from environment variables.
///
/// Called automatically on first use; call explicitly from main for
/// deterministic startup.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    START_TIME.get_or_init(Instant::now);

    FLUSH_ENABLED.store(env_get_bool("HTTPOOL_FLUSH_EPRINT", false), Ordering::Relaxed);
    TIME_ENABLED.store(env_get_bool("HTTPOOL_LOG_TIME", false), Ordering::Relaxed);

    if let Ok(val) = std::env::var("HTTPOOL_LOG_LEVEL") {
        let level = match val.to_lowercase().as_str() {
            "off" | "0" => LogLevel::Off,
            "error" | "1" => LogLevel::Error,
            "warn" | "2" => LogLevel::Warn,
            "info" | "3" => LogLevel::Info,
            "debug" | "4" => LogLevel::Debug,
            "trace" | "5" => LogLevel::Trace,
            _ => LogLevel::Info,
        };
        LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    }
}

#[inline]
fn flush_enabled() -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    FLUSH_ENABLED.load(Ordering::Relaxed)
}

#[inline]
fn time_enabled() -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    TIME_ENABLED.load(Ordering::Relaxed)
}

/// Current log level.
#[inline]
pub fn log_level() -> LogLevel {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Set log level programmatically (overrides the environment).
pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Check if a level would produce output.
#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level as u8 <= log_level() as u8
}

/// Milliseconds since logging was initialized.
#[inline]
pub fn elapsed_ms() -> u64 {
    let start = START_TIME.get_or_init(Instant::now);
    start.elapsed().as_millis() as u64
}

thread_local! {
    static WORKER_ID: std::cell::Cell<Option<u32>> = const { std::cell::Cell::new(None) };
}

/// Tag this thread as worker `id` (called by the pool at worker start).
pub fn set_worker_id(id: u32) {
    WORKER_ID.with(|w| w.set(Some(id)));
}

/// Remove the worker tag (called at worker exit).
pub fn clear_worker_id() {
    WORKER_ID.with(|w| w.set(None));
}

/// Worker id of the current thread, if tagged.
#[inline]
pub fn get_worker_id() -> Option<u32> {
    WORKER_ID.with(|w| w.get())
}

/// Internal: leveled write with context. Use the macros instead.
#[doc(hidden)]
pub fn _hlog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }

    let stderr = std::io::stderr();
    let mut handle = stderr.lock();

    let _ = write!(handle, "{} ", level.prefix());

    if time_enabled() {
        let _ = write!(handle, "[{}] ", elapsed_ms());
    }

    match get_worker_id() {
        Some(id) => {
            let _ = write!(handle, "[w{}] ", id);
        }
        None => {
            let _ = handle.write_all(b"[w--] ");
        }
    }

    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");

    if flush_enabled() {
        let _ = handle.flush();
    }
}

/// Error level log with context.
#[macro_export]
macro_rules! herror {
    ($($arg:tt)*) => {{
        $crate::hlog::_hlog_impl(
            $crate::hlog::LogLevel::Error,
            format_args!($($arg)*)
        );
    }};
}

/// Warning level log with context.
#[macro_export]
macro_rules! hwarn {
    ($($arg:tt)*) => {{
        $crate::hlog::_hlog_impl(
            $crate::hlog::LogLevel::Warn,
            format_args!($($arg)*)
        );
    }};
}

/// Info level log with context.
#[macro_export]
macro_rules! hinfo {
    ($($arg:tt)*) => {{
        $crate::hlog::_hlog_impl(
            $crate::hlog::LogLevel::Info,
            format_args!($($arg)*)
        );
    }};
}

/// Debug level log with context.
#[macro_export]
macro_rules! hdebug {
    ($($arg:tt)*) => {{
        $crate::hlog::_hlog_impl(
            $crate::hlog::LogLevel::Debug,
            format_args!($($arg)*)
        );
    }};
}

/// Trace level log with context.
#[macro_export]
macro_rules! htrace {
    ($($arg:tt)*) => {{
        $crate::hlog::_hlog_impl(
            $crate::hlog::LogLevel::Trace,
            format_args!($($arg)*)
        );
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_level_from_u8() {
        assert_eq!(LogLevel::from_u8(0), LogLevel::Off);
        assert_eq!(LogLevel::from_u8(1), LogLevel::Error);
        assert_eq!(LogLevel::from_u8(3), LogLevel::Info);
        assert_eq!(LogLevel::from_u8(99), LogLevel::Trace);
    }

    #[test]
    fn test_worker_context() {
        assert_eq!(get_worker_id(), None);
        set_worker_id(3);
        assert_eq!(get_worker_id(), Some(3));
        clear_worker_id();
        assert_eq!(get_worker_id(), None);
    }

    #[test]
    fn test_macros_compile() {
        set_log_level(LogLevel::Off);
        herror!("error {}", "msg");
        hwarn!("warn");
        hinfo!("info {}", 42);
        hdebug!("debug");
        htrace!("trace");
    }
}
