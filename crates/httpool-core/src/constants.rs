//! Build-time defaults shared across the workspace.

/// Default TCP port for the server binary.
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 4;

/// Bound of the scheduling queue. Build-time constant; admission past
/// this point blocks the submitter.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default document root served by the handler.
pub const DEFAULT_DOCROOT: &str = "./www";

/// Backlog passed to listen(2).
pub const LISTEN_BACKLOG: i32 = 128;

/// How many bytes the acceptor peeks to estimate a job's cost.
pub const PEEK_BUF_SIZE: usize = 4096;

/// Request read buffer used by the handler.
pub const REQ_BUF_SIZE: usize = 8192;

/// How long the acceptor waits for request bytes when peeking, in
/// milliseconds. A silent client must not stall the accept loop; on
/// timeout the estimate is simply 0.
pub const ESTIMATE_PEEK_TIMEOUT_MS: u64 = 250;

/// Upper bound on request/response cycles per connection.
pub const MAX_KEEPALIVE_REQUESTS: usize = 32;

/// Idle read timeout between keep-alive requests, in milliseconds.
pub const KEEPALIVE_IDLE_TIMEOUT_MS: u64 = 5_000;

/// Reporting interval of the metrics printer thread, in seconds.
pub const METRICS_INTERVAL_SECS: u64 = 5;
