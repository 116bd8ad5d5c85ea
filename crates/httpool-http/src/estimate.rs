//! Admission-side cost estimation.
//!
//! The acceptor peeks the request (`MSG_PEEK`, non-consuming, so the
//! handler still reads it in full) and sizes the file it will serve.
//! The estimate is advisory: any failure yields 0, which the SJF
//! policy handles via its arrival-time tie-break.

use std::fs;
use std::path::Path;
use std::time::Duration;

use httpool_core::constants::{ESTIMATE_PEEK_TIMEOUT_MS, PEEK_BUF_SIZE};
use httpool_core::Conn;

use crate::request;

/// Estimated cost of serving `conn`'s pending request: the size in
/// bytes of the file that will be served, or 0 when unknown.
///
/// Resolution mirrors the handler exactly (root maps to `index.html`,
/// a directory to its index, `..` rejects), so a nonzero estimate is
/// the size of the body the handler will actually send.
pub fn estimate_cost(conn: &Conn, docroot: &Path) -> u64 {
    // Bound the wait: a client that has not sent anything yet must not
    // stall the accept loop.
    if conn
        .set_read_timeout(Some(Duration::from_millis(ESTIMATE_PEEK_TIMEOUT_MS)))
        .is_err()
    {
        return 0;
    }
    let mut buf = [0u8; PEEK_BUF_SIZE];
    let n = match conn.peek(&mut buf) {
        Ok(n) if n > 0 => n,
        _ => {
            let _ = conn.set_read_timeout(None);
            return 0;
        }
    };
    let _ = conn.set_read_timeout(None);

    let req = match request::parse_request_line(&buf[..n]) {
        Some(req) => req,
        None => return 0,
    };
    if !request::is_safe_method(req.method) || !request::path_is_clean(req.path) {
        return 0;
    }

    let mut target = request::resolve_target(docroot, req.path);
    match fs::metadata(&target) {
        Ok(md) if md.is_dir() => {
            target.push("index.html");
            fs::metadata(&target).map(|md| md.len()).unwrap_or(0)
        }
        Ok(md) => md.len(),
        Err(_) => 0,
    }
}
