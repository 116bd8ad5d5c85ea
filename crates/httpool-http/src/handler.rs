//! Per-connection static file handler.
//!
//! Drives the full request/response exchange on one connection and
//! returns when it is complete or unrecoverable. Never closes the
//! endpoint; the worker owns that. Connection reuse is internal and
//! bounded (request count and idle timeout) and invisible to the pool.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Duration;

use httpool_core::constants::{KEEPALIVE_IDLE_TIMEOUT_MS, MAX_KEEPALIVE_REQUESTS, REQ_BUF_SIZE};
use httpool_core::{metrics, now_ms, Conn};

use crate::request;

/// Handle one client connection: up to `MAX_KEEPALIVE_REQUESTS`
/// request/response cycles, stopping early on close, error, idle
/// timeout, or a request that asked for close.
pub fn handle_client(conn: &mut Conn, docroot: &Path) {
    if conn
        .set_read_timeout(Some(Duration::from_millis(KEEPALIVE_IDLE_TIMEOUT_MS)))
        .is_err()
    {
        return;
    }
    for _ in 0..MAX_KEEPALIVE_REQUESTS {
        match serve_one(conn, docroot) {
            Ok(true) => continue,
            Ok(false) | Err(_) => break,
        }
    }
}

/// One request/response cycle. `Ok(true)` means the connection may
/// carry another request.
fn serve_one(conn: &mut Conn, docroot: &Path) -> io::Result<bool> {
    let mut buf = [0u8; REQ_BUF_SIZE];
    let n = match conn.read(&mut buf) {
        Ok(0) => return Ok(false), // client closed
        Ok(n) => n,
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
            return Ok(false); // idle timeout between requests
        }
        Err(e) => return Err(e),
    };
    let start = now_ms();
    let head = &buf[..n];

    let req = match request::parse_request_line(head) {
        Some(req) => req,
        None => return finish_error(conn, start, "400 Bad Request", 400),
    };
    if !request::is_safe_method(req.method) {
        return finish_error(conn, start, "405 Method Not Allowed", 405);
    }
    if !request::path_is_clean(req.path) {
        return finish_error(conn, start, "403 Forbidden", 403);
    }

    let mut target = request::resolve_target(docroot, req.path);
    let mut md = match fs::metadata(&target) {
        Ok(md) => md,
        Err(_) => return finish_error(conn, start, "404 Not Found", 404),
    };
    if md.is_dir() {
        // Serve the directory's index, or refuse.
        target.push("index.html");
        md = match fs::metadata(&target) {
            Ok(md) => md,
            Err(_) => return finish_error(conn, start, "403 Forbidden", 403),
        };
    }

    let file = match File::open(&target) {
        Ok(f) => f,
        Err(_) => return finish_error(conn, start, "500 Internal Server Error", 500),
    };

    let size = md.len();
    let head_text = String::from_utf8_lossy(head);
    let keep = request::keep_alive(&req, &head_text);

    let hdr = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: {}\r\nConnection: {}\r\n\r\n",
        size,
        content_type(&target),
        if keep { "keep-alive" } else { "close" },
    );
    conn.write_all(hdr.as_bytes())?;

    let mut sent = hdr.len() as u64;
    if req.method != "HEAD" {
        sent += conn.send_file(&file, size)?;
    }
    record(start, sent, 200);
    Ok(keep)
}

/// Send a bodyless error response and end the connection.
fn finish_error(conn: &mut Conn, start: u64, status_line: &str, status: u16) -> io::Result<bool> {
    let resp = format!(
        "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        status_line
    );
    conn.write_all(resp.as_bytes())?;
    record(start, resp.len() as u64, status);
    Ok(false)
}

fn record(start_ms: u64, bytes: u64, status: u16) {
    metrics::global().record_request(now_ms().saturating_sub(start_ms), bytes, status);
}

/// Content type from the file extension.
fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
