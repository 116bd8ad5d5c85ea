//! Request-line parsing and path resolution.
//!
//! Shared by the handler and the acceptor-side estimator: both must
//! agree on how a request path maps to the filesystem, or the estimate
//! would diverge from what gets served.

use std::path::{Path, PathBuf};

/// Parsed start line: `METHOD SP PATH SP VERSION?`. Headers are left
/// in the buffer; this server never needs more than the start line
/// plus a `Connection` scan.
#[derive(Debug, PartialEq, Eq)]
pub struct RequestLine<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub version: Option<&'a str>,
}

/// Parse the first line of `buf`. Returns `None` on malformed input
/// (no method/path, or bytes that are not valid UTF-8).
pub fn parse_request_line(buf: &[u8]) -> Option<RequestLine<'_>> {
    let end = buf.iter().position(|&b| b == b'\n').unwrap_or(buf.len());
    let line = std::str::from_utf8(&buf[..end]).ok()?.trim_end_matches('\r');

    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let path = parts.next()?;
    let version = parts.next();
    Some(RequestLine {
        method,
        path,
        version,
    })
}

/// Methods the server will serve (and the estimator will size).
pub fn is_safe_method(method: &str) -> bool {
    method == "GET" || method == "HEAD"
}

/// Minimal traversal protection: reject any path containing `..`.
pub fn path_is_clean(path: &str) -> bool {
    !path.contains("..")
}

/// Map a request path to a filesystem path under `docroot`. Root maps
/// to `index.html`. Callers check `path_is_clean` first.
pub fn resolve_target(docroot: &Path, path: &str) -> PathBuf {
    if path.is_empty() || path == "/" {
        return docroot.join("index.html");
    }
    docroot.join(path.trim_start_matches('/'))
}

/// Case-insensitive header lookup over the raw request head.
fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    for line in head.lines().skip(1) {
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case(name) {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Whether the connection may carry another request after this one.
/// HTTP/1.1 defaults to keep-alive, HTTP/1.0 to close; an explicit
/// `Connection` header wins either way.
pub fn keep_alive(req: &RequestLine<'_>, head: &str) -> bool {
    match header_value(head, "connection") {
        Some(v) if v.eq_ignore_ascii_case("close") => false,
        Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
        _ => !matches!(req.version, Some("HTTP/1.0")),
    }
}
