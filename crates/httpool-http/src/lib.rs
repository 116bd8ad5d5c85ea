//! # httpool-http - serving side of the httpool server
//!
//! Everything the scheduling core treats as an external collaborator:
//!
//! - [`Listener`] - listening-socket factory (IPv4, `SO_REUSEADDR`,
//!   all interfaces).
//! - [`handle_client`] - the per-connection handler: parses requests,
//!   serves static files under a document root, bounded keep-alive.
//!   Never closes the endpoint; that is the worker's job.
//! - [`estimate_cost`] - the admission-side estimator: peeks the
//!   request without consuming it and sizes the target file.
//!
//! The handler and the estimator share one request parser and one path
//! resolver, so the estimate agrees with what will actually be served.

pub mod estimate;
pub mod handler;
pub mod net;
pub mod request;

pub use estimate::estimate_cost;
pub use handler::handle_client;
pub use net::Listener;
