//! Middleware components for HTTP request processing.
//!
//! - `access_log`: captures request/response bodies and writes one line per
//!   request to the rotating log.
//! - `ip`: client address resolution shared by the access logger.

pub mod access_log;
pub mod ip;
