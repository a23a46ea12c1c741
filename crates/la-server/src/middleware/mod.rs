//! HTTP middleware: request ID and bearer-token authentication.

pub mod auth;
pub mod request_id;
