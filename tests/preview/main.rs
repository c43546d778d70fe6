//! Preview session integration tests.
//!
//! Stub collaborators stand in for the content API, the schema endpoint and
//! the materializer; the `http` suite runs the stock stack against an axum
//! server.

mod support;
mod config;

#[cfg(feature = "http")]
mod http;
