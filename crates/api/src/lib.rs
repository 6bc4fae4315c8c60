//! Atrium governance API server library.
//!
//! The HTTP facade over the governance engine: configuration, shared
//! state, error mapping, JWT claim extraction, RBAC extractors, handlers,
//! routes, and the background permission-expiry sweep. Exposed as a
//! library so integration tests and the binary entrypoint share the same
//! building blocks.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
