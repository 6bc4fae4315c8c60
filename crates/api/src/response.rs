//! Shared response envelope for API handlers.
//!
//! Every successful response wraps its payload in `{ "data": ... }`;
//! using [`DataResponse`] rather than ad-hoc `json!` keeps the envelope
//! type-checked and uniform.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
