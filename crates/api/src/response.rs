//! Shared response envelope for API handlers.
//!
//! Successful responses are wrapped as `{ "result": ... }`; failures are an
//! HTTP status plus `{ "error", "code" }` (see [`crate::error::AppError`]).

use serde::Serialize;

/// Standard `{ "result": T }` response envelope.
///
/// ```ignore
/// Ok(Json(ResultResponse { result: page }))
/// ```
#[derive(Debug, Serialize)]
pub struct ResultResponse<T: Serialize> {
    pub result: T,
}

impl<T: Serialize> ResultResponse<T> {
    pub fn new(result: T) -> Self {
        Self { result }
    }
}
