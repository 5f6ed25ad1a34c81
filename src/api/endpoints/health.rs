//! Health check endpoint.

use serde::Serialize;

use crate::api::types::{ok, ApiResult};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// `GET /api/health`: liveness check. Touches no upstream.
pub async fn check() -> ApiResult<HealthResponse> {
    ok(HealthResponse {
        status: "ok",
        service: crate::config::APP_NAME,
        version: crate::config::APP_VERSION,
    })
}
