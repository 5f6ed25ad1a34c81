//! Access logging middleware.
//!
//! Logs every API request with method, path, caller and response status.
//! Runs innermost (after auth has injected `Principal`).

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::Principal;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let caller = req
        .extensions()
        .get::<Principal>()
        .map(|p| format!("{}:{}", p.role, p.user_id))
        .unwrap_or_else(|| "anonymous".to_string());
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if status >= 500 {
        tracing::warn!(%method, %path, %caller, status, elapsed_ms, "api access");
    } else {
        tracing::info!(%method, %path, %caller, status, elapsed_ms, "api access");
    }

    response
}
