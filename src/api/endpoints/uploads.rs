//! Direct-upload configuration for the asset host.

use axum::extract::State;

use crate::api::types::{ok, ApiContext, ApiResult};
use crate::config::UploadConfig;

/// `GET /api/uploads/config`: where clients upload documents before
/// attaching the resulting URL to an appointment.
pub async fn config(State(ctx): State<ApiContext>) -> ApiResult<UploadConfig> {
    ok(ctx.uploads.as_ref().clone())
}
