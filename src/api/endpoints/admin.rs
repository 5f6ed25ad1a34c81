//! Admin review queue.

use axum::extract::State;
use serde::Serialize;

use crate::api::types::{ok, ApiContext, ApiResult, Principal};
use crate::db::repository;
use crate::models::{Doctor, HealthCenter, Role};

#[derive(Serialize)]
pub struct PendingApprovals {
    pub doctors: Vec<Doctor>,
    pub centers: Vec<HealthCenter>,
}

/// `GET /api/admin/pending`: profiles awaiting approval, oldest first.
pub async fn pending(
    State(ctx): State<ApiContext>,
    principal: Principal,
) -> ApiResult<PendingApprovals> {
    principal.require(&[Role::Admin])?;

    let store = ctx.service_store.as_ref();
    let (doctors, centers) = tokio::try_join!(
        repository::list_pending_doctors(store),
        repository::list_pending_centers(store),
    )?;
    ok(PendingApprovals { doctors, centers })
}
