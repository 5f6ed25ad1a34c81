//! Doctor directory and profile endpoints.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ok, parse_id, required, ApiContext, ApiResult, Payload, Principal};
use crate::db::repository;
use crate::models::{Doctor, DoctorProfile, Role};

#[derive(Deserialize)]
pub struct DirectoryQuery {
    pub specialization: Option<String>,
}

/// `GET /api/doctors`: approved doctors, optionally by specialization.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<DirectoryQuery>,
) -> ApiResult<Vec<Doctor>> {
    let specialization = query
        .specialization
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let doctors =
        repository::list_approved_doctors(ctx.public_store.as_ref(), specialization).await?;
    ok(doctors)
}

/// `GET /api/doctors/:id`
///
/// Unapproved profiles are visible only to admins and the doctor themself;
/// everyone else gets a 404.
pub async fn detail(
    State(ctx): State<ApiContext>,
    principal: Option<Principal>,
    Path(id): Path<String>,
) -> ApiResult<Doctor> {
    let id = parse_id(&id)?;
    let not_found = || ApiError::NotFound("Doctor not found".into());

    let doctor = repository::find_doctor(ctx.service_store.as_ref(), id)
        .await?
        .ok_or_else(not_found)?;
    let privileged = principal
        .as_ref()
        .is_some_and(|p| p.is_admin() || p.user_id == doctor.id);
    if !doctor.approved && !privileged {
        return Err(not_found());
    }
    ok(doctor)
}

#[derive(Deserialize)]
pub struct DoctorProfileRequest {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub account_number: Option<String>,
    pub center_id: Option<String>,
}

/// `POST /api/doctors`: doctor creates or edits their own profile.
pub async fn upsert_profile(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Payload(body): Payload<DoctorProfileRequest>,
) -> ApiResult<Doctor> {
    principal.require(&[Role::Doctor])?;

    let center_id = match body.center_id.filter(|c| !c.trim().is_empty()) {
        Some(raw) => Some(parse_id(raw.trim())?),
        None => None,
    };
    let profile = DoctorProfile {
        id: principal.user_id,
        name: required("name", body.name)?,
        specialization: required("specialization", body.specialization)?,
        account_number: body.account_number.filter(|a| !a.trim().is_empty()),
        center_id,
    };

    let doctor = repository::upsert_doctor_profile(ctx.service_store.as_ref(), &profile).await?;
    tracing::info!(doctor_id = %doctor.id, approved = doctor.approved, "doctor profile saved");
    ok(doctor)
}

#[derive(Deserialize)]
pub struct ApprovalRequest {
    pub approved: Option<bool>,
}

/// `PATCH /api/doctors/:id/approval`: admin only.
pub async fn set_approval(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Path(id): Path<String>,
    Payload(body): Payload<ApprovalRequest>,
) -> ApiResult<Doctor> {
    principal.require(&[Role::Admin])?;
    let approved = body.approved.ok_or(ApiError::MissingField("approved"))?;

    let doctor =
        repository::set_doctor_approval(ctx.service_store.as_ref(), parse_id(&id)?, approved)
            .await?;
    tracing::info!(
        doctor_id = %doctor.id,
        approved,
        admin = %principal.user_id,
        "doctor approval set"
    );
    ok(doctor)
}
