//! Sign-in and session endpoints.
//!
//! - `POST /api/auth/login`: password sign-in via the identity provider
//! - `GET /api/me`: the authenticated caller

use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ok, required, role_of, ApiContext, ApiResult, Payload, Principal};
use crate::db::repository;
use crate::models::Role;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub user: SessionUser,
}

/// `POST /api/auth/login`
///
/// Doctors cannot sign in until an admin has approved their profile; a
/// doctor account with no profile row is treated as unapproved.
pub async fn login(
    State(ctx): State<ApiContext>,
    Payload(body): Payload<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let email = required("email", body.email)?;
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or(ApiError::MissingField("password"))?;

    let session = ctx.identity.sign_in(&email, &password).await?;
    let role = role_of(&session.user)?;

    if role == Role::Doctor {
        let doctor = repository::find_doctor(ctx.service_store.as_ref(), session.user.id).await?;
        if !doctor.is_some_and(|d| d.approved) {
            tracing::info!(user_id = %session.user.id, "doctor sign-in blocked pending approval");
            return Err(ApiError::Forbidden(
                "Doctor account is pending admin approval".into(),
            ));
        }
    }

    tracing::info!(user_id = %session.user.id, %role, "signed in");

    ok(LoginResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        expires_in: session.expires_in,
        user: SessionUser {
            id: session.user.id,
            email: session.user.email,
            role,
        },
    })
}

/// `GET /api/me`
pub async fn me(principal: Principal) -> ApiResult<Principal> {
    ok(principal)
}
