//! Live video consultation endpoints.
//!
//! - `POST /api/consultations`: patient schedules with an approved doctor
//! - `GET /api/consultations`: role-scoped listing, earliest date first
//! - `POST /api/consultations/:id/meet-link`: room + signed join token
//! - `PATCH /api/consultations/:id/status`: doctor or admin moves status

use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{
    ok, parse_id, required, required_date, required_id, ApiContext, ApiResult, Payload, Principal,
};
use crate::db::repository::{self, ConsultScope};
use crate::db::DataStore;
use crate::models::{ConsultStatus, LiveConsult, NewLiveConsult, Role};
use crate::video::{meet_url, new_room_id};

#[derive(Deserialize)]
pub struct ScheduleRequest {
    pub doctor_id: Option<String>,
    pub consultation_date: Option<String>,
    pub consultation_time: Option<String>,
}

/// `POST /api/consultations`
pub async fn schedule(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Payload(body): Payload<ScheduleRequest>,
) -> ApiResult<LiveConsult> {
    principal.require(&[Role::Patient])?;

    let doctor_id = required_id("doctor_id", body.doctor_id)?;
    let consultation_date = required_date("consultation_date", body.consultation_date)?;
    let consultation_time = required("consultation_time", body.consultation_time)?;

    let store = ctx.service_store.as_ref();
    match repository::find_doctor(store, doctor_id).await? {
        Some(doctor) if doctor.approved => {}
        _ => return Err(ApiError::NotFound("Doctor not found".into())),
    }

    let consult = repository::insert_consult(
        store,
        &NewLiveConsult {
            doctor_id,
            user_id: principal.user_id,
            consultation_date,
            consultation_time,
            status: ConsultStatus::Scheduled,
        },
    )
    .await?;

    tracing::info!(
        consult_id = %consult.id,
        %doctor_id,
        user_id = %principal.user_id,
        "consultation scheduled"
    );
    ok(consult)
}

/// `GET /api/consultations`
pub async fn list(
    State(ctx): State<ApiContext>,
    principal: Principal,
) -> ApiResult<Vec<LiveConsult>> {
    let scope = match principal.role {
        Role::Patient => ConsultScope::Patient(principal.user_id),
        Role::Doctor => ConsultScope::Doctor(principal.user_id),
        Role::Admin => ConsultScope::All,
        Role::HealthCenter => {
            return Err(ApiError::Forbidden(
                "Health centers have no consultation listing".into(),
            ))
        }
    };
    ok(repository::list_consults(ctx.service_store.as_ref(), scope).await?)
}

#[derive(Serialize)]
pub struct MeetLink {
    pub room_id: String,
    pub meet_url: String,
    pub token: String,
    pub app_id: u32,
    pub expires_at: DateTime<Utc>,
}

/// `POST /api/consultations/:id/meet-link`
///
/// The first participant to ask opens a fresh room and marks the session
/// live; later requests for a live session join the same room. When two
/// participants race on a scheduled session, the loser signs for the room
/// the winner stored.
pub async fn meet_link(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Path(id): Path<String>,
) -> ApiResult<MeetLink> {
    let store = ctx.service_store.as_ref();
    let consult = repository::get_consult(store, parse_id(&id)?).await?;

    if consult.user_id != principal.user_id && consult.doctor_id != principal.user_id {
        return Err(ApiError::Forbidden("Not a participant in this consultation".into()));
    }

    let room_id = match (consult.status, consult.room_id) {
        (ConsultStatus::Live, Some(room)) => room,
        (ConsultStatus::Scheduled, _) => {
            let fresh = new_room_id();
            let url = meet_url(&ctx.public_base_url, &fresh);
            match repository::open_consult_room(store, consult.id, &fresh, &url).await? {
                Some(_) => {
                    tracing::info!(
                        consult_id = %consult.id,
                        room_id = %fresh,
                        "consultation room opened"
                    );
                    fresh
                }
                None => joined_room(store, consult.id).await?,
            }
        }
        (ConsultStatus::Live, None) => return Err(roomless(consult.id)),
        (status, _) => return Err(ApiError::BadRequest(format!("Consultation is {status}"))),
    };

    let grant = ctx.video.grant(&room_id, &principal.user_id.to_string())?;
    ok(MeetLink {
        meet_url: meet_url(&ctx.public_base_url, &room_id),
        room_id: grant.room_id,
        token: grant.token,
        app_id: grant.app_id,
        expires_at: grant.expires_at,
    })
}

fn roomless(id: Uuid) -> ApiError {
    ApiError::Internal(format!("live consultation {id} has no room"))
}

/// Room of a session another request has just opened.
async fn joined_room(store: &dyn DataStore, id: Uuid) -> Result<String, ApiError> {
    let current = repository::get_consult(store, id).await?;
    match (current.status, current.room_id) {
        (ConsultStatus::Live, Some(room)) => Ok(room),
        (ConsultStatus::Live, None) => Err(roomless(id)),
        (status, _) => Err(ApiError::BadRequest(format!("Consultation is {status}"))),
    }
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

/// `PATCH /api/consultations/:id/status`
pub async fn update_status(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Path(id): Path<String>,
    Payload(body): Payload<StatusRequest>,
) -> ApiResult<LiveConsult> {
    principal.require(&[Role::Doctor, Role::Admin])?;
    let raw = required("status", body.status)?;
    let status: ConsultStatus = raw
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown consultation status: {raw}")))?;

    let store = ctx.service_store.as_ref();
    let consult = repository::get_consult(store, parse_id(&id)?).await?;
    if !principal.is_admin() && consult.doctor_id != principal.user_id {
        return Err(ApiError::Forbidden("Not your consultation".into()));
    }

    let updated = repository::update_consult_status(store, consult.id, status).await?;
    tracing::info!(
        consult_id = %updated.id,
        from = %consult.status,
        to = %updated.status,
        "consultation status changed"
    );
    ok(updated)
}
