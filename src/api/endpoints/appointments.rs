//! Appointment endpoints.
//!
//! - `POST /api/appointments`: patient books a slot at an approved center
//! - `GET /api/appointments`: role-scoped listing, newest date first
//! - `GET /api/appointments/:id`: single appointment
//! - `PATCH /api/appointments/:id/status`: center or admin moves status
//! - `POST /api/appointments/:id/documents`: attach an uploaded document URL

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{
    ok, parse_id, required, required_date, required_id, ApiContext, ApiResult, Payload, Principal,
};
use crate::db::repository::{self, AppointmentScope};
use crate::models::{Appointment, AppointmentStatus, DocumentKind, NewAppointment, Role};

#[derive(Deserialize)]
pub struct CreateAppointmentRequest {
    pub center_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub purpose: Option<String>,
}

/// `POST /api/appointments`
pub async fn create(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Payload(body): Payload<CreateAppointmentRequest>,
) -> ApiResult<Appointment> {
    principal.require(&[Role::Patient])?;

    let center_id = required_id("center_id", body.center_id)?;
    let date = required_date("date", body.date)?;
    let time = required("time", body.time)?;
    let purpose = required("purpose", body.purpose)?;

    let store = ctx.service_store.as_ref();
    match repository::find_center(store, center_id).await? {
        Some(center) if center.approved => {}
        _ => return Err(ApiError::NotFound("Health center not found".into())),
    }

    let appointment = repository::insert_appointment(
        store,
        &NewAppointment {
            center_id,
            user_id: principal.user_id,
            date,
            time,
            purpose,
            status: AppointmentStatus::Pending,
            reports: Vec::new(),
            bills: Vec::new(),
            prescriptions: Vec::new(),
        },
    )
    .await?;

    tracing::info!(
        appointment_id = %appointment.id,
        %center_id,
        user_id = %principal.user_id,
        "appointment booked"
    );
    ok(appointment)
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// `GET /api/appointments`
pub async fn list(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Appointment>> {
    let scope = match principal.role {
        Role::Patient => AppointmentScope::Patient(principal.user_id),
        Role::HealthCenter => AppointmentScope::Center(principal.user_id),
        Role::Admin => AppointmentScope::All,
        Role::Doctor => {
            return Err(ApiError::Forbidden(
                "Doctors have no appointment listing".into(),
            ))
        }
    };
    let status = query
        .status
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_status(&s))
        .transpose()?;

    let appointments =
        repository::list_appointments(ctx.service_store.as_ref(), scope, status).await?;
    ok(appointments)
}

/// `GET /api/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Path(id): Path<String>,
) -> ApiResult<Appointment> {
    let appointment =
        repository::get_appointment(ctx.service_store.as_ref(), parse_id(&id)?).await?;
    if !can_view(&principal, &appointment) {
        return Err(ApiError::Forbidden("Not your appointment".into()));
    }
    ok(appointment)
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

/// `PATCH /api/appointments/:id/status`
pub async fn update_status(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Path(id): Path<String>,
    Payload(body): Payload<StatusRequest>,
) -> ApiResult<Appointment> {
    principal.require(&[Role::HealthCenter, Role::Admin])?;
    let status = parse_status(&required("status", body.status)?)?;

    let store = ctx.service_store.as_ref();
    let appointment = repository::get_appointment(store, parse_id(&id)?).await?;
    if !principal.is_admin() && appointment.center_id != principal.user_id {
        return Err(ApiError::Forbidden(
            "Appointment belongs to another center".into(),
        ));
    }

    let updated = repository::update_appointment_status(store, appointment.id, status).await?;
    tracing::info!(
        appointment_id = %updated.id,
        from = %appointment.status,
        to = %updated.status,
        "appointment status changed"
    );
    ok(updated)
}

#[derive(Deserialize)]
pub struct AttachDocumentRequest {
    pub kind: Option<String>,
    pub url: Option<String>,
}

/// `POST /api/appointments/:id/documents`
///
/// Patients may attach reports to their own appointments; the owning
/// center and admins may attach any kind.
pub async fn attach_document(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Path(id): Path<String>,
    Payload(body): Payload<AttachDocumentRequest>,
) -> ApiResult<Appointment> {
    let kind: DocumentKind = required("kind", body.kind)?
        .parse()
        .map_err(|_| ApiError::BadRequest("kind must be report, bill or prescription".into()))?;
    let url = required("url", body.url)?;
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(ApiError::BadRequest("url must be an http(s) URL".into()));
    }

    let store = ctx.service_store.as_ref();
    let appointment = repository::get_appointment(store, parse_id(&id)?).await?;
    if !can_view(&principal, &appointment) {
        return Err(ApiError::Forbidden("Not your appointment".into()));
    }
    if principal.role == Role::Patient && kind != DocumentKind::Report {
        return Err(ApiError::Forbidden(
            "Patients may only attach reports".into(),
        ));
    }

    let updated = repository::attach_document(store, &appointment, kind, &url).await?;
    tracing::info!(appointment_id = %updated.id, %kind, "document attached");
    ok(updated)
}

/// Its patient, its center, or an admin.
fn can_view(principal: &Principal, appointment: &Appointment) -> bool {
    match principal.role {
        Role::Admin => true,
        Role::Patient => appointment.user_id == principal.user_id,
        Role::HealthCenter => appointment.center_id == principal.user_id,
        Role::Doctor => false,
    }
}

fn parse_status(raw: &str) -> Result<AppointmentStatus, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown appointment status: {raw}")))
}
