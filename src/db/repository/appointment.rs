use serde_json::{json, Value};
use uuid::Uuid;

use super::{decode_all, single, to_row, APPOINTMENTS};
use crate::db::{DataStore, DatabaseError, Direction, Query};
use crate::models::*;

/// Which appointments a caller may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentScope {
    Patient(Uuid),
    Center(Uuid),
    All,
}

pub async fn insert_appointment(
    store: &dyn DataStore,
    appointment: &NewAppointment,
) -> Result<Appointment, DatabaseError> {
    let rows = store.insert(APPOINTMENTS, vec![to_row(appointment)?]).await?;
    single(rows, "appointment", "new")
}

pub async fn get_appointment(
    store: &dyn DataStore,
    id: Uuid,
) -> Result<Appointment, DatabaseError> {
    let rows = store
        .select(APPOINTMENTS, &Query::new().eq("id", id.to_string()))
        .await?;
    single(rows, "appointment", &id.to_string())
}

/// Appointments visible in `scope`, newest date first.
pub async fn list_appointments(
    store: &dyn DataStore,
    scope: AppointmentScope,
    status: Option<AppointmentStatus>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut query = match scope {
        AppointmentScope::Patient(user_id) => Query::new().eq("user_id", user_id.to_string()),
        AppointmentScope::Center(center_id) => Query::new().eq("center_id", center_id.to_string()),
        AppointmentScope::All => Query::new(),
    };
    if let Some(status) = status {
        query = query.eq("status", status.as_str());
    }
    let query = query
        .order("date", Direction::Desc)
        .order("time", Direction::Desc);

    decode_all(store.select(APPOINTMENTS, &query).await?)
}

pub async fn update_appointment_status(
    store: &dyn DataStore,
    id: Uuid,
    status: AppointmentStatus,
) -> Result<Appointment, DatabaseError> {
    let rows = store
        .update(
            APPOINTMENTS,
            &Query::new().eq("id", id.to_string()),
            json!({ "status": status.as_str() }),
        )
        .await?;
    single(rows, "appointment", &id.to_string())
}

/// Append a document URL to the appointment's array for `kind`.
///
/// Read-modify-write: two concurrent attachments to the same array can
/// lose one of them.
pub async fn attach_document(
    store: &dyn DataStore,
    appointment: &Appointment,
    kind: DocumentKind,
    url: &str,
) -> Result<Appointment, DatabaseError> {
    let mut documents = appointment.documents(kind).to_vec();
    documents.push(url.to_string());

    let mut patch = serde_json::Map::new();
    patch.insert(kind.column().to_string(), json!(documents));

    let rows = store
        .update(
            APPOINTMENTS,
            &Query::new().eq("id", appointment.id.to_string()),
            Value::Object(patch),
        )
        .await?;
    single(rows, "appointment", &appointment.id.to_string())
}
