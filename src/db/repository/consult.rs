use serde_json::json;
use uuid::Uuid;

use super::{decode_all, optional, single, to_row, LIVE_CONSULTS};
use crate::db::{DataStore, DatabaseError, Direction, Query};
use crate::models::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsultScope {
    Patient(Uuid),
    Doctor(Uuid),
    All,
}

pub async fn insert_consult(
    store: &dyn DataStore,
    consult: &NewLiveConsult,
) -> Result<LiveConsult, DatabaseError> {
    let rows = store.insert(LIVE_CONSULTS, vec![to_row(consult)?]).await?;
    single(rows, "live consult", "new")
}

pub async fn get_consult(store: &dyn DataStore, id: Uuid) -> Result<LiveConsult, DatabaseError> {
    let rows = store
        .select(LIVE_CONSULTS, &Query::new().eq("id", id.to_string()))
        .await?;
    single(rows, "live consult", &id.to_string())
}

/// Consultations in `scope`, earliest date first.
pub async fn list_consults(
    store: &dyn DataStore,
    scope: ConsultScope,
) -> Result<Vec<LiveConsult>, DatabaseError> {
    let query = match scope {
        ConsultScope::Patient(user_id) => Query::new().eq("user_id", user_id.to_string()),
        ConsultScope::Doctor(doctor_id) => Query::new().eq("doctor_id", doctor_id.to_string()),
        ConsultScope::All => Query::new(),
    }
    .order("consultation_date", Direction::Asc)
    .order("consultation_time", Direction::Asc);

    decode_all(store.select(LIVE_CONSULTS, &query).await?)
}

/// Record the room opened for a scheduled session and mark it live.
///
/// Only a row still `scheduled` is claimed. `None` means another request
/// opened the session first; its room is on the stored row.
pub async fn open_consult_room(
    store: &dyn DataStore,
    id: Uuid,
    room_id: &str,
    meet_url: &str,
) -> Result<Option<LiveConsult>, DatabaseError> {
    let rows = store
        .update(
            LIVE_CONSULTS,
            &Query::new()
                .eq("id", id.to_string())
                .eq("status", ConsultStatus::Scheduled.as_str()),
            json!({
                "room_id": room_id,
                "meet_url": meet_url,
                "status": ConsultStatus::Live.as_str(),
            }),
        )
        .await?;
    optional(rows)
}

pub async fn update_consult_status(
    store: &dyn DataStore,
    id: Uuid,
    status: ConsultStatus,
) -> Result<LiveConsult, DatabaseError> {
    let rows = store
        .update(
            LIVE_CONSULTS,
            &Query::new().eq("id", id.to_string()),
            json!({ "status": status.as_str() }),
        )
        .await?;
    single(rows, "live consult", &id.to_string())
}
