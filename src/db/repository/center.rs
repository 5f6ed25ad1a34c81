use serde_json::json;
use uuid::Uuid;

use super::{
    decode_all, optional, single, to_row, CENTER_AVAILABILITY, CENTER_SERVICES, HEALTH_CENTERS,
};
use crate::db::{DataStore, DatabaseError, Direction, Query};
use crate::models::*;

pub async fn find_center(
    store: &dyn DataStore,
    id: Uuid,
) -> Result<Option<HealthCenter>, DatabaseError> {
    optional(
        store
            .select(HEALTH_CENTERS, &Query::new().eq("id", id.to_string()))
            .await?,
    )
}

/// One page of approved centers ordered by name.
pub async fn list_approved_centers(
    store: &dyn DataStore,
    pincode: Option<&str>,
    offset: usize,
    limit: usize,
) -> Result<Vec<HealthCenter>, DatabaseError> {
    let mut query = Query::new().eq("approved", true);
    if let Some(pincode) = pincode {
        query = query.eq("pincode", pincode);
    }
    let query = query
        .order("name", Direction::Asc)
        .offset(offset)
        .limit(limit);
    decode_all(store.select(HEALTH_CENTERS, &query).await?)
}

pub async fn list_pending_centers(
    store: &dyn DataStore,
) -> Result<Vec<HealthCenter>, DatabaseError> {
    decode_all(
        store
            .select(
                HEALTH_CENTERS,
                &Query::new()
                    .eq("approved", false)
                    .order("created_at", Direction::Asc),
            )
            .await?,
    )
}

pub async fn upsert_center_profile(
    store: &dyn DataStore,
    profile: &CenterProfile,
) -> Result<HealthCenter, DatabaseError> {
    let existing = find_center(store, profile.id).await?;
    let mut row = to_row(profile)?;
    if existing.is_none() {
        row["approved"] = json!(false);
    }
    let rows = store.upsert(HEALTH_CENTERS, vec![row], "id").await?;
    single(rows, "health center", &profile.id.to_string())
}

pub async fn set_center_approval(
    store: &dyn DataStore,
    id: Uuid,
    approved: bool,
) -> Result<HealthCenter, DatabaseError> {
    let rows = store
        .update(
            HEALTH_CENTERS,
            &Query::new().eq("id", id.to_string()),
            json!({ "approved": approved }),
        )
        .await?;
    single(rows, "health center", &id.to_string())
}

pub async fn list_availability(
    store: &dyn DataStore,
    center_id: Uuid,
) -> Result<Vec<AvailabilitySlot>, DatabaseError> {
    decode_all(
        store
            .select(
                CENTER_AVAILABILITY,
                &Query::new()
                    .eq("center_id", center_id.to_string())
                    .order("start_time", Direction::Asc),
            )
            .await?,
    )
}

pub async fn list_services(
    store: &dyn DataStore,
    center_id: Uuid,
) -> Result<Vec<CenterService>, DatabaseError> {
    decode_all(
        store
            .select(
                CENTER_SERVICES,
                &Query::new()
                    .eq("center_id", center_id.to_string())
                    .order("name", Direction::Asc),
            )
            .await?,
    )
}

/// Delete-then-insert. Not atomic: a failed insert leaves the center with
/// no availability rows.
pub async fn replace_availability(
    store: &dyn DataStore,
    center_id: Uuid,
    slots: &[AvailabilitySlot],
) -> Result<Vec<AvailabilitySlot>, DatabaseError> {
    let filter = Query::new().eq("center_id", center_id.to_string());
    store.delete(CENTER_AVAILABILITY, &filter).await?;
    if slots.is_empty() {
        return Ok(Vec::new());
    }
    let rows = slots.iter().map(to_row).collect::<Result<Vec<_>, _>>()?;
    decode_all(store.insert(CENTER_AVAILABILITY, strip_ids(rows)).await?)
}

pub async fn replace_services(
    store: &dyn DataStore,
    center_id: Uuid,
    services: &[CenterService],
) -> Result<Vec<CenterService>, DatabaseError> {
    let filter = Query::new().eq("center_id", center_id.to_string());
    store.delete(CENTER_SERVICES, &filter).await?;
    if services.is_empty() {
        return Ok(Vec::new());
    }
    let rows = services.iter().map(to_row).collect::<Result<Vec<_>, _>>()?;
    decode_all(store.insert(CENTER_SERVICES, strip_ids(rows)).await?)
}

/// Let the store generate ids for freshly inserted child rows.
fn strip_ids(rows: Vec<serde_json::Value>) -> Vec<serde_json::Value> {
    rows.into_iter()
        .map(|mut row| {
            if let Some(map) = row.as_object_mut() {
                map.remove("id");
            }
            row
        })
        .collect()
}
