use serde_json::json;
use uuid::Uuid;

use super::{decode_all, optional, single, to_row, DOCTORS};
use crate::db::{DataStore, DatabaseError, Direction, Query};
use crate::models::*;

pub async fn find_doctor(store: &dyn DataStore, id: Uuid) -> Result<Option<Doctor>, DatabaseError> {
    optional(
        store
            .select(DOCTORS, &Query::new().eq("id", id.to_string()))
            .await?,
    )
}

/// Approved doctors ordered by name, optionally narrowed by specialization.
pub async fn list_approved_doctors(
    store: &dyn DataStore,
    specialization: Option<&str>,
) -> Result<Vec<Doctor>, DatabaseError> {
    let mut query = Query::new().eq("approved", true);
    if let Some(spec) = specialization {
        query = query.ilike("specialization", spec);
    }
    decode_all(
        store
            .select(DOCTORS, &query.order("name", Direction::Asc))
            .await?,
    )
}

pub async fn list_pending_doctors(store: &dyn DataStore) -> Result<Vec<Doctor>, DatabaseError> {
    decode_all(
        store
            .select(
                DOCTORS,
                &Query::new()
                    .eq("approved", false)
                    .order("created_at", Direction::Asc),
            )
            .await?,
    )
}

/// Create or update the doctor's own profile. Approval is never touched here
/// except on first insert, where it starts false.
pub async fn upsert_doctor_profile(
    store: &dyn DataStore,
    profile: &DoctorProfile,
) -> Result<Doctor, DatabaseError> {
    let existing = find_doctor(store, profile.id).await?;
    let mut row = to_row(profile)?;
    if existing.is_none() {
        row["approved"] = json!(false);
    }
    let rows = store.upsert(DOCTORS, vec![row], "id").await?;
    single(rows, "doctor", &profile.id.to_string())
}

pub async fn set_doctor_approval(
    store: &dyn DataStore,
    id: Uuid,
    approved: bool,
) -> Result<Doctor, DatabaseError> {
    let rows = store
        .update(
            DOCTORS,
            &Query::new().eq("id", id.to_string()),
            json!({ "approved": approved }),
        )
        .await?;
    single(rows, "doctor", &id.to_string())
}
