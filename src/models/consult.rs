use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ConsultStatus;

/// Video session between a patient and a doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConsult {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub user_id: Uuid,
    pub consultation_date: NaiveDate,
    pub consultation_time: String,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub meet_url: Option<String>,
    pub status: ConsultStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewLiveConsult {
    pub doctor_id: Uuid,
    pub user_id: Uuid,
    pub consultation_date: NaiveDate,
    pub consultation_time: String,
    pub status: ConsultStatus,
}
