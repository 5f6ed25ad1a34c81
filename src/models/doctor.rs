use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;

/// A doctor account. `id` is the identity provider's user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub approved: bool,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub center_id: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub account_number: Option<String>,
    pub center_id: Option<Uuid>,
}
