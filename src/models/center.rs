use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;

/// An organizational account offering services and availability slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCenter {
    pub id: Uuid,
    pub name: String,
    pub pincode: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub approved: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CenterProfile {
    pub id: Uuid,
    pub name: String,
    pub pincode: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Weekly opening slot. `day` holds a weekday name such as "Monday".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub center_id: Uuid,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CenterService {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub center_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Availability slot with the next calendar date it falls on.
#[derive(Debug, Clone, Serialize)]
pub struct DatedSlot {
    #[serde(flatten)]
    pub slot: AvailabilitySlot,
    pub next_date: NaiveDate,
}

/// Center enriched with its availability and services for listings.
#[derive(Debug, Clone, Serialize)]
pub struct CenterListing {
    #[serde(flatten)]
    pub center: HealthCenter,
    pub availability: Vec<AvailabilitySlot>,
    pub services: Vec<CenterService>,
}
