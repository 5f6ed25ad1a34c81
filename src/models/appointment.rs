use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AppointmentStatus, DocumentKind};
use super::null_as_default;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub center_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub purpose: String,
    pub status: AppointmentStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reports: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prescriptions: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn documents(&self, kind: DocumentKind) -> &[String] {
        match kind {
            DocumentKind::Report => &self.reports,
            DocumentKind::Bill => &self.bills,
            DocumentKind::Prescription => &self.prescriptions,
        }
    }
}

/// Row inserted when a patient books. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAppointment {
    pub center_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub purpose: String,
    pub status: AppointmentStatus,
    pub reports: Vec<String>,
    pub bills: Vec<String>,
    pub prescriptions: Vec<String>,
}
