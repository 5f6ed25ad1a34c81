//! Repository layer: entity-scoped store operations.
//!
//! Free functions over `&dyn DataStore`, one sub-module per table.
//! All public functions are re-exported here.

mod appointment;
mod center;
mod consult;
mod doctor;
mod payment;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::DatabaseError;

pub use appointment::*;
pub use center::*;
pub use consult::*;
pub use doctor::*;
pub use payment::*;

pub const APPOINTMENTS: &str = "appointments";
pub const DOCTORS: &str = "doctors";
pub const HEALTH_CENTERS: &str = "health_centers";
pub const CENTER_AVAILABILITY: &str = "center_availability";
pub const CENTER_SERVICES: &str = "center_services";
pub const PAYMENT_ORDERS: &str = "payment_orders";
pub const LIVE_CONSULTS: &str = "live_consults";

pub(crate) fn to_row<T: Serialize>(entity: &T) -> Result<Value, DatabaseError> {
    serde_json::to_value(entity).map_err(|e| DatabaseError::Decode(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(row: Value) -> Result<T, DatabaseError> {
    serde_json::from_value(row).map_err(|e| DatabaseError::Decode(e.to_string()))
}

pub(crate) fn decode_all<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, DatabaseError> {
    rows.into_iter().map(decode).collect()
}

/// First row of a single-entity read or write, or `NotFound`.
pub(crate) fn single<T: DeserializeOwned>(
    rows: Vec<Value>,
    entity_type: &str,
    id: &str,
) -> Result<T, DatabaseError> {
    match rows.into_iter().next() {
        Some(row) => decode(row),
        None => Err(DatabaseError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }),
    }
}

pub(crate) fn optional<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, DatabaseError> {
    rows.into_iter().next().map(decode).transpose()
}
