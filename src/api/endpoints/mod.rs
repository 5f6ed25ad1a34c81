//! API endpoint handlers, one module per resource.

pub mod admin;
pub mod appointments;
pub mod auth;
pub mod centers;
pub mod consultations;
pub mod doctors;
pub mod health;
pub mod payments;
pub mod uploads;
