use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::PaymentStatus;

/// Local record of one checkout attempt at the payment vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: Uuid,
    pub order_id: String,
    pub appointment_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub payment_session_id: Option<String>,
    /// Raw vendor response from order creation.
    #[serde(default)]
    pub vendor_response: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPaymentOrder {
    pub order_id: String,
    pub appointment_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_session_id: Option<String>,
    pub vendor_response: serde_json::Value,
}
