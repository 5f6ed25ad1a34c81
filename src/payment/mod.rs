//! Payment vendor seam: hosted-checkout order creation and payment lookup.
//!
//! The vendor owns settlement. Locally we only record the order and map the
//! vendor's payment attempts onto a `PaymentStatus`.

pub mod cashfree;
#[cfg(test)]
pub mod mock;

pub use cashfree::{CashfreeGateway, PaymentEnvironment};
#[cfg(test)]
pub use mock::MockGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::PaymentStatus;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway unreachable: {0}")]
    Connection(String),
    #[error("Payment gateway error ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Malformed payment gateway response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: String,
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub order_id: String,
    pub amount: f64,
    pub currency: String,
    pub customer: Customer,
    pub return_url: String,
    pub note: Option<String>,
}

/// Vendor's view of a freshly created order.
#[derive(Debug, Clone)]
pub struct VendorOrder {
    pub order_id: String,
    pub payment_session_id: String,
    pub order_status: String,
    /// Full response body, persisted as-is.
    pub raw: Value,
}

/// One payment attempt against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorPayment {
    #[serde(default)]
    pub cf_payment_id: Option<Value>,
    pub payment_status: String,
    #[serde(default)]
    pub payment_amount: Option<f64>,
    #[serde(default)]
    pub payment_time: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, order: &CreateOrder) -> Result<VendorOrder, PaymentError>;

    async fn order_payments(&self, order_id: &str) -> Result<Vec<VendorPayment>, PaymentError>;
}

/// Settle an order's status from its payment attempts.
///
/// Any successful attempt wins. Otherwise the most recent attempt decides;
/// no attempts at all means the order is still pending.
pub fn settle_status(payments: &[VendorPayment]) -> PaymentStatus {
    if payments
        .iter()
        .any(|p| PaymentStatus::from_vendor(&p.payment_status) == PaymentStatus::Success)
    {
        return PaymentStatus::Success;
    }
    payments
        .iter()
        .max_by(|a, b| a.payment_time.cmp(&b.payment_time))
        .map(|p| PaymentStatus::from_vendor(&p.payment_status))
        .unwrap_or(PaymentStatus::Pending)
}
