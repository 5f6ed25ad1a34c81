use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use super::{CreateOrder, PaymentError, PaymentGateway, VendorOrder, VendorPayment};

/// In-memory gateway for tests: records created orders and returns
/// scripted payment attempts per order id.
#[derive(Default)]
pub struct MockGateway {
    created: Mutex<Vec<CreateOrder>>,
    payments: Mutex<HashMap<String, Vec<VendorPayment>>>,
    reject_orders: bool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway that rejects every order creation with a 400.
    pub fn rejecting() -> Self {
        Self {
            reject_orders: true,
            ..Self::default()
        }
    }

    /// Script the attempts returned for `order_id`.
    pub fn set_payments(&self, order_id: &str, statuses: &[&str]) {
        let attempts = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| VendorPayment {
                cf_payment_id: Some(json!(i + 1)),
                payment_status: status.to_string(),
                payment_amount: None,
                payment_time: Some(format!("2026-10-16T10:{i:02}:00+05:30")),
            })
            .collect();
        self.payments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(order_id.to_string(), attempts);
    }

    pub fn created_orders(&self) -> Vec<CreateOrder> {
        self.created.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, order: &CreateOrder) -> Result<VendorOrder, PaymentError> {
        if self.reject_orders {
            return Err(PaymentError::Rejected {
                status: 400,
                message: "order_amount : invalid value".into(),
            });
        }
        self.created
            .lock()
            .map_err(|_| PaymentError::Connection("mock lock poisoned".into()))?
            .push(order.clone());

        let session = format!("session_{}", order.order_id);
        Ok(VendorOrder {
            order_id: order.order_id.clone(),
            payment_session_id: session.clone(),
            order_status: "ACTIVE".into(),
            raw: json!({
                "order_id": order.order_id,
                "payment_session_id": session,
                "order_status": "ACTIVE",
                "order_amount": order.amount,
                "order_currency": order.currency,
            }),
        })
    }

    async fn order_payments(&self, order_id: &str) -> Result<Vec<VendorPayment>, PaymentError> {
        Ok(self
            .payments
            .lock()
            .map_err(|_| PaymentError::Connection("mock lock poisoned".into()))?
            .get(order_id)
            .cloned()
            .unwrap_or_default())
    }
}
