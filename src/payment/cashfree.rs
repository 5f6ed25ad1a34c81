//! Hosted-checkout payment gateway client (PG API, version 2023-08-01).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CreateOrder, PaymentError, PaymentGateway, VendorOrder, VendorPayment};

const API_VERSION: &str = "2023-08-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEnvironment {
    Sandbox,
    Production,
}

impl PaymentEnvironment {
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.cashfree.com/pg",
            Self::Production => "https://api.cashfree.com/pg",
        }
    }
}

impl std::str::FromStr for PaymentEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "test" => Ok(Self::Sandbox),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown payment environment: {other}")),
        }
    }
}

pub struct CashfreeGateway {
    base_url: reqwest::Url,
    client_id: String,
    client_secret: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OrderRequest<'a> {
    order_id: &'a str,
    order_amount: f64,
    order_currency: &'a str,
    customer_details: CustomerDetails<'a>,
    order_meta: OrderMeta<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_note: Option<&'a str>,
}

#[derive(Serialize)]
struct CustomerDetails<'a> {
    customer_id: &'a str,
    customer_phone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_email: Option<&'a str>,
}

#[derive(Serialize)]
struct OrderMeta<'a> {
    return_url: &'a str,
}

#[derive(Deserialize)]
struct OrderResponse {
    order_id: String,
    payment_session_id: String,
    #[serde(default)]
    order_status: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

impl CashfreeGateway {
    pub fn new(
        environment: PaymentEnvironment,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Self, PaymentError> {
        Self::with_base_url(environment.base_url(), client_id, client_secret)
    }

    pub fn with_base_url(
        base_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Self, PaymentError> {
        let base_url = reqwest::Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| PaymentError::Connection(format!("invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(PaymentError::Connection(format!(
                "base URL {base_url} cannot take a path"
            )));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PaymentError::Connection(e.to_string()))?;
        Ok(Self {
            base_url,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            client,
        })
    }

    /// Base URL plus `segments`, each percent-encoded as one path segment.
    fn endpoint(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: reqwest::Method, segments: &[&str]) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.endpoint(segments))
            .header("x-client-id", &self.client_id)
            .header("x-client-secret", &self.client_secret)
            .header("x-api-version", API_VERSION)
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, PaymentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or(body);
        Err(PaymentError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PaymentGateway for CashfreeGateway {
    async fn create_order(&self, order: &CreateOrder) -> Result<VendorOrder, PaymentError> {
        let body = OrderRequest {
            order_id: &order.order_id,
            order_amount: order.amount,
            order_currency: &order.currency,
            customer_details: CustomerDetails {
                customer_id: &order.customer.id,
                customer_phone: &order.customer.phone,
                customer_name: order.customer.name.as_deref(),
                customer_email: order.customer.email.as_deref(),
            },
            order_meta: OrderMeta {
                return_url: &order.return_url,
            },
            order_note: order.note.as_deref(),
        };

        let response = self
            .request(reqwest::Method::POST, &["orders"])
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Connection(e.to_string()))?;
        let response = Self::checked(response).await?;

        let raw: Value = response
            .json()
            .await
            .map_err(|e| PaymentError::Decode(e.to_string()))?;
        let parsed: OrderResponse = serde_json::from_value(raw.clone())
            .map_err(|e| PaymentError::Decode(e.to_string()))?;

        tracing::info!(
            order_id = %parsed.order_id,
            status = %parsed.order_status,
            "payment order created"
        );

        Ok(VendorOrder {
            order_id: parsed.order_id,
            payment_session_id: parsed.payment_session_id,
            order_status: parsed.order_status,
            raw,
        })
    }

    async fn order_payments(&self, order_id: &str) -> Result<Vec<VendorPayment>, PaymentError> {
        // Dot segments would be dropped from the path, not escaped.
        if matches!(order_id, "" | "." | "..") {
            return Err(PaymentError::Rejected {
                status: 400,
                message: format!("invalid order id {order_id:?}"),
            });
        }
        let response = self
            .request(reqwest::Method::GET, &["orders", order_id, "payments"])
            .send()
            .await
            .map_err(|e| PaymentError::Connection(e.to_string()))?;
        let response = Self::checked(response).await?;

        response
            .json()
            .await
            .map_err(|e| PaymentError::Decode(e.to_string()))
    }
}
