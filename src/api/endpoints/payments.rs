//! Payment endpoints: hosted-checkout order creation and verification.
//!
//! Order creation and the local order row are separate calls, as are
//! verification and the appointment update. A failure between them leaves
//! the earlier step applied and is logged with the ids needed to reconcile.

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ok, required, required_id, ApiContext, ApiResult, Payload, Principal};
use crate::db::repository;
use crate::models::{
    Appointment, AppointmentStatus, NewPaymentOrder, PaymentOrder, PaymentStatus, Role,
};
use crate::payment::{settle_status, CreateOrder, Customer};

pub const CURRENCY: &str = "INR";

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub appointment_id: Option<String>,
    pub amount: Option<f64>,
    pub customer_phone: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

#[derive(Serialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub payment_session_id: String,
    pub order_status: String,
}

/// `POST /api/payments/order`
pub async fn create_order(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Payload(body): Payload<CreateOrderRequest>,
) -> ApiResult<CreateOrderResponse> {
    let appointment_id = required_id("appointment_id", body.appointment_id)?;
    let amount = body.amount.ok_or(ApiError::MissingField("amount"))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::BadRequest("amount must be greater than zero".into()));
    }
    let customer_phone = required("customer_phone", body.customer_phone)?;

    let store = ctx.service_store.as_ref();
    let appointment = repository::get_appointment(store, appointment_id).await?;
    if appointment.user_id != principal.user_id {
        return Err(ApiError::Forbidden("Not your appointment".into()));
    }

    let order_id = format!("order_{}", Uuid::new_v4().simple());
    let request = CreateOrder {
        order_id: order_id.clone(),
        amount,
        currency: CURRENCY.to_string(),
        customer: Customer {
            id: principal.user_id.to_string(),
            phone: customer_phone,
            name: body.customer_name.filter(|n| !n.trim().is_empty()),
            email: body
                .customer_email
                .or(principal.email.clone())
                .filter(|e| !e.trim().is_empty()),
        },
        return_url: format!(
            "{}/payments/return?order_id={}",
            ctx.public_base_url, order_id
        ),
        note: Some(format!("Appointment {appointment_id}")),
    };

    let created = ctx.payments.create_order(&request).await?;

    let persisted = repository::insert_payment_order(
        store,
        &NewPaymentOrder {
            order_id: created.order_id.clone(),
            appointment_id,
            amount,
            currency: CURRENCY.to_string(),
            status: PaymentStatus::Pending,
            payment_session_id: Some(created.payment_session_id.clone()),
            vendor_response: created.raw.clone(),
        },
    )
    .await;
    if let Err(e) = persisted {
        tracing::error!(
            order_id = %created.order_id,
            %appointment_id,
            error = %e,
            "vendor order created but local order row was not saved"
        );
        return Err(e.into());
    }

    tracing::info!(order_id = %created.order_id, %appointment_id, amount, "payment order created");
    ok(CreateOrderResponse {
        order_id: created.order_id,
        payment_session_id: created.payment_session_id,
        order_status: created.order_status,
    })
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub order_id: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub order_id: String,
    pub status: PaymentStatus,
    pub appointment_id: Uuid,
    pub appointment_status: AppointmentStatus,
}

/// `POST /api/payments/verify`
///
/// Settles the order from the vendor's payment attempts. Only a successful
/// payment moves the appointment to confirmed.
pub async fn verify(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Payload(body): Payload<VerifyRequest>,
) -> ApiResult<VerifyResponse> {
    let order_id = required("order_id", body.order_id)?;

    let attempts = ctx.payments.order_payments(&order_id).await?;
    let status = settle_status(&attempts);

    let store = ctx.service_store.as_ref();
    let Some(order) = repository::find_payment_order(store, &order_id).await? else {
        tracing::error!(
            %order_id,
            vendor_status = %status,
            attempts = attempts.len(),
            "vendor order has no local order row"
        );
        return Err(ApiError::NotFound("Payment order not found".into()));
    };

    let appointment = repository::get_appointment(store, order.appointment_id).await?;
    if !principal.is_admin() && appointment.user_id != principal.user_id {
        return Err(ApiError::Forbidden("Not your payment".into()));
    }

    let order = repository::update_payment_status(store, &order_id, status).await?;

    let appointment_status = if status == PaymentStatus::Success {
        match repository::update_appointment_status(
            store,
            appointment.id,
            AppointmentStatus::Confirmed,
        )
        .await
        {
            Ok(updated) => updated.status,
            Err(e) => {
                tracing::error!(
                    %order_id,
                    appointment_id = %appointment.id,
                    error = %e,
                    "payment succeeded but appointment was not confirmed"
                );
                return Err(e.into());
            }
        }
    } else {
        appointment.status
    };

    tracing::info!(%order_id, %status, %appointment_status, "payment verified");
    ok(VerifyResponse {
        order_id: order.order_id,
        status: order.status,
        appointment_id: appointment.id,
        appointment_status,
    })
}

/// `GET /api/payments/:order_id`: the local order row.
pub async fn detail(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Path(order_id): Path<String>,
) -> ApiResult<PaymentOrder> {
    let store = ctx.service_store.as_ref();
    let order = repository::find_payment_order(store, &order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment order not found".into()))?;

    if !principal.is_admin() {
        let appointment = repository::get_appointment(store, order.appointment_id).await?;
        if !can_see_payment(&principal, &appointment) {
            return Err(ApiError::Forbidden("Not your payment".into()));
        }
    }
    ok(order)
}

fn can_see_payment(principal: &Principal, appointment: &Appointment) -> bool {
    match principal.role {
        Role::Admin => true,
        Role::Patient => appointment.user_id == principal.user_id,
        Role::HealthCenter => appointment.center_id == principal.user_id,
        Role::Doctor => false,
    }
}
