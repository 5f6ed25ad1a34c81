use serde_json::json;

use super::{optional, single, to_row, PAYMENT_ORDERS};
use crate::db::{DataStore, DatabaseError, Query};
use crate::models::*;

pub async fn insert_payment_order(
    store: &dyn DataStore,
    order: &NewPaymentOrder,
) -> Result<PaymentOrder, DatabaseError> {
    let rows = store.insert(PAYMENT_ORDERS, vec![to_row(order)?]).await?;
    single(rows, "payment order", &order.order_id)
}

pub async fn find_payment_order(
    store: &dyn DataStore,
    order_id: &str,
) -> Result<Option<PaymentOrder>, DatabaseError> {
    optional(
        store
            .select(PAYMENT_ORDERS, &Query::new().eq("order_id", order_id))
            .await?,
    )
}

pub async fn update_payment_status(
    store: &dyn DataStore,
    order_id: &str,
    status: PaymentStatus,
) -> Result<PaymentOrder, DatabaseError> {
    let rows = store
        .update(
            PAYMENT_ORDERS,
            &Query::new().eq("order_id", order_id),
            json!({ "status": status.as_str() }),
        )
        .await?;
    single(rows, "payment order", order_id)
}
