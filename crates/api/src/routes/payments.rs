//! Payment capability endpoints backed by the in-process payment service.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{Money, OrderId};
use order_store::OrderStore;
use saga::{PaymentRecord, PaymentService, ProcessPaymentRequest, RefundPaymentRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/payments/process: charge a customer. Answers `true` on success.
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id))]
pub async fn process<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ProcessPaymentRequest>,
) -> Json<bool> {
    if req.amount_cents <= 0 {
        tracing::warn!(amount_cents = req.amount_cents, "rejecting non-positive payment");
        return Json(false);
    }

    let result = state
        .payments
        .process_payment(
            req.order_id,
            &req.customer_id,
            Money::from_cents(req.amount_cents),
        )
        .await;

    Json(outcome(result))
}

/// POST /api/payments/refund: refund an order's payment. Answers `true` on success.
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id))]
pub async fn refund<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RefundPaymentRequest>,
) -> Json<bool> {
    Json(outcome(state.payments.refund_payment(req.order_id).await))
}

/// GET /api/payments/{order_id}: the payment recorded for an order.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<PaymentRecord>, ApiError> {
    let order_id: OrderId = order_id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;

    state
        .payments
        .payment(order_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No payment for order {order_id}")))
}

fn outcome(result: Result<(), saga::CapabilityError>) -> bool {
    match result {
        Ok(()) => {
            metrics::counter!("capability_requests_total", "capability" => "payment", "outcome" => "approved")
                .increment(1);
            true
        }
        Err(error) => {
            metrics::counter!("capability_requests_total", "capability" => "payment", "outcome" => error.kind())
                .increment(1);
            tracing::info!(%error, "payment request declined");
            false
        }
    }
}
