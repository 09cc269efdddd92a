//! Order placement and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{CreateOrder, CustomerId, Money, Order, OrderId, OrderStatus};
use order_store::OrderStore;
use saga::SagaError;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub total_amount_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub total_amount_cents: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            product_id: order.product_id().to_string(),
            quantity: order.quantity(),
            total_amount_cents: order.total_amount().cents(),
            status: order.status(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /api/orders: validate and store a new order, then start its saga.
///
/// Responds as soon as the `PENDING` order is stored; clients poll the
/// order to observe saga progress.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let quantity = u32::try_from(req.quantity)
        .map_err(|_| ApiError::BadRequest(format!("Invalid quantity: {}", req.quantity)))?;

    let cmd = CreateOrder::new(
        req.customer_id,
        req.product_id,
        quantity,
        Money::from_cents(req.total_amount_cents),
    );

    let (order, _saga) = Arc::clone(&state.orchestrator).place_order(cmd).await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /api/orders: list all orders, optionally filtered by `?status=`.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = match query.status {
        Some(status) => {
            let status: OrderStatus = status
                .parse()
                .map_err(|e: domain::OrderError| ApiError::BadRequest(e.to_string()))?;
            state.store().list_by_status(status).await?
        }
        None => state.store().list().await?,
    };

    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /api/orders/{id}: load one order.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .store()
        .get(order_id)
        .await?
        .ok_or(SagaError::OrderNotFound(order_id))?;

    Ok(Json(OrderResponse::from(&order)))
}

/// GET /api/orders/customer/{customer_id}: list one customer's orders.
#[tracing::instrument(skip(state))]
pub async fn by_customer<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state
        .store()
        .list_by_customer(&CustomerId::new(customer_id))
        .await?;

    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))
}
