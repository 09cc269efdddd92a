//! Inventory capability and catalog endpoints backed by the in-process
//! inventory service.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use order_store::OrderStore;
use saga::{InventoryRequest, InventoryService, NewProduct, Product};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub stock: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            description: product.description,
            price_cents: product.price.cents(),
            stock: product.stock,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

fn to_responses(products: Vec<Product>) -> Json<Vec<ProductResponse>> {
    Json(products.into_iter().map(ProductResponse::from).collect())
}

fn parse_stock(stock: i64) -> Result<u32, ApiError> {
    u32::try_from(stock).map_err(|_| ApiError::BadRequest(format!("Invalid stock: {stock}")))
}

/// POST /api/inventory/update: reserve stock for an order. Answers `true` on success.
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id, product_id = %req.product_id))]
pub async fn reserve<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<InventoryRequest>,
) -> Json<bool> {
    let result = state
        .inventory
        .reserve(req.order_id, &req.product_id, req.quantity)
        .await;
    Json(outcome(result))
}

/// POST /api/inventory/compensate: release an order's reserved stock.
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id, product_id = %req.product_id))]
pub async fn release<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<InventoryRequest>,
) -> Json<bool> {
    let result = state
        .inventory
        .release(req.order_id, &req.product_id, req.quantity)
        .await;
    Json(outcome(result))
}

/// GET /api/inventory/products: the full catalog.
pub async fn list_products<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<Vec<ProductResponse>> {
    to_responses(state.inventory.list_products().await)
}

/// GET /api/inventory/products/available: products in stock.
pub async fn available_products<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<Vec<ProductResponse>> {
    to_responses(state.inventory.available_products().await)
}

/// GET /api/inventory/products/{id}: one product.
#[tracing::instrument(skip(state))]
pub async fn get_product<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    state
        .inventory
        .get_product(&ProductId::new(id.as_str()))
        .await
        .map(|product| Json(product.into()))
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))
}

/// POST /api/inventory/products: add a product to the catalog.
#[tracing::instrument(skip(state, req), fields(product_id = %req.id))]
pub async fn create_product<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product_id = ProductId::new(req.id);
    if product_id.is_blank() {
        return Err(ApiError::BadRequest("Product ID is required".to_string()));
    }
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest(format!(
            "Invalid price: {}",
            req.price_cents
        )));
    }

    let product = state
        .inventory
        .create_product(NewProduct {
            id: product_id,
            name: req.name,
            description: req.description,
            price: Money::from_cents(req.price_cents),
            stock: parse_stock(req.stock)?,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /api/inventory/products/{id}/stock: overwrite a product's stock.
#[tracing::instrument(skip(state, req))]
pub async fn update_stock<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStockRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let stock = parse_stock(req.stock)?;
    let product = state
        .inventory
        .set_stock(&ProductId::new(id), stock)
        .await?;
    Ok(Json(product.into()))
}

fn outcome(result: Result<(), saga::CapabilityError>) -> bool {
    match result {
        Ok(()) => {
            metrics::counter!("capability_requests_total", "capability" => "inventory", "outcome" => "approved")
                .increment(1);
            true
        }
        Err(error) => {
            metrics::counter!("capability_requests_total", "capability" => "inventory", "outcome" => error.kind())
                .increment(1);
            tracing::info!(%error, "inventory request declined");
            false
        }
    }
}
