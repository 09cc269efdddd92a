//! HTTP API server for order placement and saga execution.
//!
//! Serves the order endpoints, the in-process payment and inventory
//! capabilities, health and Prometheus metrics, with structured logging
//! (tracing) throughout.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use state::{AppState, Orchestrator, create_default_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/api/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/api/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/api/orders/customer/{customer_id}",
            get(routes::orders::by_customer::<S>),
        )
        .route("/api/payments/process", post(routes::payments::process::<S>))
        .route("/api/payments/refund", post(routes::payments::refund::<S>))
        .route("/api/payments/{order_id}", get(routes::payments::get::<S>))
        .route("/api/inventory/update", post(routes::inventory::reserve::<S>))
        .route(
            "/api/inventory/compensate",
            post(routes::inventory::release::<S>),
        )
        .route(
            "/api/inventory/products",
            get(routes::inventory::list_products::<S>).post(routes::inventory::create_product::<S>),
        )
        .route(
            "/api/inventory/products/available",
            get(routes::inventory::available_products::<S>),
        )
        .route(
            "/api/inventory/products/{id}",
            get(routes::inventory::get_product::<S>),
        )
        .route(
            "/api/inventory/products/{id}/stock",
            put(routes::inventory::update_stock::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
