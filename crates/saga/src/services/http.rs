//! HTTP clients for remote payment and inventory capabilities.
//!
//! Remote endpoints accept a JSON body and answer with a JSON boolean:
//! `true` is success, `false` is a business decline.

use std::time::Duration;

use async_trait::async_trait;
use common::{CustomerId, Money, OrderId, ProductId};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::inventory::InventoryService;
use super::payment::PaymentService;
use crate::error::CapabilityError;

/// Body of `POST /api/payments/process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPaymentRequest {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub amount_cents: i64,
}

/// Body of `POST /api/payments/refund`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundPaymentRequest {
    pub order_id: OrderId,
}

/// Body of `POST /api/inventory/update` and `POST /api/inventory/compensate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRequest {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
}

fn build_client(timeout: Duration) -> Result<Client, CapabilityError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CapabilityError::Transport(e.to_string()))
}

/// Posts a request and maps the response to a step outcome.
async fn post_for_outcome<B: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    timeout: Duration,
    body: &B,
) -> Result<(), CapabilityError> {
    let response = client.post(url).json(body).send().await.map_err(|e| {
        if e.is_timeout() {
            CapabilityError::Timeout(timeout)
        } else {
            CapabilityError::Transport(e.to_string())
        }
    })?;

    let status = response.status();
    if status.is_success() {
        let approved: bool = response
            .json()
            .await
            .map_err(|e| CapabilityError::Transport(format!("invalid response from {url}: {e}")))?;
        return if approved {
            Ok(())
        } else {
            Err(CapabilityError::Declined(format!("{url} declined the request")))
        };
    }

    match status {
        StatusCode::NOT_FOUND => Err(CapabilityError::NotFound {
            resource: "endpoint",
            id: url.to_string(),
        }),
        s if s.is_server_error() => Err(CapabilityError::Transport(format!("{url} returned {s}"))),
        s => Err(CapabilityError::Declined(format!("{url} returned {s}"))),
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Payment capability backed by a remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpPaymentClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPaymentClient {
    /// Creates a client for the service at `base_url`, with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CapabilityError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PaymentService for HttpPaymentClient {
    #[tracing::instrument(skip(self, customer_id, amount), fields(base_url = %self.base_url))]
    async fn process_payment(
        &self,
        order_id: OrderId,
        customer_id: &CustomerId,
        amount: Money,
    ) -> Result<(), CapabilityError> {
        let body = ProcessPaymentRequest {
            order_id,
            customer_id: customer_id.clone(),
            amount_cents: amount.cents(),
        };
        post_for_outcome(
            &self.client,
            &endpoint(&self.base_url, "/api/payments/process"),
            self.timeout,
            &body,
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn refund_payment(&self, order_id: OrderId) -> Result<(), CapabilityError> {
        post_for_outcome(
            &self.client,
            &endpoint(&self.base_url, "/api/payments/refund"),
            self.timeout,
            &RefundPaymentRequest { order_id },
        )
        .await
    }
}

/// Inventory capability backed by a remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpInventoryClient {
    /// Creates a client for the service at `base_url`, with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CapabilityError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl InventoryService for HttpInventoryClient {
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn reserve(
        &self,
        order_id: OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CapabilityError> {
        let body = InventoryRequest {
            order_id,
            product_id: product_id.clone(),
            quantity,
        };
        post_for_outcome(
            &self.client,
            &endpoint(&self.base_url, "/api/inventory/update"),
            self.timeout,
            &body,
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn release(
        &self,
        order_id: OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CapabilityError> {
        let body = InventoryRequest {
            order_id,
            product_id: product_id.clone(),
            quantity,
        };
        post_for_outcome(
            &self.client,
            &endpoint(&self.base_url, "/api/inventory/compensate"),
            self.timeout,
            &body,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://localhost:8080/", "/api/payments/process"),
            "http://localhost:8080/api/payments/process"
        );
        assert_eq!(
            endpoint("http://localhost:8080", "/api/inventory/update"),
            "http://localhost:8080/api/inventory/update"
        );
    }

    #[test]
    fn test_request_wire_format() {
        let order_id = OrderId::new();
        let body = ProcessPaymentRequest {
            order_id,
            customer_id: CustomerId::new("cust-1"),
            amount_cents: 5000,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["order_id"], order_id.to_string());
        assert_eq!(json["customer_id"], "cust-1");
        assert_eq!(json["amount_cents"], 5000);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client =
            HttpPaymentClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let result = client.refund_payment(OrderId::new()).await;
        assert!(result.unwrap_err().is_transient());
    }
}
