//! Inventory capability trait and in-memory implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CapabilityError;

/// Reserves and releases product stock.
///
/// Operations are keyed by `(order_id, product_id)` so that repeating a
/// reserve never decrements twice and repeating a release never restores
/// twice.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Reserves `quantity` units of a product for an order.
    async fn reserve(
        &self,
        order_id: OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CapabilityError>;

    /// Returns the units reserved for an order to stock.
    async fn release(
        &self,
        order_id: OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CapabilityError>;
}

#[async_trait]
impl<T: InventoryService + ?Sized> InventoryService for Arc<T> {
    async fn reserve(
        &self,
        order_id: OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CapabilityError> {
        (**self).reserve(order_id, product_id, quantity).await
    }

    async fn release(
        &self,
        order_id: OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CapabilityError> {
        (**self).release(order_id, product_id, quantity).await
    }
}

/// A catalog product with its available stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub stock: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReservationStatus {
    Reserved,
    Released,
}

#[derive(Debug, Clone)]
struct Reservation {
    reservation_id: String,
    quantity: u32,
    status: ReservationStatus,
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    products: BTreeMap<ProductId, Product>,
    reservations: HashMap<(OrderId, ProductId), Reservation>,
    next_id: u32,
    reserve_calls: HashMap<OrderId, u32>,
    release_calls: HashMap<OrderId, u32>,
    latency: Option<Duration>,
}

/// In-process inventory service with a product catalog and a reservation ledger.
///
/// Stock never goes negative: a reserve that cannot be covered fails with
/// `InsufficientStock` and leaves stock untouched. A release that would push
/// stock past `u32::MAX` is declined the same way.
///
/// Nothing is ever evicted: the reservation ledger and the per-order call
/// counters behind [`reserve_attempts`](Self::reserve_attempts) and
/// [`release_attempts`](Self::release_attempts) grow with every order seen.
/// Counters saturate at `u32::MAX`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryService {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryService {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inventory holding the given products.
    pub async fn with_products(products: impl IntoIterator<Item = NewProduct>) -> Self {
        let service = Self::new();
        {
            let mut state = service.state.write().await;
            for product in products {
                let product = Self::build_product(product);
                state.products.insert(product.id.clone(), product);
            }
        }
        service
    }

    fn build_product(new: NewProduct) -> Product {
        let now = Utc::now();
        Product {
            id: new.id,
            name: new.name,
            description: new.description,
            price: new.price,
            stock: new.stock,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a product to the catalog. Fails if the ID is taken.
    pub async fn create_product(&self, new: NewProduct) -> Result<Product, CapabilityError> {
        let mut state = self.state.write().await;
        if state.products.contains_key(&new.id) {
            return Err(CapabilityError::Declined(format!(
                "product {} already exists",
                new.id
            )));
        }

        let product = Self::build_product(new);
        state.products.insert(product.id.clone(), product.clone());
        tracing::info!(product_id = %product.id, stock = product.stock, "product created");
        Ok(product)
    }

    /// Overwrites a product's available stock.
    pub async fn set_stock(
        &self,
        product_id: &ProductId,
        stock: u32,
    ) -> Result<Product, CapabilityError> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(product_id)
            .ok_or_else(|| product_not_found(product_id))?;
        product.stock = stock;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    pub async fn get_product(&self, product_id: &ProductId) -> Option<Product> {
        self.state.read().await.products.get(product_id).cloned()
    }

    /// All products, ordered by ID.
    pub async fn list_products(&self) -> Vec<Product> {
        self.state.read().await.products.values().cloned().collect()
    }

    /// Products with stock above zero, ordered by ID.
    pub async fn available_products(&self) -> Vec<Product> {
        self.state
            .read()
            .await
            .products
            .values()
            .filter(|product| product.stock > 0)
            .cloned()
            .collect()
    }

    pub async fn product_count(&self) -> usize {
        self.state.read().await.products.len()
    }

    /// Current stock of a product, if it exists.
    pub async fn stock_of(&self, product_id: &ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .products
            .get(product_id)
            .map(|product| product.stock)
    }

    /// Number of reservations currently holding stock.
    pub async fn active_reservations(&self) -> usize {
        self.state
            .read()
            .await
            .reservations
            .values()
            .filter(|reservation| reservation.status == ReservationStatus::Reserved)
            .count()
    }

    /// Number of `reserve` calls received for an order.
    pub async fn reserve_attempts(&self, order_id: OrderId) -> u32 {
        self.state
            .read()
            .await
            .reserve_calls
            .get(&order_id)
            .copied()
            .unwrap_or(0)
    }

    /// Number of `release` calls received for an order.
    pub async fn release_attempts(&self, order_id: OrderId) -> u32 {
        self.state
            .read()
            .await
            .release_calls
            .get(&order_id)
            .copied()
            .unwrap_or(0)
    }

    /// Delays every subsequent reserve and release by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().await.latency = latency;
    }

    async fn simulate_latency(&self) {
        let latency = self.state.read().await.latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn product_not_found(product_id: &ProductId) -> CapabilityError {
    CapabilityError::NotFound {
        resource: "product",
        id: product_id.to_string(),
    }
}

#[async_trait]
impl InventoryService for InMemoryInventoryService {
    #[tracing::instrument(skip(self))]
    async fn reserve(
        &self,
        order_id: OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CapabilityError> {
        self.simulate_latency().await;

        let mut state = self.state.write().await;
        let calls = state.reserve_calls.entry(order_id).or_default();
        *calls = calls.saturating_add(1);

        let key = (order_id, product_id.clone());
        if let Some(existing) = state.reservations.get(&key) {
            return match existing.status {
                ReservationStatus::Reserved => {
                    tracing::warn!(reservation_id = %existing.reservation_id, "stock already reserved for order");
                    Ok(())
                }
                ReservationStatus::Released => Err(CapabilityError::Declined(format!(
                    "reservation {} was released",
                    existing.reservation_id
                ))),
            };
        }

        let product = state
            .products
            .get_mut(product_id)
            .ok_or_else(|| product_not_found(product_id))?;

        if product.stock < quantity {
            metrics::counter!("inventory_reservations_total", "outcome" => "insufficient_stock")
                .increment(1);
            return Err(CapabilityError::InsufficientStock {
                product_id: product_id.clone(),
                available: product.stock,
                requested: quantity,
            });
        }

        product.stock -= quantity;
        product.updated_at = Utc::now();
        let remaining = product.stock;

        state.next_id += 1;
        let reservation_id = format!("RES-{:04}", state.next_id);
        state.reservations.insert(
            key,
            Reservation {
                reservation_id: reservation_id.clone(),
                quantity,
                status: ReservationStatus::Reserved,
            },
        );

        metrics::counter!("inventory_reservations_total", "outcome" => "reserved").increment(1);
        tracing::info!(%reservation_id, remaining, "stock reserved");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn release(
        &self,
        order_id: OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CapabilityError> {
        self.simulate_latency().await;

        let mut state = self.state.write().await;
        let calls = state.release_calls.entry(order_id).or_default();
        *calls = calls.saturating_add(1);

        let key = (order_id, product_id.clone());
        let reservation = state
            .reservations
            .get(&key)
            .cloned()
            .ok_or_else(|| CapabilityError::NotFound {
                resource: "reservation",
                id: format!("{order_id}/{product_id}"),
            })?;

        if reservation.status == ReservationStatus::Released {
            tracing::warn!(reservation_id = %reservation.reservation_id, "reservation already released");
            return Ok(());
        }
        if reservation.quantity != quantity {
            return Err(CapabilityError::Declined(format!(
                "reservation {} holds {} units, release asked for {}",
                reservation.reservation_id, reservation.quantity, quantity
            )));
        }

        let product = state
            .products
            .get_mut(product_id)
            .ok_or_else(|| product_not_found(product_id))?;
        let current = product.stock;
        let restored = current.checked_add(reservation.quantity).ok_or_else(|| {
            CapabilityError::Declined(format!(
                "releasing {} units of {product_id} would overflow stock {current}",
                reservation.quantity
            ))
        })?;
        product.stock = restored;
        product.updated_at = Utc::now();

        if let Some(entry) = state.reservations.get_mut(&key) {
            entry.status = ReservationStatus::Released;
        }

        metrics::counter!("inventory_releases_total").increment(1);
        tracing::info!(reservation_id = %reservation.reservation_id, "stock released");
        Ok(())
    }
}
