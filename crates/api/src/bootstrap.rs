//! Startup seeding of the sample product catalog.

use common::{Money, ProductId};
use saga::{CapabilityError, InMemoryInventoryService, NewProduct};

/// The sample catalog: smartphone, laptop and headphones.
pub fn sample_products() -> Vec<NewProduct> {
    vec![
        NewProduct {
            id: ProductId::new("PROD-001"),
            name: "Smartphone".to_string(),
            description: "Latest model smartphone".to_string(),
            price: Money::from_cents(69_999),
            stock: 50,
        },
        NewProduct {
            id: ProductId::new("PROD-002"),
            name: "Laptop".to_string(),
            description: "High-performance laptop".to_string(),
            price: Money::from_cents(129_999),
            stock: 30,
        },
        NewProduct {
            id: ProductId::new("PROD-003"),
            name: "Headphones".to_string(),
            description: "Wireless noise-cancelling headphones".to_string(),
            price: Money::from_cents(29_999),
            stock: 100,
        },
    ]
}

/// Seeds the sample catalog into an empty inventory.
///
/// Does nothing if any product already exists. Returns the number of
/// products created.
pub async fn seed_sample_products(
    inventory: &InMemoryInventoryService,
) -> Result<usize, CapabilityError> {
    if inventory.product_count().await > 0 {
        tracing::debug!("catalog already populated, skipping sample data");
        return Ok(0);
    }

    let mut created = 0;
    for product in sample_products() {
        inventory.create_product(product).await?;
        created += 1;
    }

    tracing::info!(created, "sample products seeded");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeds_empty_catalog() {
        let inventory = InMemoryInventoryService::new();

        let created = seed_sample_products(&inventory).await.unwrap();

        assert_eq!(created, 3);
        assert_eq!(
            inventory.stock_of(&ProductId::new("PROD-002")).await,
            Some(30)
        );
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let inventory = InMemoryInventoryService::new();
        seed_sample_products(&inventory).await.unwrap();
        inventory
            .set_stock(&ProductId::new("PROD-001"), 7)
            .await
            .unwrap();

        let created = seed_sample_products(&inventory).await.unwrap();

        assert_eq!(created, 0);
        assert_eq!(inventory.product_count().await, 3);
        assert_eq!(inventory.stock_of(&ProductId::new("PROD-001")).await, Some(7));
    }
}
