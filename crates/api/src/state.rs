//! Shared application state and capability wiring.

use std::sync::Arc;

use order_store::OrderStore;
use saga::{
    ApprovalRate, CapabilityError, HttpInventoryClient, HttpPaymentClient,
    InMemoryInventoryService, InMemoryPaymentService, InventoryService, PaymentService,
    SagaOrchestrator, StepPolicy,
};

use crate::config::Config;

/// Orchestrator type used by the server: capabilities are chosen at startup.
pub type Orchestrator<S> =
    SagaOrchestrator<S, Arc<dyn PaymentService>, Arc<dyn InventoryService>>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    /// Runs order sagas and owns the order store.
    pub orchestrator: Arc<Orchestrator<S>>,
    /// In-process payment service behind `/api/payments`.
    pub payments: InMemoryPaymentService,
    /// In-process inventory service behind `/api/inventory`.
    pub inventory: InMemoryInventoryService,
}

impl<S: OrderStore + 'static> AppState<S> {
    /// Builds state where the saga calls the in-process services directly.
    pub fn in_process(
        store: S,
        payments: InMemoryPaymentService,
        inventory: InMemoryInventoryService,
        policy: StepPolicy,
    ) -> Self {
        let payment: Arc<dyn PaymentService> = Arc::new(payments.clone());
        let inventory_capability: Arc<dyn InventoryService> = Arc::new(inventory.clone());
        Self::with_capabilities(store, payment, inventory_capability, payments, inventory, policy)
    }

    /// Builds state with explicit saga capabilities.
    pub fn with_capabilities(
        store: S,
        payment: Arc<dyn PaymentService>,
        inventory_capability: Arc<dyn InventoryService>,
        payments: InMemoryPaymentService,
        inventory: InMemoryInventoryService,
        policy: StepPolicy,
    ) -> Self {
        let orchestrator =
            SagaOrchestrator::new(store, payment, inventory_capability).with_policy(policy);
        Self {
            orchestrator: Arc::new(orchestrator),
            payments,
            inventory,
        }
    }

    pub fn store(&self) -> &S {
        self.orchestrator.store()
    }
}

/// Creates the default application state from configuration.
///
/// The in-process services decide charges and refunds with the configured
/// approval rates. The saga uses them unless a remote service URL is set,
/// in which case it calls that service over HTTP.
pub fn create_default_state<S: OrderStore + 'static>(
    store: S,
    config: &Config,
) -> Result<Arc<AppState<S>>, CapabilityError> {
    let payments = InMemoryPaymentService::with_outcomes(
        ApprovalRate::new(config.payment_approval_rate),
        ApprovalRate::new(config.refund_approval_rate),
    );
    let inventory = InMemoryInventoryService::new();

    let payment: Arc<dyn PaymentService> = match &config.payment_service_url {
        Some(url) => {
            tracing::info!(%url, "using remote payment service");
            Arc::new(HttpPaymentClient::new(url.as_str(), config.capability_timeout)?)
        }
        None => Arc::new(payments.clone()),
    };
    let inventory_capability: Arc<dyn InventoryService> = match &config.inventory_service_url {
        Some(url) => {
            tracing::info!(%url, "using remote inventory service");
            Arc::new(HttpInventoryClient::new(url.as_str(), config.capability_timeout)?)
        }
        None => Arc::new(inventory.clone()),
    };

    Ok(Arc::new(AppState::with_capabilities(
        store,
        payment,
        inventory_capability,
        payments,
        inventory,
        config.step_policy(),
    )))
}
