//! Test context for service-level tests.

use std::sync::Arc;

use jiff::Timestamp;

use crate::domain::{
    carts::{
        CartItemsRepository, CartStore,
        models::{CartItem, CartItemUuid},
        reconciler::ExpirationReconciler,
    },
    owners::Owner,
    products::{ProductRef, ProductRegistry, ProductTypeTag},
    reservations::{MockReservationClient, ReservationClient, ReservationToken},
};

use super::{memory::MemoryCartItemsRepository, products::FakeProductKind};

/// A [`CartStore`] over in-memory storage and recording product kinds, with
/// the given mock standing in for the reservation system.
pub(crate) struct TestContext {
    pub(crate) repository: Arc<MemoryCartItemsRepository>,
    pub(crate) registry: ProductRegistry,
    pub(crate) reservations: Arc<dyn ReservationClient>,
    pub(crate) vouchers: Arc<FakeProductKind>,
    pub(crate) tickets: Arc<FakeProductKind>,
    pub(crate) packages: Arc<FakeProductKind>,
    pub(crate) token: ReservationToken,
    pub(crate) carts: CartStore,
}

impl TestContext {
    pub(crate) fn new(reservations: MockReservationClient) -> Self {
        let repository = Arc::new(MemoryCartItemsRepository::new());
        let reservations: Arc<dyn ReservationClient> = Arc::new(reservations);

        let vouchers = Arc::new(FakeProductKind::new(ProductTypeTag::VOUCHER));
        let tickets = Arc::new(FakeProductKind::new(ProductTypeTag::TICKET));
        let packages = Arc::new(FakeProductKind::new(ProductTypeTag::PACKAGE));

        let registry = ProductRegistry::new()
            .with(vouchers.clone())
            .with(tickets.clone())
            .with(packages.clone());

        let carts = CartStore::new(
            repository.clone(),
            registry.clone(),
            Arc::clone(&reservations),
        );

        Self {
            repository,
            registry,
            reservations,
            vouchers,
            tickets,
            packages,
            token: ReservationToken::new("token-1"),
            carts,
        }
    }

    /// Insert a cart item directly, bypassing hooks and reconciliation.
    pub(crate) fn seed(&self, owner: &Owner, product: ProductRef) -> CartItem {
        let now = Timestamp::now();

        let item = CartItem {
            uuid: CartItemUuid::new(),
            owner: owner.clone(),
            product,
            is_paid: false,
            created_at: now,
            updated_at: now,
        };

        self.repository.insert(item.clone());

        item
    }

    /// A second store over the same storage and collaborators, standing in
    /// for another process.
    pub(crate) fn another_store(&self) -> CartStore {
        CartStore::new(
            self.repository.clone(),
            self.registry.clone(),
            Arc::clone(&self.reservations),
        )
    }

    /// A reconciler sharing this context's storage and collaborators.
    pub(crate) fn reconciler(&self) -> ExpirationReconciler {
        let repository: Arc<dyn CartItemsRepository> = self.repository.clone();

        ExpirationReconciler::new(
            repository,
            self.registry.clone(),
            Arc::clone(&self.reservations),
        )
    }
}
