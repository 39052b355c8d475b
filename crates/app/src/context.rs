//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::{DatabaseConfig, ReservationConfig},
    database::{self, Db},
    domain::{
        carts::{CartStore, CartsService, PgCartItemsRepository},
        products::{
            ProductRegistry,
            variants::{PgPackages, PgTickets, PgVouchers},
        },
        reservations::{HttpReservationClient, ReservationClient, ReservationError},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to build reservation client")]
    Reservations(#[source] ReservationError),
}

/// Wired services for the binary.
#[derive(Clone)]
pub struct AppContext {
    pub db: Db,
    pub packages: Arc<PgPackages>,
    pub tickets: Arc<PgTickets>,
    pub vouchers: Arc<PgVouchers>,
    pub carts: Arc<dyn CartsService>,
}

impl AppContext {
    /// Connect to the database and the reservation system and build the cart store.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or building
    /// the reservation client fails.
    pub async fn from_config(
        database: &DatabaseConfig,
        reservations: &ReservationConfig,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(&database.database_url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);

        let reservations: Arc<dyn ReservationClient> = Arc::new(
            HttpReservationClient::new(reservations.client_config())
                .map_err(AppInitError::Reservations)?,
        );

        let vouchers = Arc::new(PgVouchers::new(db.clone()));
        let tickets = Arc::new(PgTickets::new(db.clone(), Arc::clone(&reservations)));
        let packages = Arc::new(PgPackages::new(db.clone()));

        let registry = ProductRegistry::new()
            .with(vouchers.clone())
            .with(tickets.clone())
            .with(packages.clone());

        let carts = CartStore::new(
            Arc::new(PgCartItemsRepository::new(db.clone())),
            registry,
            reservations,
        );

        Ok(Self {
            db,
            packages,
            tickets,
            vouchers,
            carts: Arc::new(carts),
        })
    }
}
