//! Ticket expiration reconciliation.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use jiff::Timestamp;
use smallvec::SmallVec;
use tracing::{debug, error, info, warn};

use crate::domain::{
    carts::{errors::CartsServiceError, models::CartItem, repositories::CartItemsRepository},
    owners::Owner,
    products::ProductRegistry,
    reservations::{ReservationClient, ReservationLine, ReservationToken},
};

/// What to do with ticket items when their expiration cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenUnavailable {
    Keep,
    Evict,
}

/// Outcome of reconciling an owner's tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    NoTickets,
    Live { expires_at: Option<Timestamp> },
    Evicted { count: usize },
    Unchecked,
}

/// Evicts ticket items whose reservation has lapsed.
///
/// Local state wins: once tickets are deemed expired their product records and
/// cart items are deleted even if the reservation system refuses the release.
pub(crate) struct ExpirationReconciler {
    repository: Arc<dyn CartItemsRepository>,
    registry: ProductRegistry,
    reservations: Arc<dyn ReservationClient>,
}

impl ExpirationReconciler {
    pub(crate) fn new(
        repository: Arc<dyn CartItemsRepository>,
        registry: ProductRegistry,
        reservations: Arc<dyn ReservationClient>,
    ) -> Self {
        Self {
            repository,
            registry,
            reservations,
        }
    }

    /// Compare the owner's ticket holds against `now`, evicting them once expired.
    pub(crate) async fn reconcile(
        &self,
        owner: &Owner,
        token: &ReservationToken,
        now: Timestamp,
        when_unavailable: WhenUnavailable,
    ) -> Result<Reconciliation, CartsServiceError> {
        let tickets = self.tickets(owner).await?;

        if tickets.is_empty() {
            return Ok(Reconciliation::NoTickets);
        }

        match self.reservations.get_expiration(token).await {
            Ok(Some(expires_at)) if expires_at < now => {
                info!(%owner, %expires_at, "ticket reservations expired");

                let count = self.evict(owner, token, &tickets).await?;

                Ok(Reconciliation::Evicted { count })
            }
            Ok(expires_at) => Ok(Reconciliation::Live { expires_at }),
            Err(error) => match when_unavailable {
                WhenUnavailable::Keep => {
                    warn!(%owner, error = %error, "could not read ticket expiration");

                    Ok(Reconciliation::Unchecked)
                }
                WhenUnavailable::Evict => {
                    warn!(%owner, error = %error, "could not read ticket expiration, evicting tickets");

                    let count = self.evict(owner, token, &tickets).await?;

                    Ok(Reconciliation::Evicted { count })
                }
            },
        }
    }

    /// Evict every ticket item of the owner without consulting the expiration.
    pub(crate) async fn evict_tickets(
        &self,
        owner: &Owner,
        token: &ReservationToken,
    ) -> Result<usize, CartsServiceError> {
        let tickets = self.tickets(owner).await?;

        if tickets.is_empty() {
            return Ok(0);
        }

        self.evict(owner, token, &tickets).await
    }

    async fn tickets(&self, owner: &Owner) -> Result<Vec<CartItem>, CartsServiceError> {
        let items = self.repository.list_items(owner, false).await?;

        Ok(items
            .into_iter()
            .filter(|item| item.product.is_ticket())
            .collect())
    }

    async fn evict(
        &self,
        owner: &Owner,
        token: &ReservationToken,
        tickets: &[CartItem],
    ) -> Result<usize, CartsServiceError> {
        let mut lines: SmallVec<[ReservationLine; 4]> = SmallVec::new();

        for item in tickets {
            match self.registry.resolve(&item.product).await {
                Ok(Some(product)) => lines.extend(product.reservation_line()),
                Ok(None) => debug!(item_uuid = %item.uuid, "ticket record already gone"),
                Err(error) => {
                    warn!(item_uuid = %item.uuid, product = %item.product, error = %error, "could not resolve ticket");
                }
            }
        }

        // One release call covers the whole subset in place of per-item delete hooks.
        if !lines.is_empty()
            && let Err(error) = self.reservations.bulk_release(token, &lines).await
        {
            error!(
                %owner,
                line_count = lines.len(),
                error = %error,
                "bulk release failed, evicting locally"
            );
        }

        let mut evicted = 0;

        for item in tickets {
            if let Err(error) = self.registry.delete(&item.product).await {
                warn!(item_uuid = %item.uuid, product = %item.product, error = %error, "could not delete ticket record");
            }

            match self.repository.delete_item(owner, item.uuid).await {
                Ok(0) => {}
                Ok(_) => evicted += 1,
                Err(error) => {
                    warn!(item_uuid = %item.uuid, error = %error, "could not delete evicted cart item");
                }
            }
        }

        info!(%owner, evicted, "evicted ticket items");

        Ok(evicted)
    }
}

impl Debug for ExpirationReconciler {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExpirationReconciler")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
