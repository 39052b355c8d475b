//! Anonymous-to-account cart transfer.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use tracing::{debug, info, warn};

use crate::domain::{
    carts::{errors::CartsServiceError, repositories::CartItemsRepository},
    owners::{AccountId, SessionKey},
    products::ProductRegistry,
};

pub(crate) struct TransferService {
    repository: Arc<dyn CartItemsRepository>,
    registry: ProductRegistry,
}

impl TransferService {
    pub(crate) fn new(repository: Arc<dyn CartItemsRepository>, registry: ProductRegistry) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// Move every item held under `session` to `account`, then let each
    /// product re-register its external holds. Returns the number of items
    /// moved; a repeat call finds nothing and returns zero.
    pub(crate) async fn transfer_to_account(
        &self,
        session: &SessionKey,
        account: AccountId,
    ) -> Result<usize, CartsServiceError> {
        let moved = self.repository.reassign_session(session, account).await?;

        for item in &moved {
            match self.registry.resolve(&item.product).await {
                Ok(Some(product)) => {
                    if let Err(error) = product.transfer_to_user(account).await {
                        warn!(
                            item_uuid = %item.uuid,
                            product = %item.product,
                            error = %error,
                            "transfer hook failed"
                        );
                    }
                }
                Ok(None) => debug!(item_uuid = %item.uuid, "transferred a removed item"),
                Err(error) => {
                    warn!(item_uuid = %item.uuid, product = %item.product, error = %error, "could not resolve product");
                }
            }
        }

        if !moved.is_empty() {
            info!(%account, moved = moved.len(), "moved session cart to account");
        }

        Ok(moved.len())
    }
}

impl Debug for TransferService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TransferService")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
