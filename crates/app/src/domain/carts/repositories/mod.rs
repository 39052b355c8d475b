//! Cart Repositories

use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;

use crate::domain::{
    carts::models::{CartItem, CartItemUuid, NewCartItem},
    owners::{AccountId, Owner, SessionKey},
};

mod items;

pub use items::PgCartItemsRepository;

/// Exclusive hold on one owner's cart, shared by every store over the same
/// storage. Released when dropped.
#[must_use = "the owner is unlocked as soon as the lease is dropped"]
pub struct OwnerLease {
    _hold: Box<dyn Send>,
}

impl OwnerLease {
    /// Wrap whatever keeps the owner locked until it is dropped.
    pub fn new(hold: impl Send + 'static) -> Self {
        Self {
            _hold: Box::new(hold),
        }
    }
}

impl Debug for OwnerLease {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OwnerLease").finish_non_exhaustive()
    }
}

/// Storage for cart item rows, always scoped to an owner.
#[async_trait]
pub trait CartItemsRepository: Send + Sync {
    /// Wait until no other holder has the owner's cart, then hold it.
    async fn lock_owner(&self, owner: &Owner) -> Result<OwnerLease, sqlx::Error>;

    /// Items for an owner in insertion order; paid items only when asked for.
    async fn list_items(
        &self,
        owner: &Owner,
        include_paid: bool,
    ) -> Result<Vec<CartItem>, sqlx::Error>;

    async fn get_item(
        &self,
        owner: &Owner,
        item: CartItemUuid,
    ) -> Result<Option<CartItem>, sqlx::Error>;

    async fn create_item(&self, item: NewCartItem) -> Result<CartItem, sqlx::Error>;

    /// Delete one of the owner's items, returning the number of rows removed.
    async fn delete_item(&self, owner: &Owner, item: CartItemUuid) -> Result<u64, sqlx::Error>;

    /// Flip the given unpaid items of an account to paid in one statement.
    async fn mark_paid(
        &self,
        account: AccountId,
        items: &[CartItemUuid],
    ) -> Result<u64, sqlx::Error>;

    /// Move every item held under a session key to an account.
    async fn reassign_session(
        &self,
        session: &SessionKey,
        account: AccountId,
    ) -> Result<Vec<CartItem>, sqlx::Error>;
}
