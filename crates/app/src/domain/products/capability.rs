//! Product capability contract.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::{
    owners::AccountId,
    products::{
        errors::ProductError,
        records::{ProductRef, ProductTypeTag, ProductUuid},
    },
    reservations::{ReservationLine, ReservationToken},
};

/// Free-form attributes passed through to a product's add-to-cart hook.
pub type ExtraAttrs = serde_json::Map<String, serde_json::Value>;

/// Behaviour every cart-eligible product variant provides.
///
/// Hooks run to completion before the cart continues; any latency of the
/// systems behind them is the product's concern.
#[async_trait]
pub trait Product: Debug + Send + Sync {
    fn product_ref(&self) -> ProductRef;

    fn title(&self) -> String;

    fn description(&self) -> String;

    /// Cost in minor currency units.
    fn cost(&self) -> u64;

    /// The external hold backing this product, if it has one.
    fn reservation_line(&self) -> Option<ReservationLine> {
        None
    }

    /// Called before a cart item is created for this product.
    ///
    /// Returns [`ProductError::PendingConflict`] when an external task for
    /// the product is already in flight.
    async fn add_to_cart(
        &self,
        token: &ReservationToken,
        attrs: &ExtraAttrs,
    ) -> Result<(), ProductError>;

    async fn checkout_callback(&self, token: &ReservationToken) -> Result<(), ProductError>;

    /// Re-register whatever the product holds under the given account.
    async fn transfer_to_user(&self, account: AccountId) -> Result<(), ProductError>;

    /// Release external resources before the product record is deleted.
    async fn delete_callback(&self, token: &ReservationToken) -> Result<(), ProductError>;
}

/// Storage for one product variant, keyed by its type tag.
#[async_trait]
pub trait ProductKind: Debug + Send + Sync {
    fn tag(&self) -> ProductTypeTag;

    /// Load a product, `None` when its record no longer exists.
    async fn load(&self, uuid: ProductUuid) -> Result<Option<Box<dyn Product>>, ProductError>;

    /// Delete a product record, returning the number of rows removed.
    async fn delete(&self, uuid: ProductUuid) -> Result<u64, ProductError>;
}
