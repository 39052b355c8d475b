//! Cart Models

use jiff::Timestamp;

use crate::{
    domain::{
        owners::{Owner, SessionKey},
        products::ProductRef,
    },
    uuids::TypedUuid,
};

/// Title shown for an item whose product record no longer exists.
pub const REMOVED_ITEM_TITLE: &str = "Removed item";

/// Cart Item Record
#[derive(Debug)]
pub struct CartItemRecord;

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItemRecord>;

/// CartItem Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub uuid: CartItemUuid,
    pub owner: Owner,
    pub product: ProductRef,
    pub is_paid: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartItem {
    /// Session key the item is held under, `None` once it belongs to an account.
    #[must_use]
    pub const fn session_key(&self) -> Option<&SessionKey> {
        self.owner.session_key()
    }
}

/// NewCartItem Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub uuid: CartItemUuid,
    pub owner: Owner,
    pub product: ProductRef,
}

/// One rendered cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item: CartItemUuid,
    pub product: ProductRef,
    pub title: String,
    pub cost: u64,
}

impl CartLine {
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.title == REMOVED_ITEM_TITLE
    }
}

/// Cart Summary Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub sub_total: u64,
    pub fees: u64,
    pub total: u64,

    /// When the reservation system will drop the cart's ticket holds.
    pub expires_at: Option<Timestamp>,
}

impl CartSummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
