//! Carts

pub mod errors;
pub(crate) mod locks;
pub mod login;
pub mod models;
pub mod reconciler;
pub mod repositories;
pub mod service;
mod transfer;

pub use errors::CartsServiceError;
pub use login::{LoginEvent, handle_login};
pub use repositories::{CartItemsRepository, OwnerLease, PgCartItemsRepository};
pub use service::*;
