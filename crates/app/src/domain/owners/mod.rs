//! Cart Owners

pub mod errors;
pub mod models;
pub mod resolver;

pub use errors::OwnerError;
pub use models::{AccountId, Owner, OwnerKind, SessionKey};
pub use resolver::{Actor, resolve_owner};
