//! Product errors.

use sqlx::Error;
use thiserror::Error;

use crate::domain::{products::records::ProductTypeTag, reservations::ReservationError};

#[derive(Debug, Error)]
pub enum ProductError {
    /// An external task for this product is already in flight; retry later.
    #[error("an external task for this product is still pending")]
    PendingConflict,

    #[error("no product kind registered for type `{0}`")]
    UnknownType(ProductTypeTag),

    #[error("product rejected the operation: {0}")]
    Rejected(String),

    #[error("reservation system error")]
    Reservation(#[from] ReservationError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ProductError {
    fn from(error: Error) -> Self {
        Self::Sql(error)
    }
}
