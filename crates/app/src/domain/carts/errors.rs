//! Carts service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    owners::OwnerError,
    products::{ProductError, ProductRef, ProductTypeTag},
    reservations::ReservationError,
};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("actor is neither an account nor a session")]
    InvalidOwnerKind,

    /// An external task for the product is still in flight; retry the add.
    #[error("product {0} has a pending external task")]
    PendingConflict(ProductRef),

    #[error("cart item not found")]
    NotFound,

    #[error("reservation system unavailable")]
    ReservationUnavailable(#[source] ReservationError),

    #[error("no product kind registered for type `{0}`")]
    UnknownProductType(ProductTypeTag),

    #[error("product hook failed")]
    Product(#[source] ProductError),

    #[error("cart item already exists")]
    AlreadyExists,

    #[error("related resource not found")]
    InvalidReference,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl CartsServiceError {
    /// Whether the caller may retry the same operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PendingConflict(_) | Self::ReservationUnavailable(_)
        )
    }
}

impl From<Error> for CartsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(_) | None => Self::Sql(error),
        }
    }
}

impl From<OwnerError> for CartsServiceError {
    fn from(error: OwnerError) -> Self {
        match error {
            OwnerError::InvalidOwnerKind => Self::InvalidOwnerKind,
        }
    }
}

impl From<ReservationError> for CartsServiceError {
    fn from(error: ReservationError) -> Self {
        Self::ReservationUnavailable(error)
    }
}

impl From<ProductError> for CartsServiceError {
    fn from(error: ProductError) -> Self {
        match error {
            ProductError::UnknownType(tag) => Self::UnknownProductType(tag),
            ProductError::Reservation(error) => Self::ReservationUnavailable(error),
            ProductError::Sql(error) => Self::from(error),
            other => Self::Product(other),
        }
    }
}
