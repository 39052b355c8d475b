//! Reservation client contract.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;

use crate::domain::reservations::{
    errors::ReservationError,
    models::{CartSnapshot, ReservationLine, ReservationToken, TransferTarget},
};

#[automock]
#[async_trait]
/// The external system holding real-world reservations (seats, order lines)
/// for cart items.
///
/// Timeouts are the implementation's concern; callers only see errors.
pub trait ReservationClient: Send + Sync {
    /// Fetch the remote cart for a session, `None` when it has none.
    async fn get_cart_snapshot(
        &self,
        token: &ReservationToken,
    ) -> Result<Option<CartSnapshot>, ReservationError>;

    /// When the session's held tickets expire, if it holds any.
    async fn get_expiration(
        &self,
        token: &ReservationToken,
    ) -> Result<Option<Timestamp>, ReservationError>;

    /// Release the given lines in one call.
    async fn bulk_release(
        &self,
        token: &ReservationToken,
        lines: &[ReservationLine],
    ) -> Result<(), ReservationError>;

    /// Move the remote session to an account, or swap it for a fresh one.
    async fn transfer_session(&self, target: &TransferTarget) -> Result<(), ReservationError>;
}
