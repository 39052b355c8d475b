//! Reservation client errors.

use thiserror::Error;

/// Errors that can occur when talking to the reservation system.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// The reservation system is down, slow or refused the call.
    #[error("reservation system unavailable: {0}")]
    Unavailable(String),

    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The reservation system returned a non-2xx response or unexpected body.
    #[error("unexpected response from reservation system: {0}")]
    UnexpectedResponse(String),

    /// The configured base URL cannot carry path segments.
    #[error("invalid reservation api url: {0}")]
    InvalidUrl(String),
}
