//! Reservations

pub mod client;
pub mod errors;
pub mod http;
pub mod models;

pub use client::*;
pub use errors::ReservationError;
pub use http::{HttpReservationClient, HttpReservationConfig};
pub use models::{CartSnapshot, ReservationLine, ReservationToken, TransferTarget};
