//! Reservation Models

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::domain::owners::AccountId;

/// Session token the reservation system knows the shopper by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationToken(String);

impl ReservationToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ReservationToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// One held seat (or order line) in the reservation system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationLine {
    pub performance_no: i64,
    pub line_seq_no: i64,
}

/// The reservation system's view of the shopper's remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Handling charges in minor currency units.
    pub handling_charges: u64,

    /// Lines whose reservation task is still being processed.
    #[serde(default)]
    pub pending_lines: Vec<ReservationLine>,
}

impl CartSnapshot {
    #[must_use]
    pub fn is_pending(&self, line: ReservationLine) -> bool {
        self.pending_lines.contains(&line)
    }
}

/// Who a remote session should be handed over to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferTarget {
    /// Re-register the session's holds under an account.
    Account(AccountId),

    /// Swap the session for a fresh one, dropping its remote cart.
    Session(ReservationToken),
}
