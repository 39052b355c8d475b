//! Owner errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OwnerError {
    #[error("actor is neither an authenticated account nor a live session")]
    InvalidOwnerKind,
}
