//! Login hand-over of anonymous carts.

use tracing::debug;

use crate::domain::{
    carts::{errors::CartsServiceError, service::CartsService},
    owners::{AccountId, SessionKey},
};

/// Raised by the authentication flow after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginEvent {
    pub account: AccountId,

    /// Session key captured before the anonymous session was discarded.
    pub anonymous_session_key: Option<SessionKey>,
}

/// Move the anonymous cart recorded in `event`, if any, to the account.
///
/// # Errors
///
/// Returns the error from [`CartsService::transfer_to_account`].
pub async fn handle_login(
    carts: &dyn CartsService,
    event: LoginEvent,
) -> Result<usize, CartsServiceError> {
    let Some(session) = event.anonymous_session_key else {
        debug!(account = %event.account, "login without an anonymous cart");

        return Ok(0);
    };

    carts.transfer_to_account(&session, event.account).await
}
