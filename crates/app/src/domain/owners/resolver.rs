//! Ownership resolution

use uuid::Uuid;

use crate::domain::owners::{
    errors::OwnerError,
    models::{AccountId, Owner, SessionKey},
};

/// The "current actor" as handed over by the presentation layer.
///
/// A signed-in visitor still carries a session, so both fields may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    pub account: Option<Uuid>,
    pub session_key: Option<String>,
}

impl Actor {
    #[must_use]
    pub fn account(account: Uuid) -> Self {
        Self {
            account: Some(account),
            session_key: None,
        }
    }

    #[must_use]
    pub fn session(session_key: impl Into<String>) -> Self {
        Self {
            account: None,
            session_key: Some(session_key.into()),
        }
    }
}

/// Map an actor to the owner its cart items belong to.
///
/// An authenticated account always wins over the session it is browsing with.
///
/// # Errors
///
/// Returns [`OwnerError::InvalidOwnerKind`] when the actor carries neither an
/// account nor a usable session key.
pub fn resolve_owner(actor: &Actor) -> Result<Owner, OwnerError> {
    match (actor.account, actor.session_key.as_deref()) {
        (Some(account), _) => Ok(Owner::AuthenticatedUser(AccountId::from_uuid(account))),
        (None, Some(key)) => SessionKey::new(key).map(Owner::AnonymousSession),
        (None, None) => Err(OwnerError::InvalidOwnerKind),
    }
}

impl TryFrom<&Actor> for Owner {
    type Error = OwnerError;

    fn try_from(actor: &Actor) -> Result<Self, Self::Error> {
        resolve_owner(actor)
    }
}
