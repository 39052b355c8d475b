//! Owner Models

use std::fmt::{Display, Formatter, Result as FmtResult};

use uuid::Uuid;

use crate::{domain::owners::errors::OwnerError, uuids::TypedUuid};

/// Authenticated account marker.
#[derive(Debug)]
pub struct Account;

/// Account identifier
pub type AccountId = TypedUuid<Account>;

/// Key of an anonymous visitor's session.
///
/// The key outlives the session record it came from: the session store may
/// purge the session while cart items keyed by it wait to be transferred.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(String);

impl SessionKey {
    /// Wrap a raw session key.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerError::InvalidOwnerKind`] when the key is blank.
    pub fn new(key: impl Into<String>) -> Result<Self, OwnerError> {
        let key = key.into();

        if key.trim().is_empty() {
            return Err(OwnerError::InvalidOwnerKind);
        }

        Ok(Self(key))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Discriminator persisted alongside the owner key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    Account,
    Session,
}

impl OwnerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Session => "session",
        }
    }
}

/// Whoever a cart item belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    AuthenticatedUser(AccountId),
    AnonymousSession(SessionKey),
}

impl Owner {
    #[must_use]
    pub const fn kind(&self) -> OwnerKind {
        match self {
            Self::AuthenticatedUser(_) => OwnerKind::Account,
            Self::AnonymousSession(_) => OwnerKind::Session,
        }
    }

    /// Owner key as stored in the `owner_key` column.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::AuthenticatedUser(account) => account.to_string(),
            Self::AnonymousSession(session) => session.as_str().to_owned(),
        }
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::AnonymousSession(_))
    }

    #[must_use]
    pub const fn account(&self) -> Option<AccountId> {
        match self {
            Self::AuthenticatedUser(account) => Some(*account),
            Self::AnonymousSession(_) => None,
        }
    }

    #[must_use]
    pub const fn session_key(&self) -> Option<&SessionKey> {
        match self {
            Self::AuthenticatedUser(_) => None,
            Self::AnonymousSession(session) => Some(session),
        }
    }

    /// Rebuild an owner from its persisted `(owner_kind, owner_key)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerError::InvalidOwnerKind`] for an unknown discriminator,
    /// a malformed account id or a blank session key.
    pub fn from_parts(kind: &str, key: &str) -> Result<Self, OwnerError> {
        match kind {
            "account" => Uuid::parse_str(key)
                .ok()
                .map(|uuid| Self::AuthenticatedUser(AccountId::from_uuid(uuid)))
                .ok_or(OwnerError::InvalidOwnerKind),
            "session" => SessionKey::new(key).map(Self::AnonymousSession),
            _ => Err(OwnerError::InvalidOwnerKind),
        }
    }
}

impl Display for Owner {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.kind().as_str(), self.key())
    }
}
