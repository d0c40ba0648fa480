//! Typed keys of the key-value store.
//!
//! Local keys live in the shared `local` scope and survive restarts.
//! Session keys live in a `session:<id>` scope tied to the visitor's session
//! cookie; the scope is created on first write, cleared on logout and purged
//! once idle for a day.

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::models::{AdminAccount, AdminSession, Booking, CmsContent, SessionUser};

pub const LOCAL_SCOPE: &str = "local";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }

    pub fn scope(&self) -> String {
        format!("session:{}", self.0)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub trait StorageKey {
    type Value: Serialize + DeserializeOwned + Send + Sync;
    const NAME: &'static str;
}

/// Key stored in the shared local scope.
pub trait LocalKey: StorageKey {}

/// Key stored per session.
pub trait SessionKey: StorageKey {}

macro_rules! storage_key {
    ($name:ident, $scope:ident, $key:literal, $value:ty) => {
        pub struct $name;

        impl StorageKey for $name {
            type Value = $value;
            const NAME: &'static str = $key;
        }

        impl $scope for $name {}
    };
}

storage_key!(BookingsKey, LocalKey, "bookings", Vec<Booking>);
storage_key!(CmsDataKey, LocalKey, "sapphire-cms-data", CmsContent);
storage_key!(AdminsKey, LocalKey, "sapphire-admins", Vec<AdminAccount>);
storage_key!(AdminUserKey, SessionKey, "adminUser", AdminSession);
storage_key!(SapphireUserKey, SessionKey, "sapphire-user", SessionUser);
storage_key!(IsAdminAuthenticatedKey, SessionKey, "isAdminAuthenticated", bool);
