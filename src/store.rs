//! Persistence seam.
//!
//! The vault core does not care which database holds its records. Anything
//! implementing [`VaultStore`] can back a [`VaultService`](crate::service::VaultService);
//! envelopes and hashes are opaque strings to it. A store is created once at
//! process start and shared behind an `Arc`, so every method takes `&self`
//! and implementations bring their own synchronisation.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::Envelope;
use crate::error::VaultError;
use crate::gate::VaultPasswordHash;

/// An account identifier supplied by the identity provider. Trusted as
/// already authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A vault item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for ItemId {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| VaultError::invalid("item id is not a uuid"))
    }
}

/// One stored, encrypted credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultItem {
    pub id: ItemId,
    pub user_id: UserId,
    /// Plaintext label, kept unencrypted for listing and search.
    pub website: String,
    #[serde(flatten)]
    pub envelope: Envelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storage for vault password hashes and vault items.
pub trait VaultStore: Send + Sync {
    /// The user's vault password hash, if one has been set.
    fn vault_password(&self, user: &UserId) -> Result<Option<VaultPasswordHash>, VaultError>;

    /// Store or replace the user's vault password hash.
    fn put_vault_password(&self, user: &UserId, hash: VaultPasswordHash) -> Result<(), VaultError>;

    fn insert_item(&self, item: VaultItem) -> Result<(), VaultError>;

    /// The item with `id`, only if it belongs to `user`.
    fn item(&self, user: &UserId, id: ItemId) -> Result<Option<VaultItem>, VaultError>;

    /// Every item belonging to `user`, in no particular order.
    fn items(&self, user: &UserId) -> Result<Vec<VaultItem>, VaultError>;

    /// Replace an existing item wholesale. Returns `false` if no item with
    /// that id belongs to the item's user.
    fn replace_item(&self, item: VaultItem) -> Result<bool, VaultError>;

    /// Returns `false` if no item with that id belongs to `user`.
    fn remove_item(&self, user: &UserId, id: ItemId) -> Result<bool, VaultError>;
}

#[derive(Default)]
struct Tables {
    passwords: HashMap<UserId, VaultPasswordHash>,
    items: HashMap<ItemId, VaultItem>,
}

/// A process-local store. Useful for tests and single-node deployments.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, VaultError> {
        self.tables
            .read()
            .map_err(|_| VaultError::Storage("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, VaultError> {
        self.tables
            .write()
            .map_err(|_| VaultError::Storage("store lock poisoned".to_string()))
    }
}

impl VaultStore for InMemoryStore {
    fn vault_password(&self, user: &UserId) -> Result<Option<VaultPasswordHash>, VaultError> {
        Ok(self.read()?.passwords.get(user).cloned())
    }

    fn put_vault_password(&self, user: &UserId, hash: VaultPasswordHash) -> Result<(), VaultError> {
        self.write()?.passwords.insert(user.clone(), hash);
        Ok(())
    }

    fn insert_item(&self, item: VaultItem) -> Result<(), VaultError> {
        let mut tables = self.write()?;
        if tables.items.contains_key(&item.id) {
            return Err(VaultError::Storage(format!("duplicate item id {}", item.id)));
        }
        tables.items.insert(item.id, item);
        Ok(())
    }

    fn item(&self, user: &UserId, id: ItemId) -> Result<Option<VaultItem>, VaultError> {
        Ok(self
            .read()?
            .items
            .get(&id)
            .filter(|item| &item.user_id == user)
            .cloned())
    }

    fn items(&self, user: &UserId) -> Result<Vec<VaultItem>, VaultError> {
        Ok(self
            .read()?
            .items
            .values()
            .filter(|item| &item.user_id == user)
            .cloned()
            .collect())
    }

    fn replace_item(&self, item: VaultItem) -> Result<bool, VaultError> {
        let mut tables = self.write()?;
        match tables.items.get_mut(&item.id) {
            Some(existing) if existing.user_id == item.user_id => {
                *existing = item;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn remove_item(&self, user: &UserId, id: ItemId) -> Result<bool, VaultError> {
        let mut tables = self.write()?;
        let owned = tables
            .items
            .get(&id)
            .is_some_and(|item| &item.user_id == user);
        if owned {
            tables.items.remove(&id);
        }
        Ok(owned)
    }
}
