//! Gated vault operations.
//!
//! [`VaultService`] is the boundary the request handlers call. It composes
//! the password gate, the envelope codec, the store and the audit log:
//!
//! 1. Verify the vault password against the stored hash (Gate)
//! 2. Seal or open the envelope (Codec)
//! 3. Persist the record (Store)
//! 4. Append to the audit log
//!
//! Every operation that exposes plaintext or mutates an item passes the gate
//! first. The codec itself trusts its caller.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::audit::{AuditAction, AuditLog, AuditOutcome, AuditRecord, AuditSink};
use crate::config::VaultConfig;
use crate::envelope::{self, PlaintextCredential};
use crate::error::VaultError;
use crate::gate::PasswordGate;
use crate::store::{ItemId, UserId, VaultItem, VaultStore};

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

/// Body of a create or update call.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ItemRequest {
    pub vault_password: String,
    pub data: PlaintextCredential,
}

impl ItemRequest {
    pub fn new(vault_password: impl Into<String>, data: PlaintextCredential) -> Self {
        Self {
            vault_password: vault_password.into(),
            data,
        }
    }

    pub fn validate(&self) -> Result<(), VaultError> {
        if self.vault_password.is_empty() {
            return Err(VaultError::invalid("vault password is required"));
        }
        self.data.validate()
    }
}

/// Body of a delete call.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct DeleteRequest {
    pub vault_password: String,
}

impl DeleteRequest {
    pub fn new(vault_password: impl Into<String>) -> Self {
        Self {
            vault_password: vault_password.into(),
        }
    }
}

/// The listing view of an item: no envelope, nothing secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub website: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&VaultItem> for ItemSummary {
    fn from(item: &VaultItem) -> Self {
        Self {
            id: item.id,
            website: item.website.clone(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Shared, thread-safe entry point for vault operations.
///
/// Build one at process start and hand clones of the `Arc` to handlers.
/// Seal and open are CPU-bound (PBKDF2 dominates); async callers should run
/// them on a blocking pool.
pub struct VaultService<S: VaultStore> {
    store: Arc<S>,
    gate: PasswordGate,
    audit: Mutex<AuditLog>,
}

impl<S: VaultStore> VaultService<S> {
    pub fn new(store: Arc<S>, gate: PasswordGate) -> Self {
        Self {
            store,
            gate,
            audit: Mutex::new(AuditLog::new()),
        }
    }

    /// Build a service from configuration, attaching the file audit sink if
    /// one is configured.
    pub fn from_config(store: Arc<S>, config: &VaultConfig) -> Result<Self, VaultError> {
        let service = Self::new(store, PasswordGate::new(config.gate)?);
        if let Some(path) = &config.audit.file {
            let sink = crate::audit::FileAuditSink::new(path)
                .map_err(|e| VaultError::Config(format!("{}: {e}", path.display())))?;
            service.add_audit_sink(Box::new(sink));
        }
        Ok(service)
    }

    /// Forward every audit record to `sink` as well.
    pub fn add_audit_sink(&self, sink: Box<dyn AuditSink>) {
        if let Ok(mut log) = self.audit.lock() {
            log.add_forward_sink(sink);
        }
    }

    /// Run `f` against the audit log.
    pub fn with_audit_log<R>(&self, f: impl FnOnce(&AuditLog) -> R) -> Result<R, VaultError> {
        let log = self
            .audit
            .lock()
            .map_err(|_| VaultError::Storage("audit lock poisoned".to_string()))?;
        Ok(f(&log))
    }

    fn record(
        &self,
        user: &UserId,
        item: Option<ItemId>,
        action: AuditAction,
        outcome: AuditOutcome,
    ) {
        let item = item.map(|id| id.to_string());
        let record = AuditRecord::now(user.as_str(), item, action, outcome);
        match self.audit.lock() {
            Ok(mut log) => log.append(record),
            Err(_) => tracing::error!(user = %user, ?action, "audit lock poisoned, record dropped"),
        }
    }

    /// Verify the vault password and audit the outcome.
    fn check_gate(
        &self,
        user: &UserId,
        item: Option<ItemId>,
        action: AuditAction,
        vault_password: &str,
    ) -> Result<(), VaultError> {
        let stored = self.store.vault_password(user)?;
        match self.gate.require(vault_password, stored.as_ref()) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(user = %user, ?action, "vault password rejected");
                self.record(user, item, action, AuditOutcome::Denied);
                Err(e)
            }
        }
    }

    fn owned_item(&self, user: &UserId, id: ItemId) -> Result<VaultItem, VaultError> {
        self.store
            .item(user, id)?
            .ok_or_else(|| VaultError::ItemNotFound(id.to_string()))
    }

    /// Set (or reset) the user's vault password.
    ///
    /// Existing items are not re-encrypted. They stay sealed under the old
    /// password and can no longer be opened with the new one.
    pub fn set_vault_password(&self, user: &UserId, new_password: &str) -> Result<(), VaultError> {
        let hash = self.gate.set_vault_password(new_password)?;

        let existing = self.store.items(user)?.len();
        if existing > 0 {
            tracing::warn!(
                user = %user,
                items = existing,
                "vault password replaced; existing items remain sealed under the old password"
            );
        }

        self.store.put_vault_password(user, hash)?;
        self.record(user, None, AuditAction::SetPassword, AuditOutcome::Success);
        tracing::info!(user = %user, "vault password set");
        Ok(())
    }

    /// Check a vault password without touching any item.
    pub fn verify_vault_password(&self, user: &UserId, candidate: &str) -> Result<(), VaultError> {
        self.check_gate(user, None, AuditAction::Verify, candidate)?;
        self.record(user, None, AuditAction::Verify, AuditOutcome::Success);
        Ok(())
    }

    /// Seal a new credential and store it.
    pub fn create_item(&self, user: &UserId, request: &ItemRequest) -> Result<ItemId, VaultError> {
        request.validate()?;
        self.check_gate(user, None, AuditAction::Create, &request.vault_password)?;

        let envelope = envelope::seal(&request.vault_password, &request.data)?;
        let now = Utc::now();
        let item = VaultItem {
            id: ItemId::new_random(),
            user_id: user.clone(),
            website: request.data.website.clone(),
            envelope,
            created_at: now,
            updated_at: now,
        };
        let id = item.id;
        self.store.insert_item(item)?;

        self.record(user, Some(id), AuditAction::Create, AuditOutcome::Success);
        tracing::info!(user = %user, item = %id, "vault item created");
        Ok(id)
    }

    /// List the user's items, sorted by website.
    pub fn list_items(&self, user: &UserId) -> Result<Vec<ItemSummary>, VaultError> {
        let mut summaries: Vec<ItemSummary> =
            self.store.items(user)?.iter().map(ItemSummary::from).collect();
        summaries.sort_by(|a, b| a.website.cmp(&b.website));
        Ok(summaries)
    }

    /// The encrypted record, for callers that open envelopes client-side.
    pub fn fetch_item(&self, user: &UserId, id: ItemId) -> Result<VaultItem, VaultError> {
        self.owned_item(user, id)
    }

    /// Verify the vault password, then open one item.
    pub fn reveal_item(
        &self,
        user: &UserId,
        id: ItemId,
        vault_password: &str,
    ) -> Result<PlaintextCredential, VaultError> {
        self.check_gate(user, Some(id), AuditAction::Reveal, vault_password)?;
        let item = self.owned_item(user, id)?;

        let credential = envelope::open(vault_password, &item.envelope).map_err(|e| {
            tracing::warn!(user = %user, item = %id, error = %e, "vault item failed to open");
            self.record(user, Some(id), AuditAction::Reveal, AuditOutcome::Failed);
            e
        })?;

        self.record(user, Some(id), AuditAction::Reveal, AuditOutcome::Success);
        Ok(credential)
    }

    /// Re-seal an item with new contents. Salt, IV and ciphertext are all
    /// replaced; nothing is patched in place.
    pub fn update_item(
        &self,
        user: &UserId,
        id: ItemId,
        request: &ItemRequest,
    ) -> Result<(), VaultError> {
        request.validate()?;
        self.check_gate(user, Some(id), AuditAction::Update, &request.vault_password)?;
        let existing = self.owned_item(user, id)?;

        let item = VaultItem {
            website: request.data.website.clone(),
            envelope: envelope::seal(&request.vault_password, &request.data)?,
            updated_at: Utc::now(),
            ..existing
        };
        if !self.store.replace_item(item)? {
            return Err(VaultError::ItemNotFound(id.to_string()));
        }

        self.record(user, Some(id), AuditAction::Update, AuditOutcome::Success);
        tracing::info!(user = %user, item = %id, "vault item updated");
        Ok(())
    }

    /// Verify the vault password, then delete one item.
    pub fn delete_item(
        &self,
        user: &UserId,
        id: ItemId,
        request: &DeleteRequest,
    ) -> Result<(), VaultError> {
        if request.vault_password.is_empty() {
            return Err(VaultError::invalid("vault password is required"));
        }
        self.check_gate(user, Some(id), AuditAction::Delete, &request.vault_password)?;

        if !self.store.remove_item(user, id)? {
            return Err(VaultError::ItemNotFound(id.to_string()));
        }

        self.record(user, Some(id), AuditAction::Delete, AuditOutcome::Success);
        tracing::info!(user = %user, item = %id, "vault item deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateConfig;
    use crate::store::InMemoryStore;

    fn service() -> VaultService<InMemoryStore> {
        let gate = PasswordGate::new(GateConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        VaultService::new(Arc::new(InMemoryStore::new()), gate)
    }

    #[test]
    fn test_create_requires_vault_setup() {
        let svc = service();
        let user = UserId::new("u1");
        let request = ItemRequest::new("pw", PlaintextCredential::new("a.com", "me", "x"));

        assert!(matches!(
            svc.create_item(&user, &request),
            Err(VaultError::GateVerificationFailed)
        ));
        assert_eq!(svc.with_audit_log(|log| log.len()).unwrap(), 1);
    }

    #[test]
    fn test_missing_fields_rejected_before_gate() {
        let svc = service();
        let user = UserId::new("u2");
        svc.set_vault_password(&user, "pw").unwrap();

        let request = ItemRequest::new("pw", PlaintextCredential::new("a.com", "me", ""));
        assert!(matches!(
            svc.create_item(&user, &request),
            Err(VaultError::InvalidParameter(_))
        ));
        // Only the SetPassword record; validation failures are not accesses.
        assert_eq!(svc.with_audit_log(|log| log.len()).unwrap(), 1);
    }

    #[test]
    fn test_list_is_sorted_and_secret_free() {
        let svc = service();
        let user = UserId::new("u3");
        svc.set_vault_password(&user, "pw").unwrap();

        for site in ["zeta.io", "alpha.io", "mid.io"] {
            let request = ItemRequest::new("pw", PlaintextCredential::new(site, "me", "x"));
            svc.create_item(&user, &request).unwrap();
        }

        let listed: Vec<String> = svc
            .list_items(&user)
            .unwrap()
            .into_iter()
            .map(|s| s.website)
            .collect();
        assert_eq!(listed, vec!["alpha.io", "mid.io", "zeta.io"]);

        let json = serde_json::to_string(&svc.list_items(&user).unwrap()).unwrap();
        assert!(!json.contains("ciphertext"));
        assert!(!json.contains("salt"));
    }

    #[test]
    fn test_update_keeps_identity_and_reseals() {
        let svc = service();
        let user = UserId::new("u4");
        svc.set_vault_password(&user, "pw").unwrap();

        let original = PlaintextCredential::new("a.com", "me", "old");
        let id = svc
            .create_item(&user, &ItemRequest::new("pw", original))
            .unwrap();
        let before = svc.fetch_item(&user, id).unwrap();

        let updated = PlaintextCredential::new("b.com", "me", "new").with_notes("rotated");
        svc.update_item(&user, id, &ItemRequest::new("pw", updated.clone()))
            .unwrap();
        let after = svc.fetch_item(&user, id).unwrap();

        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.website, "b.com");
        assert_ne!(after.envelope.salt, before.envelope.salt);
        assert_ne!(after.envelope.iv, before.envelope.iv);
        assert_eq!(svc.reveal_item(&user, id, "pw").unwrap(), updated);
    }

    #[test]
    fn test_unknown_item_is_not_found() {
        let svc = service();
        let user = UserId::new("u5");
        svc.set_vault_password(&user, "pw").unwrap();
        let ghost = ItemId::new_random();

        assert!(matches!(svc.fetch_item(&user, ghost), Err(VaultError::ItemNotFound(_))));
        assert!(matches!(
            svc.reveal_item(&user, ghost, "pw"),
            Err(VaultError::ItemNotFound(_))
        ));
        assert!(matches!(
            svc.delete_item(&user, ghost, &DeleteRequest::new("pw")),
            Err(VaultError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_request_deserialises_from_json() {
        let body = r#"{
            "vault_password": "pw",
            "data": {"website": "a.com", "username": "me", "password": "x"}
        }"#;
        let request: ItemRequest = serde_json::from_str(body).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.data.notes, None);
    }
}
