//! Vault password gate.
//!
//! The vault password is hashed with Argon2id and stored as a self-describing
//! PHC string (algorithm, costs, salt and digest). This hash authenticates
//! possession of the vault password. It is never used to derive the envelope
//! key: that is PBKDF2 over a per-item salt, see `keys`.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Version};
use serde::{Deserialize, Serialize};

use crate::config::GateConfig;
use crate::error::VaultError;

/// A stored vault password hash in PHC string format.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultPasswordHash(String);

impl VaultPasswordHash {
    /// Wrap a hash read back from storage.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VaultPasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultPasswordHash(..)")
    }
}

const DECOY_PASSWORD: &str = "credvault-decoy";

/// Hashes and verifies vault passwords.
#[derive(Debug, Clone)]
pub struct PasswordGate {
    config: GateConfig,
    /// Verified against when a user has no vault, hashed with this gate's
    /// costs so both paths cost the same.
    decoy: VaultPasswordHash,
}

impl PasswordGate {
    /// Validate the costs and hash the decoy. Fails if either step fails, so
    /// a constructed gate always has a decoy to verify against.
    pub fn new(config: GateConfig) -> Result<Self, VaultError> {
        config.validate()?;
        let mut gate = Self {
            config,
            decoy: VaultPasswordHash(String::new()),
        };
        gate.decoy = gate.set_vault_password(DECOY_PASSWORD)?;
        Ok(gate)
    }

    fn hasher(&self) -> Result<Argon2<'static>, VaultError> {
        Ok(Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            self.config.params()?,
        ))
    }

    /// Hash a new vault password with a fresh random salt.
    pub fn set_vault_password(&self, new_password: &str) -> Result<VaultPasswordHash, VaultError> {
        if new_password.is_empty() {
            return Err(VaultError::invalid("vault password is required"));
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()?
            .hash_password(new_password.as_bytes(), &salt)
            .map_err(|_| VaultError::PasswordHashFailure)?;
        Ok(VaultPasswordHash(hash.to_string()))
    }

    /// Check a candidate against a stored hash.
    ///
    /// Comparison is delegated to the argon2 crate, which compares digests in
    /// constant time. A hash that does not parse verifies as `false`.
    pub fn verify_vault_password(&self, candidate: &str, stored: &VaultPasswordHash) -> bool {
        let Ok(parsed) = PasswordHash::new(stored.as_str()) else {
            return false;
        };
        // Costs come from the stored hash, not from our config.
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }

    /// Gate an operation on the vault password.
    ///
    /// A missing hash (no such user, or no vault set up) still runs a full
    /// verification against a throwaway hash, so callers see the same error
    /// and roughly the same latency either way.
    pub fn require(
        &self,
        candidate: &str,
        stored: Option<&VaultPasswordHash>,
    ) -> Result<(), VaultError> {
        let verified = match stored {
            Some(hash) => self.verify_vault_password(candidate, hash),
            None => {
                let _ = self.verify_vault_password(candidate, &self.decoy);
                false
            }
        };

        if verified {
            Ok(())
        } else {
            Err(VaultError::GateVerificationFailed)
        }
    }
}
