//! Envelope sealing and opening.
//!
//! An envelope is the triple (ciphertext, salt, IV) that, together with the
//! vault password, reconstructs one stored credential. Sealing is applied
//! in this order:
//!
//! ```text
//! salt, iv  <- SystemRandom            (fresh every call)
//! key       <- PBKDF2(password, salt)
//! blob      <- JSON(credential)
//! cipher    <- AES-256-CBC(blob, key, iv)
//! envelope  =  base64(cipher), base64(salt), base64(iv)
//! ```
//!
//! Opening runs the same steps backwards. The codec performs no
//! authentication of its own; callers gate access with
//! [`PasswordGate`](crate::gate::PasswordGate) first.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{self, IV_LEN, MIN_SALT_LEN};
use crate::error::VaultError;
use crate::keys;

// ---------------------------------------------------------------------------
// Plaintext credential
// ---------------------------------------------------------------------------

/// One credential as the owner sees it. Exists only in memory during
/// seal/open and is zeroised on drop.
///
/// Serialises to the canonical flat JSON object
/// `{"website", "username", "password", "notes"}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PlaintextCredential {
    pub website: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PlaintextCredential {
    pub fn new(
        website: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            website: website.into(),
            username: username.into(),
            password: password.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check the fields every stored credential must carry.
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.website.trim().is_empty() {
            return Err(VaultError::invalid("website is required"));
        }
        if self.username.is_empty() {
            return Err(VaultError::invalid("username is required"));
        }
        if self.password.is_empty() {
            return Err(VaultError::invalid("password is required"));
        }
        Ok(())
    }
}

impl fmt::Debug for PlaintextCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaintextCredential")
            .field("website", &self.website)
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .field("notes", &self.notes.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The stored form of one sealed credential. All three fields are standard
/// base64 text, ready for a text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// AES-256-CBC output. Older records name this field `encryptedData`.
    #[serde(alias = "encryptedData")]
    pub ciphertext: String,
    /// Per-item KDF salt.
    pub salt: String,
    /// Per-item CBC initialization vector, 16 raw bytes.
    pub iv: String,
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, VaultError> {
    STANDARD
        .decode(value)
        .map_err(|_| VaultError::invalid(format!("{name} is not valid base64")))
}

/// Encrypt a credential under a vault password.
///
/// A fresh salt and IV are drawn for every call, so sealing the same
/// credential twice never yields the same envelope. The derived key and the
/// serialised plaintext are zeroised before this returns.
pub fn seal(vault_password: &str, credential: &PlaintextCredential) -> Result<Envelope, VaultError> {
    if vault_password.is_empty() {
        return Err(VaultError::invalid("vault password is required"));
    }
    credential.validate()?;

    let salt = crypto::generate_salt()?;
    let iv = crypto::generate_iv()?;
    let key = keys::derive_key(vault_password, &salt)?;

    let plaintext = Zeroizing::new(
        serde_json::to_vec(credential).map_err(|_| VaultError::EncryptionFailure)?,
    );
    let ciphertext = crypto::encrypt_blob(&plaintext, key.as_bytes(), &iv)?;

    tracing::debug!(ciphertext_len = ciphertext.len(), "sealed vault envelope");

    Ok(Envelope {
        ciphertext: STANDARD.encode(ciphertext),
        salt: STANDARD.encode(salt),
        iv: STANDARD.encode(iv),
    })
}

/// Decrypt an envelope with a vault password.
///
/// - Empty password, undecodable or wrongly sized salt/IV: `InvalidParameter`.
/// - Cipher rejects the bytes: `InvalidPasswordOrCorruptData`.
/// - Bytes decrypt but are not a credential: `MalformedEnvelope`.
///
/// Without an authentication tag a wrong password very occasionally gets
/// through the padding check; the parse step then almost always rejects it.
pub fn open(vault_password: &str, envelope: &Envelope) -> Result<PlaintextCredential, VaultError> {
    if vault_password.is_empty() {
        return Err(VaultError::invalid("vault password is required"));
    }
    let salt = decode_field("salt", &envelope.salt)?;
    let iv = decode_field("iv", &envelope.iv)?;
    let ciphertext = decode_field("ciphertext", &envelope.ciphertext)?;

    if salt.len() < MIN_SALT_LEN {
        return Err(VaultError::invalid(format!(
            "salt must be at least {MIN_SALT_LEN} bytes"
        )));
    }
    if iv.len() != IV_LEN {
        return Err(VaultError::invalid(format!("iv must be {IV_LEN} bytes")));
    }

    let key = keys::derive_key(vault_password, &salt)?;
    let plaintext = crypto::decrypt_blob(&ciphertext, key.as_bytes(), &iv).map_err(|e| match e {
        VaultError::DecryptionFailure => VaultError::InvalidPasswordOrCorruptData,
        other => other,
    })?;

    serde_json::from_slice::<PlaintextCredential>(&plaintext).map_err(|_| {
        tracing::warn!("envelope decrypted but did not parse as a credential");
        VaultError::MalformedEnvelope
    })
}
