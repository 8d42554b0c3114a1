//! Error types for credvault.
//!
//! Every error variant is a distinct failure mode in the vault. Error
//! messages are intentionally minimal: they signal *what* failed without
//! carrying passwords, keys, plaintext or ciphertext.

/// The single error type for all credvault operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// A caller supplied a malformed value: wrong key/IV/salt length, bad
    /// base64, an empty required field. Always a caller bug.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The block cipher refused to encrypt.
    #[error("encryption failed")]
    EncryptionFailure,

    /// The block cipher rejected the ciphertext (bad padding or length).
    /// Raised by the cipher wrapper only; `open` translates it.
    #[error("decryption failed")]
    DecryptionFailure,

    /// Opening an envelope failed at the cipher step. Almost always a wrong
    /// vault password, occasionally corrupted storage.
    #[error("invalid password or corrupted data")]
    InvalidPasswordOrCorruptData,

    /// Decryption succeeded but the plaintext is not a credential record.
    #[error("malformed envelope")]
    MalformedEnvelope,

    /// The vault password did not verify. Also returned when the user has no
    /// vault password at all, so callers cannot enumerate vaults.
    #[error("invalid vault password")]
    GateVerificationFailed,

    /// PBKDF2 key derivation failed.
    #[error("key derivation failed")]
    KeyDerivationFailure,

    /// Argon2 hashing of a new vault password failed.
    #[error("password hashing failed")]
    PasswordHashFailure,

    /// The system's random number generator failed to produce bytes.
    #[error("randomness source failed")]
    RandomnessFailure,

    /// No vault item with this id belongs to the caller.
    #[error("vault item not found: {0}")]
    ItemNotFound(String),

    /// The persistence backend failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl VaultError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidParameter(what.into())
    }
}
