//! Password-based key derivation.
//!
//! This module owns two responsibilities:
//! 1. Stretching a vault password plus a per-item salt into a symmetric key
//!    using PBKDF2-HMAC-SHA256.
//! 2. Holding derived key material in a type that is opaque, non-cloneable,
//!    and zeroised on drop.
//!
//! Together with `crypto` this is one of exactly two modules permitted to
//! import `ring` directly.
//!
//! ## Derivation structure
//!
//! ```text
//! PBKDF2-HMAC-SHA256(
//!     password   = vault password (UTF-8 bytes),
//!     salt       = per-item random salt,
//!     iterations = 100_000,
//!     dk_len     = 32
//! )
//! ```
//!
//! Derivation is deterministic. `open` reconstructs the exact key used at
//! `seal` time from the password and the stored salt; the key itself is
//! never stored.

use std::num::NonZeroU32;

use ring::pbkdf2;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::KEY_LEN;
use crate::error::VaultError;

/// PBKDF2 iteration count. A fixed security parameter: changing it changes
/// the key every existing envelope was sealed under.
pub const KDF_ITERATIONS: u32 = 100_000;

static PBKDF2_ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

// ---------------------------------------------------------------------------
// Derived key
// ---------------------------------------------------------------------------

/// A key derived from a vault password and one item's salt.
///
/// - Not `Clone`. Each derived key is scoped to a single seal or open call.
/// - Zeroised on drop.
/// - Raw bytes never leave the crate.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Borrow the raw key bytes for use in encrypt/decrypt operations.
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive a key of arbitrary length with explicit parameters.
///
/// `salt` is always supplied by the caller so that every vault item can
/// carry its own. Fails only on a zero iteration count or a zero-length key.
pub fn derive_key_with(
    password: &str,
    salt: &[u8],
    iterations: u32,
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    let iterations = NonZeroU32::new(iterations)
        .ok_or_else(|| VaultError::invalid("kdf iterations must be non-zero"))?;
    if key_len == 0 {
        return Err(VaultError::invalid("kdf key length must be non-zero"));
    }

    let mut out = Zeroizing::new(vec![0u8; key_len]);
    pbkdf2::derive(PBKDF2_ALGORITHM, iterations, salt, password.as_bytes(), &mut out);
    Ok(out)
}

/// Derive the 256-bit envelope key for one vault item.
///
/// Uses the fixed [`KDF_ITERATIONS`] and [`KEY_LEN`].
pub(crate) fn derive_key(password: &str, salt: &[u8]) -> Result<DerivedKey, VaultError> {
    let out = derive_key_with(password, salt, KDF_ITERATIONS, KEY_LEN)?;
    if out.len() != KEY_LEN {
        return Err(VaultError::KeyDerivationFailure);
    }
    // Written in place so the only copy is the one zeroised on drop.
    let mut key = DerivedKey {
        bytes: [0u8; KEY_LEN],
    };
    key.bytes.copy_from_slice(&out[..]);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbkdf2_sha256_known_answer() {
        let one = derive_key_with("password", b"salt", 1, 32).unwrap();
        assert_eq!(
            hex::encode(&*one),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );

        let two = derive_key_with("password", b"salt", 2, 32).unwrap();
        assert_eq!(
            hex::encode(&*two),
            "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let salt = [7u8; 32];
        let a = derive_key("hunter2", &salt).unwrap();
        let b = derive_key("hunter2", &salt).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_envelope_key_matches_explicit_derivation() {
        let salt = [4u8; 16];
        let key = derive_key("hunter2", &salt).unwrap();
        let explicit = derive_key_with("hunter2", &salt, KDF_ITERATIONS, KEY_LEN).unwrap();
        assert_eq!(&key.as_bytes()[..], &explicit[..]);
        assert_ne!(key.as_bytes(), &[0u8; KEY_LEN]);
    }

    #[test]
    fn test_password_and_salt_both_matter() {
        let base = derive_key_with("hunter2", &[1u8; 32], 10, 32).unwrap();
        let other_password = derive_key_with("hunter3", &[1u8; 32], 10, 32).unwrap();
        let other_salt = derive_key_with("hunter2", &[2u8; 32], 10, 32).unwrap();

        assert_ne!(*base, *other_password);
        assert_ne!(*base, *other_salt);
    }

    #[test]
    fn test_key_length_is_honoured() {
        let key = derive_key_with("pw", b"salt", 1, 64).unwrap();
        assert_eq!(key.len(), 64);
        // The first block of a longer output equals the shorter output.
        let short = derive_key_with("pw", b"salt", 1, 32).unwrap();
        assert_eq!(&key[..32], &short[..]);
    }

    #[test]
    fn test_rejects_zero_parameters() {
        assert!(matches!(
            derive_key_with("pw", b"salt", 0, 32),
            Err(VaultError::InvalidParameter(_))
        ));
        assert!(matches!(
            derive_key_with("pw", b"salt", 1, 0),
            Err(VaultError::InvalidParameter(_))
        ));
    }
}
