//! Low-level cryptographic operations.
//!
//! All other modules perform encryption and decryption exclusively through
//! the functions exposed here.
//!
//! Primitive choices:
//! - **Cipher**: AES-256-CBC with PKCS#7 padding (no authentication tag)
//! - **IV**: 128 bits (16 bytes), generated fresh per seal via `SystemRandom`
//! - **Salt**: 256 bits (32 bytes), generated fresh per seal via `SystemRandom`
//! - **Key size**: 256 bits (32 bytes)
//!
//! CBC is unauthenticated. A bad padding byte is the only signal that the
//! key was wrong or the bytes were altered, and flipping IV bits flips the
//! matching bits of the first plaintext block without any error at all.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use crate::error::VaultError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Size of the cipher key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Size of the initialization vector in bytes (one AES block).
pub const IV_LEN: usize = 16;

/// Size of the per-item salt generated by `seal`.
pub const SALT_LEN: usize = 32;

/// Shortest salt `open` will accept.
pub const MIN_SALT_LEN: usize = 16;

/// AES block size.
const BLOCK_LEN: usize = 16;

fn check_lengths(key: &[u8], iv: &[u8]) -> Result<(), VaultError> {
    if key.len() != KEY_LEN {
        return Err(VaultError::invalid(format!(
            "key must be {KEY_LEN} bytes, got {}",
            key.len()
        )));
    }
    if iv.len() != IV_LEN {
        return Err(VaultError::invalid(format!(
            "iv must be {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }
    Ok(())
}

/// Encrypt a plaintext blob with AES-256-CBC and PKCS#7 padding.
///
/// The output is always a non-empty multiple of 16 bytes. Wrong key or IV
/// lengths fail with `InvalidParameter`; nothing is truncated or padded.
pub fn encrypt_blob(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, VaultError> {
    check_lengths(key, iv)?;
    let cipher =
        Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| VaultError::EncryptionFailure)?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt an AES-256-CBC blob and strip its PKCS#7 padding.
///
/// Fails with `DecryptionFailure` when the ciphertext is empty, not
/// block-aligned, or unpads to garbage. That is the only signal separating
/// a wrong key from a right one.
pub fn decrypt_blob(
    ciphertext: &[u8],
    key: &[u8],
    iv: &[u8],
) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    check_lengths(key, iv)?;
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(VaultError::DecryptionFailure);
    }

    let cipher =
        Aes256CbcDec::new_from_slices(key, iv).map_err(|_| VaultError::DecryptionFailure)?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| VaultError::DecryptionFailure)?;
    Ok(Zeroizing::new(plaintext))
}

/// Fill a fixed-size buffer from the system CSPRNG.
///
/// `ring::rand::SystemRandom` is the only source of randomness in the crate.
/// There is no caching or counter-based generation.
fn random_bytes<const N: usize>() -> Result<[u8; N], VaultError> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; N];
    rng.fill(&mut buf).map_err(|_| VaultError::RandomnessFailure)?;
    Ok(buf)
}

/// Generate a fresh per-item salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN], VaultError> {
    random_bytes::<SALT_LEN>()
}

/// Generate a fresh IV. Never reused across seals.
pub fn generate_iv() -> Result<[u8; IV_LEN], VaultError> {
    random_bytes::<IV_LEN>()
}
