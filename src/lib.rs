//! # credvault
//!
//! Password-derived envelope encryption for stored credentials.
//!
//! Each credential is sealed under a key stretched from the user's vault
//! password and a fresh per-item salt, then encrypted with a fresh IV. The
//! envelope (ciphertext, salt, IV) is all that is stored; the key never is.
//! A separate Argon2id hash of the vault password gates who may seal and
//! open at all.
//!
//! ## Public API
//!
//! - [`seal`] / [`open`]: the envelope codec.
//! - [`PasswordGate`]: vault password hashing and verification.
//! - [`VaultService`]: gated create/list/reveal/update/delete over a
//!   [`VaultStore`].
//!
//! All primitives are synchronous, CPU-bound and hold no shared state.

pub mod audit;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod gate;
pub mod keys;
pub mod service;
pub mod store;

pub use config::{GateConfig, VaultConfig};
pub use envelope::{open, seal, Envelope, PlaintextCredential};
pub use error::VaultError;
pub use gate::{PasswordGate, VaultPasswordHash};
pub use keys::{derive_key_with, KDF_ITERATIONS};
pub use service::{DeleteRequest, ItemRequest, ItemSummary, VaultService};
pub use store::{InMemoryStore, ItemId, UserId, VaultItem, VaultStore};
