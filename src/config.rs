//! Vault configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty document is a
//! valid configuration. The PBKDF2 iteration count is not configurable: it
//! is part of the envelope format.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Argon2id costs for hashing vault passwords.
    #[serde(default)]
    pub gate: GateConfig,

    /// Audit log forwarding.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Argon2id costs used when a new vault password is hashed. Verification
/// always uses the costs embedded in the stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    /// Number of passes.
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

// argon2 crate defaults (OWASP minimum for Argon2id).
fn default_memory_kib() -> u32 {
    argon2::Params::DEFAULT_M_COST
}

fn default_iterations() -> u32 {
    argon2::Params::DEFAULT_T_COST
}

fn default_parallelism() -> u32 {
    argon2::Params::DEFAULT_P_COST
}

/// Where audit records go besides the in-memory log.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Append records as JSON lines to this file.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl GateConfig {
    /// Build Argon2 parameters, rejecting combinations the algorithm refuses.
    pub(crate) fn params(&self) -> Result<argon2::Params, VaultError> {
        argon2::Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| VaultError::invalid(format!("argon2 parameters: {e}")))
    }

    /// Validate the costs. Values below the defaults are accepted with a
    /// warning so that tests and constrained hosts can lower them.
    pub fn validate(&self) -> Result<(), VaultError> {
        self.params()?;

        let recommended = GateConfig::default();
        if self.memory_kib < recommended.memory_kib {
            tracing::warn!(
                memory_kib = self.memory_kib,
                recommended = recommended.memory_kib,
                "argon2 memory below recommended value"
            );
        }
        if self.iterations < recommended.iterations {
            tracing::warn!(
                iterations = self.iterations,
                recommended = recommended.iterations,
                "argon2 iterations below recommended value"
            );
        }
        Ok(())
    }
}

impl VaultConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, VaultError> {
        let config: Self = toml::from_str(input).map_err(|e| VaultError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VaultError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), VaultError> {
        self.gate.validate()
    }
}
