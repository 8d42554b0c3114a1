//! Vault access audit logging.
//!
//! Records every gated vault operation, including reveals that passed the
//! gate but could not open the item. The log is append-only and never holds
//! passwords, keys or credential contents.
//! Supports pluggable sinks for forwarding records to files or other stores.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sink that receives audit records. Implement this to forward records
/// to a file, database or log shipper.
pub trait AuditSink: Send {
    /// Append a record. Called for every gated operation.
    fn append(&mut self, record: AuditRecord);
}

/// What the caller attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    SetPassword,
    Verify,
    Create,
    Reveal,
    Update,
    Delete,
}

/// How the access ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    /// The gate rejected the vault password.
    Denied,
    /// The gate passed but the item could not be opened: sealed under an
    /// earlier vault password, or corrupted at rest.
    Failed,
}

/// A permanent record of one vault access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// The authenticated account that made the call.
    pub user_id: String,
    /// The vault item touched, if the action targets one.
    pub item_id: Option<String>,
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    /// When the access occurred.
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn now(
        user_id: impl Into<String>,
        item_id: Option<String>,
        action: AuditAction,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            item_id,
            action,
            outcome,
            timestamp: Utc::now(),
        }
    }
}

/// An append-only log of vault accesses.
/// Can forward records to additional sinks via `add_forward_sink`.
#[derive(Default)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
    forward_sinks: Vec<Box<dyn AuditSink>>,
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("records", &self.records.len())
            .field("forward_sinks", &self.forward_sinks.len())
            .finish()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink to receive a copy of every record.
    pub fn add_forward_sink(&mut self, sink: Box<dyn AuditSink>) {
        self.forward_sinks.push(sink);
    }

    /// Append a new record to the log and forward to any attached sinks.
    pub fn append(&mut self, record: AuditRecord) {
        for sink in self.forward_sinks.iter_mut() {
            sink.append(record.clone());
        }
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AuditRecord> {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Built-in sink: file
// ---------------------------------------------------------------------------

/// Writes audit records as JSON lines (one per record) to a file.
/// Creates the file if it doesn't exist; appends if it does.
pub struct FileAuditSink {
    file: std::fs::File,
}

impl FileAuditSink {
    /// Open or create a file for append-only audit logging.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }
}

impl AuditSink for FileAuditSink {
    fn append(&mut self, record: AuditRecord) {
        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialise audit record");
                return;
            }
        };
        if let Err(e) = writeln!(self.file, "{line}").and_then(|_| self.file.flush()) {
            tracing::warn!(error = %e, "failed to write audit record");
        }
    }
}
