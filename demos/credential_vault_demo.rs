//! Minimal example: a credential vault behind the password gate.
//!
//! Run with: `RUST_LOG=credvault=debug cargo run --example credential_vault_demo`
//!
//! - A user sets a vault password (stored only as an Argon2id hash)
//! - Credentials are sealed under it and stored as base64 envelopes
//! - Reading one back requires the vault password again
//! - Every gated access is audited to a JSON-lines file

use std::sync::Arc;

use credvault::{InMemoryStore, ItemRequest, PlaintextCredential, UserId, VaultConfig, VaultService};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1. Setup
    let audit_path = std::env::temp_dir().join("credvault_audit.jsonl");
    let config = VaultConfig::from_toml_str(&format!(
        "[audit]\nfile = {:?}\n",
        audit_path.display().to_string()
    ))?;
    let vault = VaultService::from_config(Arc::new(InMemoryStore::new()), &config)?;
    let user = UserId::new("user_2abc");

    // 2. First-time vault setup
    vault.set_vault_password(&user, "hunter2")?;

    // 3. Store a credential
    let credential = PlaintextCredential::new("example.com", "alice", "p@ss").with_notes("");
    let id = vault.create_item(&user, &ItemRequest::new("hunter2", credential))?;
    println!("Stored item {id}");

    // 4. What the database sees
    let stored = vault.fetch_item(&user, id)?;
    println!("Stored record: {}", serde_json::to_string_pretty(&stored)?);

    // 5. Listing needs no password and exposes no secrets
    for summary in vault.list_items(&user)? {
        println!("  {} ({})", summary.website, summary.id);
    }

    // 6. Reveal with the right and the wrong password
    let opened = vault.reveal_item(&user, id, "hunter2")?;
    println!("Revealed username for {}: {}", opened.website, opened.username);
    match vault.reveal_item(&user, id, "wrong") {
        Ok(_) => println!("unexpected: wrong password opened the item"),
        Err(e) => println!("Wrong password rejected: {e}"),
    }

    println!("Audit log written to: {}", audit_path.display());
    Ok(())
}
