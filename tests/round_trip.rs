use credvault::{open, seal, PlaintextCredential};

fn credential() -> PlaintextCredential {
    PlaintextCredential::new("example.com", "alice", "p@ss").with_notes("")
}

#[test]
fn test_open_recovers_sealed_credential() {
    let envelope = seal("hunter2", &credential()).unwrap();
    let opened = open("hunter2", &envelope).unwrap();

    assert_eq!(opened.website, "example.com");
    assert_eq!(opened.username, "alice");
    assert_eq!(opened.password, "p@ss");
    assert_eq!(opened.notes.as_deref(), Some(""));
}

#[test]
fn test_roundtrip_preserves_awkward_content() {
    let cases = [
        PlaintextCredential::new("bank.example", "bob", "\"quoted\" \\ back\\slash"),
        PlaintextCredential::new("unicode.example", "ユーザー", "pässwörd🔑").with_notes("line one\nline two"),
        PlaintextCredential::new("long.example", "carol", "x".repeat(4096)),
    ];
    for (i, credential) in cases.iter().enumerate() {
        let password = format!("vault-password-{i}");
        let envelope = seal(&password, credential).unwrap();
        assert_eq!(&open(&password, &envelope).unwrap(), credential);
    }
}

#[test]
fn test_repeated_seals_never_repeat() {
    // Threat: determinism leak. Identical input must not produce identical
    // envelopes, or equal passwords would be visible across items.
    let a = seal("hunter2", &credential()).unwrap();
    let b = seal("hunter2", &credential()).unwrap();
    let c = seal("hunter2", &credential()).unwrap();

    for (x, y) in [(&a, &b), (&a, &c), (&b, &c)] {
        assert_ne!(x.salt, y.salt);
        assert_ne!(x.iv, y.iv);
        assert_ne!(x.ciphertext, y.ciphertext);
    }

    // All three still open.
    for envelope in [&a, &b, &c] {
        assert_eq!(open("hunter2", envelope).unwrap(), credential());
    }
}

#[test]
fn test_envelope_survives_json_storage() {
    let envelope = seal("hunter2", &credential()).unwrap();
    let stored = serde_json::to_string(&envelope).unwrap();
    let loaded = serde_json::from_str(&stored).unwrap();
    assert_eq!(open("hunter2", &loaded).unwrap(), credential());
}
