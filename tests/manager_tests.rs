//! Integration tests for the SecretsManager lifecycle.

use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use securestore::{Codec, Error, SecretsManager, VaultPolicy};
use tempfile::TempDir;

/// Helper: a fresh temp dir and a vault path inside it.
fn vault_path() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("secrets.json");
    (dir, path)
}

// ---------------------------------------------------------------------------
// Password round-trip
// ---------------------------------------------------------------------------

#[test]
fn password_roundtrip_through_disk() {
    let (_dir, path) = vault_path();

    let mut sman = SecretsManager::new();
    sman.load_key_from_password("test123").unwrap();
    sman.set("foo", "bar").unwrap();
    sman.save(&path).unwrap();

    let mut reopened = SecretsManager::load(&path, VaultPolicy::Strict).unwrap();
    reopened.load_key_from_password("test123").unwrap();
    assert_eq!(reopened.get("foo").unwrap(), "bar");
}

#[test]
fn binary_values_roundtrip() {
    let (_dir, path) = vault_path();
    let blob: Vec<u8> = (0..=255).collect();

    let mut sman = SecretsManager::new();
    sman.generate_key().unwrap();
    sman.set_bytes("blob", &blob).unwrap();
    sman.set_bytes("empty", b"").unwrap();
    let key_path = path.with_extension("key");
    sman.export_key(&key_path).unwrap();
    sman.save(&path).unwrap();

    let mut reopened = SecretsManager::load(&path, VaultPolicy::Strict).unwrap();
    reopened.load_key_from_file(&key_path).unwrap();
    assert_eq!(reopened.get_bytes("blob").unwrap().as_slice(), &blob[..]);
    assert_eq!(reopened.get_bytes("empty").unwrap().as_slice(), b"");
}

// ---------------------------------------------------------------------------
// Key file and password interchange
// ---------------------------------------------------------------------------

/// Integers stored as decimal ASCII, the caller-injected codec form.
struct DecimalCodec;

impl Codec<i64> for DecimalCodec {
    fn encode(&self, value: &i64) -> securestore::Result<Vec<u8>> {
        Ok(value.to_string().into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> securestore::Result<i64> {
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::ValueEncoding("not a decimal integer".into()))
    }
}

#[test]
fn exported_key_and_password_open_the_same_vault() {
    let (dir, path) = vault_path();
    let key_path = dir.path().join("exported.key");

    let mut sman = SecretsManager::new();
    sman.load_key_from_password("test123").unwrap();
    sman.set("string", "hello").unwrap();
    sman.set_with("int", &42i64, &DecimalCodec).unwrap();
    sman.export_key(&key_path).unwrap();
    sman.save(&path).unwrap();

    // Open with the exported key file.
    let mut by_key = SecretsManager::load(&path, VaultPolicy::Strict).unwrap();
    by_key.load_key_from_file(&key_path).unwrap();
    assert_eq!(by_key.get("string").unwrap(), "hello");

    // Open again with the original password.
    let mut by_password = SecretsManager::load(&path, VaultPolicy::Strict).unwrap();
    by_password.load_key_from_password("test123").unwrap();
    assert_eq!(by_password.get_with("int", &DecimalCodec).unwrap(), 42);
}

// ---------------------------------------------------------------------------
// Wrong key and tampering
// ---------------------------------------------------------------------------

#[test]
fn wrong_password_never_yields_plaintext() {
    let (_dir, path) = vault_path();

    let mut sman = SecretsManager::new();
    sman.load_key_from_password("test123").unwrap();
    sman.set("foo", "bar").unwrap();
    sman.save(&path).unwrap();

    let mut reopened = SecretsManager::load(&path, VaultPolicy::Strict).unwrap();
    reopened.load_key_from_password("wrong").unwrap();
    assert!(matches!(
        reopened.get("foo"),
        Err(Error::TamperedCiphertext)
    ));
}

#[test]
fn payload_tampering_is_detected_on_reload() {
    let (_dir, path) = vault_path();

    let mut sman = SecretsManager::new();
    sman.load_key_from_password("test123").unwrap();
    sman.set("foo", "bar").unwrap();
    sman.save(&path).unwrap();

    // XOR a non-zero mask into every payload byte of the stored blob.
    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let payload_b64 = doc["secrets"]["foo"]["payload"].as_str().unwrap();
    let mut payload = BASE64.decode(payload_b64).unwrap();
    for byte in &mut payload {
        *byte ^= 0x5A;
    }
    doc["secrets"]["foo"]["payload"] = serde_json::Value::String(BASE64.encode(&payload));
    std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

    let mut reopened = SecretsManager::load(&path, VaultPolicy::Strict).unwrap();
    reopened.load_key_from_password("test123").unwrap();
    assert!(matches!(
        reopened.get("foo"),
        Err(Error::TamperedCiphertext)
    ));
}

#[test]
fn sentinel_catches_mistyped_password_before_first_write() {
    let (_dir, path) = vault_path();

    let mut sman = SecretsManager::new();
    sman.load_key_from_password("A").unwrap();
    sman.set("x", "1").unwrap();
    sman.save(&path).unwrap();

    // Reopen under a different password: the first write must fail
    // before anything is encrypted under the mismatched key.
    let mut mistyped = SecretsManager::load(&path, VaultPolicy::Strict).unwrap();
    mistyped.load_key_from_password("B").unwrap();
    assert!(matches!(
        mistyped.set("y", "2"),
        Err(Error::TamperedCiphertext)
    ));

    // The original key still works and sees no partial write.
    let mut original = SecretsManager::load(&path, VaultPolicy::Strict).unwrap();
    original.load_key_from_password("A").unwrap();
    assert_eq!(original.get("x").unwrap(), "1");
    assert_eq!(original.try_get("y").unwrap(), None);
}

// ---------------------------------------------------------------------------
// Determinism and uniqueness
// ---------------------------------------------------------------------------

#[test]
fn on_disk_order_is_independent_of_insertion_order() {
    let (_dir, path_a) = vault_path();
    let (_dir2, path_b) = vault_path();

    let mut first = SecretsManager::new();
    first.load_key_from_password("pw").unwrap();
    for name in ["Zulu", "alpha", "Mike", "bravo"] {
        first.set(name, "v").unwrap();
    }
    first.save(&path_a).unwrap();

    let mut second = SecretsManager::new();
    second.load_key_from_password("pw").unwrap();
    for name in ["bravo", "Mike", "alpha", "Zulu"] {
        second.set(name, "v").unwrap();
    }
    second.save(&path_b).unwrap();

    let names = |path: &std::path::Path| -> Vec<String> {
        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        doc["secrets"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    };

    let order_a = names(&path_a);
    assert_eq!(order_a, names(&path_b));
    assert_eq!(order_a, ["alpha", "bravo", "Mike", "Zulu"]);
}

#[test]
fn all_ivs_in_a_saved_vault_are_distinct() {
    let (_dir, path) = vault_path();

    let mut sman = SecretsManager::new();
    sman.load_key_from_password("pw").unwrap();
    for i in 0..20 {
        sman.set(&format!("secret{i}"), "same value").unwrap();
    }
    sman.save(&path).unwrap();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let mut ivs = HashSet::new();
    assert!(ivs.insert(doc["sentinel"]["iv"].as_str().unwrap().to_string()));
    for (_, blob) in doc["secrets"].as_object().unwrap() {
        assert!(ivs.insert(blob["iv"].as_str().unwrap().to_string()));
    }
    // Vault salt is distinct from every blob IV as well.
    assert!(ivs.insert(doc["iv"].as_str().unwrap().to_string()));
}

#[test]
fn same_password_different_vaults_derive_different_keys() {
    let mut a = SecretsManager::new();
    a.load_key_from_password("shared password").unwrap();

    let mut b = SecretsManager::new();
    b.load_key_from_password("shared password").unwrap();

    // Fresh salt per vault, so the working keys differ.
    assert_ne!(
        a.export_key_bytes().unwrap().as_slice(),
        b.export_key_bytes().unwrap().as_slice()
    );
}

// ---------------------------------------------------------------------------
// Lifecycle state machine
// ---------------------------------------------------------------------------

#[test]
fn second_key_load_fails_without_state_change() {
    let mut sman = SecretsManager::new();
    sman.load_key_from_password("first").unwrap();
    sman.set("a", "1").unwrap();

    assert!(matches!(
        sman.load_key_from_password("second"),
        Err(Error::KeyAlreadyLoaded)
    ));
    assert!(matches!(sman.generate_key(), Err(Error::KeyAlreadyLoaded)));

    // The original key still decrypts.
    assert_eq!(sman.get("a").unwrap(), "1");
}

#[test]
fn operations_before_key_load_fail() {
    let (_dir, path) = vault_path();

    let mut writer = SecretsManager::new();
    writer.load_key_from_password("pw").unwrap();
    writer.set("a", "1").unwrap();
    writer.save(&path).unwrap();

    let mut unkeyed = SecretsManager::load(&path, VaultPolicy::Strict).unwrap();
    assert!(matches!(unkeyed.get("a"), Err(Error::NoKeyLoaded)));
    assert!(matches!(unkeyed.set("b", "2"), Err(Error::NoKeyLoaded)));
    assert!(matches!(
        unkeyed.save(path.as_path()),
        Err(Error::NoKeyLoaded)
    ));
    assert!(matches!(
        unkeyed.export_key_bytes(),
        Err(Error::NoKeyLoaded)
    ));

    // Deleting is a pure map operation and works without a key.
    assert!(unkeyed.delete("a").unwrap());
}

#[test]
fn disposed_manager_rejects_everything() {
    let mut sman = SecretsManager::new();
    sman.load_key_from_password("pw").unwrap();
    sman.set("a", "1").unwrap();

    sman.dispose();

    assert!(matches!(sman.get("a"), Err(Error::NoStoreLoaded)));
    assert!(matches!(sman.set("b", "2"), Err(Error::NoStoreLoaded)));
    assert!(matches!(sman.keys(), Err(Error::NoStoreLoaded)));
    assert!(matches!(
        sman.load_key_from_password("pw"),
        Err(Error::NoStoreLoaded)
    ));

    // Disposal is absorbing and idempotent.
    sman.dispose();
    assert!(matches!(sman.get("a"), Err(Error::NoStoreLoaded)));
}

#[test]
fn missing_names_and_try_get() {
    let mut sman = SecretsManager::new();
    sman.load_key_from_password("pw").unwrap();
    sman.set("present", "yes").unwrap();

    assert!(matches!(
        sman.get("absent"),
        Err(Error::SecretNotFound(_))
    ));
    assert_eq!(sman.try_get("absent").unwrap(), None);
    assert_eq!(sman.try_get("present").unwrap().as_deref(), Some("yes"));
    assert!(sman.try_get_bytes("absent").unwrap().is_none());
}

#[test]
fn delete_reports_whether_the_name_existed() {
    let mut sman = SecretsManager::new();
    sman.load_key_from_password("pw").unwrap();
    sman.set("a", "1").unwrap();

    assert!(sman.delete("a").unwrap());
    assert!(!sman.delete("a").unwrap());
    assert!(!sman.delete("never-existed").unwrap());
}

#[test]
fn names_are_case_insensitive() {
    let mut sman = SecretsManager::new();
    sman.load_key_from_password("pw").unwrap();
    sman.set("Token", "first").unwrap();
    sman.set("token", "second").unwrap();

    // One logical secret, updated in place.
    assert_eq!(sman.keys().unwrap().len(), 1);
    assert_eq!(sman.get("TOKEN").unwrap(), "second");
    assert!(sman.delete("tOkEn").unwrap());
    assert!(sman.keys().unwrap().is_empty());
}

#[test]
fn keys_lists_names_in_sorted_order() {
    let mut sman = SecretsManager::new();
    sman.load_key_from_password("pw").unwrap();
    for name in ["delta", "Alpha", "charlie", "Bravo"] {
        sman.set(name, "v").unwrap();
    }
    assert_eq!(
        sman.keys().unwrap(),
        ["Alpha", "Bravo", "charlie", "delta"]
    );
}

#[test]
fn empty_names_are_rejected() {
    let mut sman = SecretsManager::new();
    sman.load_key_from_password("pw").unwrap();
    assert!(matches!(
        sman.set("", "value"),
        Err(Error::InvalidSecretName(_))
    ));
}

// ---------------------------------------------------------------------------
// Streams and version gates
// ---------------------------------------------------------------------------

#[test]
fn save_and_load_through_byte_streams() {
    let mut sman = SecretsManager::new();
    sman.load_key_from_password("pw").unwrap();
    sman.set("a", "1").unwrap();

    let mut vault_bytes = Vec::new();
    sman.save_to_writer(&mut vault_bytes).unwrap();

    let mut key_bytes = Vec::new();
    sman.export_key_to_writer(&mut key_bytes).unwrap();

    let mut reopened =
        SecretsManager::load_from(vault_bytes.as_slice(), VaultPolicy::Strict).unwrap();
    reopened
        .load_key_from_stream(key_bytes.as_slice())
        .unwrap();
    assert_eq!(reopened.get("a").unwrap(), "1");
}

#[test]
fn future_schema_versions_are_refused() {
    let (_dir, path) = vault_path();

    let mut sman = SecretsManager::new();
    sman.load_key_from_password("pw").unwrap();
    sman.save(&path).unwrap();

    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    doc["version"] = serde_json::Value::from(4);
    std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

    assert!(matches!(
        SecretsManager::load(&path, VaultPolicy::Upgrade),
        Err(Error::UnsupportedVersion(4))
    ));
}
