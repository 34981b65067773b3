// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;

#[test]
fn memory_store_round_trip() {
    let store = MemoryTokenStore::new();
    assert_eq!(store.get().unwrap(), None);
    store.set("abc").unwrap();
    assert_eq!(store.get().unwrap().as_deref(), Some("abc"));
    store.delete().unwrap();
    assert_eq!(store.get().unwrap(), None);
}

#[test]
fn file_store_round_trip() {
    let temp = TempDir::new().unwrap();
    let store = FileTokenStore::new(temp.path().join("nested").join("token"));

    assert_eq!(store.get().unwrap(), None);
    store.set("tok-123").unwrap();
    assert_eq!(store.get().unwrap().as_deref(), Some("tok-123"));
    store.delete().unwrap();
    assert_eq!(store.get().unwrap(), None);
    store.delete().unwrap();
}

#[cfg(unix)]
#[test]
fn file_store_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("token");
    FileTokenStore::new(path.clone()).set("secret").unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[cfg(unix)]
#[test]
fn file_store_tightens_existing_token_file_before_writing() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("token");
    fs::write(&path, "old-token-with-a-longer-value").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let store = FileTokenStore::new(path.clone());
    store.set("new").unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert_eq!(store.get().unwrap().as_deref(), Some("new"));
}

#[test]
fn file_store_ignores_blank_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("token");
    fs::write(&path, "  \n").unwrap();
    assert_eq!(FileTokenStore::new(path).get().unwrap(), None);
}

#[test]
fn store_kind_from_config() {
    #[derive(Deserialize)]
    struct Wrapper {
        kind: TokenStoreKind,
    }
    let parsed: Wrapper = toml::from_str("kind = \"file\"").unwrap();
    assert_eq!(parsed.kind, TokenStoreKind::File);
    assert_eq!(TokenStoreKind::default(), TokenStoreKind::Keyring);
}
