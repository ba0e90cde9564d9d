//! End-to-end scenarios against a real directory tree.

use entifs_core::{Config, EntityArg, Key, Store};
use entifs_testkit::{fields_of, TestStore};
use serde_json::json;
use std::sync::Arc;

#[test]
fn users_land_in_type_directory() {
    let store = TestStore::new();
    let alice = store.create("user", fields_of(json!({"name": "Alice"}))).unwrap();
    store.save(&alice, None).unwrap();
    let bob = store.create("user", fields_of(json!({"name": "Bob"}))).unwrap();
    store.save(&bob, None).unwrap();

    assert_eq!(alice.key().encode(), "user:1");
    assert_eq!(bob.key().encode(), "user:2");
    assert_eq!(
        store.read_entity_file("user", "1").unwrap(),
        r#"{"name":"Alice"}"#
    );
    assert_eq!(
        store.read_entity_file("user", "2").unwrap(),
        r#"{"name":"Bob"}"#
    );
    assert!(store.store().staged_files().unwrap().is_empty());
}

#[test]
fn removed_user_drops_out_of_listing() {
    let store = TestStore::new();
    for name in ["Alice", "Bob"] {
        let user = store.create("user", fields_of(json!({ "name": name }))).unwrap();
        store.save(&user, None).unwrap();
    }

    store.remove_reference("user:1", None).unwrap();

    assert_eq!(store.all("user").unwrap(), vec![Key::new("user", "2").unwrap()]);
    assert!(store.get("user", "1").unwrap().is_none());
}

#[test]
fn allocator_skips_files_written_outside_the_store() {
    let store = TestStore::new();
    store.write_entity_file("user", "1", "{}");
    store.write_entity_file("user", "2", "{}");

    let user = store.create("user", fields_of(json!({}))).unwrap();
    assert_eq!(user.key().id(), "3");
}

#[test]
fn reopened_store_rescans_for_free_ids() {
    let store = TestStore::new();
    let first = store.create("user", fields_of(json!({"n": 1}))).unwrap();
    store.save(&first, None).unwrap();

    let reopened = Store::open_with_config(
        store.base(),
        Config::default().create_if_missing(false),
    )
    .unwrap();
    assert_eq!(reopened.generate_id("user").unwrap(), "2");
}

#[test]
fn transaction_closure_commits_or_aborts() {
    let store = TestStore::new();

    store
        .transaction(|txn| {
            let a = store.create("note", fields_of(json!({"t": "a"})))?;
            store.save(&a, Some(&mut *txn))
        })
        .unwrap();
    let failed = store.transaction(|txn| {
        let b = store.create("note", fields_of(json!({"t": "b"})))?;
        store.save(&b, Some(&mut *txn))?;
        Key::decode("no-separator").map(|_| ())
    });

    assert!(failed.unwrap_err().is_invalid_key());
    assert_eq!(store.all("note").unwrap().len(), 1);
    assert!(store.store().staged_files().unwrap().is_empty());
}

#[test]
fn resolve_turns_fields_into_a_new_entity() {
    let store = TestStore::new();
    let saved = store.create("tag", fields_of(json!({"name": "rust"}))).unwrap();
    store.save(&saved, None).unwrap();

    let by_ref = store
        .resolve("tag", EntityArg::Reference(saved.key().clone()))
        .unwrap()
        .unwrap();
    assert_eq!(by_ref, saved);

    let fresh = store
        .resolve("tag", EntityArg::Fields(fields_of(json!({"name": "go"}))))
        .unwrap()
        .unwrap();
    assert_eq!(fresh.key().encode(), "tag:2");
    assert!(store.get("tag", "2").unwrap().is_none());
}

#[test]
fn shared_store_handles_are_independent_wrappers() {
    let store = TestStore::new();
    let other = entifs_core::EntityStore::new(Arc::clone(store.entities.store()));
    let user = other.create("user", fields_of(json!({}))).unwrap();
    other.save(&user, None).unwrap();
    assert!(store.get("user", user.key().id()).unwrap().is_some());
}
