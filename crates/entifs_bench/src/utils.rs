//! Benchmark utilities.

use entifs_core::{EntityStore, Fields};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::Value;
use tempfile::TempDir;

/// Generate a field bag with `count` random string fields of `width` characters.
pub fn random_fields(count: usize, width: usize) -> Fields {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let text: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(width)
                .map(char::from)
                .collect();
            (format!("field_{i}"), Value::String(text))
        })
        .collect()
}

/// Open an entity store in a fresh temporary directory.
pub fn temp_store() -> (TempDir, EntityStore) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let store = EntityStore::open(dir.path().join("db")).expect("Failed to open store");
    (dir, store)
}

/// Save `count` entities of `kind`, each with a random `score` field.
pub fn populate(store: &EntityStore, kind: &str, count: usize) {
    let mut rng = rand::thread_rng();
    store
        .transaction(|txn| {
            for _ in 0..count {
                let mut fields = random_fields(2, 16);
                fields.insert("score".into(), Value::from(rng.gen_range(0..1_000u32)));
                let entity = store.create(kind, fields)?;
                store.save(&entity, Some(&mut *txn))?;
            }
            Ok(())
        })
        .expect("Failed to populate store");
}
