//! Model-checked integration helpers.
//!
//! [`IntegrationHarness`] mirrors every write in an in-memory map so a test
//! can check the store against what it should contain.

use crate::fixtures::TestStore;
use crate::generators::EntityOperation;
use entifs_core::{CoreResult, Entity, Fields, Key};
use std::collections::BTreeMap;

/// A test harness that tracks the expected content of one store.
pub struct IntegrationHarness {
    /// The store under test.
    pub store: TestStore,
    expected: BTreeMap<Key, Fields>,
    created: Vec<Key>,
}

impl IntegrationHarness {
    /// Creates a harness over a fresh temporary store.
    pub fn new() -> Self {
        Self {
            store: TestStore::new(),
            expected: BTreeMap::new(),
            created: Vec::new(),
        }
    }

    /// Creates and saves a new entity of `kind`.
    pub fn create(&mut self, kind: &str, fields: Fields) -> CoreResult<Key> {
        let entity = self.store.create(kind, fields.clone())?;
        self.store.save(&entity, None)?;
        let key = entity.key().clone();
        self.expected.insert(key.clone(), fields);
        self.created.push(key.clone());
        Ok(key)
    }

    /// Overwrites `key` with `fields`.
    pub fn put(&mut self, key: &Key, fields: Fields) -> CoreResult<()> {
        let entity = Entity::new(key.clone(), fields.clone());
        self.store.save(&entity, None)?;
        self.expected.insert(key.clone(), fields);
        Ok(())
    }

    /// Removes `key`.
    pub fn remove(&mut self, key: &Key) -> CoreResult<()> {
        self.store.remove(key, None)?;
        self.expected.remove(key);
        Ok(())
    }

    /// Applies one generated operation against `kind`.
    pub fn apply(&mut self, kind: &str, op: EntityOperation) -> CoreResult<()> {
        match op {
            EntityOperation::Create(fields) => self.create(kind, fields).map(|_| ()),
            EntityOperation::Update(n, fields) => match self.pick(n) {
                Some(key) => self.put(&key, fields),
                None => Ok(()),
            },
            EntityOperation::Remove(n) => match self.pick(n) {
                Some(key) => self.remove(&key),
                None => Ok(()),
            },
        }
    }

    /// Returns the tracked fields for `key`.
    pub fn expected(&self, key: &Key) -> Option<&Fields> {
        self.expected.get(key)
    }

    /// Checks every tracked entity, and the listing of `kind`, against the store.
    ///
    /// # Panics
    ///
    /// Panics on the first mismatch.
    pub fn verify(&self, kind: &str) {
        for key in &self.created {
            let actual = self
                .store
                .get(key.kind(), key.id())
                .expect("Failed to load entity")
                .map(|entity| entity.into_parts().1);
            assert_eq!(
                actual.as_ref(),
                self.expected.get(key),
                "entity mismatch for {key}"
            );
        }

        let mut listed = self.store.all(kind).expect("Failed to list kind");
        listed.sort();
        let tracked: Vec<Key> = self
            .expected
            .keys()
            .filter(|key| key.kind() == kind)
            .cloned()
            .collect();
        assert_eq!(listed, tracked, "listing mismatch for {kind}");
        assert!(
            self.store.store().staged_files().expect("Failed to scan").is_empty(),
            "staged files left behind"
        );
    }

    fn pick(&self, n: usize) -> Option<Key> {
        if self.created.is_empty() {
            return None;
        }
        Some(self.created[n % self.created.len()].clone())
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::fields_of;
    use crate::generators::operations_strategy;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn create_update_remove() {
        let mut harness = IntegrationHarness::new();
        let alice = harness.create("user", fields_of(json!({"name": "Alice"}))).unwrap();
        let bob = harness.create("user", fields_of(json!({"name": "Bob"}))).unwrap();
        harness.put(&alice, fields_of(json!({"name": "Alicia"}))).unwrap();
        harness.remove(&bob).unwrap();

        harness.verify("user");
        assert_eq!(harness.expected(&alice).unwrap()["name"], "Alicia");
        assert!(harness.expected(&bob).is_none());
    }

    #[test]
    fn removed_ids_are_not_reused_while_files_exist() {
        let mut harness = IntegrationHarness::new();
        let first = harness.create("note", Fields::new()).unwrap();
        let second = harness.create("note", Fields::new()).unwrap();
        assert_ne!(first, second);
        harness.verify("note");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn store_matches_model(ops in operations_strategy(24)) {
            let mut harness = IntegrationHarness::new();
            for op in ops {
                harness.apply("item", op).unwrap();
            }
            harness.verify("item");
        }
    }
}
