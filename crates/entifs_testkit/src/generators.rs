//! Property-based test generators using proptest.

use entifs_core::{Fields, Key};
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for generating valid entity kinds.
pub fn kind_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating valid entity ids.
pub fn id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9a-z][0-9a-z:_-]{0,11}").expect("Invalid regex")
}

/// Strategy for generating valid keys.
pub fn key_strategy() -> impl Strategy<Value = Key> {
    (kind_strategy(), id_strategy())
        .prop_map(|(kind, id)| Key::new(kind, id).expect("generated key is valid"))
}

/// Strategy for generating arbitrary JSON values.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("JSON has no NaN or infinity", |f| f.is_finite())
            .prop_map(Value::from),
        ".{0,24}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Strategy for generating entity field bags.
pub fn fields_strategy() -> impl Strategy<Value = Fields> {
    prop::collection::btree_map("[a-zA-Z_][a-zA-Z0-9_]{0,11}", json_value_strategy(), 0..8)
        .prop_map(|map| map.into_iter().collect())
}

/// An operation against a single kind.
#[derive(Debug, Clone)]
pub enum EntityOperation {
    /// Create a new entity with these fields.
    Create(Fields),
    /// Overwrite the n-th created entity (modulo count).
    Update(usize, Fields),
    /// Remove the n-th created entity (modulo count).
    Remove(usize),
}

/// Strategy for generating a sequence of operations.
pub fn operations_strategy(max_len: usize) -> impl Strategy<Value = Vec<EntityOperation>> {
    prop::collection::vec(
        prop_oneof![
            3 => fields_strategy().prop_map(EntityOperation::Create),
            2 => (any::<usize>(), fields_strategy())
                .prop_map(|(n, fields)| EntityOperation::Update(n, fields)),
            1 => any::<usize>().prop_map(EntityOperation::Remove),
        ],
        0..max_len,
    )
}
