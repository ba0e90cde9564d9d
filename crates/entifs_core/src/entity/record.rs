//! Entity records.

use crate::entity::Key;
use crate::error::CoreResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// The field bag of an entity: a JSON object.
pub type Fields = serde_json::Map<String, Value>;

/// A persisted record: a key plus its fields.
///
/// The key is structural metadata. Only the fields are written to the
/// entity file; the key is recovered from the file's location on load.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    key: Key,
    fields: Fields,
}

impl Entity {
    /// Creates an entity from a key and its fields.
    #[must_use]
    pub fn new(key: Key, fields: Fields) -> Self {
        Self { key, fields }
    }

    /// Creates an entity from any value that serializes to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the value does not serialize to an object.
    pub fn from_serialize<T: Serialize>(key: Key, value: &T) -> CoreResult<Self> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self::new(key, fields)),
            other => {
                let err = <serde_json::Error as serde::ser::Error>::custom(format!(
                    "expected a JSON object for {key}, got {other}"
                ));
                Err(err.into())
            }
        }
    }

    /// Deserializes the fields into a typed value.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the fields don't match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> CoreResult<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }

    /// Returns the entity's key.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Returns the entity's fields.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns the entity's fields mutably.
    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Returns a single field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a single field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Copies every property of `props` onto the fields, replacing
    /// existing values with the same name.
    pub fn merge(&mut self, props: Fields) {
        for (name, value) in props {
            self.fields.insert(name, value);
        }
    }

    /// Splits the entity into key and fields.
    #[must_use]
    pub fn into_parts(self) -> (Key, Fields) {
        (self.key, self.fields)
    }

    /// Serializes the fields to the entity file body.
    pub(crate) fn encode_body(&self) -> CoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.fields)?)
    }
}

/// The shapes an entity argument can take.
///
/// Callers may hand over a bare reference, an already-materialized entity,
/// or a plain field bag that has not been assigned a key yet.
/// [`crate::Store::resolve`] maps each to an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityArg {
    /// A reference to a stored entity, loaded on resolve.
    Reference(Key),
    /// An entity that already carries its key.
    Entity(Entity),
    /// Fields of a new entity; a key is allocated on resolve.
    Fields(Fields),
}

impl From<Key> for EntityArg {
    fn from(key: Key) -> Self {
        Self::Reference(key)
    }
}

impl From<Entity> for EntityArg {
    fn from(entity: Entity) -> Self {
        Self::Entity(entity)
    }
}

impl From<Fields> for EntityArg {
    fn from(fields: Fields) -> Self {
        Self::Fields(fields)
    }
}
