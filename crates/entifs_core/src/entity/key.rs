//! Entity keys and the `kind:id` reference codec.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address of an entity: its kind and its id within that kind.
///
/// A key maps to the file `<base>/<kind>/<id>`, so both parts must be a
/// single, visible path component. The canonical string form is
/// `kind:id`; decoding splits on the first `:`, so an id may itself
/// contain `:` but a kind may not.
///
/// In JSON a key is written as a reference object, `{"$ref": "kind:id"}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "KeyRef", into = "KeyRef")]
pub struct Key {
    kind: String,
    id: String,
}

impl Key {
    /// Separator between kind and id in the canonical encoding.
    pub const SEPARATOR: char = ':';

    /// Creates a key, validating both parts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] if either part is empty, is not a
    /// single visible path component, or the kind contains `:`.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> CoreResult<Self> {
        let kind = kind.into();
        let id = id.into();
        Self::validate_kind(&kind)?;
        validate_component("id", &id)?;
        Ok(Self { kind, id })
    }

    /// Checks that `kind` can name a type directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] if the kind is unusable.
    pub fn validate_kind(kind: &str) -> CoreResult<()> {
        validate_component("kind", kind)?;
        if kind.contains(Self::SEPARATOR) {
            return Err(CoreError::invalid_key(format!(
                "kind {kind:?} contains the separator '{}'",
                Self::SEPARATOR
            )));
        }
        Ok(())
    }

    /// Decodes a `kind:id` reference.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] if the separator is missing or
    /// either side is empty or invalid.
    pub fn decode(reference: &str) -> CoreResult<Self> {
        let (kind, id) = reference.split_once(Self::SEPARATOR).ok_or_else(|| {
            CoreError::invalid_key(format!("missing separator in {reference:?}"))
        })?;
        Self::new(kind, id)
    }

    /// Encodes the key as `kind:id`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.kind, Self::SEPARATOR, self.id)
    }

    /// Returns the entity kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the entity id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Splits the key into `(kind, id)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.kind, self.id)
    }
}

fn validate_component(part: &str, value: &str) -> CoreResult<()> {
    if value.is_empty() {
        return Err(CoreError::invalid_key(format!("{part} is empty")));
    }
    if value.starts_with('.') {
        return Err(CoreError::invalid_key(format!(
            "{part} {value:?} would be a hidden or relative path"
        )));
    }
    if value.contains(['/', '\\', '\0']) {
        return Err(CoreError::invalid_key(format!(
            "{part} {value:?} is not a single path component"
        )));
    }
    Ok(())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.kind, Self::SEPARATOR, self.id)
    }
}

impl FromStr for Key {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Wire shape of a key reference.
#[derive(Serialize, Deserialize)]
struct KeyRef {
    #[serde(rename = "$ref")]
    reference: String,
}

impl TryFrom<KeyRef> for Key {
    type Error = CoreError;

    fn try_from(value: KeyRef) -> Result<Self, Self::Error> {
        Self::decode(&value.reference)
    }
}

impl From<Key> for KeyRef {
    fn from(key: Key) -> Self {
        Self {
            reference: key.encode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_and_decode() {
        let key = Key::new("user", "1").unwrap();
        assert_eq!(key.encode(), "user:1");
        assert_eq!(Key::decode("user:1").unwrap(), key);
        assert_eq!("user:1".parse::<Key>().unwrap(), key);
        assert_eq!(key.to_string(), "user:1");
    }

    #[test]
    fn decode_splits_on_first_separator() {
        let key = Key::decode("note:a:b").unwrap();
        assert_eq!(key.kind(), "note");
        assert_eq!(key.id(), "a:b");
    }

    #[test]
    fn decode_rejects_malformed() {
        for bad in ["", "user", ":1", "user:", ":"] {
            let err = Key::decode(bad).unwrap_err();
            assert!(err.is_invalid_key(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn new_rejects_path_escapes() {
        assert!(Key::new("..", "1").is_err());
        assert!(Key::new("user", "../etc").is_err());
        assert!(Key::new("user", "a/b").is_err());
        assert!(Key::new("user", ".hidden").is_err());
        assert!(Key::new("us:er", "1").is_err());
    }

    #[test]
    fn serde_uses_reference_shape() {
        let key = Key::new("user", "2").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"$ref":"user:2"}"#);

        let back: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);

        let bad: Result<Key, _> = serde_json::from_str(r#"{"$ref":"user"}"#);
        assert!(bad.is_err());
    }
}
