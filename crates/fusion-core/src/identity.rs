//! Document identity for deduplication across ranked lists.
//!
//! Two items are the same document iff their canonical form is equal. The
//! canonical form is compact JSON of the content and the metadata with keys
//! in sorted order, so metadata insertion order never matters. Scores are
//! ignored.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{FusionError, Result};
use crate::types::RetrievedItem;

/// Content-addressed identity of a retrieved document (blake3 digest).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey([u8; 32]);

impl DocumentKey {
    /// Resolve the key for an item.
    pub fn of(item: &RetrievedItem) -> Result<Self> {
        let canonical = canonical_form(item)?;
        Ok(Self(*blake3::hash(canonical.as_bytes()).as_bytes()))
    }

    /// Lowercase hex rendering of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocumentKey({})", &self.to_hex()[..12])
    }
}

impl Serialize for DocumentKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_hex().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DocumentKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        let bytes = hex::decode(&hex).map_err(serde::de::Error::custom)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("invalid key length"))?;
        Ok(Self(arr))
    }
}

impl RetrievedItem {
    /// Identity key used for deduplication.
    pub fn key(&self) -> Result<DocumentKey> {
        DocumentKey::of(self)
    }
}

#[derive(Serialize)]
struct Canonical<'a> {
    content: &'a str,
    metadata: BTreeMap<&'a str, &'a Value>,
}

/// Canonical serialization of `(content, metadata)`.
///
/// Fails with [`FusionError::Serialization`] when a metadata value is not a
/// scalar.
pub fn canonical_form(item: &RetrievedItem) -> Result<String> {
    let mut metadata = BTreeMap::new();
    for (key, value) in &item.metadata {
        if !is_scalar(value) {
            return Err(FusionError::serialization(format!(
                "metadata key {:?} holds a non-scalar value ({}); only null, bool, number and string are allowed",
                key,
                kind(value)
            )));
        }
        metadata.insert(key.as_str(), value);
    }

    let canonical = Canonical {
        content: &item.content,
        metadata,
    };
    Ok(serde_json::to_string(&canonical)?)
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
    }
}
