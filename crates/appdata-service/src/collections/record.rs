use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CollectionError, CollectionKind};

/// The key every record must carry.
pub const ID_KEY: &str = "id";
/// The human-readable name every record must carry.
pub const DISPLAY_NAME_KEY: &str = "displayName";

/// A single loosely-typed item of a collection, as returned by the management API.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Looks up an arbitrary field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The `id` of this record, if it is a string.
    pub fn id(&self) -> Option<&str> {
        self.get(ID_KEY).and_then(Value::as_str)
    }

    /// The `displayName` of this record, if it is a string.
    pub fn display_name(&self) -> Option<&str> {
        self.get(DISPLAY_NAME_KEY).and_then(Value::as_str)
    }

    /// Returns `true` if `key` is present with a non-null value.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.is_null())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A snapshot of a collection.
///
/// Snapshots are shared, handing one out never copies the records.
pub type Collection = Arc<[Record]>;

/// Checks that every record carries an `id` and a `displayName`.
///
/// This is intentionally shallow and only guards against gross shape drift of the API. An
/// empty collection is always valid.
pub fn validate(kind: CollectionKind, records: &[Record]) -> Result<(), CollectionError> {
    for (idx, record) in records.iter().enumerate() {
        for key in [ID_KEY, DISPLAY_NAME_KEY] {
            if !record.has(key) {
                return Err(CollectionError::InvalidData {
                    kind,
                    reason: format!("record {idx} is missing `{key}`"),
                });
            }
        }
    }
    Ok(())
}
